//! Shared type definitions for the mail engine.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

/// Fixed set of mail categories. Rule names map 1:1 onto these; anything
/// else classifies as `Uncategorized`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MailCategory {
    Urgent,
    Approval,
    External,
    Internal,
    System,
    #[default]
    Uncategorized,
}

impl MailCategory {
    pub const ALL: [MailCategory; 6] = [
        MailCategory::Urgent,
        MailCategory::Approval,
        MailCategory::External,
        MailCategory::Internal,
        MailCategory::System,
        MailCategory::Uncategorized,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MailCategory::Urgent => "urgent",
            MailCategory::Approval => "approval",
            MailCategory::External => "external",
            MailCategory::Internal => "internal",
            MailCategory::System => "system",
            MailCategory::Uncategorized => "uncategorized",
        }
    }

    /// Parse a stored category name. Unknown names yield `None`; callers
    /// decide whether that means "uncategorized" or an error.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "urgent" => Some(MailCategory::Urgent),
            "approval" => Some(MailCategory::Approval),
            "external" => Some(MailCategory::External),
            "internal" => Some(MailCategory::Internal),
            "system" => Some(MailCategory::System),
            "uncategorized" => Some(MailCategory::Uncategorized),
            _ => None,
        }
    }

    /// Display metadata used by notification dispatch and rule seeding.
    pub fn meta(&self) -> CategoryMeta {
        match self {
            MailCategory::Urgent => CategoryMeta {
                label: "긴급",
                color: "#EF4444",
                emoji: "🔴",
            },
            MailCategory::Approval => CategoryMeta {
                label: "결재",
                color: "#F59E0B",
                emoji: "🟡",
            },
            MailCategory::External => CategoryMeta {
                label: "외부",
                color: "#3B82F6",
                emoji: "🔵",
            },
            MailCategory::Internal => CategoryMeta {
                label: "내부",
                color: "#22C55E",
                emoji: "🟢",
            },
            MailCategory::System => CategoryMeta {
                label: "시스템",
                color: "#6B7280",
                emoji: "⚙️",
            },
            MailCategory::Uncategorized => CategoryMeta {
                label: "미분류",
                color: "#9CA3AF",
                emoji: "📧",
            },
        }
    }
}

/// Display metadata for a category.
#[derive(Debug, Clone, Copy)]
pub struct CategoryMeta {
    pub label: &'static str,
    pub color: &'static str,
    pub emoji: &'static str,
}

// ---------------------------------------------------------------------------
// Mail
// ---------------------------------------------------------------------------

/// A row from the `mails` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mail {
    /// Server-assigned stable ID, the de-duplication key.
    pub id: String,
    pub sender_name: String,
    pub sender_email: String,
    pub subject: String,
    /// Server timestamp (RFC 3339). `MAX(received_at)` is the fetch watermark.
    pub received_at: String,
    pub category: MailCategory,
    pub web_link: String,
    pub notified: bool,
    pub is_read: bool,
    pub project_id: Option<i64>,
    /// Protocol-level Message-ID header; may be empty.
    pub message_id: String,
    /// Local insertion time; drives retention cleanup.
    pub created_at: String,
}

/// Minimal `(id, subject)` view of a mail, used by the project matcher and
/// the AI project analyzer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailRef {
    pub id: String,
    pub subject: String,
}

/// Aggregate mail counts for a status indicator.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct MailStats {
    pub total: i64,
    pub unread: i64,
}

// ---------------------------------------------------------------------------
// Category rules
// ---------------------------------------------------------------------------

/// Sentinel match value: sender domain differs from the company domain.
pub const EXTERNAL_SENTINEL: &str = "__EXTERNAL__";
/// Sentinel match value: sender domain equals the company domain.
pub const INTERNAL_SENTINEL: &str = "__INTERNAL__";

/// Recognized `match_type` values. The column is stored as plain text so
/// that rows with an unrecognized type load fine and simply never match.
pub const MATCH_SUBJECT_CONTAINS: &str = "subject_contains";
pub const MATCH_SENDER_DOMAIN: &str = "sender_domain";
pub const MATCH_SENDER_CONTAINS: &str = "sender_contains";

/// A row from the `category_rules` table: an ordered predicate mapping a
/// mail to a category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryRule {
    pub id: i64,
    /// Category name this rule classifies into.
    pub name: String,
    /// Lower priority evaluates first; ties broken by id order.
    pub priority: i64,
    pub match_type: String,
    /// Comma-separated terms, or one of the domain sentinels.
    pub match_value: String,
    pub color: String,
    pub notify: bool,
    pub is_default: bool,
}

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

/// A project with aggregates derived from its assigned mails.
#[derive(Debug, Clone, Serialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub color: String,
    pub keywords: Vec<String>,
    pub created_at: String,
    pub mail_count: i64,
    pub unread_count: i64,
    pub latest_mail_at: Option<String>,
}

/// The slice of a project the keyword matcher needs.
#[derive(Debug, Clone)]
pub struct ProjectForMatch {
    pub id: i64,
    pub name: String,
    pub keywords: Vec<String>,
}

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// Mailbox credentials, passed to `Poller::start` and forwarded to the
/// mail-client collaborator. Never persisted by this crate.
#[derive(Debug, Clone)]
pub struct MailCredentials {
    pub host: String,
    pub port: u16,
    pub email: String,
    pub password: String,
}
