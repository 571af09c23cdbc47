//! Rule-based mail category classification.
//!
//! Pure functions: no store access, no network. The poller loads the rule
//! set once per cycle and calls `classify_mail` per fetched message.

use crate::types::{
    CategoryRule, MailCategory, EXTERNAL_SENTINEL, INTERNAL_SENTINEL, MATCH_SENDER_CONTAINS,
    MATCH_SENDER_DOMAIN, MATCH_SUBJECT_CONTAINS,
};

/// Extract the domain from an email address: the text after the last `@`,
/// case-folded. Empty when no `@` is present.
pub fn extract_domain(email_addr: &str) -> String {
    match email_addr.rfind('@') {
        Some(at_pos) => email_addr[at_pos + 1..].to_lowercase(),
        None => String::new(),
    }
}

/// Classify a mail against an ordered rule set.
///
/// Rules are evaluated in ascending priority (stable, so equal priorities
/// keep their stored order); the first matching rule names the category.
/// No match, or a matching rule whose name is not a known category, yields
/// `Uncategorized`.
pub fn classify_mail(
    subject: &str,
    sender_email: &str,
    rules: &[CategoryRule],
    company_domain: &str,
) -> MailCategory {
    let mut sorted: Vec<&CategoryRule> = rules.iter().collect();
    sorted.sort_by_key(|r| r.priority);

    for rule in sorted {
        if matches_rule(subject, sender_email, rule, company_domain) {
            return MailCategory::parse(&rule.name).unwrap_or(MailCategory::Uncategorized);
        }
    }

    MailCategory::Uncategorized
}

/// Evaluate a single rule predicate. Unrecognized match types never match.
fn matches_rule(
    subject: &str,
    sender_email: &str,
    rule: &CategoryRule,
    company_domain: &str,
) -> bool {
    let values: Vec<String> = rule
        .match_value
        .split(',')
        .map(|v| v.trim().to_lowercase())
        .collect();

    match rule.match_type.as_str() {
        MATCH_SUBJECT_CONTAINS => {
            let subject_lower = subject.to_lowercase();
            values.iter().any(|kw| subject_lower.contains(kw.as_str()))
        }
        MATCH_SENDER_DOMAIN => {
            let sender_domain = extract_domain(sender_email);
            let company_lower = company_domain.to_lowercase();

            if rule.match_value == EXTERNAL_SENTINEL {
                return !company_lower.is_empty() && sender_domain != company_lower;
            }
            if rule.match_value == INTERNAL_SENTINEL {
                return !company_lower.is_empty() && sender_domain == company_lower;
            }
            values.iter().any(|domain| &sender_domain == domain)
        }
        MATCH_SENDER_CONTAINS => {
            let sender_lower = sender_email.to_lowercase();
            values.iter().any(|kw| sender_lower.contains(kw.as_str()))
        }
        _ => false,
    }
}
