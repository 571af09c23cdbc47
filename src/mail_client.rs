//! Mail-server client contract.
//!
//! The concrete mailbox transport (IMAP in production) lives outside this
//! crate; the poller only depends on this trait. Errors carry a
//! discriminated kind so the scheduler can switch on it instead of sniffing
//! error text: auth failures are terminal, everything else feeds the
//! backoff counter.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::MailCredentials;

/// Raw message metadata as returned by the mailbox.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawMail {
    /// Server-assigned stable ID (e.g. IMAP UID), used for de-duplication.
    pub id: String,
    pub sender_name: String,
    pub sender_email: String,
    pub subject: String,
    /// RFC 3339 server timestamp.
    pub received_at: String,
    #[serde(default)]
    pub message_id: String,
}

/// Errors reported by the mail-client collaborator.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// Credentials rejected by the server. Terminal: the poller stops and
    /// the caller must re-authenticate.
    #[error("authentication rejected by mail server")]
    Auth,

    /// Could not reach or stay connected to the server.
    #[error("mail server connection failed: {0}")]
    Connection(String),

    /// The server answered but the exchange failed (search, fetch, parse).
    #[error("mail protocol error: {0}")]
    Protocol(String),
}

impl FetchError {
    pub fn is_auth(&self) -> bool {
        matches!(self, FetchError::Auth)
    }
}

/// Contract for the external mailbox client.
#[async_trait]
pub trait MailClient: Send + Sync {
    /// Fetch message metadata strictly newer than `since` (RFC 3339), or
    /// everything the server is willing to return when `since` is `None`
    /// (first run). Ordering is unspecified.
    async fn fetch_since(
        &self,
        credentials: &MailCredentials,
        since: Option<&str>,
    ) -> Result<Vec<RawMail>, FetchError>;
}
