//! Poll-cycle error taxonomy.
//!
//! Errors are classified by how the scheduler reacts:
//! - `Fetch(Auth)`: terminal — stop polling, caller must re-authenticate
//! - `Fetch(_)`: transient — feeds the consecutive-failure backoff counter
//! - `Store`: transient — same backoff treatment
//!
//! Classification-service failures never reach this level; they degrade to
//! the rule-based category inside the cycle.

use thiserror::Error;

use crate::mail_client::FetchError;

/// A failure of one poll cycle.
#[derive(Debug, Error)]
pub enum PollError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("store error: {0}")]
    Store(String),
}

impl PollError {
    /// True for the terminal auth failure that stops the scheduler outright.
    pub fn is_auth(&self) -> bool {
        matches!(self, PollError::Fetch(e) if e.is_auth())
    }
}
