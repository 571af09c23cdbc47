//! MailSnap core: periodic mailbox synchronization, mail classification,
//! project grouping, and desktop notification decisions.
//!
//! The crate is transport-agnostic. Hosts supply the mailbox client and the
//! notification backend (`MailClient`, `Notifier`), wire them into a
//! [`poller::Poller`], and watch its broadcast channel for new mail. All
//! state lives in a local SQLite store ([`db::MailDb`]); classification is
//! rule-based first, with optional AI arbitration and project analysis
//! through [`ai::AiProvider`].

pub mod ai;
pub mod classifier;
pub mod db;
pub mod mail_client;
pub mod matcher;
pub mod notify;
pub mod poller;
pub mod settings;
pub mod types;

mod error;

pub use error::PollError;
