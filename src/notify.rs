//! Desktop notification dispatch.
//!
//! The poller decides *whether* to notify; this module decides *what* the
//! notification says and hands it to a platform backend behind `Notifier`.
//! Delivery is fire-and-forget: a backend failure is logged and the poll
//! cycle continues.

use crate::types::Mail;

/// Platform notification backend.
pub trait Notifier: Send + Sync {
    /// Whether the OS currently allows us to post notifications.
    fn permission_granted(&self) -> bool;

    fn notify(&self, title: &str, body: &str) -> Result<(), String>;
}

/// Post a notification for one newly inserted mail. Title carries the
/// category emoji and the sender (display name, or address when the name
/// is empty); body is the subject.
pub fn dispatch_new_mail(notifier: &dyn Notifier, mail: &Mail) {
    if !notifier.permission_granted() {
        log::debug!("notify: permission not granted, skipping {}", mail.id);
        return;
    }

    let meta = mail.category.meta();
    let sender = if mail.sender_name.is_empty() {
        &mail.sender_email
    } else {
        &mail.sender_name
    };
    let title = format!("{} {}", meta.emoji, sender);

    if let Err(e) = notifier.notify(&title, &mail.subject) {
        log::warn!("notify: failed to post notification for {}: {e}", mail.id);
    }
}
