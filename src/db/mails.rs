use rusqlite::params;

use super::MailDb;
use crate::types::{Mail, MailCategory, MailStats};

impl MailDb {
    // =========================================================================
    // Mails
    // =========================================================================

    /// Idempotent insert. Returns `true` only when the row was newly
    /// inserted; an existing `id` is a no-op (never an update) and reports
    /// `false` so the caller neither re-notifies nor re-emits the mail.
    ///
    /// `created_at` is written as SQLite's `datetime('now')` so retention
    /// cleanup compares like against like.
    pub fn insert_mail(&self, mail: &Mail) -> Result<bool, String> {
        let rows = self
            .conn
            .execute(
                "INSERT OR IGNORE INTO mails (
                    id, sender_name, sender_email, subject, received_at,
                    category, web_link, notified, is_read, project_id,
                    message_id, created_at
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, datetime('now'))",
                params![
                    mail.id,
                    mail.sender_name,
                    mail.sender_email,
                    mail.subject,
                    mail.received_at,
                    mail.category.as_str(),
                    mail.web_link,
                    mail.notified as i32,
                    mail.is_read as i32,
                    mail.project_id,
                    mail.message_id,
                ],
            )
            .map_err(|e| format!("Failed to insert mail {}: {e}", mail.id))?;
        Ok(rows > 0)
    }

    /// Get mails, optionally filtered by category, newest first.
    pub fn get_mails(&self, category: Option<MailCategory>) -> Result<Vec<Mail>, String> {
        let base = "SELECT id, sender_name, sender_email, subject, received_at,
                           category, web_link, notified, is_read, project_id,
                           message_id, created_at
                    FROM mails";
        let (sql, filter) = match category {
            Some(c) => (
                format!("{base} WHERE category = ?1 ORDER BY received_at DESC"),
                Some(c.as_str()),
            ),
            None => (format!("{base} ORDER BY received_at DESC"), None),
        };

        let mut stmt = self
            .conn
            .prepare(&sql)
            .map_err(|e| format!("Failed to prepare mails query: {e}"))?;

        let rows = match filter {
            Some(c) => stmt.query_map(params![c], map_mail_row),
            None => stmt.query_map([], map_mail_row),
        }
        .map_err(|e| format!("Failed to query mails: {e}"))?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row.map_err(|e| format!("Failed to read mail row: {e}"))?);
        }
        Ok(results)
    }

    /// Mark a mail as read.
    pub fn mark_as_read(&self, mail_id: &str) -> Result<(), String> {
        self.conn
            .execute("UPDATE mails SET is_read = 1 WHERE id = ?1", params![mail_id])
            .map_err(|e| format!("Failed to mark mail {mail_id} read: {e}"))?;
        Ok(())
    }

    /// The fetch watermark: most recent `received_at` across all mails.
    /// `None` means first run — fetch everything.
    pub fn last_received_time(&self) -> Result<Option<String>, String> {
        self.conn
            .query_row("SELECT MAX(received_at) FROM mails", [], |row| row.get(0))
            .map_err(|e| format!("Failed to query last received time: {e}"))
    }

    /// Retention cleanup: delete mails whose local insertion time is older
    /// than `days`. Returns the number of rows deleted.
    pub fn cleanup_old_mails(&self, days: u32) -> Result<usize, String> {
        let modifier = format!("-{days} days");
        self.conn
            .execute(
                "DELETE FROM mails WHERE created_at < datetime('now', ?1)",
                params![modifier],
            )
            .map_err(|e| format!("Failed to clean up old mails: {e}"))
    }

    /// Total and unread counts across all mails.
    pub fn total_mail_stats(&self) -> Result<MailStats, String> {
        self.conn
            .query_row(
                "SELECT COUNT(*), COALESCE(SUM(is_read = 0), 0) FROM mails",
                [],
                |row| {
                    Ok(MailStats {
                        total: row.get(0)?,
                        unread: row.get(1)?,
                    })
                },
            )
            .map_err(|e| format!("Failed to query mail stats: {e}"))
    }

    /// Counts for mails not yet assigned to any project.
    pub fn unassigned_mail_stats(&self) -> Result<MailStats, String> {
        self.conn
            .query_row(
                "SELECT COUNT(*), COALESCE(SUM(is_read = 0), 0)
                 FROM mails WHERE project_id IS NULL",
                [],
                |row| {
                    Ok(MailStats {
                        total: row.get(0)?,
                        unread: row.get(1)?,
                    })
                },
            )
            .map_err(|e| format!("Failed to query unassigned mail stats: {e}"))
    }
}

/// Row mapper for mails SELECT queries (12 columns).
fn map_mail_row(row: &rusqlite::Row) -> rusqlite::Result<Mail> {
    let category: String = row.get(5)?;
    Ok(Mail {
        id: row.get(0)?,
        sender_name: row.get(1)?,
        sender_email: row.get(2)?,
        subject: row.get(3)?,
        received_at: row.get(4)?,
        category: MailCategory::parse(&category).unwrap_or_default(),
        web_link: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
        notified: row.get::<_, i32>(7)? != 0,
        is_read: row.get::<_, i32>(8)? != 0,
        project_id: row.get(9)?,
        message_id: row.get::<_, Option<String>>(10)?.unwrap_or_default(),
        created_at: row.get(11)?,
    })
}
