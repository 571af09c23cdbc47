use rusqlite::{params, OptionalExtension};

use super::MailDb;

impl MailDb {
    // =========================================================================
    // Settings key/value store
    // =========================================================================

    /// Read a setting value. `None` means the key was never written.
    pub fn get_setting(&self, key: &str) -> Result<Option<String>, String> {
        self.conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| format!("Failed to read setting '{key}': {e}"))
    }

    /// Write a setting value, replacing any previous one.
    pub fn set_setting(&self, key: &str, value: &str) -> Result<(), String> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO settings (key, value) VALUES (?1, ?2)",
                params![key, value],
            )
            .map_err(|e| format!("Failed to write setting '{key}': {e}"))?;
        Ok(())
    }
}
