use rusqlite::params;

use super::MailDb;
use crate::types::CategoryRule;

impl MailDb {
    // =========================================================================
    // Category rules
    // =========================================================================

    /// All rules in evaluation order: ascending priority, id breaking ties.
    pub fn category_rules(&self) -> Result<Vec<CategoryRule>, String> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, name, priority, match_type, match_value, color, notify, is_default
                 FROM category_rules
                 ORDER BY priority ASC, id ASC",
            )
            .map_err(|e| format!("Failed to prepare rules query: {e}"))?;

        let rows = stmt
            .query_map([], map_rule_row)
            .map_err(|e| format!("Failed to query rules: {e}"))?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row.map_err(|e| format!("Failed to read rule row: {e}"))?);
        }
        Ok(results)
    }

    /// Insert a new rule (`id` 0) or update an existing one. Default rules
    /// are editable like any other; only `is_default` itself is immutable.
    pub fn upsert_category_rule(&self, rule: &CategoryRule) -> Result<i64, String> {
        if rule.id > 0 {
            self.conn
                .execute(
                    "UPDATE category_rules
                     SET name = ?1, priority = ?2, match_type = ?3, match_value = ?4,
                         color = ?5, notify = ?6
                     WHERE id = ?7",
                    params![
                        rule.name,
                        rule.priority,
                        rule.match_type,
                        rule.match_value,
                        rule.color,
                        rule.notify as i32,
                        rule.id,
                    ],
                )
                .map_err(|e| format!("Failed to update rule {}: {e}", rule.id))?;
            Ok(rule.id)
        } else {
            self.conn
                .execute(
                    "INSERT INTO category_rules (name, priority, match_type, match_value, color, notify, is_default)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0)",
                    params![
                        rule.name,
                        rule.priority,
                        rule.match_type,
                        rule.match_value,
                        rule.color,
                        rule.notify as i32,
                    ],
                )
                .map_err(|e| format!("Failed to insert rule '{}': {e}", rule.name))?;
            Ok(self.conn.last_insert_rowid())
        }
    }

    /// Delete a rule. Applies to defaults too — they are seeded, not protected.
    pub fn delete_category_rule(&self, id: i64) -> Result<(), String> {
        self.conn
            .execute("DELETE FROM category_rules WHERE id = ?1", params![id])
            .map_err(|e| format!("Failed to delete rule {id}: {e}"))?;
        Ok(())
    }
}

/// Row mapper for category_rules SELECT queries (8 columns).
fn map_rule_row(row: &rusqlite::Row) -> rusqlite::Result<CategoryRule> {
    Ok(CategoryRule {
        id: row.get(0)?,
        name: row.get(1)?,
        priority: row.get(2)?,
        match_type: row.get(3)?,
        match_value: row.get(4)?,
        color: row.get(5)?,
        notify: row.get::<_, i32>(6)? != 0,
        is_default: row.get::<_, i32>(7)? != 0,
    })
}
