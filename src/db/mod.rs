//! SQLite-backed local store for mails, category rules, projects, and
//! settings.
//!
//! The database lives at `~/.mailsnap/mailsnap.db`. The store is the sole
//! arbiter of de-duplication: `insert_mail` uses INSERT OR IGNORE so that a
//! mail id seen twice yields exactly one row and one "newly inserted"
//! report. Query methods return `Result<T, String>` with formatted context;
//! only `open` has a dedicated error type.

use std::path::PathBuf;

use rusqlite::{params, Connection};
use thiserror::Error;

mod kv;
mod mails;
mod projects;
mod rules;

/// Errors opening or creating the database.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Home directory not found")]
    HomeDirNotFound,

    #[error("Failed to create database directory: {0}")]
    CreateDir(std::io::Error),
}

pub struct MailDb {
    conn: Connection,
}

impl MailDb {
    /// Open (or create) the database at `~/.mailsnap/mailsnap.db` and apply
    /// the schema.
    pub fn open() -> Result<Self, DbError> {
        let path = Self::db_path()?;
        Self::open_at(path)
    }

    /// Open a database at an explicit path. Useful for testing.
    pub fn open_at(path: PathBuf) -> Result<Self, DbError> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(DbError::CreateDir)?;
            }
        }

        let conn = Connection::open(&path)?;

        // WAL for better concurrent read performance
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;

        Self::init_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Open an in-memory database. Testing only — nothing survives drop.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Borrow the underlying connection for ad-hoc queries.
    pub fn conn_ref(&self) -> &Connection {
        &self.conn
    }

    /// Execute a closure within a SQLite transaction.
    /// Commits on Ok, rolls back on Err.
    pub fn with_transaction<F, T>(&self, f: F) -> Result<T, String>
    where
        F: FnOnce(&Self) -> Result<T, String>,
    {
        self.conn
            .execute_batch("BEGIN IMMEDIATE")
            .map_err(|e| format!("Failed to begin transaction: {e}"))?;
        match f(self) {
            Ok(val) => {
                self.conn
                    .execute_batch("COMMIT")
                    .map_err(|e| format!("Failed to commit transaction: {e}"))?;
                Ok(val)
            }
            Err(e) => {
                let _ = self.conn.execute_batch("ROLLBACK");
                Err(e)
            }
        }
    }

    /// Resolve the default database path: `~/.mailsnap/mailsnap.db`.
    fn db_path() -> Result<PathBuf, DbError> {
        let home = dirs::home_dir().ok_or(DbError::HomeDirNotFound)?;
        Ok(home.join(".mailsnap").join("mailsnap.db"))
    }

    /// Create tables and seed the default category rules once.
    fn init_schema(conn: &Connection) -> Result<(), rusqlite::Error> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS mails (
                id TEXT PRIMARY KEY,
                sender_name TEXT NOT NULL,
                sender_email TEXT NOT NULL,
                subject TEXT NOT NULL,
                received_at TEXT NOT NULL,
                category TEXT NOT NULL DEFAULT 'uncategorized',
                web_link TEXT DEFAULT '',
                notified INTEGER DEFAULT 0,
                is_read INTEGER DEFAULT 0,
                project_id INTEGER REFERENCES projects(id),
                message_id TEXT DEFAULT '',
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE IF NOT EXISTS category_rules (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                priority INTEGER NOT NULL,
                match_type TEXT NOT NULL,
                match_value TEXT NOT NULL,
                color TEXT NOT NULL,
                notify INTEGER DEFAULT 1,
                is_default INTEGER DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS projects (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                color TEXT NOT NULL,
                keywords TEXT NOT NULL DEFAULT '[]',
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT
            );",
        )?;

        let rule_count: i64 =
            conn.query_row("SELECT COUNT(*) FROM category_rules", [], |row| row.get(0))?;
        if rule_count == 0 {
            Self::seed_default_rules(conn)?;
        }

        Ok(())
    }

    /// Insert the five default category rules. Defaults stay editable and
    /// deletable; this runs only against an empty rule table.
    fn seed_default_rules(conn: &Connection) -> Result<(), rusqlite::Error> {
        let defaults: [(&str, i64, &str, &str, &str); 5] = [
            ("urgent", 1, "subject_contains", "[긴급],[장애],[URGENT]", "#EF4444"),
            ("approval", 2, "subject_contains", "[결재],[승인],[Approval]", "#F59E0B"),
            ("external", 3, "sender_domain", "__EXTERNAL__", "#3B82F6"),
            ("internal", 4, "sender_domain", "__INTERNAL__", "#22C55E"),
            ("system", 5, "sender_contains", "noreply,system,notification,no-reply", "#6B7280"),
        ];

        for (name, priority, match_type, match_value, color) in defaults {
            conn.execute(
                "INSERT INTO category_rules (name, priority, match_type, match_value, color, notify, is_default)
                 VALUES (?1, ?2, ?3, ?4, ?5, 1, 1)",
                params![name, priority, match_type, match_value, color],
            )?;
        }

        Ok(())
    }
}
