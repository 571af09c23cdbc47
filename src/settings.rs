//! Typed facade over the settings key/value table.
//!
//! Every field has a default, so a fresh database or a malformed stored
//! value always yields a usable configuration.

use serde::{Deserialize, Serialize};

use crate::db::MailDb;

pub const KEY_POLLING_INTERVAL: &str = "polling_interval";
pub const KEY_NOTIFICATIONS_ENABLED: &str = "notifications_enabled";
pub const KEY_WORK_HOURS_ONLY: &str = "work_hours_only";
pub const KEY_WORK_HOURS_START: &str = "work_hours_start";
pub const KEY_WORK_HOURS_END: &str = "work_hours_end";
pub const KEY_AUTO_CLEANUP_DAYS: &str = "auto_cleanup_days";
pub const KEY_LAUNCH_ON_STARTUP: &str = "launch_on_startup";
pub const KEY_COMPANY_DOMAIN: &str = "company_domain";
pub const KEY_GROQ_API_KEY: &str = "groq_api_key";
pub const KEY_AI_CATEGORIZATION: &str = "ai_categorization";
pub const KEY_WEBMAIL_URL: &str = "webmail_url";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    /// Base polling interval in seconds.
    pub polling_interval: u64,
    pub notifications_enabled: bool,
    /// When true, poll cycles outside the work-hours window are skipped.
    pub work_hours_only: bool,
    /// Inclusive window bounds as local "HH:MM".
    pub work_hours_start: String,
    pub work_hours_end: String,
    /// Retention window for stored mails, in days. 0 disables cleanup.
    pub auto_cleanup_days: u32,
    pub launch_on_startup: bool,
    /// Overrides the domain derived from the account address when non-empty.
    pub company_domain: String,
    pub groq_api_key: String,
    /// Enables per-mail AI arbitration on top of rule classification.
    pub ai_categorization: bool,
    pub webmail_url: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            polling_interval: 60,
            notifications_enabled: true,
            work_hours_only: false,
            work_hours_start: "09:00".to_string(),
            work_hours_end: "18:00".to_string(),
            auto_cleanup_days: 30,
            launch_on_startup: false,
            company_domain: String::new(),
            groq_api_key: String::new(),
            ai_categorization: false,
            webmail_url: "https://mail.worksmobile.com".to_string(),
        }
    }
}

impl AppSettings {
    /// Load settings, falling back to defaults for missing or unparseable
    /// values. Never fails: a broken settings table degrades to defaults.
    pub fn load(db: &MailDb) -> AppSettings {
        let defaults = AppSettings::default();
        AppSettings {
            polling_interval: parse_or(db, KEY_POLLING_INTERVAL, defaults.polling_interval),
            notifications_enabled: bool_or(
                db,
                KEY_NOTIFICATIONS_ENABLED,
                defaults.notifications_enabled,
            ),
            work_hours_only: bool_or(db, KEY_WORK_HOURS_ONLY, defaults.work_hours_only),
            work_hours_start: string_or(db, KEY_WORK_HOURS_START, defaults.work_hours_start),
            work_hours_end: string_or(db, KEY_WORK_HOURS_END, defaults.work_hours_end),
            auto_cleanup_days: parse_or(db, KEY_AUTO_CLEANUP_DAYS, defaults.auto_cleanup_days),
            launch_on_startup: bool_or(db, KEY_LAUNCH_ON_STARTUP, defaults.launch_on_startup),
            company_domain: string_or(db, KEY_COMPANY_DOMAIN, defaults.company_domain),
            groq_api_key: string_or(db, KEY_GROQ_API_KEY, defaults.groq_api_key),
            ai_categorization: bool_or(db, KEY_AI_CATEGORIZATION, defaults.ai_categorization),
            webmail_url: string_or(db, KEY_WEBMAIL_URL, defaults.webmail_url),
        }
    }

    /// Persist every field to the settings table.
    pub fn save(&self, db: &MailDb) -> Result<(), String> {
        db.set_setting(KEY_POLLING_INTERVAL, &self.polling_interval.to_string())?;
        db.set_setting(
            KEY_NOTIFICATIONS_ENABLED,
            bool_str(self.notifications_enabled),
        )?;
        db.set_setting(KEY_WORK_HOURS_ONLY, bool_str(self.work_hours_only))?;
        db.set_setting(KEY_WORK_HOURS_START, &self.work_hours_start)?;
        db.set_setting(KEY_WORK_HOURS_END, &self.work_hours_end)?;
        db.set_setting(KEY_AUTO_CLEANUP_DAYS, &self.auto_cleanup_days.to_string())?;
        db.set_setting(KEY_LAUNCH_ON_STARTUP, bool_str(self.launch_on_startup))?;
        db.set_setting(KEY_COMPANY_DOMAIN, &self.company_domain)?;
        db.set_setting(KEY_GROQ_API_KEY, &self.groq_api_key)?;
        db.set_setting(KEY_AI_CATEGORIZATION, bool_str(self.ai_categorization))?;
        db.set_setting(KEY_WEBMAIL_URL, &self.webmail_url)?;
        Ok(())
    }
}

fn bool_str(v: bool) -> &'static str {
    if v {
        "true"
    } else {
        "false"
    }
}

fn string_or(db: &MailDb, key: &str, default: String) -> String {
    match db.get_setting(key) {
        Ok(Some(v)) => v,
        _ => default,
    }
}

fn bool_or(db: &MailDb, key: &str, default: bool) -> bool {
    match db.get_setting(key) {
        Ok(Some(v)) => match v.as_str() {
            "true" | "1" => true,
            "false" | "0" => false,
            _ => default,
        },
        _ => default,
    }
}

fn parse_or<T: std::str::FromStr>(db: &MailDb, key: &str, default: T) -> T {
    match db.get_setting(key) {
        Ok(Some(v)) => v.parse().unwrap_or(default),
        _ => default,
    }
}
