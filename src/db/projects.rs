use rusqlite::{params, OptionalExtension};

use super::MailDb;
use crate::types::{MailRef, Project, ProjectForMatch};

/// Fixed palette for project colors, assigned round-robin at creation time
/// by current project count modulo palette length.
pub const PROJECT_PALETTE: &[&str] = &[
    "#EF4444", "#F59E0B", "#3B82F6", "#22C55E", "#8B5CF6", "#EC4899", "#14B8A6", "#F97316",
];

impl MailDb {
    // =========================================================================
    // Projects
    // =========================================================================

    /// Get a project id by exact (case-sensitive) name.
    pub fn project_id_by_name(&self, name: &str) -> Result<Option<i64>, String> {
        self.conn
            .query_row(
                "SELECT id FROM projects WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| format!("Failed to look up project '{name}': {e}"))
    }

    /// Atomic get-or-create by name. Runs in an immediate transaction so two
    /// racing callers cannot create duplicate projects for one name; the
    /// UNIQUE constraint on `name` backs that up at the row level.
    pub fn get_or_create_project(&self, name: &str) -> Result<i64, String> {
        self.with_transaction(|db| {
            if let Some(id) = db.project_id_by_name(name)? {
                return Ok(id);
            }

            let count: i64 = db
                .conn
                .query_row("SELECT COUNT(*) FROM projects", [], |row| row.get(0))
                .map_err(|e| format!("Failed to count projects: {e}"))?;
            let color = PROJECT_PALETTE[count as usize % PROJECT_PALETTE.len()];

            db.conn
                .execute(
                    "INSERT INTO projects (name, color) VALUES (?1, ?2)",
                    params![name, color],
                )
                .map_err(|e| format!("Failed to create project '{name}': {e}"))?;
            Ok(db.conn.last_insert_rowid())
        })
    }

    /// Assign a mail to a project.
    pub fn assign_mail_to_project(&self, mail_id: &str, project_id: i64) -> Result<(), String> {
        self.conn
            .execute(
                "UPDATE mails SET project_id = ?1 WHERE id = ?2",
                params![project_id, mail_id],
            )
            .map_err(|e| format!("Failed to assign mail {mail_id} to project {project_id}: {e}"))?;
        Ok(())
    }

    /// All projects with derived aggregates, ordered by most recent mail.
    pub fn get_projects(&self) -> Result<Vec<Project>, String> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT p.id, p.name, p.color, p.keywords, p.created_at,
                        COUNT(m.id),
                        COALESCE(SUM(m.is_read = 0), 0),
                        MAX(m.received_at)
                 FROM projects p
                 LEFT JOIN mails m ON m.project_id = p.id
                 GROUP BY p.id
                 ORDER BY MAX(m.received_at) DESC",
            )
            .map_err(|e| format!("Failed to prepare projects query: {e}"))?;

        let rows = stmt
            .query_map([], |row| {
                let keywords_json: String = row.get(3)?;
                Ok(Project {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    color: row.get(2)?,
                    keywords: parse_keywords(&keywords_json),
                    created_at: row.get(4)?,
                    mail_count: row.get(5)?,
                    unread_count: row.get(6)?,
                    latest_mail_at: row.get(7)?,
                })
            })
            .map_err(|e| format!("Failed to query projects: {e}"))?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row.map_err(|e| format!("Failed to read project row: {e}"))?);
        }
        Ok(results)
    }

    /// The `(id, name, keywords)` slice the keyword matcher consumes.
    pub fn projects_for_matching(&self) -> Result<Vec<ProjectForMatch>, String> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, keywords FROM projects ORDER BY id ASC")
            .map_err(|e| format!("Failed to prepare matching query: {e}"))?;

        let rows = stmt
            .query_map([], |row| {
                let keywords_json: String = row.get(2)?;
                Ok(ProjectForMatch {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    keywords: parse_keywords(&keywords_json),
                })
            })
            .map_err(|e| format!("Failed to query projects for matching: {e}"))?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row.map_err(|e| format!("Failed to read project row: {e}"))?);
        }
        Ok(results)
    }

    /// Existing project names, for the AI analyzer prompt.
    pub fn project_names(&self) -> Result<Vec<String>, String> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM projects ORDER BY id ASC")
            .map_err(|e| format!("Failed to prepare names query: {e}"))?;

        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e| format!("Failed to query project names: {e}"))?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row.map_err(|e| format!("Failed to read project name: {e}"))?);
        }
        Ok(results)
    }

    /// Replace the stored keyword set. Callers are responsible for merging:
    /// the analyzer always writes the union of stored ∪ new, never a bare
    /// replacement.
    pub fn update_project_keywords(&self, project_id: i64, keywords: &[String]) -> Result<(), String> {
        let json = serde_json::to_string(keywords)
            .map_err(|e| format!("Failed to encode keywords for project {project_id}: {e}"))?;
        self.conn
            .execute(
                "UPDATE projects SET keywords = ?1 WHERE id = ?2",
                params![json, project_id],
            )
            .map_err(|e| format!("Failed to update keywords for project {project_id}: {e}"))?;
        Ok(())
    }

    /// Mails not yet assigned to any project, oldest first so analysis
    /// batches walk forward in time.
    pub fn unassigned_mails(&self) -> Result<Vec<MailRef>, String> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, subject FROM mails
                 WHERE project_id IS NULL
                 ORDER BY received_at ASC",
            )
            .map_err(|e| format!("Failed to prepare unassigned query: {e}"))?;

        let rows = stmt
            .query_map([], |row| {
                Ok(MailRef {
                    id: row.get(0)?,
                    subject: row.get(1)?,
                })
            })
            .map_err(|e| format!("Failed to query unassigned mails: {e}"))?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row.map_err(|e| format!("Failed to read unassigned row: {e}"))?);
        }
        Ok(results)
    }
}

/// Keywords are stored as a JSON array; tolerate legacy/garbage values by
/// falling back to an empty set.
fn parse_keywords(json: &str) -> Vec<String> {
    serde_json::from_str(json).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Mail, MailCategory};

    fn mail(id: &str, received_at: &str, project_id: Option<i64>) -> Mail {
        Mail {
            id: id.to_string(),
            sender_name: "Kim".to_string(),
            sender_email: "kim@mycompany.com".to_string(),
            subject: format!("subject {id}"),
            received_at: received_at.to_string(),
            category: MailCategory::Internal,
            web_link: String::new(),
            notified: false,
            is_read: false,
            project_id,
            message_id: String::new(),
            created_at: String::new(),
        }
    }

    #[test]
    fn test_get_or_create_is_idempotent() {
        let db = MailDb::open_in_memory().unwrap();
        let a = db.get_or_create_project("인프라 구축").unwrap();
        let b = db.get_or_create_project("인프라 구축").unwrap();
        assert_eq!(a, b);

        let count: i64 = db
            .conn_ref()
            .query_row("SELECT COUNT(*) FROM projects", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_project_names_are_case_sensitive() {
        let db = MailDb::open_in_memory().unwrap();
        let a = db.get_or_create_project("Billing").unwrap();
        let b = db.get_or_create_project("billing").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_palette_round_robin() {
        let db = MailDb::open_in_memory().unwrap();
        for i in 0..PROJECT_PALETTE.len() + 1 {
            db.get_or_create_project(&format!("p{i}")).unwrap();
        }

        let projects = db.projects_for_matching().unwrap();
        assert_eq!(projects.len(), PROJECT_PALETTE.len() + 1);

        let colors: Vec<String> = {
            let mut stmt = db
                .conn_ref()
                .prepare("SELECT color FROM projects ORDER BY id ASC")
                .unwrap();
            stmt.query_map([], |row| row.get(0))
                .unwrap()
                .map(|r| r.unwrap())
                .collect()
        };
        assert_eq!(colors[0], PROJECT_PALETTE[0]);
        assert_eq!(colors[1], PROJECT_PALETTE[1]);
        // Wraps around after exhausting the palette
        assert_eq!(colors[PROJECT_PALETTE.len()], PROJECT_PALETTE[0]);
    }

    #[test]
    fn test_keyword_roundtrip_and_tolerant_parse() {
        let db = MailDb::open_in_memory().unwrap();
        let id = db.get_or_create_project("infra").unwrap();
        db.update_project_keywords(id, &["서버".to_string(), "deploy".to_string()])
            .unwrap();

        let projects = db.projects_for_matching().unwrap();
        assert_eq!(projects[0].keywords, vec!["서버", "deploy"]);

        // Garbage in the column degrades to no keywords, not an error
        db.conn_ref()
            .execute("UPDATE projects SET keywords = 'not json' WHERE id = ?1", params![id])
            .unwrap();
        assert!(db.projects_for_matching().unwrap()[0].keywords.is_empty());
    }

    #[test]
    fn test_aggregates_and_unassigned() {
        let db = MailDb::open_in_memory().unwrap();
        let pid = db.get_or_create_project("infra").unwrap();

        db.insert_mail(&mail("m1", "2026-08-01T09:00:00+00:00", None)).unwrap();
        db.insert_mail(&mail("m2", "2026-08-02T09:00:00+00:00", None)).unwrap();
        db.insert_mail(&mail("m3", "2026-08-03T09:00:00+00:00", None)).unwrap();
        db.assign_mail_to_project("m1", pid).unwrap();
        db.assign_mail_to_project("m2", pid).unwrap();
        db.mark_as_read("m1").unwrap();

        let projects = db.get_projects().unwrap();
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].mail_count, 2);
        assert_eq!(projects[0].unread_count, 1);
        assert_eq!(
            projects[0].latest_mail_at.as_deref(),
            Some("2026-08-02T09:00:00+00:00")
        );

        let unassigned = db.unassigned_mails().unwrap();
        assert_eq!(unassigned.len(), 1);
        assert_eq!(unassigned[0].id, "m3");

        let stats = db.unassigned_mail_stats().unwrap();
        assert_eq!(stats.total, 1);
        assert_eq!(stats.unread, 1);
    }
}
