//! AI project analysis: group unassigned mails into projects and grow
//! each project's keyword set.

use std::collections::HashMap;

use serde::Deserialize;

use super::{AiError, AiProvider};
use crate::db::MailDb;
use crate::types::MailRef;

/// Mails per analysis request.
pub const ANALYZE_BATCH_SIZE: usize = 15;

const ANALYZE_SYSTEM_PROMPT: &str = "You are an assistant that groups work emails into projects. \
Given email subjects and a list of existing project names, assign each email to an existing \
project when one fits, or propose a concise new project name. Reuse existing names whenever \
possible. For each assignment also suggest 3-5 short keywords from the subject that identify \
the project. Respond with JSON only.";

/// One assignment in the model's response. `keywords` is optional; models
/// that omit it contribute nothing to the keyword set.
#[derive(Debug, Deserialize)]
pub struct ProjectAssignment {
    pub mail_id: String,
    pub project_name: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

#[derive(Deserialize)]
struct RawAssignments {
    assignments: Vec<ProjectAssignment>,
}

/// What one analysis run accomplished.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct AnalysisOutcome {
    pub assigned: usize,
    pub batches: usize,
}

/// Walk unassigned mails in batches, asking the model to group each batch
/// into projects. Every completed batch is persisted before the next one
/// starts, so a mid-run failure keeps all progress made so far.
///
/// Keyword suggestions are merged into the project's stored set as a
/// union; existing keywords are never dropped.
pub async fn analyze_and_assign(
    provider: &dyn AiProvider,
    db: &MailDb,
) -> Result<AnalysisOutcome, String> {
    let unassigned = db.unassigned_mails()?;
    if unassigned.is_empty() {
        return Ok(AnalysisOutcome::default());
    }

    let mut outcome = AnalysisOutcome::default();

    for batch in unassigned.chunks(ANALYZE_BATCH_SIZE) {
        let existing = db.project_names()?;
        let assignments = match analyze_batch(provider, batch, &existing).await {
            Ok(assignments) => assignments,
            Err(e) => {
                log::warn!("ai: project analysis batch failed, keeping progress: {e}");
                break;
            }
        };
        if assignments.is_empty() {
            log::warn!("ai: project analysis returned no assignments, stopping");
            break;
        }

        apply_assignments(db, batch, &assignments)?;
        outcome.assigned += assignments
            .iter()
            .filter(|a| batch.iter().any(|m| m.id == a.mail_id))
            .count();
        outcome.batches += 1;
    }

    Ok(outcome)
}

async fn analyze_batch(
    provider: &dyn AiProvider,
    batch: &[MailRef],
    existing: &[String],
) -> Result<Vec<ProjectAssignment>, AiError> {
    let mut listing = String::new();
    for mail in batch {
        listing.push_str(&format!("- id: {} | subject: {}\n", mail.id, mail.subject));
    }
    let names = if existing.is_empty() {
        "(none yet)".to_string()
    } else {
        existing.join(", ")
    };
    let user_prompt = format!(
        "Existing projects: {names}\n\nEmails:\n{listing}\n\
         Respond with a JSON object: \
         {{\"assignments\": [{{\"mail_id\": \"...\", \"project_name\": \"...\", \
         \"keywords\": [\"...\"]}}, ...]}}"
    );

    let content = provider.complete(ANALYZE_SYSTEM_PROMPT, &user_prompt).await?;
    let parsed: RawAssignments =
        serde_json::from_str(&content).map_err(|e| AiError::Parse(e.to_string()))?;
    Ok(parsed.assignments)
}

/// Persist one batch: create/look up each named project, assign the mails,
/// then write back the keyword union per project.
fn apply_assignments(
    db: &MailDb,
    batch: &[MailRef],
    assignments: &[ProjectAssignment],
) -> Result<(), String> {
    let mut new_keywords: HashMap<i64, Vec<String>> = HashMap::new();

    for assignment in assignments {
        // Ignore ids the model invented
        if !batch.iter().any(|m| m.id == assignment.mail_id) {
            log::warn!(
                "ai: skipping assignment for unknown mail id {}",
                assignment.mail_id
            );
            continue;
        }
        let name = assignment.project_name.trim();
        if name.is_empty() {
            continue;
        }

        let project_id = db.get_or_create_project(name)?;
        db.assign_mail_to_project(&assignment.mail_id, project_id)?;
        new_keywords
            .entry(project_id)
            .or_default()
            .extend(assignment.keywords.iter().cloned());
    }

    for project in db.projects_for_matching()? {
        let Some(incoming) = new_keywords.get(&project.id) else {
            continue;
        };
        let mut merged = project.keywords.clone();
        for kw in incoming {
            let kw = kw.trim();
            if !kw.is_empty() && !merged.iter().any(|k| k == kw) {
                merged.push(kw.to_string());
            }
        }
        if merged != project.keywords {
            db.update_project_keywords(project.id, &merged)?;
        }
    }

    Ok(())
}
