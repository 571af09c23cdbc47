//! Keyword-based mail → project matching (no AI involved).
//!
//! Scoring: +3 when the project name appears in the cleaned subject, +1 per
//! matching keyword. The strictly highest score wins; ties keep the
//! first-seen project. The matcher never creates projects.

use std::sync::OnceLock;

use regex::Regex;

use crate::types::{MailRef, ProjectForMatch};

/// Score awarded when the project name itself appears in the subject.
const NAME_MATCH_SCORE: u32 = 3;
/// Score awarded per matching keyword.
const KEYWORD_MATCH_SCORE: u32 = 1;

fn reply_prefix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^(re|fwd|fw):\s*").unwrap())
}

/// Match a single subject against the candidate projects.
///
/// Returns the id of the project with the strictly highest score, or `None`
/// when nothing scores above zero.
pub fn match_mail_to_project(subject: &str, projects: &[ProjectForMatch]) -> Option<i64> {
    if projects.is_empty() {
        return None;
    }

    let subject_lower = subject.to_lowercase();
    let cleaned = reply_prefix().replace(&subject_lower, "");

    let mut best_match: Option<i64> = None;
    let mut best_score: u32 = 0;

    for project in projects {
        let mut score = 0;

        let name_lower = project.name.to_lowercase();
        if !name_lower.is_empty() && cleaned.contains(&name_lower) {
            score += NAME_MATCH_SCORE;
        }

        for kw in &project.keywords {
            if kw.is_empty() {
                continue;
            }
            if cleaned.contains(&kw.to_lowercase()) {
                score += KEYWORD_MATCH_SCORE;
            }
        }

        if score > best_score {
            best_score = score;
            best_match = Some(project.id);
        }
    }

    best_match
}

/// Match a batch of mails independently; mails with no match are omitted.
pub fn match_mails_to_projects(
    mails: &[MailRef],
    projects: &[ProjectForMatch],
) -> Vec<(String, i64)> {
    let mut results = Vec::new();
    for mail in mails {
        if let Some(project_id) = match_mail_to_project(&mail.subject, projects) {
            results.push((mail.id.clone(), project_id));
        }
    }
    results
}
