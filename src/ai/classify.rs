//! AI mail classification: per-mail and batched arbitration over the
//! rule-based verdict.

use serde::Deserialize;

use super::{AiError, AiProvider};
use crate::types::MailCategory;

/// Minimum confidence before an AI verdict overrides the rule-based one.
pub const AI_CONFIDENCE_THRESHOLD: f64 = 0.7;

const CLASSIFY_SYSTEM_PROMPT: &str = "You are an email classification assistant. \
Classify each email into exactly one category: \
urgent (incidents, outages, deadlines requiring immediate action), \
approval (approval requests, sign-offs, authorization), \
external (business mail from outside the company), \
internal (mail from colleagues inside the company), \
system (automated notifications, no-reply senders), \
or uncategorized when none clearly applies. \
Respond with JSON only.";

/// An AI verdict for one mail. Unknown category names and missing fields
/// parse as uncategorized / 0.0 rather than failing.
#[derive(Debug, Clone)]
pub struct AiClassification {
    pub category: MailCategory,
    pub confidence: f64,
    pub reason: String,
}

#[derive(Deserialize)]
struct RawClassification {
    category: Option<String>,
    confidence: Option<f64>,
    reason: Option<String>,
}

#[derive(Deserialize)]
struct RawBatch {
    results: Vec<RawClassification>,
}

impl From<RawClassification> for AiClassification {
    fn from(raw: RawClassification) -> Self {
        AiClassification {
            category: raw
                .category
                .as_deref()
                .and_then(MailCategory::parse)
                .unwrap_or_default(),
            confidence: raw.confidence.unwrap_or(0.0),
            reason: raw.reason.unwrap_or_default(),
        }
    }
}

/// Classify a single mail.
pub async fn classify_mail(
    provider: &dyn AiProvider,
    subject: &str,
    sender_email: &str,
) -> Result<AiClassification, AiError> {
    let user_prompt = format!(
        "Subject: {subject}\nSender: {sender_email}\n\n\
         Respond with a JSON object: \
         {{\"category\": \"...\", \"confidence\": 0.0, \"reason\": \"...\"}}"
    );

    let content = provider.complete(CLASSIFY_SYSTEM_PROMPT, &user_prompt).await?;
    let raw: RawClassification =
        serde_json::from_str(&content).map_err(|e| AiError::Parse(e.to_string()))?;
    Ok(raw.into())
}

/// Classify a batch of mails in one call. The response must carry one
/// result per input, in order; a bare object is accepted as a single
/// result for one-mail batches.
pub async fn classify_batch(
    provider: &dyn AiProvider,
    mails: &[(String, String)],
) -> Result<Vec<AiClassification>, AiError> {
    let mut listing = String::new();
    for (i, (subject, sender)) in mails.iter().enumerate() {
        listing.push_str(&format!("{}. Subject: {subject} | Sender: {sender}\n", i + 1));
    }
    let user_prompt = format!(
        "Classify each of these emails:\n{listing}\n\
         Respond with a JSON object: \
         {{\"results\": [{{\"category\": \"...\", \"confidence\": 0.0, \"reason\": \"...\"}}, ...]}} \
         with one result per email, in order."
    );

    let content = provider.complete(CLASSIFY_SYSTEM_PROMPT, &user_prompt).await?;

    if let Ok(batch) = serde_json::from_str::<RawBatch>(&content) {
        // Results pair positionally with the inputs, so a short or long
        // array would mislabel every mail after the gap
        if batch.results.len() != mails.len() {
            return Err(AiError::Parse(format!(
                "expected {} results, got {}",
                mails.len(),
                batch.results.len()
            )));
        }
        return Ok(batch.results.into_iter().map(Into::into).collect());
    }
    // Some models answer a one-element batch with a bare object
    if mails.len() == 1 {
        let single: RawClassification =
            serde_json::from_str(&content).map_err(|e| AiError::Parse(e.to_string()))?;
        return Ok(vec![single.into()]);
    }
    Err(AiError::Parse(format!(
        "expected {} results, got an unrecognized response",
        mails.len()
    )))
}
