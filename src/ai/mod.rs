//! AI provider abstraction and the Groq chat-completion client.
//!
//! The provider trait takes a system prompt and a user prompt and returns
//! the raw completion text; prompt construction and response parsing live
//! with the callers (`classify`, `projects`). All AI paths are optional:
//! callers degrade to rule-based behavior when a call fails.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

pub mod classify;
pub mod projects;

pub use classify::{AiClassification, AI_CONFIDENCE_THRESHOLD};
pub use projects::{analyze_and_assign, AnalysisOutcome, ANALYZE_BATCH_SIZE};

const GROQ_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
const GROQ_MODEL: &str = "llama-3.3-70b-versatile";

/// Retries after a 429 before giving up.
const RATE_LIMIT_RETRIES: u32 = 2;
const RATE_LIMIT_WAIT_SECS: u64 = 10;

#[derive(Debug, Error)]
pub enum AiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Empty response from model")]
    EmptyResponse,

    #[error("Failed to parse model output: {0}")]
    Parse(String),
}

/// A chat-completion backend that returns raw completion text.
#[async_trait]
pub trait AiProvider: Send + Sync {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String, AiError>;
}

/// Groq chat-completion client. Requests JSON-object output and retries
/// rate-limit responses a bounded number of times.
pub struct GroqClient {
    api_key: String,
    model: String,
    http: reqwest::Client,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

impl GroqClient {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            model: GROQ_MODEL.to_string(),
            http: reqwest::Client::new(),
        }
    }

    async fn request_once(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<reqwest::Response, AiError> {
        let body = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": system_prompt},
                {"role": "user", "content": user_prompt},
            ],
            "temperature": 0.3,
            "max_tokens": 1024,
            "response_format": {"type": "json_object"},
        });

        let response = self
            .http
            .post(GROQ_API_URL)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        Ok(response)
    }
}

#[async_trait]
impl AiProvider for GroqClient {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String, AiError> {
        let mut attempt = 0;
        let response = loop {
            let response = self.request_once(system_prompt, user_prompt).await?;
            if response.status().as_u16() == 429 && attempt < RATE_LIMIT_RETRIES {
                attempt += 1;
                log::warn!(
                    "ai: rate limited, retrying in {RATE_LIMIT_WAIT_SECS}s (attempt {attempt})"
                );
                tokio::time::sleep(std::time::Duration::from_secs(RATE_LIMIT_WAIT_SECS)).await;
                continue;
            }
            break response;
        };

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(AiError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ChatResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(AiError::EmptyResponse)
    }
}
