//! Generation backend client.
//!
//! Talks to an OpenAI-compatible chat-completions endpoint. Bounded retries
//! and the fixed request timeout live here; callers never retry on top.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

use crate::config::GenerationSettings;
use crate::core::errors::EngineError;

const SYSTEM_PROMPT: &str =
    "You are a helpful assistant. Try to answer in one sentence.";

#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Synthesize an answer for `question` grounded in `context`.
    async fn generate(&self, context: &str, question: &str) -> Result<String, EngineError>;
}

pub struct OpenAiCompatClient {
    base_url: String,
    model: String,
    api_key: Option<String>,
    max_retries: u32,
    client: Client,
}

impl OpenAiCompatClient {
    pub fn new(settings: &GenerationSettings) -> Result<Self, EngineError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(EngineError::generation)?;

        Ok(Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            api_key: settings.api_key.clone(),
            max_retries: settings.max_retries,
            client,
        })
    }

    async fn request_once(&self, prompt: &str) -> Result<String, GenerationAttemptError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": prompt },
            ],
            "temperature": 1.0,
        });

        let mut req = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let res = req.send().await.map_err(|err| GenerationAttemptError {
            message: err.to_string(),
            retryable: true,
        })?;

        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(GenerationAttemptError {
                message: format!("generation request failed ({status}): {text}"),
                retryable: is_retryable(status),
            });
        }

        let payload: Value = res.json().await.map_err(|err| GenerationAttemptError {
            message: err.to_string(),
            retryable: false,
        })?;

        let answer = payload["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or_default()
            .trim()
            .to_string();

        if answer.is_empty() {
            return Err(GenerationAttemptError {
                message: "backend returned an empty answer".to_string(),
                retryable: false,
            });
        }
        Ok(answer)
    }
}

struct GenerationAttemptError {
    message: String,
    retryable: bool,
}

/// Rate limits and server-side trouble are worth retrying; auth and request
/// shape problems are not.
fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn build_prompt(context: &str, question: &str) -> String {
    format!(
        "Answer the question based only on the following context:\n\n\
         Context:\n{context}\n\nQuestion: {question}\nAnswer:"
    )
}

#[async_trait]
impl GenerationBackend for OpenAiCompatClient {
    async fn generate(&self, context: &str, question: &str) -> Result<String, EngineError> {
        let prompt = build_prompt(context, question);

        let mut attempt = 0u32;
        loop {
            match self.request_once(&prompt).await {
                Ok(answer) => return Ok(answer),
                Err(err) if err.retryable && attempt < self.max_retries => {
                    attempt += 1;
                    tracing::warn!(
                        "Generation attempt {} failed, retrying: {}",
                        attempt,
                        err.message
                    );
                    tokio::time::sleep(Duration::from_millis(500 * u64::from(attempt))).await;
                }
                Err(err) => {
                    return Err(EngineError::Generation(err.message));
                }
            }
        }
    }
}
