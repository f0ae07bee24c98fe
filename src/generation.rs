//! Answer-generation service client.
//!
//! The core treats generation as an opaque, stateless text-completion
//! service: one prompt in, one completion out. Failures surface as
//! [`Error::Generation`], distinguishable from embedding failures.

use async_trait::async_trait;
use std::time::Duration;

use crate::config::GenerationConfig;
use crate::error::{Error, Result};

/// External text-completion service, stateless per call.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Send a single prompt and return the completion verbatim.
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Generation client for the OpenAI chat-completions API.
///
/// The reqwest client carries the configured request timeout, so a hung
/// service surfaces as a typed error instead of blocking indefinitely.
pub struct OpenAiGenerator {
    model: String,
    temperature: f64,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiGenerator {
    /// Create a client from configuration. Requires `OPENAI_API_KEY` in the
    /// environment.
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| Error::Generation("OPENAI_API_KEY environment variable not set".into()))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Generation(e.to_string()))?;

        Ok(Self {
            model: config.model.clone(),
            temperature: config.temperature,
            api_key,
            client,
        })
    }
}

#[async_trait]
impl Generator for OpenAiGenerator {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "temperature": self.temperature,
            "messages": [{ "role": "user", "content": prompt }],
        });

        let response = self
            .client
            .post("https://api.openai.com/v1/chat/completions")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Generation(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(Error::Generation(format!(
                "API error {}: {}",
                status, body_text
            )));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| Error::Generation(e.to_string()))?;

        parse_completion_response(&json)
    }
}

/// Extract `choices[0].message.content` from a chat-completions response.
fn parse_completion_response(json: &serde_json::Value) -> Result<String> {
    json.get("choices")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|t| t.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| Error::Generation("invalid response: missing completion text".into()))
}
