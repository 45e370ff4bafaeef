//! Language model clients.

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::time::Duration;

use crate::config::AiConfig;

/// Text generation backend used by the suggestion service.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    fn model_name(&self) -> &str;

    /// Send one prompt and return the model's text reply.
    async fn generate(&self, prompt: &str) -> Result<String>;
}

const TEMPERATURE: f64 = 0.7;
const MAX_OUTPUT_TOKENS: u32 = 1024;

/// Google Gemini `generateContent` client. One request per call, no retries.
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            http,
            api_key: api_key.into(),
            model: model.into(),
            base_url: base_url.into(),
        })
    }

    /// Build a client from configuration. `None` when no API key is set.
    pub fn from_config(config: &AiConfig) -> Result<Option<Self>> {
        let Some(api_key) = config.api_key.as_deref().filter(|k| !k.trim().is_empty()) else {
            return Ok(None);
        };
        Self::new(
            api_key,
            config.model.clone(),
            config.base_url.clone(),
            Duration::from_secs(config.timeout_seconds),
        )
        .map(Some)
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }

    /// Concatenate the text parts of the first candidate.
    fn extract_text(body: &Value) -> Option<String> {
        let parts = body
            .get("candidates")?
            .get(0)?
            .get("content")?
            .get("parts")?
            .as_array()?;
        let text: String = parts
            .iter()
            .filter_map(|part| part.get("text").and_then(Value::as_str))
            .collect();
        Some(text)
    }
}

#[async_trait]
impl LanguageModel for GeminiClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let request = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "temperature": TEMPERATURE,
                "maxOutputTokens": MAX_OUTPUT_TOKENS,
            }
        });

        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| anyhow!("Gemini request failed: {e}"))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| anyhow!("Gemini response read failed: {e}"))?;

        if !status.is_success() {
            return Err(anyhow!("Gemini request failed ({status}): {body}"));
        }

        let value: Value =
            serde_json::from_str(&body).map_err(|e| anyhow!("Gemini response decode failed: {e}"))?;

        Self::extract_text(&value).ok_or_else(|| anyhow!("Gemini response contained no text"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_text_joins_parts() {
        let body = json!({
            "candidates": [{
                "content": { "parts": [{ "text": "Hello, " }, { "text": "world" }] }
            }]
        });
        assert_eq!(
            GeminiClient::extract_text(&body).as_deref(),
            Some("Hello, world")
        );
    }

    #[test]
    fn test_extract_text_missing_candidates() {
        assert!(GeminiClient::extract_text(&json!({ "candidates": [] })).is_none());
        assert!(GeminiClient::extract_text(&json!({})).is_none());
    }

    #[test]
    fn test_from_config_without_key() {
        let config = AiConfig::default();
        assert!(GeminiClient::from_config(&config).unwrap().is_none());
    }

    #[test]
    fn test_endpoint_trims_slash() {
        let client = GeminiClient::new(
            "key",
            "gemini-2.5-flash",
            "http://localhost:9999/",
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(
            client.endpoint(),
            "http://localhost:9999/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }
}
