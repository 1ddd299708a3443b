//! Gemini provider — remote API-keyed generation.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;

use crate::error::LlmError;
use crate::llm::AiProvider;

const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

const GENERATE_TIMEOUT: Duration = Duration::from_secs(60);
const PROBE_TIMEOUT: Duration = Duration::from_secs(15);

/// Gemini API settings.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: SecretString,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: SecretString::from(""),
            model: "gemini-2.5-flash".to_string(),
            temperature: 0.3,
            max_tokens: 2000,
        }
    }
}

/// Remote API-keyed generative backend.
pub struct GeminiProvider {
    config: GeminiConfig,
    client: reqwest::Client,
}

impl GeminiProvider {
    pub fn new(config: GeminiConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{BASE_URL}/{}:generateContent?key={}",
            self.config.model,
            self.config.api_key.expose_secret()
        )
    }

    fn request_error(&self, e: reqwest::Error) -> LlmError {
        if e.is_timeout() {
            LlmError::Timeout {
                provider: "gemini".into(),
                timeout: GENERATE_TIMEOUT,
            }
        } else {
            LlmError::RequestFailed {
                provider: "gemini".into(),
                reason: e.to_string(),
            }
        }
    }
}

#[async_trait]
impl AiProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "temperature": self.config.temperature,
                "maxOutputTokens": self.config.max_tokens,
                "responseMimeType": "application/json",
            },
        });

        let response = self
            .client
            .post(self.endpoint())
            .timeout(GENERATE_TIMEOUT)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            let head: String = detail.chars().take(200).collect();
            return Err(LlmError::RequestFailed {
                provider: "gemini".into(),
                reason: format!("HTTP {status}: {head}"),
            });
        }

        let payload: serde_json::Value =
            response.json().await.map_err(|e| self.request_error(e))?;

        payload
            .pointer("/candidates/0/content/parts/0/text")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| LlmError::InvalidResponse {
                provider: "gemini".into(),
                reason: "no text candidate in response".into(),
            })
    }

    async fn test_connection(&self) -> (bool, String) {
        if self.config.api_key.expose_secret().is_empty() {
            return (false, "Gemini API key not configured".into());
        }

        let body = json!({
            "contents": [{ "parts": [{ "text": "Responda apenas: OK" }] }],
            "generationConfig": { "temperature": 0.1, "maxOutputTokens": 10 },
        });

        let response = self
            .client
            .post(self.endpoint())
            .timeout(PROBE_TIMEOUT)
            .json(&body)
            .send()
            .await;

        match response {
            Ok(r) if r.status().is_success() => {
                (true, format!("Gemini connected, model: {}", self.config.model))
            }
            Ok(r) if r.status() == reqwest::StatusCode::FORBIDDEN => {
                (false, "Gemini API key invalid or lacks permission".into())
            }
            Ok(r) if r.status() == reqwest::StatusCode::BAD_REQUEST => {
                let detail = r.text().await.unwrap_or_default();
                let message = serde_json::from_str::<serde_json::Value>(&detail)
                    .ok()
                    .and_then(|v| {
                        v.pointer("/error/message")
                            .and_then(|m| m.as_str())
                            .map(str::to_string)
                    })
                    .unwrap_or_else(|| "unknown error".into());
                (false, format!("Gemini API error: {message}"))
            }
            Ok(r) => (false, format!("Gemini returned HTTP {}", r.status())),
            Err(e) => (false, format!("Could not reach Gemini: {e}")),
        }
    }
}
