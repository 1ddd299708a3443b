//! Ollama provider — locally hosted generation.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use crate::error::LlmError;
use crate::llm::AiProvider;

/// Per-generation timeout. Local models on modest hardware are slow.
const GENERATE_TIMEOUT: Duration = Duration::from_secs(120);

/// Reachability probe timeout.
const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Ollama connection settings.
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    pub url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:11434".to_string(),
            model: "llama3.1:8b-instruct-q4_K_M".to_string(),
            temperature: 0.3,
            max_tokens: 2000,
        }
    }
}

/// Locally hosted generative backend.
pub struct OllamaProvider {
    config: OllamaConfig,
    client: reqwest::Client,
}

impl OllamaProvider {
    pub fn new(config: OllamaConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn request_error(&self, e: reqwest::Error) -> LlmError {
        if e.is_timeout() {
            LlmError::Timeout {
                provider: "ollama".into(),
                timeout: GENERATE_TIMEOUT,
            }
        } else if e.is_connect() {
            LlmError::Unreachable {
                provider: "ollama".into(),
                reason: e.to_string(),
            }
        } else {
            LlmError::RequestFailed {
                provider: "ollama".into(),
                reason: e.to_string(),
            }
        }
    }
}

#[async_trait]
impl AiProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let body = json!({
            "model": self.config.model,
            "prompt": prompt,
            "temperature": self.config.temperature,
            "stream": false,
            "options": { "num_predict": self.config.max_tokens },
        });

        let response = self
            .client
            .post(format!("{}/api/generate", self.config.url))
            .timeout(GENERATE_TIMEOUT)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        if !response.status().is_success() {
            return Err(LlmError::RequestFailed {
                provider: "ollama".into(),
                reason: format!("HTTP {}", response.status()),
            });
        }

        let payload: serde_json::Value =
            response.json().await.map_err(|e| self.request_error(e))?;

        payload
            .get("response")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| LlmError::InvalidResponse {
                provider: "ollama".into(),
                reason: "missing 'response' field".into(),
            })
    }

    async fn test_connection(&self) -> (bool, String) {
        let response = self
            .client
            .get(format!("{}/api/tags", self.config.url))
            .timeout(PROBE_TIMEOUT)
            .send()
            .await;

        let response = match response {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => return (false, format!("Ollama returned HTTP {}", r.status())),
            Err(e) => {
                return (
                    false,
                    format!("Could not reach Ollama at {}: {e}", self.config.url),
                );
            }
        };

        let payload: serde_json::Value = match response.json().await {
            Ok(v) => v,
            Err(e) => return (false, format!("Ollama tags response unreadable: {e}")),
        };

        let models: Vec<String> = payload
            .get("models")
            .and_then(|m| m.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|m| m.get("name").and_then(|n| n.as_str()))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        // Tag suffix (":8b-instruct-...") may differ from what `ollama list`
        // reports; compare on the base model name.
        let base = self.config.model.split(':').next().unwrap_or_default();
        if models.iter().any(|m| m.starts_with(base)) {
            (true, format!("Ollama connected, model: {}", self.config.model))
        } else {
            (
                false,
                format!(
                    "Model '{}' not found. Available: {}",
                    self.config.model,
                    models.join(", ")
                ),
            )
        }
    }
}
