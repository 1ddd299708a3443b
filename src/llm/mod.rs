//! AI backends for publication extraction.
//!
//! Two interchangeable providers sit behind the [`AiProvider`] trait:
//!
//! - **Ollama**: locally hosted, `POST /api/generate`
//! - **Gemini**: remote API-keyed, `generateContent`
//!
//! Selection is a configuration enum; the extraction orchestrator never
//! knows which one it is talking to.

pub mod gemini;
pub mod ollama;

pub use gemini::{GeminiConfig, GeminiProvider};
pub use ollama::{OllamaConfig, OllamaProvider};

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::LlmError;

/// Capability every AI backend must provide.
#[async_trait]
pub trait AiProvider: Send + Sync {
    /// Identifier stamped on every record this provider produced.
    fn name(&self) -> &str;

    /// Run one generation. A bounded timeout applies per call; timeouts
    /// surface as errors, not cancellations.
    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;

    /// Startup reachability probe: `(ok, diagnostic message)`.
    async fn test_connection(&self) -> (bool, String);
}

/// Supported AI backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiBackend {
    Ollama,
    Gemini,
}

impl FromStr for AiBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "gemini" => Ok(Self::Gemini),
            other => Err(format!("unknown AI backend: '{other}'")),
        }
    }
}

/// Provider selection for [`create_provider`].
#[derive(Debug, Clone)]
pub struct AiConfig {
    pub backend: AiBackend,
    pub ollama: OllamaConfig,
    pub gemini: GeminiConfig,
}

/// Create the configured AI provider.
pub fn create_provider(config: &AiConfig) -> Arc<dyn AiProvider> {
    match config.backend {
        AiBackend::Ollama => {
            tracing::info!(model = %config.ollama.model, "Using Ollama backend");
            Arc::new(OllamaProvider::new(config.ollama.clone()))
        }
        AiBackend::Gemini => {
            tracing::info!(model = %config.gemini.model, "Using Gemini backend");
            Arc::new(GeminiProvider::new(config.gemini.clone()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_parses_case_insensitive() {
        assert_eq!("ollama".parse::<AiBackend>().unwrap(), AiBackend::Ollama);
        assert_eq!("Gemini".parse::<AiBackend>().unwrap(), AiBackend::Gemini);
        assert!("openai".parse::<AiBackend>().is_err());
    }

    #[test]
    fn create_provider_selects_backend() {
        let config = AiConfig {
            backend: AiBackend::Ollama,
            ollama: OllamaConfig::default(),
            gemini: GeminiConfig::default(),
        };
        assert_eq!(create_provider(&config).name(), "ollama");

        let config = AiConfig {
            backend: AiBackend::Gemini,
            ..config
        };
        assert_eq!(create_provider(&config).name(), "gemini");
    }
}
