//! Configuration, built from `JUSPUB_*` environment variables.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::channels::{ImapConfig, TelegramConfig};
use crate::cards::TrelloConfig;
use crate::error::ConfigError;
use crate::llm::{AiBackend, AiConfig, GeminiConfig, OllamaConfig};

/// Everything the bot needs to run.
#[derive(Debug, Clone)]
pub struct Config {
    pub imap: ImapConfig,
    pub ai: AiConfig,
    pub trello: TrelloConfig,
    pub telegram: TelegramConfig,
    /// Watched-client list file. Missing file means an empty list.
    pub special_list_path: PathBuf,
    /// Pause between publications within a batch.
    pub inter_item_delay: Duration,
    /// Interval between batches in `--watch` mode.
    pub watch_interval: Duration,
}

fn required(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

fn optional(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let imap = ImapConfig {
            host: required("JUSPUB_IMAP_HOST")?,
            port: parsed("JUSPUB_IMAP_PORT", 993),
            username: required("JUSPUB_IMAP_USERNAME")?,
            password: required("JUSPUB_IMAP_PASSWORD")?,
            folder: optional("JUSPUB_IMAP_FOLDER", ""),
        };

        let backend: AiBackend = optional("JUSPUB_AI_BACKEND", "ollama")
            .parse()
            .map_err(|message| ConfigError::InvalidValue {
                key: "JUSPUB_AI_BACKEND".into(),
                message,
            })?;

        let ollama_defaults = OllamaConfig::default();
        let ollama = OllamaConfig {
            url: optional("JUSPUB_OLLAMA_URL", &ollama_defaults.url),
            model: optional("JUSPUB_OLLAMA_MODEL", &ollama_defaults.model),
            ..ollama_defaults
        };

        let gemini_defaults = GeminiConfig::default();
        let gemini = GeminiConfig {
            api_key: SecretString::from(optional("JUSPUB_GEMINI_API_KEY", "")),
            model: optional("JUSPUB_GEMINI_MODEL", &gemini_defaults.model),
            ..gemini_defaults
        };

        // The Gemini key is only required when Gemini is the backend.
        if backend == AiBackend::Gemini && std::env::var("JUSPUB_GEMINI_API_KEY").is_err() {
            return Err(ConfigError::MissingEnvVar("JUSPUB_GEMINI_API_KEY".into()));
        }

        let trello = TrelloConfig {
            api_key: required("JUSPUB_TRELLO_API_KEY")?,
            token: SecretString::from(required("JUSPUB_TRELLO_TOKEN")?),
            board_id: required("JUSPUB_TRELLO_BOARD_ID")?,
            list_id: required("JUSPUB_TRELLO_LIST_ID")?,
        };

        let telegram = TelegramConfig {
            bot_token: SecretString::from(optional("JUSPUB_TELEGRAM_TOKEN", "")),
            chat_id: optional("JUSPUB_TELEGRAM_CHAT_ID", ""),
        };

        Ok(Self {
            imap,
            ai: AiConfig {
                backend,
                ollama,
                gemini,
            },
            trello,
            telegram,
            special_list_path: PathBuf::from(optional(
                "JUSPUB_SPECIAL_LIST",
                "lista_especial.txt",
            )),
            inter_item_delay: Duration::from_secs(parsed("JUSPUB_ITEM_DELAY_SECS", 3)),
            watch_interval: Duration::from_secs(parsed("JUSPUB_WATCH_INTERVAL_MIN", 15) * 60),
        })
    }
}
