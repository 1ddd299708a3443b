//! Error types for juspub.

use std::time::Duration;

/// Top-level error type for the bot.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Card error: {0}")]
    Card(#[from] CardError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Mailbox / notifier channel errors.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Channel {name} failed to connect: {reason}")]
    ConnectFailed { name: String, reason: String },

    #[error("Channel {name} fetch failed: {reason}")]
    FetchFailed { name: String, reason: String },

    #[error("Failed to send on channel {name}: {reason}")]
    SendFailed { name: String, reason: String },

    #[error("Channel {name} protocol error: {reason}")]
    Protocol { name: String, reason: String },
}

/// AI provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Provider {provider} returned an empty response")]
    EmptyResponse { provider: String },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Provider {provider} timed out after {timeout:?}")]
    Timeout { provider: String, timeout: Duration },

    #[error("Provider {provider} is unreachable: {reason}")]
    Unreachable { provider: String, reason: String },
}

/// Board card creation errors.
#[derive(Debug, thiserror::Error)]
pub enum CardError {
    #[error("Card creation failed: {0}")]
    CreateFailed(String),

    #[error("Board request failed: {0}")]
    Request(String),
}

/// Batch pipeline errors.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Card creation failed: {0}")]
    CardCreation(String),

    #[error("Mail fetch failed: {0}")]
    MailFetch(String),
}

/// Result type alias for the bot.
pub type Result<T> = std::result::Result<T, Error>;
