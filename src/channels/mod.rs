//! Inbound and outbound channels.
//!
//! The pipeline talks to the mailbox through [`MailSource`] and announces
//! results through [`Notifier`]; both are trait objects so tests can swap in
//! in-memory doubles.

pub mod email;
pub mod telegram;

pub use email::{ImapConfig, ImapMailSource};
pub use telegram::{TelegramConfig, TelegramNotifier};

use async_trait::async_trait;

use crate::error::ChannelError;
use crate::extract::ExtractedRecord;
use crate::pipeline::types::{BatchCounters, RawMessage};

/// Where publication emails come from.
#[async_trait]
pub trait MailSource: Send + Sync {
    /// Fetch all unread messages, bodies already reduced to plain text.
    /// Fetching must not flag messages as read; that happens explicitly
    /// via [`mark_read`](MailSource::mark_read) once a message is handled.
    async fn fetch_unread(&self) -> Result<Vec<RawMessage>, ChannelError>;

    /// Flag one message read after its publications were handled.
    async fn mark_read(&self, id: &str) -> Result<(), ChannelError>;
}

/// Outbound announcements. All methods are best-effort; implementations
/// log failures instead of surfacing them, so a dead notifier never stops
/// a batch.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// One publication turned into a card.
    async fn publication_processed(&self, record: &ExtractedRecord, card_url: &str);

    /// End-of-batch summary.
    async fn batch_summary(&self, counters: &BatchCounters);

    /// Unrecoverable error worth a human's attention.
    async fn fatal_error(&self, message: &str);
}

/// Notifier that drops everything. Used when no notifier is configured.
pub struct NullNotifier;

#[async_trait]
impl Notifier for NullNotifier {
    async fn publication_processed(&self, _record: &ExtractedRecord, _card_url: &str) {}
    async fn batch_summary(&self, _counters: &BatchCounters) {}
    async fn fatal_error(&self, _message: &str) {}
}
