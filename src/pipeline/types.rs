//! Shared pipeline types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An email as fetched from the mailbox, before segmentation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawMessage {
    /// Mailbox-side identifier, used to mark the message read afterwards.
    pub id: String,
    pub subject: String,
    pub sender: String,
    pub date: DateTime<Utc>,
    /// Plain text, HTML already stripped.
    pub body: String,
}

/// Outcome counters for one batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchCounters {
    /// Segments that produced a card.
    pub created: usize,
    /// Segments skipped because a watched name matched.
    pub skipped_special_list: usize,
    /// Segments that errored (extraction ran, card creation failed).
    pub failed: usize,
}

impl BatchCounters {
    pub fn total(&self) -> usize {
        self.created + self.skipped_special_list + self.failed
    }
}
