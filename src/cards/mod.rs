//! Card sinks — where finished records land for human review.

pub mod format;
pub mod trello;

pub use trello::{TrelloBoard, TrelloConfig};

use async_trait::async_trait;

use crate::error::CardError;
use crate::extract::ExtractedRecord;

/// A successfully created review card.
#[derive(Debug, Clone)]
pub struct CreatedCard {
    pub id: String,
    pub url: String,
    pub title: String,
}

/// Destination board for extracted records.
#[async_trait]
pub trait CardSink: Send + Sync {
    /// Create one review card. `source_text` is the publication text the
    /// record was extracted from, shown verbatim for human verification.
    async fn create(
        &self,
        record: &ExtractedRecord,
        source_text: &str,
    ) -> Result<CreatedCard, CardError>;
}
