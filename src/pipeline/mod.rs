//! Batch pipeline — mailbox to review cards.
//!
//! One batch run: fetch unread emails, split each into publication
//! segments, skip segments naming a watched client, extract the rest,
//! create one card per record and notify. Segments are independent: a
//! failing segment bumps the failure counter and the batch moves on.

pub mod types;

pub use types::{BatchCounters, RawMessage};

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::cards::CardSink;
use crate::channels::{MailSource, Notifier};
use crate::error::PipelineError;
use crate::extract::ExtractionOrchestrator;
use crate::segmenter::{self, PublicationSegment};
use crate::special_list::SpecialList;

/// Pause between segments, keeps AI and board APIs from rate limiting.
pub const DEFAULT_INTER_ITEM_DELAY: Duration = Duration::from_secs(3);

pub struct PipelineCoordinator {
    mail: Arc<dyn MailSource>,
    orchestrator: ExtractionOrchestrator,
    cards: Arc<dyn CardSink>,
    notifier: Arc<dyn Notifier>,
    special_list: SpecialList,
    inter_item_delay: Duration,
}

impl PipelineCoordinator {
    pub fn new(
        mail: Arc<dyn MailSource>,
        orchestrator: ExtractionOrchestrator,
        cards: Arc<dyn CardSink>,
        notifier: Arc<dyn Notifier>,
        special_list: SpecialList,
    ) -> Self {
        Self {
            mail,
            orchestrator,
            cards,
            notifier,
            special_list,
            inter_item_delay: DEFAULT_INTER_ITEM_DELAY,
        }
    }

    pub fn with_inter_item_delay(mut self, delay: Duration) -> Self {
        self.inter_item_delay = delay;
        self
    }

    /// Run one batch over everything currently unread.
    pub async fn run_batch(&self) -> Result<BatchCounters, PipelineError> {
        let messages = self.mail.fetch_unread().await.map_err(|e| {
            error!(error = %e, "Mail fetch failed");
            PipelineError::MailFetch(e.to_string())
        })?;

        if messages.is_empty() {
            info!("No unread emails");
            let counters = BatchCounters::default();
            self.notifier.batch_summary(&counters).await;
            return Ok(counters);
        }

        let work: Vec<(&RawMessage, PublicationSegment)> = messages
            .iter()
            .flat_map(|msg| {
                segments_for(msg)
                    .into_iter()
                    .map(move |segment| (msg, segment))
            })
            .collect();

        info!(
            emails = messages.len(),
            publications = work.len(),
            "Batch started"
        );

        let mut counters = BatchCounters::default();
        // An email is marked read once at least one of its publications was
        // handled (card created or intentionally skipped).
        let mut handled_ids: BTreeSet<&str> = BTreeSet::new();
        let total = work.len();

        for (index, (message, segment)) in work.iter().enumerate() {
            info!(
                publication = segment.ordinal,
                of = segment.total_in_message,
                email = %message.id,
                "Processing publication"
            );

            if let Some(name) = self.special_list.matches(&segment.text) {
                info!(client = %name, "Skipping publication, client on special list");
                counters.skipped_special_list += 1;
                handled_ids.insert(&message.id);
            } else {
                match self.process_segment(segment).await {
                    Ok(()) => {
                        counters.created += 1;
                        handled_ids.insert(&message.id);
                    }
                    Err(e) => {
                        error!(error = %e, "Publication failed");
                        counters.failed += 1;
                    }
                }
            }

            if index + 1 < total {
                tokio::time::sleep(self.inter_item_delay).await;
            }
        }

        for id in handled_ids {
            if let Err(e) = self.mail.mark_read(id).await {
                warn!(email = %id, error = %e, "Could not mark email read");
            }
        }

        info!(
            created = counters.created,
            skipped = counters.skipped_special_list,
            failed = counters.failed,
            "Batch finished"
        );
        self.notifier.batch_summary(&counters).await;
        Ok(counters)
    }

    async fn process_segment(&self, segment: &PublicationSegment) -> Result<(), PipelineError> {
        let record = self.orchestrator.extract(&segment.text).await;
        info!(
            process = record.process_number.as_deref().unwrap_or("N/A"),
            act = %record.act_type,
            due = ?record.due_date,
            confidence = record.confidence,
            "Record extracted"
        );

        let card = self
            .cards
            .create(&record, &segment.text)
            .await
            .map_err(|e| PipelineError::CardCreation(e.to_string()))?;
        info!(url = %card.url, "Card created");

        self.notifier.publication_processed(&record, &card.url).await;
        Ok(())
    }
}

/// Segment an email body. An email the segmenter cannot split still gets
/// processed whole, as a single publication.
fn segments_for(message: &RawMessage) -> Vec<PublicationSegment> {
    let segments = segmenter::segment(&message.body);
    if !segments.is_empty() {
        return segments;
    }
    if message.body.trim().is_empty() {
        warn!(email = %message.id, "Empty email body, nothing to process");
        return Vec::new();
    }
    vec![PublicationSegment {
        ordinal: 1,
        total_in_message: 1,
        text: message.body.clone(),
    }]
}
