//! End-to-end pipeline runs over in-memory doubles.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use juspub::cards::{CardSink, CreatedCard};
use juspub::channels::{MailSource, Notifier};
use juspub::error::{CardError, ChannelError, LlmError};
use juspub::extract::{ExtractedRecord, ExtractionOrchestrator, FALLBACK_PROVIDER};
use juspub::llm::AiProvider;
use juspub::pipeline::{BatchCounters, PipelineCoordinator, RawMessage};
use juspub::special_list::SpecialList;

const CNJ_A: &str = "1234567-89.2024.8.26.0100";
const CNJ_B: &str = "7654321-98.2023.8.26.0224";

// ── Doubles ─────────────────────────────────────────────────────────

struct FakeMail {
    messages: Vec<RawMessage>,
    marked_read: Mutex<Vec<String>>,
}

impl FakeMail {
    fn with(messages: Vec<RawMessage>) -> Arc<Self> {
        Arc::new(Self {
            messages,
            marked_read: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl MailSource for FakeMail {
    async fn fetch_unread(&self) -> Result<Vec<RawMessage>, ChannelError> {
        Ok(self.messages.clone())
    }

    async fn mark_read(&self, id: &str) -> Result<(), ChannelError> {
        self.marked_read.lock().unwrap().push(id.to_string());
        Ok(())
    }
}

/// Card sink that records every created card and can be told to reject
/// publications containing a marker string.
struct FakeBoard {
    created: Mutex<Vec<(ExtractedRecord, String)>>,
    fail_on: Option<&'static str>,
}

impl FakeBoard {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            created: Mutex::new(Vec::new()),
            fail_on: None,
        })
    }

    fn failing_on(marker: &'static str) -> Arc<Self> {
        Arc::new(Self {
            created: Mutex::new(Vec::new()),
            fail_on: Some(marker),
        })
    }
}

#[async_trait]
impl CardSink for FakeBoard {
    async fn create(
        &self,
        record: &ExtractedRecord,
        source_text: &str,
    ) -> Result<CreatedCard, CardError> {
        if let Some(marker) = self.fail_on
            && source_text.contains(marker)
        {
            return Err(CardError::CreateFailed("simulated board outage".into()));
        }
        let mut guard = self.created.lock().unwrap();
        guard.push((record.clone(), source_text.to_string()));
        let n = guard.len();
        Ok(CreatedCard {
            id: format!("card-{n}"),
            url: format!("https://boards.example/c/{n}"),
            title: "card".into(),
        })
    }
}

#[derive(Default)]
struct RecordingNotifier {
    processed: Mutex<Vec<String>>,
    summaries: Mutex<Vec<BatchCounters>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn publication_processed(&self, record: &ExtractedRecord, _card_url: &str) {
        self.processed
            .lock()
            .unwrap()
            .push(record.process_number.clone().unwrap_or_default());
    }

    async fn batch_summary(&self, counters: &BatchCounters) {
        self.summaries.lock().unwrap().push(*counters);
    }

    async fn fatal_error(&self, _message: &str) {}
}

/// AI double returning a fixed reply for every segment.
struct CannedAi(&'static str);

#[async_trait]
impl AiProvider for CannedAi {
    fn name(&self) -> &str {
        "canned"
    }

    async fn generate(&self, _prompt: &str) -> Result<String, LlmError> {
        Ok(self.0.to_string())
    }

    async fn test_connection(&self) -> (bool, String) {
        (true, "canned".into())
    }
}

fn email(id: &str, body: String) -> RawMessage {
    RawMessage {
        id: id.into(),
        subject: "Publicações DJE".into(),
        sender: "dje@tjsp.jus.br".into(),
        date: Utc::now(),
        body,
    }
}

fn two_publication_email() -> RawMessage {
    email(
        "17",
        format!(
            "Publicação: 1.\nData de Publicação: 07/06/2024\nPROCESSO Nº {CNJ_A}\n\
             POLO ATIVO: Acme Ltda\nIntimação, prazo de 15 dias.\n\
             Publicação: 2.\nData de Publicação: 07/06/2024\nPROCESSO Nº {CNJ_B}\n\
             POLO ATIVO: Fundação Beta\nCitação da parte ré.\n"
        ),
    )
}

fn coordinator(
    mail: Arc<FakeMail>,
    ai: &'static str,
    board: Arc<FakeBoard>,
    notifier: Arc<RecordingNotifier>,
    special: SpecialList,
) -> PipelineCoordinator {
    PipelineCoordinator::new(
        mail,
        ExtractionOrchestrator::new(Arc::new(CannedAi(ai))),
        board,
        notifier,
        special,
    )
    .with_inter_item_delay(Duration::ZERO)
}

const GOOD_REPLY: &str = r#"{"numero_processo": "1234567-89.2024.8.26.0100",
    "cliente": "Acme Ltda", "tipo_ato": "Intimação", "prazo_dias": 15,
    "prazo_tipo": "úteis", "confianca": 0.9}"#;

// ── Tests ───────────────────────────────────────────────────────────

#[tokio::test]
async fn bundled_publications_become_independent_cards() {
    let mail = FakeMail::with(vec![two_publication_email()]);
    let board = FakeBoard::new();
    let notifier = Arc::new(RecordingNotifier::default());

    let counters = coordinator(
        Arc::clone(&mail),
        GOOD_REPLY,
        Arc::clone(&board),
        Arc::clone(&notifier),
        SpecialList::from_entries(Vec::<String>::new()),
    )
    .run_batch()
    .await
    .unwrap();

    assert_eq!(counters.created, 2);
    assert_eq!(counters.failed, 0);

    let created = board.created.lock().unwrap();
    assert_eq!(created.len(), 2);
    assert!(created[0].1.contains(CNJ_A));
    assert!(created[1].1.contains(CNJ_B));

    // Email marked read once, after both publications were handled.
    assert_eq!(*mail.marked_read.lock().unwrap(), vec!["17".to_string()]);
    assert_eq!(notifier.processed.lock().unwrap().len(), 2);
    assert_eq!(notifier.summaries.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn one_failing_publication_does_not_block_the_rest() {
    let mail = FakeMail::with(vec![two_publication_email()]);
    let board = FakeBoard::failing_on(CNJ_B);
    let notifier = Arc::new(RecordingNotifier::default());

    let counters = coordinator(
        Arc::clone(&mail),
        GOOD_REPLY,
        Arc::clone(&board),
        notifier,
        SpecialList::from_entries(Vec::<String>::new()),
    )
    .run_batch()
    .await
    .unwrap();

    assert_eq!(counters.created, 1);
    assert_eq!(counters.failed, 1);
    assert_eq!(board.created.lock().unwrap().len(), 1);
    // The first publication succeeded, so the email still gets marked read.
    assert_eq!(*mail.marked_read.lock().unwrap(), vec!["17".to_string()]);
}

#[tokio::test]
async fn special_list_skips_without_carding() {
    let mail = FakeMail::with(vec![two_publication_email()]);
    let board = FakeBoard::new();
    let notifier = Arc::new(RecordingNotifier::default());

    // Accent-insensitive: entry without the cedilla still matches.
    let counters = coordinator(
        Arc::clone(&mail),
        GOOD_REPLY,
        Arc::clone(&board),
        notifier,
        SpecialList::from_entries(vec!["fundacao beta"]),
    )
    .run_batch()
    .await
    .unwrap();

    assert_eq!(counters.created, 1);
    assert_eq!(counters.skipped_special_list, 1);
    let created = board.created.lock().unwrap();
    assert_eq!(created.len(), 1);
    assert!(created[0].1.contains(CNJ_A));
    // Skipping is intentional handling; the email is still marked read.
    assert_eq!(*mail.marked_read.lock().unwrap(), vec!["17".to_string()]);
}

#[tokio::test]
async fn unusable_ai_reply_degrades_to_regex_fallback() {
    let mail = FakeMail::with(vec![two_publication_email()]);
    let board = FakeBoard::new();
    let notifier = Arc::new(RecordingNotifier::default());

    let counters = coordinator(
        mail,
        "", // model answers nothing
        Arc::clone(&board),
        notifier,
        SpecialList::from_entries(Vec::<String>::new()),
    )
    .run_batch()
    .await
    .unwrap();

    assert_eq!(counters.created, 2);
    let created = board.created.lock().unwrap();
    for (record, _) in created.iter() {
        assert_eq!(record.source_provider, FALLBACK_PROVIDER);
        assert!((record.confidence - 0.3).abs() < f32::EPSILON);
    }
    // Fallback still reads the CNJ and the explicit 15-day deadline.
    assert_eq!(created[0].0.process_number.as_deref(), Some(CNJ_A));
    assert_eq!(created[0].0.deadline_days, 15);
    assert!(created[1].0.deadline_is_implicit);
}

#[tokio::test]
async fn empty_mailbox_still_sends_a_summary() {
    let mail = FakeMail::with(vec![]);
    let board = FakeBoard::new();
    let notifier = Arc::new(RecordingNotifier::default());

    let counters = coordinator(
        mail,
        GOOD_REPLY,
        board,
        Arc::clone(&notifier),
        SpecialList::from_entries(Vec::<String>::new()),
    )
    .run_batch()
    .await
    .unwrap();

    assert_eq!(counters.total(), 0);
    assert_eq!(notifier.summaries.lock().unwrap().len(), 1);
}
