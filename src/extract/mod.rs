//! Extraction orchestrator — prompt, model call, parse, fallback.
//!
//! `extract()` never fails: any backend error, empty response or
//! unparseable output degrades to the deterministic regex fallback, which
//! always produces a record (at confidence 0.3). The pipeline can count on
//! getting one `ExtractedRecord` per segment, no exceptions crossing this
//! boundary.

pub mod fallback;
pub mod prompt;
pub mod record;

pub use fallback::FALLBACK_PROVIDER;
pub use record::ExtractedRecord;

use std::sync::Arc;
use std::sync::LazyLock;

use chrono::{Local, NaiveDate, Utc};
use regex::Regex;
use serde::{Deserialize, Deserializer};
use tracing::{debug, warn};

use crate::deadline::{self, DeadlineUnit};
use crate::error::LlmError;
use crate::llm::AiProvider;

/// Models have bounded context; truncation favors the head of the text,
/// where publication metadata conventionally appears.
const MAX_PROMPT_CHARS: usize = 8000;

/// "Data de Publicação: DD/MM/YYYY" — the conventional field.
static RE_PUB_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)data\s+de\s+publica[çc][aã]o\s*:\s*(\d{1,2})[/\-](\d{1,2})[/\-](\d{4})")
        .unwrap()
});

/// Looser phrasing: "Publicação ... DD/MM/YYYY".
static RE_PUB_DATE_LOOSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)publica[çc][aã]o[^0-9]*(\d{1,2})[/\-](\d{1,2})[/\-](\d{4})").unwrap()
});

/// Runs a segment through the AI backend and assembles the record,
/// degrading to regex extraction on any failure.
pub struct ExtractionOrchestrator {
    provider: Arc<dyn AiProvider>,
}

impl ExtractionOrchestrator {
    pub fn new(provider: Arc<dyn AiProvider>) -> Self {
        Self { provider }
    }

    /// Which backend this orchestrator generates with.
    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Extract a structured record from one publication segment.
    pub async fn extract(&self, segment_text: &str) -> ExtractedRecord {
        let publication_date =
            find_publication_date(segment_text).unwrap_or_else(|| Local::now().date_naive());

        let truncated = truncate_chars(segment_text, MAX_PROMPT_CHARS);
        let prompt = prompt::build_prompt(truncated, publication_date);

        match self.try_model(&prompt).await {
            Ok(reply) => {
                debug!(provider = self.provider.name(), "Model extraction succeeded");
                assemble(reply, publication_date, self.provider.name())
            }
            Err(e) => {
                warn!(
                    provider = self.provider.name(),
                    error = %e,
                    "Model extraction unusable, degrading to regex fallback"
                );
                fallback::extract_basic(segment_text, publication_date)
            }
        }
    }

    async fn try_model(&self, prompt: &str) -> Result<LlmReply, LlmError> {
        let raw = self.provider.generate(prompt).await?;
        if raw.trim().is_empty() {
            return Err(LlmError::EmptyResponse {
                provider: self.provider.name().to_string(),
            });
        }
        parse_reply(&raw).ok_or_else(|| LlmError::InvalidResponse {
            provider: self.provider.name().to_string(),
            reason: "no parseable JSON object in response".into(),
        })
    }
}

// ── Model reply parsing ─────────────────────────────────────────────

/// The model's output contract. Keys are the Portuguese ones the prompt
/// demands; struct fields carry the crate's English vocabulary.
#[derive(Debug, Deserialize)]
struct LlmReply {
    #[serde(rename = "numero_processo", default)]
    process_number: Option<String>,
    #[serde(rename = "cliente", default)]
    client_name: Option<String>,
    #[serde(rename = "tipo_ato", default)]
    act_type: Option<String>,
    #[serde(rename = "tribunal", default)]
    court: Option<String>,
    #[serde(rename = "vara", default)]
    court_division: Option<String>,
    #[serde(rename = "prazo_mencionado", default)]
    deadline_mentioned: Option<String>,
    #[serde(rename = "prazo_implicito", default)]
    deadline_is_implicit: bool,
    #[serde(rename = "prazo_dias", default, deserialize_with = "lenient_u32")]
    deadline_days: Option<u32>,
    #[serde(rename = "prazo_tipo", default)]
    deadline_unit: Option<String>,
    #[serde(rename = "resumo_topicos", default)]
    summary_points: Vec<String>,
    #[serde(rename = "urgente", default)]
    is_urgent: bool,
    #[serde(rename = "observacoes", default)]
    notes: Option<String>,
    #[serde(rename = "confianca", default)]
    confidence: Option<f32>,
}

/// Accept `15`, `"15"` or null — models are sloppy about number types.
fn lenient_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        serde_json::Value::Number(n) => n.as_u64().map(|n| n as u32),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }))
}

/// Recover a JSON object from model output.
///
/// Tried in order: strip code-fence markers, the outermost `{…}` span,
/// the whole response verbatim. First successful parse wins.
fn parse_reply(raw: &str) -> Option<LlmReply> {
    let cleaned = raw.replace("```json", "").replace("```", "");
    let cleaned = cleaned.trim();

    if let (Some(start), Some(end)) = (cleaned.find('{'), cleaned.rfind('}'))
        && end > start
        && let Ok(reply) = serde_json::from_str(&cleaned[start..=end])
    {
        return Some(reply);
    }

    serde_json::from_str(cleaned).ok()
}

/// Build the final record from a parsed model reply.
fn assemble(reply: LlmReply, publication_date: NaiveDate, provider: &str) -> ExtractedRecord {
    let deadline_is_implicit = reply.deadline_is_implicit || reply.deadline_days.is_none();
    let deadline_days = reply.deadline_days.unwrap_or(record::IMPLICIT_DEADLINE_DAYS);
    let deadline_unit = reply
        .deadline_unit
        .as_deref()
        .map(DeadlineUnit::parse_lenient)
        .unwrap_or(DeadlineUnit::Business);

    let act_type = reply
        .act_type
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| record::UNIDENTIFIED_ACT.to_string());

    let mut record = ExtractedRecord {
        process_number: reply.process_number,
        client_name: reply.client_name,
        act_type,
        court: reply.court,
        court_division: reply.court_division,
        deadline_mentioned: reply.deadline_mentioned,
        deadline_is_implicit,
        deadline_days,
        deadline_unit,
        summary_points: reply.summary_points,
        is_urgent: reply.is_urgent,
        notes: reply.notes,
        confidence: reply.confidence.unwrap_or(0.5).clamp(0.0, 1.0),
        publication_date,
        due_date: None,
        processed_at: Utc::now(),
        source_provider: provider.to_string(),
    };
    record.enforce_implicit_default();
    record.due_date = deadline::compute(
        record.deadline_days,
        record.deadline_unit,
        publication_date,
    );
    record
}

// ── Publication date ────────────────────────────────────────────────

/// Find the publication date field in the segment text.
pub fn find_publication_date(text: &str) -> Option<NaiveDate> {
    for re in [&*RE_PUB_DATE, &*RE_PUB_DATE_LOOSE] {
        if let Some(caps) = re.captures(text) {
            let (day, month, year) = (
                caps[1].parse().ok()?,
                caps[2].parse().ok()?,
                caps[3].parse().ok()?,
            );
            if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
                return Some(date);
            }
            // Nonsense date in the strict field: keep trying the loose one.
        }
    }
    None
}

/// Head-truncate to at most `max` characters on a char boundary.
fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
