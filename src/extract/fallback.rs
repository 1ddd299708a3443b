//! Deterministic regex extraction — the degraded path when the AI backend
//! fails or returns unusable output.
//!
//! Pulls out only what fixed patterns can find and stamps a low confidence
//! so downstream review knows the record was not model-extracted.

use std::sync::LazyLock;

use chrono::{NaiveDate, Utc};
use regex::Regex;

use crate::deadline::{self, DeadlineUnit};
use crate::extract::record::{
    ExtractedRecord, FALLBACK_CONFIDENCE, IMPLICIT_DEADLINE_DAYS, UNIDENTIFIED_ACT,
};
use crate::segmenter::CNJ_PATTERN;

/// Provider identifier stamped on fallback records.
pub const FALLBACK_PROVIDER: &str = "regex-fallback";

static RE_CNJ: LazyLock<Regex> = LazyLock::new(|| Regex::new(CNJ_PATTERN).unwrap());
static RE_POLO_ATIVO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)POLO\s+ATIVO\s*:\s*([^\n]+)").unwrap());
static RE_PRAZO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"prazo\s+de\s+(\d+)\s+dias?").unwrap());

/// Act-type keywords in match-priority order — first hit wins.
const ACT_KEYWORDS: &[(&str, &str)] = &[
    ("sentença", "Sentença"),
    ("decisão", "Decisão"),
    ("despacho", "Despacho"),
    ("intimação", "Intimação"),
    ("citação", "Citação"),
    ("ato ordinatório", "Ato Ordinatório"),
];

/// Extract what regexes alone can find in a publication.
pub fn extract_basic(text: &str, publication_date: NaiveDate) -> ExtractedRecord {
    let lowered = text.to_lowercase();

    let process_number = RE_CNJ.find(text).map(|m| m.as_str().to_string());

    let client_name = RE_POLO_ATIVO
        .captures(text)
        .map(|caps| caps[1].trim().to_string());

    let act_type = ACT_KEYWORDS
        .iter()
        .find(|(keyword, _)| lowered.contains(keyword))
        .map(|(_, label)| label.to_string())
        .unwrap_or_else(|| UNIDENTIFIED_ACT.to_string());

    let (deadline_days, deadline_mentioned, deadline_is_implicit) =
        match RE_PRAZO.captures(&lowered).and_then(|c| c[1].parse().ok()) {
            Some(days) => (days, Some(format!("{days} dias")), false),
            None => (IMPLICIT_DEADLINE_DAYS, None, true),
        };

    let due_date = deadline::compute(deadline_days, DeadlineUnit::Business, publication_date);

    ExtractedRecord {
        process_number,
        client_name,
        act_type,
        court: None,
        court_division: None,
        deadline_mentioned,
        deadline_is_implicit,
        deadline_days,
        deadline_unit: DeadlineUnit::Business,
        summary_points: vec!["Verificar manualmente".to_string()],
        is_urgent: false,
        notes: Some("Extração via regex (fallback)".to_string()),
        confidence: FALLBACK_CONFIDENCE,
        publication_date,
        due_date,
        processed_at: Utc::now(),
        source_provider: FALLBACK_PROVIDER.to_string(),
    }
}
