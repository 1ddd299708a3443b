//! Structured result of processing one publication segment.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::deadline::DeadlineUnit;

/// Statutory default when a publication names no explicit deadline
/// (general civil-procedure rule, CPC art. 231).
pub const IMPLICIT_DEADLINE_DAYS: u32 = 5;

/// Confidence stamped on regex-fallback records — deliberately low so
/// downstream review knows the extraction was degraded.
pub const FALLBACK_CONFIDENCE: f32 = 0.3;

/// Act type when no keyword matched.
pub const UNIDENTIFIED_ACT: &str = "Ato não identificado";

/// Everything the pipeline knows about one publication.
///
/// Field values that end up on cards and notifications keep the Portuguese
/// conventions of the court domain (act types, review notes); the struct
/// itself is the machine-facing contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedRecord {
    /// CNJ-format case number, when one was found.
    pub process_number: Option<String>,
    /// Principal party (POLO ATIVO is conventionally our client).
    pub client_name: Option<String>,
    pub act_type: String,
    pub court: Option<String>,
    pub court_division: Option<String>,
    /// Deadline wording as it appeared in the text (e.g. "15 dias").
    pub deadline_mentioned: Option<String>,
    /// True when no explicit deadline was stated and the statutory default
    /// applies. Implies `deadline_days == 5` and business-day counting.
    pub deadline_is_implicit: bool,
    pub deadline_days: u32,
    pub deadline_unit: DeadlineUnit,
    pub summary_points: Vec<String>,
    pub is_urgent: bool,
    pub notes: Option<String>,
    /// Extraction quality, 0.0–1.0.
    pub confidence: f32,
    pub publication_date: NaiveDate,
    /// The Prazo Fatal. `None` only when the calculator degraded on
    /// unrepresentable date arithmetic.
    pub due_date: Option<NaiveDate>,
    pub processed_at: DateTime<Utc>,
    /// Which extraction path produced this record (backend name or
    /// the regex fallback identifier).
    pub source_provider: String,
}

impl ExtractedRecord {
    /// Re-assert the implicit-deadline invariant, whatever the model said.
    pub fn enforce_implicit_default(&mut self) {
        if self.deadline_is_implicit {
            self.deadline_days = IMPLICIT_DEADLINE_DAYS;
            self.deadline_unit = DeadlineUnit::Business;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn implicit_invariant_overrides_model_output() {
        let mut record = ExtractedRecord {
            process_number: None,
            client_name: None,
            act_type: UNIDENTIFIED_ACT.to_string(),
            court: None,
            court_division: None,
            deadline_mentioned: None,
            deadline_is_implicit: true,
            deadline_days: 15,
            deadline_unit: DeadlineUnit::Calendar,
            summary_points: vec![],
            is_urgent: false,
            notes: None,
            confidence: 0.9,
            publication_date: NaiveDate::from_ymd_opt(2024, 6, 7).unwrap(),
            due_date: None,
            processed_at: Utc::now(),
            source_provider: "test".into(),
        };
        record.enforce_implicit_default();
        assert_eq!(record.deadline_days, IMPLICIT_DEADLINE_DAYS);
        assert_eq!(record.deadline_unit, DeadlineUnit::Business);
    }
}
