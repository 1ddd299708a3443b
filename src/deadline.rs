//! Prazo Fatal computation under Brazilian civil-procedure rules.
//!
//! The count starts the day after publication; a weekend start advances to
//! the next weekday before counting begins. Business-day deadlines skip
//! Saturday/Sunday. Holidays are intentionally not modeled — the computed
//! date is a review aid, and legal staff validate it against the local
//! forensic calendar.

use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// Whether a deadline counts business days or calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeadlineUnit {
    /// Dias úteis — Monday through Friday.
    Business,
    /// Dias corridos.
    Calendar,
}

impl DeadlineUnit {
    /// Interpret the unit wording coming back from the model.
    ///
    /// Court texts and the extraction prompt say "úteis" / "corridos";
    /// anything not explicitly calendar defaults to business days, the
    /// statutory-safe reading.
    pub fn parse_lenient(raw: &str) -> Self {
        let folded = raw.to_lowercase();
        if folded.contains("corrido") || folded.contains("calendar") {
            Self::Calendar
        } else {
            Self::Business
        }
    }
}

use DeadlineUnit::{Business, Calendar};

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Compute the due date for a deadline of `days` (`unit`) counted from
/// `publication_date`.
///
/// Never panics or propagates an error: on date-arithmetic failure the
/// result is `None` and the caller treats the due date as unresolved.
pub fn compute(days: u32, unit: DeadlineUnit, publication_date: NaiveDate) -> Option<NaiveDate> {
    // Count starts the day after publication, advanced past the weekend.
    let mut start = publication_date.checked_add_days(Days::new(1))?;
    while is_weekend(start) {
        start = start.checked_add_days(Days::new(1))?;
    }

    match unit {
        Calendar if days > 0 => start.checked_add_days(Days::new(u64::from(days) - 1)),
        Calendar => Some(start),
        Business => {
            // The start weekday counts as day 1.
            let mut date = start;
            let mut counted = 1;
            while counted < days {
                date = date.checked_add_days(Days::new(1))?;
                if !is_weekend(date) {
                    counted += 1;
                }
            }
            Some(date)
        }
    }
}
