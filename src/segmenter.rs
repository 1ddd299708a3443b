//! Splits one email body into individual publication texts.
//!
//! Court mail frequently bundles several publications in a single message.
//! Three strategies are tried in order, each only if the previous one
//! produced nothing:
//!
//! 1. `Publicação: N.` line markers (accent-insensitive, including the
//!    `publicagao` OCR artifact), validated by a CNJ number or a
//!    `PROCESSO` token inside the slice;
//! 2. splitting directly on CNJ case-number tokens;
//! 3. the whole body as one segment, when it is long enough and carries at
//!    least one CNJ number.
//!
//! The tier order is deliberate and must not be reordered: on pathological
//! input (a CNJ number before any marker, a marker without its trailing
//! period) the tiers disagree about boundaries, and the pipeline relies on
//! marker-first semantics, surfacing oddities through low extraction
//! confidence rather than guessing here.

use std::sync::LazyLock;

use regex::Regex;

use crate::text::fold_for_matching;

/// The standardized Brazilian case-number format: NNNNNNN-NN.NNNN.N.NN.NNNN.
pub const CNJ_PATTERN: &str = r"\d{7}-\d{2}\.\d{4}\.\d\.\d{2}\.\d{4}";

static RE_CNJ: LazyLock<Regex> = LazyLock::new(|| Regex::new(CNJ_PATTERN).unwrap());

/// Line-anchored `publicacao: N.` marker, matched against the accent-folded
/// copy of the body. The trailing period distinguishes the segment marker
/// from inline fields such as "Data de Publicação: 01/02/2024".
static RE_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*publica(?:cao|gao)\s*:\s*(\d+)\s*\.").unwrap());

/// `PROCESSO` followed by a number/identifier marker — accepts slices that
/// reference a case without a full CNJ number.
static RE_PROCESSO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)PROCESSO\s*[Nº°:\d]").unwrap());

/// Minimum slice length (chars) for the case-number fallback tier.
const MIN_SLICE_CHARS: usize = 50;

/// Minimum body length (chars) for the whole-message tier.
const MIN_BODY_CHARS: usize = 30;

/// One publication carved out of an email body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicationSegment {
    /// 1-based position within the parent message (the marker's own number
    /// when one was present).
    pub ordinal: u32,
    /// How many segments the parent message yielded.
    pub total_in_message: usize,
    pub text: String,
}

/// Split an email body into ordered publication segments.
///
/// Returns an empty vec only when no tier applies; the caller decides
/// whether to fall back to treating the whole message as one publication.
pub fn segment(body: &str) -> Vec<PublicationSegment> {
    if body.is_empty() {
        return Vec::new();
    }

    const TIERS: &[fn(&str) -> Vec<PublicationSegment>] =
        &[split_by_marker, split_by_case_number, whole_message];

    for tier in TIERS {
        let segments = tier(body);
        if !segments.is_empty() {
            return segments;
        }
    }
    Vec::new()
}

/// Tier 1: slice between `Publicação: N.` markers.
///
/// Marker positions are found on the accent-folded copy and mapped back to
/// byte offsets in the original text; the slices themselves always come
/// from the original, never the folded copy.
fn split_by_marker(body: &str) -> Vec<PublicationSegment> {
    let (folded, map) = fold_for_matching(body);

    let marks: Vec<(usize, u32)> = RE_MARKER
        .captures_iter(&folded)
        .filter_map(|caps| {
            let start = map[caps.get(0)?.start()];
            let ordinal: u32 = caps[1].parse().ok()?;
            Some((start, ordinal))
        })
        .collect();

    let mut segments = Vec::with_capacity(marks.len());
    for (i, &(start, ordinal)) in marks.iter().enumerate() {
        let end = marks.get(i + 1).map_or(body.len(), |&(s, _)| s);
        let block = body[start..end].trim_start_matches('\n').trim();

        // Guard against false positives such as a "Data de Publicação:"
        // field: a real publication references its case.
        if !block.is_empty() && (RE_CNJ.is_match(block) || RE_PROCESSO.is_match(block)) {
            segments.push(PublicationSegment {
                ordinal,
                total_in_message: 0,
                text: block.to_string(),
            });
        }
    }
    finish(segments)
}

/// Tier 2: slice between CNJ case-number occurrences.
fn split_by_case_number(body: &str) -> Vec<PublicationSegment> {
    let starts: Vec<usize> = RE_CNJ.find_iter(body).map(|m| m.start()).collect();

    let mut segments = Vec::with_capacity(starts.len());
    for (i, &start) in starts.iter().enumerate() {
        let end = starts.get(i + 1).copied().unwrap_or(body.len());
        let block = body[start..end].trim();

        if block.chars().count() > MIN_SLICE_CHARS {
            segments.push(PublicationSegment {
                ordinal: (segments.len() + 1) as u32,
                total_in_message: 0,
                text: block.to_string(),
            });
        }
    }
    finish(segments)
}

/// Tier 3: the whole body as a single segment.
fn whole_message(body: &str) -> Vec<PublicationSegment> {
    if body.chars().count() > MIN_BODY_CHARS && RE_CNJ.is_match(body) {
        vec![PublicationSegment {
            ordinal: 1,
            total_in_message: 1,
            text: body.to_string(),
        }]
    } else {
        Vec::new()
    }
}

fn finish(mut segments: Vec<PublicationSegment>) -> Vec<PublicationSegment> {
    let total = segments.len();
    for seg in &mut segments {
        seg.total_in_message = total;
    }
    segments
}
