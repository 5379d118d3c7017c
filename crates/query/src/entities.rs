//! Numeric entity extraction.
//!
//! Three passes in priority order: currency, percentage, then generic number.
//! A span captured by an earlier pass is excluded from later passes, and the
//! generic pass additionally collapses duplicate raw text to one entry.
//!
//! Extraction runs over the lower-cased raw query (not the normalized form)
//! so currency and percent symbols are still visible.

use crate::types::{NumberKind, NumericEntity};
use once_cell::sync::Lazy;
use regex::Regex;

static CURRENCY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\s*(\d+(?:,\d{3})*(?:\.\d+)?)").expect("valid currency pattern"));

static PERCENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+(?:\.\d+)?)\s*%").expect("valid percent pattern"));

static NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d+(?:,\d{3})*(?:\.\d+)?)\b").expect("valid number pattern"));

/// Characters of context captured on each side of a match.
const CONTEXT_CHARS: usize = 20;

/// Extract currency, percentage, and plain-number entities from text.
pub fn extract_numbers(text: &str) -> Vec<NumericEntity> {
    let mut entities: Vec<NumericEntity> = Vec::new();
    let mut captured_spans: Vec<(usize, usize)> = Vec::new();

    // Pass 1: dollar amounts
    for m in CURRENCY_RE.captures_iter(text) {
        let full = m.get(0).expect("match group 0 always present");
        let digits = m.get(1).expect("currency pattern has one group");

        entities.push(NumericEntity {
            value: parse_value(digits.as_str()),
            kind: NumberKind::Currency,
            raw_text: full.as_str().to_string(),
            context: surrounding_context(text, full.start(), full.end()),
        });
        captured_spans.push((full.start(), full.end()));
    }

    // Pass 2: percentages
    for m in PERCENT_RE.captures_iter(text) {
        let full = m.get(0).expect("match group 0 always present");
        if overlaps_any(&captured_spans, full.start(), full.end()) {
            continue;
        }
        let digits = m.get(1).expect("percent pattern has one group");

        entities.push(NumericEntity {
            value: parse_value(digits.as_str()),
            kind: NumberKind::Percentage,
            raw_text: full.as_str().to_string(),
            context: surrounding_context(text, full.start(), full.end()),
        });
        captured_spans.push((full.start(), full.end()));
    }

    // Pass 3: everything else that looks like a number
    for m in NUMBER_RE.captures_iter(text) {
        let full = m.get(0).expect("match group 0 always present");
        if overlaps_any(&captured_spans, full.start(), full.end()) {
            continue;
        }
        // Exact raw-text dedup only; two distinct spans with the same text
        // collapse to one entry, but "$100" and a standalone "100" both stay.
        if entities.iter().any(|e| e.raw_text == full.as_str()) {
            continue;
        }

        entities.push(NumericEntity {
            value: parse_value(full.as_str()),
            kind: NumberKind::Number,
            raw_text: full.as_str().to_string(),
            context: surrounding_context(text, full.start(), full.end()),
        });
    }

    entities
}

/// Parse a matched numeric string, dropping thousands separators.
fn parse_value(digits: &str) -> f64 {
    digits.replace(',', "").parse().unwrap_or(0.0)
}

/// Whether [start, end) overlaps any captured span.
fn overlaps_any(spans: &[(usize, usize)], start: usize, end: usize) -> bool {
    spans.iter().any(|&(s, e)| start < e && s < end)
}

/// Up to `CONTEXT_CHARS` characters on each side of the match, char-boundary safe.
fn surrounding_context(text: &str, start: usize, end: usize) -> String {
    let ctx_start = text[..start]
        .char_indices()
        .rev()
        .take(CONTEXT_CHARS)
        .last()
        .map(|(i, _)| i)
        .unwrap_or(start);

    let ctx_end = text[end..]
        .char_indices()
        .take(CONTEXT_CHARS)
        .last()
        .map(|(i, c)| end + i + c.len_utf8())
        .unwrap_or(end)
        .min(text.len());

    text[ctx_start..ctx_end].to_string()
}
