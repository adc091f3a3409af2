//! Accuracy engine: how much of the gold message the learner reproduced.
//!
//! The difficulty tier picks the strategy:
//! - easy: key-element matching
//! - medium: 0.6 key elements + 0.4 phrase overlap
//! - hard: word error rate against the full message

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::Difficulty;
use crate::normalize::match_tokens;
use crate::results::{bounded, AccuracyResult, ACCURACY_MAX};
use crate::structure::{detect_callsigns, INFRASTRUCTURE_NOUNS};
use crate::wer::{edit_distance, word_error_rate};

const ELEMENT_WEIGHT: f64 = 0.6;
const PHRASE_WEIGHT: f64 = 0.4;
/// Missing elements listed in the explanation before truncating.
const MISSING_SHOWN: usize = 5;

static ACTION_VERB: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(?:REQUEST|REQUESTING|CLEARED|CLEARANCE|PERMISSION|PROCEED|PROCEEDING|HOLD|HOLDING|TAXI|CROSS|CROSSING|ENTER|ENTERING|VACATE|VACATED|CONTINUE|STOP|WAIT|READY|DEPART|DEPARTING|ARRIVE|ARRIVED|RETURN|RETURNING|ROGER|WILCO|AFFIRM|NEGATIVE|APPROVED|STANDBY|REPORT|CONTACT|MONITOR|GIVE WAY|LINE UP)\b",
    )
    .expect("valid regex")
});

/// Optional qualifier, infrastructure noun, optional designator.
static LOCATION_PHRASE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"\b(?:([A-Z][A-Z-]*) )?({INFRASTRUCTURE_NOUNS})(?: ([0-9]+[A-Z]?))?\b"
    ))
    .expect("valid regex")
});

static NUMERIC_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(?:RUNWAY|TAXIWAY|STAND|GATE|BAY|PAD|SECTOR|ZONE|ROAD|HANGAR|POINT) [0-9]+[LRC]?\b|\b[0-9]+[LRC]?\b",
    )
    .expect("valid regex")
});

static URGENCY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(?:MAYDAY|PAN PAN|URGENT|EMERGENCY|PRIORITY|IMMEDIATE|IMMEDIATELY|CASUALTY|CASUALTIES)\b",
    )
    .expect("valid regex")
});

/// Words that never qualify a location noun.
const QUALIFIER_STOPWORDS: &[&str] = &[
    "AT", "TO", "OF", "VIA", "THE", "ON", "IN", "FROM", "NEAR", "INTO", "ONTO", "FOR", "AND",
    "BEHIND", "ABEAM", "SHORT",
];

/// Deduplicated key elements of `text`: callsigns, action verbs, location
/// phrases, numeric identifiers and urgency terms, in that order.
pub fn extract_key_elements(text: &str) -> Vec<String> {
    let joined = match_tokens(text).join(" ");
    let mut elements: Vec<String> = Vec::new();
    let push = |elements: &mut Vec<String>, element: String| {
        if !element.is_empty() && !elements.contains(&element) {
            elements.push(element);
        }
    };

    for detection in detect_callsigns(text, None) {
        push(&mut elements, detection.callsign);
    }
    for m in ACTION_VERB.find_iter(&joined) {
        push(&mut elements, m.as_str().to_string());
    }
    for caps in LOCATION_PHRASE.captures_iter(&joined) {
        let mut parts = Vec::with_capacity(3);
        if let Some(q) = caps.get(1) {
            if !QUALIFIER_STOPWORDS.contains(&q.as_str()) {
                parts.push(q.as_str());
            }
        }
        if let Some(noun) = caps.get(2) {
            parts.push(noun.as_str());
        }
        if let Some(designator) = caps.get(3) {
            parts.push(designator.as_str());
        }
        push(&mut elements, parts.join(" "));
    }
    // "ROAD 1" inside "SERVICE ROAD 1" or the "1" of "REDCROSS 1" is not a
    // separate element.
    for m in NUMERIC_ID.find_iter(&joined) {
        if !covered(&elements, m.as_str()) {
            push(&mut elements, m.as_str().to_string());
        }
    }
    for m in URGENCY.find_iter(&joined) {
        push(&mut elements, m.as_str().to_string());
    }
    elements
}

/// `true` if `candidate` is a word sequence inside an existing element.
fn covered(elements: &[String], candidate: &str) -> bool {
    elements.iter().any(|element| {
        let words: Vec<String> = element.split(' ').map(str::to_string).collect();
        contains_sequence(&words, candidate)
    })
}

/// `true` if `element` occurs in `tokens` as a contiguous word sequence.
fn contains_sequence(tokens: &[String], element: &str) -> bool {
    let needle: Vec<&str> = element.split(' ').collect();
    if needle.is_empty() || needle.len() > tokens.len() {
        return false;
    }
    tokens
        .windows(needle.len())
        .any(|w| w.iter().zip(&needle).all(|(a, b)| a == b))
}

struct ElementMatch {
    matched: Vec<String>,
    missing: Vec<String>,
    ratio: f64,
}

fn match_elements(transcript: &str, expected: &str) -> ElementMatch {
    let required = extract_key_elements(expected);
    let tokens = match_tokens(transcript);
    let (matched, missing): (Vec<String>, Vec<String>) = required
        .into_iter()
        .partition(|e| contains_sequence(&tokens, e));
    let denominator = (matched.len() + missing.len()).max(1);
    let ratio = matched.len() as f64 / denominator as f64;
    ElementMatch {
        matched,
        missing,
        ratio,
    }
}

fn ngrams(tokens: &[String], n: usize) -> Vec<String> {
    tokens.windows(n).map(|w| w.join(" ")).collect()
}

/// Fraction of the expected 2- and 3-word windows found in the transcript.
///
/// Returns 1.0 when the expected text is too short to form any window.
pub fn phrase_overlap(transcript: &str, expected: &str) -> f64 {
    let expected_tokens = match_tokens(expected);
    let transcript_tokens = match_tokens(transcript);

    let mut total = 0usize;
    let mut found = 0usize;
    for n in [2, 3] {
        let available: HashSet<String> = ngrams(&transcript_tokens, n).into_iter().collect();
        for phrase in ngrams(&expected_tokens, n) {
            total += 1;
            if available.contains(&phrase) {
                found += 1;
            }
        }
    }
    if total == 0 {
        1.0
    } else {
        found as f64 / total as f64
    }
}

fn missing_note(missing: &[String]) -> String {
    if missing.is_empty() {
        return String::new();
    }
    let shown = missing
        .iter()
        .take(MISSING_SHOWN)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    let more = missing.len().saturating_sub(MISSING_SHOWN);
    if more > 0 {
        format!(" Missing: {shown} (+{more} more).")
    } else {
        format!(" Missing: {shown}.")
    }
}

/// Score `transcript` against `expected` with the strategy for `difficulty`.
///
/// `wer_threshold` only annotates the hard-tier explanation.
pub fn evaluate(
    transcript: &str,
    expected: &str,
    difficulty: Difficulty,
    wer_threshold: Option<f64>,
) -> AccuracyResult {
    match difficulty {
        Difficulty::Easy => evaluate_elements(transcript, expected),
        Difficulty::Medium => evaluate_balanced(transcript, expected),
        Difficulty::Hard => evaluate_exact(transcript, expected, wer_threshold),
    }
}

fn evaluate_elements(transcript: &str, expected: &str) -> AccuracyResult {
    let m = match_elements(transcript, expected);
    let total = m.matched.len() + m.missing.len();
    let explanation = format!(
        "Matched {}/{} key elements.{}",
        m.matched.len(),
        total,
        missing_note(&m.missing)
    );
    AccuracyResult {
        score: bounded(ACCURACY_MAX as f64 * m.ratio, ACCURACY_MAX),
        matched_elements: m.matched,
        missing_elements: m.missing,
        wer_score: None,
        semantic_score: Some(m.ratio),
        explanation,
    }
}

fn evaluate_balanced(transcript: &str, expected: &str) -> AccuracyResult {
    let m = match_elements(transcript, expected);
    let overlap = phrase_overlap(transcript, expected);
    let combined = ELEMENT_WEIGHT * m.ratio + PHRASE_WEIGHT * overlap;
    let explanation = format!(
        "Key elements {:.0}%, phrase overlap {:.0}%.{}",
        m.ratio * 100.0,
        overlap * 100.0,
        missing_note(&m.missing)
    );
    AccuracyResult {
        score: bounded(ACCURACY_MAX as f64 * combined, ACCURACY_MAX),
        matched_elements: m.matched,
        missing_elements: m.missing,
        wer_score: None,
        semantic_score: Some(combined),
        explanation,
    }
}

fn evaluate_exact(transcript: &str, expected: &str, wer_threshold: Option<f64>) -> AccuracyResult {
    let hypothesis = match_tokens(transcript);
    let reference = match_tokens(expected);
    let wer = word_error_rate(&hypothesis, &reference);
    let edits = edit_distance(&hypothesis, &reference);
    let wer_pct = wer * 100.0;

    let mut explanation = format!(
        "Word error rate {wer_pct:.1}% ({edits} edit(s) over {} reference words).",
        reference.len()
    );
    if let Some(threshold) = wer_threshold {
        let verdict = if wer_pct <= threshold { "within" } else { "above" };
        explanation.push_str(&format!(" That is {verdict} the {threshold:.0}% threshold."));
    }

    // Element lists are informational in this tier.
    let m = match_elements(transcript, expected);
    explanation.push_str(&missing_note(&m.missing));

    AccuracyResult {
        score: bounded(ACCURACY_MAX as f64 * (1.0 - wer), ACCURACY_MAX),
        matched_elements: m.matched,
        missing_elements: m.missing,
        wer_score: Some(wer_pct),
        semantic_score: None,
        explanation,
    }
}
