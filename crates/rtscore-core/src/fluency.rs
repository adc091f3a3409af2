//! Fluency engine: fillers, self-corrections and pauses.
//!
//! Works on case-folded raw text. Fillers depend on surface form ("um,"
//! versus "UM"), so the full normalizer is not applied here.
//!
//! score = 20 - excess_fillers * filler_penalty - corrections - 0.5 * pauses

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::ScoringParameters;
use crate::normalize::number_word_value;
use crate::results::{bounded, FluencyRating, FluencyResult, FLUENCY_MAX};

const CORRECTION_PENALTY: f64 = 1.0;
const PAUSE_PENALTY: f64 = 0.5;

/// Procedure words that are spoken repeated.
const REPEATED_PROWORDS: &[&str] = &["pan", "mayday", "securite"];

static INTERJECTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:u+m+|u+h+|e+r+m*|a+h+|hmm+|mm+)\b").expect("valid regex"));

/// Matches a whole word that is an interjection.
static INTERJECTION_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:u+m+|u+h+|e+r+m*|a+h+|hmm+|mm+)$").expect("valid regex"));

static FILLER_PHRASE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:you know|kind of|sort of|i mean|i guess|you see|let me see|let me think)\b")
        .expect("valid regex")
});

/// Words that are fillers only in discourse position.
static DISCOURSE_WORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:like|so|well|basically|actually|literally)\b").expect("valid regex")
});

static CORRECTION_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:correction|i mean|no wait|sorry|rather|scratch that)\b")
        .expect("valid regex")
});

static PAUSE_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\.{3,}|…+|[\[(<]\s*(?:long pause|pause|silence|breath|hesitation|\.\.\.)\s*[\])>]|[-–]{2,}|—+",
    )
    .expect("valid regex")
});

static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\p{L}\p{N}']+").expect("valid regex"));

/// A discourse word counts as a filler when punctuation or an interjection
/// follows it.
fn discourse_filler(text: &str, end: usize) -> bool {
    let rest = text[end..].trim_start();
    match rest.chars().next() {
        None => false,
        Some(c) if matches!(c, ',' | '.' | ';' | '!' | '?' | '…') => true,
        Some(_) => WORD
            .find(rest)
            .filter(|m| m.start() == 0)
            .is_some_and(|m| INTERJECTION_WORD.is_match(m.as_str())),
    }
}

/// Filler words and phrases in order of appearance.
pub fn detect_fillers(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let mut found: Vec<(usize, String)> = Vec::new();

    for m in INTERJECTION.find_iter(&lowered) {
        found.push((m.start(), m.as_str().to_string()));
    }
    for m in FILLER_PHRASE.find_iter(&lowered) {
        found.push((m.start(), m.as_str().to_string()));
    }
    for m in DISCOURSE_WORD.find_iter(&lowered) {
        if discourse_filler(&lowered, m.end()) {
            found.push((m.start(), m.as_str().to_string()));
        }
    }

    found.sort_by_key(|(start, _)| *start);
    found.into_iter().map(|(_, s)| s).collect()
}

fn is_number(word: &str) -> bool {
    word.chars().all(|c| c.is_ascii_digit()) || number_word_value(word).is_some()
}

/// Correction markers, immediate repetitions and truncated fragments.
pub fn detect_corrections(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let mut found: Vec<(usize, String)> = Vec::new();

    for m in CORRECTION_MARKER.find_iter(&lowered) {
        found.push((m.start(), m.as_str().to_string()));
    }

    // Spoken digits ("two two") and prowords ("pan pan") repeat legitimately.
    let words: Vec<_> = WORD.find_iter(&lowered).collect();
    for pair in words.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let between = &lowered[a.end()..b.start()];
        if a.as_str() == b.as_str()
            && between.chars().all(char::is_whitespace)
            && !is_number(a.as_str())
            && !REPEATED_PROWORDS.contains(&a.as_str())
            && !INTERJECTION_WORD.is_match(a.as_str())
        {
            found.push((a.start(), format!("{} {}", a.as_str(), b.as_str())));
        }
    }

    let mut offset = 0;
    for raw in lowered.split_whitespace() {
        let start = lowered[offset..].find(raw).map_or(offset, |i| offset + i);
        offset = start + raw.len();
        if let Some(stem) = raw.strip_suffix('-') {
            if !stem.is_empty() && stem.chars().all(char::is_alphabetic) {
                found.push((start, raw.to_string()));
            }
        }
    }

    found.sort_by_key(|(start, _)| *start);
    found.into_iter().map(|(_, s)| s).collect()
}

/// Ellipses, bracketed pause markers and dash runs.
pub fn detect_pauses(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    PAUSE_MARKER
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Score the fluency of `transcript`.
///
/// `parameters.pause_tolerance` is not consulted.
pub fn evaluate(transcript: &str, parameters: &ScoringParameters) -> FluencyResult {
    let fillers = detect_fillers(transcript);
    let corrections = detect_corrections(transcript);
    let pauses = detect_pauses(transcript);

    let filler_count = fillers.len() as u32;
    let correction_count = corrections.len() as u32;
    let pause_count = pauses.len() as u32;

    let penalty = if parameters.filler_penalty.is_finite() {
        parameters.filler_penalty.max(0.0)
    } else {
        0.0
    };
    let excess = filler_count.saturating_sub(parameters.max_allowed_fillers);
    let raw = FLUENCY_MAX as f64
        - excess as f64 * penalty
        - correction_count as f64 * CORRECTION_PENALTY
        - pause_count as f64 * PAUSE_PENALTY;
    let score = bounded(raw.max(0.0), FLUENCY_MAX);
    let rating = FluencyRating::from_score(score);

    let explanation = if filler_count + correction_count + pause_count == 0 {
        "Smooth delivery with no disfluencies detected.".to_string()
    } else {
        let mut parts = Vec::new();
        if filler_count > 0 {
            parts.push(format!(
                "{filler_count} filler(s) ({}), {} allowed",
                fillers.join(", "),
                parameters.max_allowed_fillers
            ));
        }
        if correction_count > 0 {
            parts.push(format!("{correction_count} self-correction(s)"));
        }
        if pause_count > 0 {
            parts.push(format!("{pause_count} pause(s)"));
        }
        format!("{}. Fluency is {rating}.", parts.join("; "))
    };

    FluencyResult {
        score,
        fillers_detected: fillers,
        filler_count,
        corrections_detected: corrections,
        correction_count,
        pause_indicators: pause_count,
        fluency_rating: rating,
        explanation,
    }
}
