//! Structure engine: callsign order, location and intent.
//!
//! Score = 10 (receiver first) + 10 (sender second) + 5 (location) + 5 (intent).

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::ScoringContext;
use crate::normalize::{compact_callsign, match_tokens, normalize};
use crate::results::{bounded, StructureResult, STRUCTURE_MAX};

/// Whether a callsign stem takes an instance number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Numbering {
    /// "SHEPHARD" or "REDCROSS 1".
    Optional,
    /// Only detected with a number: "UNIT 4".
    Required,
}

/// A known callsign stem, possibly several words long.
#[derive(Debug, Clone)]
pub struct CallsignPattern {
    pub stem: Cow<'static, str>,
    pub numbering: Numbering,
}

const fn pattern(stem: &'static str, numbering: Numbering) -> CallsignPattern {
    CallsignPattern {
        stem: Cow::Borrowed(stem),
        numbering,
    }
}

/// Callsign stems recognized in every transmission, in priority order.
pub static CALLSIGN_PATTERNS: &[CallsignPattern] = &[
    pattern("SHEPHARD", Numbering::Optional),
    pattern("REDCROSS", Numbering::Optional),
    pattern("MEDEVAC", Numbering::Optional),
    pattern("RESCUE", Numbering::Optional),
    pattern("GUARDIAN", Numbering::Optional),
    pattern("DISPATCH", Numbering::Optional),
    pattern("TOWER", Numbering::Optional),
    pattern("GROUND", Numbering::Optional),
    pattern("OPS", Numbering::Optional),
    pattern("UNIT", Numbering::Required),
    pattern("MOBILE", Numbering::Required),
    pattern("VEHICLE", Numbering::Required),
    pattern("AMBULANCE", Numbering::Required),
    pattern("TANKER", Numbering::Required),
    pattern("RECOVERY", Numbering::Required),
    pattern("SECURITY", Numbering::Required),
];

/// Prepositions that introduce a position.
static LOCATION_PREPOSITION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(?:AT|NEAR|VIA|ABEAM|BEHIND|OUTSIDE|INSIDE|APPROACHING|PASSING|ENTERING|LEAVING|VACATING|HOLDING AT)\s+[A-Z][A-Z0-9-]*",
    )
    .expect("valid regex")
});

/// Infrastructure nouns, as a regex alternation.
pub(crate) const INFRASTRUCTURE_NOUNS: &str = "BAY|AREA|ROAD|GATE|RUNWAY|TAXIWAY|APRON|HANGAR|STAND|PAD|HELIPAD|DECK|RAMP|JUNCTION|CHECKPOINT|SECTOR|ZONE|PERIMETER|DEPOT|YARD|WARD|ENTRANCE|HOLDING POINT";

static INFRASTRUCTURE_NOUN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"\b(?:{INFRASTRUCTURE_NOUNS})\b")).expect("valid regex")
});

/// Numbered designators such as "RUNWAY 27" or "09L".
static NUMERIC_DESIGNATOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(?:RUNWAY|TAXIWAY|STAND|GATE|BAY|PAD|SECTOR|ZONE|ROAD|HANGAR|POINT)\s+[0-9]+[A-Z]?\b|\b[0-9]{1,2}[LRC]\b",
    )
    .expect("valid regex")
});

/// A callsign found in a transmission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    /// Canonical text, e.g. "REDCROSS 1".
    pub callsign: String,
    /// Token range `start..end` the callsign occupies.
    pub span: (usize, usize),
}

/// Static table plus the stems of the context's own callsigns.
fn patterns_for(context: Option<&ScoringContext>) -> Vec<CallsignPattern> {
    let mut patterns: Vec<CallsignPattern> = CALLSIGN_PATTERNS.to_vec();
    if let Some(ctx) = context {
        for callsign in [&ctx.expected_receiver, &ctx.expected_sender] {
            let stem: Vec<String> = match_tokens(callsign)
                .into_iter()
                .take_while(|t| !t.chars().all(|c| c.is_ascii_digit()))
                .collect();
            if stem.is_empty() {
                continue;
            }
            let stem = stem.join(" ");
            if !patterns.iter().any(|p| p.stem == stem) {
                patterns.push(CallsignPattern {
                    stem: Cow::Owned(stem),
                    numbering: Numbering::Optional,
                });
            }
        }
    }
    patterns
}

struct Word<'a> {
    core: &'a str,
    /// A comma or period follows the word.
    separated: bool,
}

fn words(normalized: &str) -> Vec<Word<'_>> {
    normalized
        .split_whitespace()
        .map(|raw| {
            let core = raw.trim_matches(|c| c == ',' || c == '.');
            Word {
                core,
                separated: raw.ends_with(|c| c == ',' || c == '.'),
            }
        })
        .collect()
}

fn is_numeric(word: &str) -> bool {
    !word.is_empty() && word.chars().all(|c| c.is_ascii_digit())
}

/// Length of `stem` if it matches at `words[at..]` without separators inside.
fn stem_len(words: &[Word<'_>], at: usize, stem: &str) -> Option<usize> {
    let parts: Vec<&str> = stem.split(' ').collect();
    let candidate = words.get(at..at + parts.len())?;
    let matches = candidate.iter().zip(&parts).all(|(w, p)| w.core == *p)
        && candidate[..parts.len() - 1].iter().all(|w| !w.separated);
    matches.then_some(parts.len())
}

/// Detect callsigns in order of appearance.
///
/// At each position the longest matching stem wins. A number directly after
/// the stem is absorbed unless a separator intervenes.
pub fn detect_callsigns(text: &str, context: Option<&ScoringContext>) -> Vec<Detection> {
    let normalized = normalize(text);
    let words = words(&normalized);
    let patterns = patterns_for(context);

    let mut detections = Vec::new();
    let mut i = 0;
    while i < words.len() {
        let best = patterns
            .iter()
            .filter_map(|p| stem_len(&words, i, &p.stem).map(|len| (p, len)))
            .max_by_key(|(_, len)| *len);

        let Some((pattern, len)) = best else {
            i += 1;
            continue;
        };

        let last = &words[i + len - 1];
        let number = words
            .get(i + len)
            .filter(|w| !last.separated && is_numeric(w.core));

        match (number, pattern.numbering) {
            (Some(n), _) => {
                detections.push(Detection {
                    callsign: format!("{} {}", pattern.stem, n.core),
                    span: (i, i + len + 1),
                });
                i += len + 1;
            }
            (None, Numbering::Optional) => {
                detections.push(Detection {
                    callsign: pattern.stem.to_string(),
                    span: (i, i + len),
                });
                i += len;
            }
            (None, Numbering::Required) => i += 1,
        }
    }
    detections
}

/// `true` if any location indicator matches the normalized transcript.
pub fn has_location(text: &str) -> bool {
    let joined = match_tokens(text).join(" ");
    LOCATION_PREPOSITION.is_match(&joined)
        || INFRASTRUCTURE_NOUN.is_match(&joined)
        || NUMERIC_DESIGNATOR.is_match(&joined)
}

/// Score the structure of `transcript` against `context`.
pub fn evaluate(transcript: &str, context: &ScoringContext) -> StructureResult {
    let normalized = normalize(transcript);
    let words = words(&normalized);
    let detections = detect_callsigns(transcript, Some(context));

    let receiver = detections.first().map(|d| d.callsign.as_str());
    let sender = detections.get(1).map(|d| d.callsign.as_str());

    let receiver_correct = receiver
        .is_some_and(|r| compact_callsign(r) == compact_callsign(&context.expected_receiver));
    let sender_correct =
        sender.is_some_and(|s| compact_callsign(s) == compact_callsign(&context.expected_sender));

    let location_present = !context.requires_location || has_location(transcript);

    let residual = words
        .iter()
        .enumerate()
        .filter(|(idx, _)| !detections.iter().any(|d| (d.span.0..d.span.1).contains(idx)))
        .filter(|(_, w)| w.core.chars().count() > 2)
        .count();
    let intent_complete = residual >= 2;

    let raw = 10 * u32::from(receiver_correct)
        + 10 * u32::from(sender_correct)
        + 5 * u32::from(location_present)
        + 5 * u32::from(intent_complete);

    let mut notes = Vec::new();
    if !receiver_correct {
        notes.push(format!(
            "Receiver should come first as '{}'; heard {}.",
            context.expected_receiver,
            describe(receiver)
        ));
    }
    if !sender_correct {
        notes.push(format!(
            "Your callsign '{}' should follow the receiver; heard {}.",
            context.expected_sender,
            describe(sender)
        ));
    }
    if !location_present {
        notes.push("No position given; state where you are (e.g. 'at Medical Bay').".to_string());
    }
    if !intent_complete {
        notes.push("Intent is incomplete; say what you are requesting or reporting.".to_string());
    }
    let explanation = if notes.is_empty() {
        "Structure correct: receiver, sender, position and intent all present.".to_string()
    } else {
        notes.join(" ")
    };

    StructureResult {
        score: bounded(raw as f64, STRUCTURE_MAX),
        receiver_correct,
        sender_correct,
        location_present,
        intent_complete,
        detected_order: detections.into_iter().map(|d| d.callsign).collect(),
        explanation,
    }
}

fn describe(callsign: Option<&str>) -> String {
    callsign.map_or_else(|| "no callsign".to_string(), |c| format!("'{c}'"))
}
