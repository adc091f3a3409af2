//! Result types produced by the scoring engines.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Ceiling of the structure sub-score.
pub const STRUCTURE_MAX: u32 = 30;
/// Ceiling of the accuracy sub-score.
pub const ACCURACY_MAX: u32 = 50;
/// Ceiling of the fluency sub-score.
pub const FLUENCY_MAX: u32 = 20;

/// Round `value` and clamp it into `0..=max`. Non-finite values become 0.
pub fn bounded(value: f64, max: u32) -> u32 {
    if !value.is_finite() {
        return 0;
    }
    value.round().clamp(0.0, max as f64) as u32
}

/// Outcome of the structure engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureResult {
    /// 0..=30.
    pub score: u32,
    pub receiver_correct: bool,
    pub sender_correct: bool,
    pub location_present: bool,
    pub intent_complete: bool,
    /// Callsigns in the order they were spoken.
    pub detected_order: Vec<String>,
    pub explanation: String,
}

/// Outcome of the accuracy engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccuracyResult {
    /// 0..=50.
    pub score: u32,
    pub matched_elements: Vec<String>,
    pub missing_elements: Vec<String>,
    /// Word error rate as a percentage (hard tier only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wer_score: Option<f64>,
    /// Match ratio in 0..=1 (easy and medium tiers).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semantic_score: Option<f64>,
    pub explanation: String,
}

/// Qualitative fluency bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FluencyRating {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl FluencyRating {
    /// Bucket a final fluency score.
    pub fn from_score(score: u32) -> Self {
        match score {
            18.. => FluencyRating::Excellent,
            14..=17 => FluencyRating::Good,
            8..=13 => FluencyRating::Fair,
            _ => FluencyRating::Poor,
        }
    }
}

impl fmt::Display for FluencyRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FluencyRating::Excellent => write!(f, "excellent"),
            FluencyRating::Good => write!(f, "good"),
            FluencyRating::Fair => write!(f, "fair"),
            FluencyRating::Poor => write!(f, "poor"),
        }
    }
}

/// Outcome of the fluency engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FluencyResult {
    /// 0..=20.
    pub score: u32,
    pub fillers_detected: Vec<String>,
    pub filler_count: u32,
    pub corrections_detected: Vec<String>,
    pub correction_count: u32,
    pub pause_indicators: u32,
    pub fluency_rating: FluencyRating,
    pub explanation: String,
}

/// The full score breakdown for one transmission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeResult {
    pub structure: StructureResult,
    pub accuracy: AccuracyResult,
    pub fluency: FluencyResult,
    /// Sum of the three sub-scores, 0..=100.
    pub total: u32,
}
