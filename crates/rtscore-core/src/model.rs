//! Core data model types for rtscore.
//!
//! Requests arrive loosely typed at the boundary and are decoded once into
//! these structures. Everything here is transient: built per evaluation and
//! dropped afterwards.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::RequestError;

/// Difficulty tier of a prompt. Selects the accuracy strategy and the
/// default scoring parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// All tiers, in ascending order.
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    /// Parse a tier label. Unknown labels fall back to [`Difficulty::Medium`]
    /// instead of failing.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "easy" => Difficulty::Easy,
            "medium" => Difficulty::Medium,
            "hard" => Difficulty::Hard,
            other => {
                tracing::warn!("unrecognized difficulty '{other}', scoring as medium");
                Difficulty::Medium
            }
        }
    }
}

impl From<String> for Difficulty {
    fn from(label: String) -> Self {
        Difficulty::from_label(&label)
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Difficulty::Medium
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "easy"),
            Difficulty::Medium => write!(f, "medium"),
            Difficulty::Hard => write!(f, "hard"),
        }
    }
}

/// What a correctly structured transmission looks like for one prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringContext {
    /// Callsign that must be addressed first.
    #[serde(alias = "expected_receiver")]
    pub expected_receiver: String,
    /// Own callsign, which must follow the receiver.
    #[serde(alias = "expected_sender")]
    pub expected_sender: String,
    /// Whether the transmission must state a position.
    #[serde(default = "default_true", alias = "requires_location")]
    pub requires_location: bool,
}

fn default_true() -> bool {
    true
}

/// Caller-supplied tuning for one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringParameters {
    /// Word-error-rate percentage used for the pass/fail note in hard mode.
    #[serde(alias = "wer_threshold")]
    pub wer_threshold: f64,
    /// Points deducted per filler beyond the allowance.
    #[serde(alias = "filler_penalty")]
    pub filler_penalty: f64,
    /// Fillers tolerated before any deduction.
    #[serde(alias = "max_allowed_fillers")]
    pub max_allowed_fillers: u32,
    /// Pause tolerance in seconds. Carried for callers; the fluency formula
    /// does not read it.
    #[serde(alias = "pause_tolerance")]
    pub pause_tolerance: f64,
}

impl ScoringParameters {
    /// Built-in defaults for a tier.
    pub fn for_difficulty(difficulty: Difficulty) -> Self {
        match difficulty {
            Difficulty::Easy => Self {
                wer_threshold: 40.0,
                filler_penalty: 0.5,
                max_allowed_fillers: 3,
                pause_tolerance: 3.0,
            },
            Difficulty::Medium => Self {
                wer_threshold: 25.0,
                filler_penalty: 1.0,
                max_allowed_fillers: 2,
                pause_tolerance: 2.0,
            },
            Difficulty::Hard => Self {
                wer_threshold: 15.0,
                filler_penalty: 2.0,
                max_allowed_fillers: 0,
                pause_tolerance: 1.0,
            },
        }
    }

    /// Check numeric ranges.
    pub fn validate(&self) -> Result<(), RequestError> {
        if !(0.0..=100.0).contains(&self.wer_threshold) {
            return Err(RequestError::OutOfRange {
                field: "werThreshold",
                expected: "between 0 and 100",
                value: self.wer_threshold,
            });
        }
        if !self.filler_penalty.is_finite() || self.filler_penalty < 0.0 {
            return Err(RequestError::OutOfRange {
                field: "fillerPenalty",
                expected: "a finite number >= 0",
                value: self.filler_penalty,
            });
        }
        if !self.pause_tolerance.is_finite() || self.pause_tolerance < 0.0 {
            return Err(RequestError::OutOfRange {
                field: "pauseTolerance",
                expected: "a finite number of seconds >= 0",
                value: self.pause_tolerance,
            });
        }
        Ok(())
    }
}

impl Default for ScoringParameters {
    fn default() -> Self {
        Self::for_difficulty(Difficulty::Medium)
    }
}

/// One evaluation: a learner transcript against the gold message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationRequest {
    /// What the learner said, as transcribed.
    pub transcript: String,
    /// The known-correct message.
    pub expected: String,
    /// Tier selecting the accuracy strategy.
    #[serde(default)]
    pub difficulty: Difficulty,
    /// Expected structure.
    pub context: ScoringContext,
    /// Tuning; tier defaults apply when absent.
    #[serde(default)]
    pub parameters: Option<ScoringParameters>,
}

impl EvaluationRequest {
    /// Decode and validate a JSON payload in one step.
    pub fn from_json(payload: &str) -> Result<Self, RequestError> {
        let request: EvaluationRequest = serde_json::from_str(payload)?;
        request.validate()?;
        Ok(request)
    }

    /// Check the fields the type system cannot.
    pub fn validate(&self) -> Result<(), RequestError> {
        if self.expected.trim().is_empty() {
            return Err(RequestError::EmptyExpected);
        }
        if let Some(params) = &self.parameters {
            params.validate()?;
        }
        Ok(())
    }

    /// The parameters in effect: explicit ones, else the tier defaults.
    pub fn parameters(&self) -> ScoringParameters {
        self.parameters
            .unwrap_or_else(|| ScoringParameters::for_difficulty(self.difficulty))
    }
}

/// A single practice prompt in a drill set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrillCase {
    /// Unique identifier within the set.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Situation description shown to the learner.
    #[serde(default)]
    pub description: String,
    /// The gold-standard transmission.
    pub expected: String,
    /// The learner's transcribed attempt, when one has been recorded.
    #[serde(default)]
    pub transcript: Option<String>,
    /// Per-drill tier override.
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
    /// Expected structure.
    pub context: ScoringContext,
    /// Per-drill parameter override.
    #[serde(default)]
    pub parameters: Option<ScoringParameters>,
    /// Tags for filtering.
    #[serde(default)]
    pub tags: Vec<String>,
}

impl DrillCase {
    /// Build the evaluation request for this drill, if it has a transcript.
    pub fn to_request(
        &self,
        default_difficulty: Difficulty,
        fallback: impl Fn(Difficulty) -> ScoringParameters,
    ) -> Option<EvaluationRequest> {
        let transcript = self.transcript.clone()?;
        let difficulty = self.difficulty.unwrap_or(default_difficulty);
        Some(EvaluationRequest {
            transcript,
            expected: self.expected.clone(),
            difficulty,
            context: self.context.clone(),
            parameters: Some(self.parameters.unwrap_or_else(|| fallback(difficulty))),
        })
    }
}

/// A collection of drills.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrillSet {
    /// Unique identifier for this drill set.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Description of the scenario the drills belong to.
    #[serde(default)]
    pub description: String,
    /// The drills in this set.
    #[serde(default)]
    pub drills: Vec<DrillCase>,
    /// Tier for drills that don't specify one.
    #[serde(default)]
    pub default_difficulty: Difficulty,
}
