//! Trait seam for narrative feedback.
//!
//! Scores are always computed locally. A `FeedbackGenerator` can turn a
//! finished score into prose for the learner; the session engine treats it
//! as optional and never lets its failure change a score.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::model::Difficulty;
use crate::results::CompositeResult;

/// Backend that writes coaching text for a scored transmission.
#[async_trait]
pub trait FeedbackGenerator: Send + Sync {
    /// Human-readable generator name (e.g. "template").
    fn name(&self) -> &str;

    /// Produce feedback for one scored drill.
    async fn generate(&self, request: &FeedbackRequest) -> anyhow::Result<FeedbackResponse>;
}

/// Everything a generator needs to explain a score.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRequest {
    pub transcript: String,
    pub expected: String,
    pub difficulty: Difficulty,
    /// The deterministic score being explained.
    pub result: CompositeResult,
}

/// Feedback text with its cost.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackResponse {
    pub narrative: String,
    #[serde(default)]
    pub token_usage: TokenUsage,
}

/// Token usage reported by generators backed by a language model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Offline generator that stitches the engines' explanations together.
#[derive(Debug, Clone, Default)]
pub struct TemplateFeedback;

#[async_trait]
impl FeedbackGenerator for TemplateFeedback {
    fn name(&self) -> &str {
        "template"
    }

    async fn generate(&self, request: &FeedbackRequest) -> anyhow::Result<FeedbackResponse> {
        let result = &request.result;
        let mut narrative = format!(
            "Scored {}/100 on a {} drill.\n",
            result.total, request.difficulty
        );
        narrative.push_str(&format!(
            "Structure {}/30: {}\n",
            result.structure.score, result.structure.explanation
        ));
        narrative.push_str(&format!(
            "Accuracy {}/50: {}\n",
            result.accuracy.score, result.accuracy.explanation
        ));
        narrative.push_str(&format!(
            "Fluency {}/20: {}",
            result.fluency.score, result.fluency.explanation
        ));
        Ok(FeedbackResponse {
            narrative,
            token_usage: TokenUsage::default(),
        })
    }
}
