//! Score aggregator: runs the three engines and sums their sub-scores.

use crate::model::{Difficulty, EvaluationRequest, ScoringContext, ScoringParameters};
use crate::results::CompositeResult;
use crate::{accuracy, fluency, structure};

/// Score one request.
pub fn evaluate(request: &EvaluationRequest) -> CompositeResult {
    evaluate_parts(
        &request.transcript,
        &request.expected,
        request.difficulty,
        &request.context,
        &request.parameters(),
    )
}

/// Score a transcript from its individual parts.
pub fn evaluate_parts(
    transcript: &str,
    expected: &str,
    difficulty: Difficulty,
    context: &ScoringContext,
    parameters: &ScoringParameters,
) -> CompositeResult {
    let structure = structure::evaluate(transcript, context);
    let accuracy = accuracy::evaluate(
        transcript,
        expected,
        difficulty,
        Some(parameters.wer_threshold),
    );
    let fluency = fluency::evaluate(transcript, parameters);
    let total = structure.score + accuracy.score + fluency.score;

    tracing::debug!(
        %difficulty,
        structure = structure.score,
        accuracy = accuracy.score,
        fluency = fluency.score,
        total,
        "scored transmission"
    );

    CompositeResult {
        structure,
        accuracy,
        fluency,
        total,
    }
}
