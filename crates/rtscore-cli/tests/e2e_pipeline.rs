//! End-to-end tests: drill-set files through the session engine.

use std::path::Path;
use std::sync::Arc;

use rtscore_core::config::RtscoreConfig;
use rtscore_core::engine::{DrillEngine, DrillEngineConfig, NoopReporter};
use rtscore_core::model::{Difficulty, EvaluationRequest, ScoringParameters};
use rtscore_core::normalize::normalize;
use rtscore_core::parser::{parse_drill_set, validate_drill_set};
use rtscore_core::scoring::evaluate;
use rtscore_core::traits::TemplateFeedback;

fn ground_ops() -> rtscore_core::model::DrillSet {
    parse_drill_set(Path::new("../../drill-sets/ground-ops.toml")).unwrap()
}

#[tokio::test]
async fn ground_ops_session() {
    let set = ground_ops();
    assert!(validate_drill_set(&set).is_empty());

    let config = RtscoreConfig::default();
    let engine = DrillEngine::new(
        DrillEngineConfig::from(&config),
        Some(Arc::new(TemplateFeedback)),
    );
    let report = engine
        .run(&set, |d| config.parameters_for(d), &NoopReporter)
        .await
        .unwrap();

    assert_eq!(report.results.len(), 5);
    let by_id = |id: &str| report.results.iter().find(|r| r.drill_id == id).unwrap();

    let perfect = by_id("fuel-run");
    assert_eq!(perfect.difficulty, Difficulty::Hard);
    assert_eq!(perfect.result.total, 100);
    assert_eq!(perfect.result.accuracy.wer_score, Some(0.0));

    // Aliases and spoken numbers still earn full structure. Two fillers are
    // within the medium allowance and a single pause costs half a point.
    let hesitant = by_id("fuel-run-hesitant");
    assert_eq!(hesitant.difficulty, Difficulty::Medium);
    assert_eq!(hesitant.result.structure.score, 30);
    assert_eq!(hesitant.result.fluency.filler_count, 2);
    assert_eq!(hesitant.result.fluency.pause_indicators, 1);
    assert_eq!(
        hesitant.result.fluency.fluency_rating,
        rtscore_core::results::FluencyRating::Excellent
    );

    let runway = by_id("runway-crossing");
    assert!(runway
        .result
        .accuracy
        .missing_elements
        .contains(&"RUNWAY 27".to_string()));
    assert!(runway.result.accuracy.score < 50);

    let correction = by_id("casualty-pickup");
    assert_eq!(correction.result.fluency.correction_count, 1);

    let swapped = by_id("return-to-base");
    assert!(!swapped.result.structure.receiver_correct);
    assert!(!swapped.result.structure.sender_correct);

    assert!(report.results.iter().all(|r| r.feedback.is_some()));
    assert_eq!(report.stats.overall.count, 5);
    assert_eq!(report.stats.overall.max_total, 100);
}

#[test]
fn structure_ignores_case_and_padding() {
    let set = ground_ops();
    let drill = &set.drills[0];
    let expected = drill.expected.clone();
    let variants = [
        expected.to_lowercase(),
        expected.to_uppercase(),
        expected.replace(' ', "   "),
        expected.replace(", ", ","),
    ];

    let score = |transcript: &str| {
        evaluate(&EvaluationRequest {
            transcript: transcript.into(),
            expected: expected.clone(),
            difficulty: Difficulty::Hard,
            context: drill.context.clone(),
            parameters: Some(ScoringParameters::default()),
        })
    };
    let baseline = score(&expected);
    for variant in &variants {
        let result = score(variant);
        assert_eq!(result.structure, baseline.structure, "{variant}");
        assert_eq!(result.accuracy.score, 50, "{variant}");
    }
}

#[test]
fn normalization_is_idempotent_on_drill_text() {
    for set in [
        ground_ops(),
        parse_drill_set(Path::new("../../drill-sets/emergency.toml")).unwrap(),
    ] {
        for drill in &set.drills {
            for text in [Some(&drill.expected), drill.transcript.as_ref()]
                .into_iter()
                .flatten()
            {
                let once = normalize(text);
                assert_eq!(normalize(&once), once, "{text}");
            }
        }
    }
}

#[test]
fn self_match_is_perfect_in_every_tier() {
    let set = ground_ops();
    for drill in &set.drills {
        for difficulty in Difficulty::ALL {
            let result = evaluate(&EvaluationRequest {
                transcript: drill.expected.clone(),
                expected: drill.expected.clone(),
                difficulty,
                context: drill.context.clone(),
                parameters: None,
            });
            assert_eq!(result.accuracy.score, 50, "{} at {difficulty}", drill.id);
            if difficulty == Difficulty::Hard {
                assert_eq!(result.accuracy.wer_score, Some(0.0));
            }
        }
    }
}
