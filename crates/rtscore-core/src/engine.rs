//! Drill-session orchestrator.
//!
//! Scores every drill of a set with bounded parallelism and, when a feedback
//! generator is configured, asks it for narrative feedback with timeout and
//! retries. Feedback failures are recorded on the drill and never change its
//! score.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use futures::stream::{FuturesUnordered, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use uuid::Uuid;

use crate::config::RtscoreConfig;
use crate::error::FeedbackError;
use crate::model::{Difficulty, DrillSet, ScoringParameters};
use crate::report::{DrillSetSummary, SessionReport};
use crate::results::CompositeResult;
use crate::scoring;
use crate::statistics::compute_session_stats;
use crate::traits::{FeedbackGenerator, FeedbackRequest, FeedbackResponse};

/// Configuration for the drill engine.
#[derive(Debug, Clone)]
pub struct DrillEngineConfig {
    /// Maximum concurrent drills.
    pub parallelism: usize,
    /// Limit for one feedback call.
    pub feedback_timeout: Duration,
    /// Retries on transient feedback errors.
    pub max_feedback_retries: u32,
    /// Delay before the first retry; doubles on each further attempt.
    pub retry_delay: Duration,
    /// Label stored on the report.
    pub trainee: Option<String>,
}

impl Default for DrillEngineConfig {
    fn default() -> Self {
        Self::from(&RtscoreConfig::default())
    }
}

impl From<&RtscoreConfig> for DrillEngineConfig {
    fn from(config: &RtscoreConfig) -> Self {
        Self {
            parallelism: config.parallelism.max(1),
            feedback_timeout: Duration::from_secs(config.feedback_timeout_secs),
            max_feedback_retries: config.max_feedback_retries,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
            trainee: config.trainee.clone(),
        }
    }
}

/// Outcome of one drill in a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrillResult {
    pub drill_id: String,
    pub name: String,
    /// Tier the drill was scored at.
    pub difficulty: Difficulty,
    pub transcript: String,
    pub result: CompositeResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<FeedbackResponse>,
    /// Why feedback is missing, if the generator failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback_error: Option<String>,
}

/// Progress reporting trait.
pub trait ProgressReporter: Send + Sync {
    fn on_drill_start(&self, drill_id: &str);
    fn on_drill_complete(&self, result: &DrillResult);
    fn on_drill_skipped(&self, drill_id: &str, reason: &str);
    fn on_session_complete(&self, total: usize, scored: usize, skipped: usize, elapsed: Duration);
}

/// No-op progress reporter.
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn on_drill_start(&self, _: &str) {}
    fn on_drill_complete(&self, _: &DrillResult) {}
    fn on_drill_skipped(&self, _: &str, _: &str) {}
    fn on_session_complete(&self, _: usize, _: usize, _: usize, _: Duration) {}
}

/// Runs drill sets.
pub struct DrillEngine {
    feedback: Option<Arc<dyn FeedbackGenerator>>,
    config: DrillEngineConfig,
}

impl DrillEngine {
    pub fn new(config: DrillEngineConfig, feedback: Option<Arc<dyn FeedbackGenerator>>) -> Self {
        Self { feedback, config }
    }

    /// Score every drill in `drill_set` that has a transcript.
    ///
    /// Drills without their own parameters use `defaults` for their tier.
    pub async fn run<F>(
        &self,
        drill_set: &DrillSet,
        defaults: F,
        progress: &dyn ProgressReporter,
    ) -> Result<SessionReport>
    where
        F: Fn(Difficulty) -> ScoringParameters,
    {
        let start = Instant::now();
        let session_id = Uuid::new_v4();
        let semaphore = Arc::new(Semaphore::new(self.config.parallelism.max(1)));

        let mut futures = FuturesUnordered::new();
        let mut skipped = 0usize;

        for drill in &drill_set.drills {
            let Some(request) = drill.to_request(drill_set.default_difficulty, &defaults) else {
                progress.on_drill_skipped(&drill.id, "no transcript");
                skipped += 1;
                continue;
            };
            if let Err(e) = request.validate() {
                tracing::warn!("drill '{}' is invalid: {e}", drill.id);
                progress.on_drill_skipped(&drill.id, &e.to_string());
                skipped += 1;
                continue;
            }

            let feedback = self.feedback.clone();
            let semaphore = Arc::clone(&semaphore);
            let config = self.config.clone();
            let drill_id = drill.id.clone();
            let name = drill.name.clone();

            futures.push(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|_| anyhow::anyhow!("semaphore closed"))?;
                progress.on_drill_start(&drill_id);

                let result = scoring::evaluate(&request);

                let (feedback, feedback_error) = match feedback {
                    Some(generator) => {
                        let feedback_request = FeedbackRequest {
                            transcript: request.transcript.clone(),
                            expected: request.expected.clone(),
                            difficulty: request.difficulty,
                            result: result.clone(),
                        };
                        match request_feedback(generator.as_ref(), &feedback_request, &config)
                            .await
                        {
                            Ok(response) => (Some(response), None),
                            Err(e) => {
                                tracing::warn!(
                                    "feedback from '{}' failed for {drill_id}: {e:#}",
                                    generator.name()
                                );
                                (None, Some(format!("{e:#}")))
                            }
                        }
                    }
                    None => (None, None),
                };

                anyhow::Ok(DrillResult {
                    drill_id,
                    name,
                    difficulty: request.difficulty,
                    transcript: request.transcript,
                    result,
                    feedback,
                    feedback_error,
                })
            });
        }

        let total = futures.len() + skipped;
        let mut results = Vec::with_capacity(futures.len());

        while let Some(outcome) = futures.next().await {
            let drill_result = outcome?;
            progress.on_drill_complete(&drill_result);
            results.push(drill_result);
        }

        // Keep the authored order regardless of completion order.
        let order = |id: &str| drill_set.drills.iter().position(|d| d.id == id);
        results.sort_by_key(|r| order(&r.drill_id));

        let elapsed = start.elapsed();
        progress.on_session_complete(total, results.len(), skipped, elapsed);
        tracing::info!(
            drill_set = %drill_set.id,
            scored = results.len(),
            skipped,
            "session complete"
        );

        let stats = compute_session_stats(&results);

        Ok(SessionReport {
            id: session_id,
            created_at: chrono::Utc::now(),
            trainee: self.config.trainee.clone(),
            drill_set: DrillSetSummary {
                id: drill_set.id.clone(),
                name: drill_set.name.clone(),
                drill_count: drill_set.drills.len(),
            },
            results,
            stats,
            duration_ms: elapsed.as_millis() as u64,
        })
    }
}

/// Upper bound on the wait between feedback attempts.
const MAX_RETRY_DELAY: Duration = Duration::from_secs(60);

/// Call the generator with a timeout, retrying transient failures with
/// exponential backoff.
async fn request_feedback(
    generator: &dyn FeedbackGenerator,
    request: &FeedbackRequest,
    config: &DrillEngineConfig,
) -> Result<FeedbackResponse> {
    let mut last_error = None;
    let mut retry_delay = config.retry_delay;

    for retry in 0..=config.max_feedback_retries {
        if retry > 0 {
            tokio::time::sleep(retry_delay).await;
            retry_delay = retry_delay.saturating_mul(2).min(MAX_RETRY_DELAY);
        }

        let outcome = match tokio::time::timeout(config.feedback_timeout, generator.generate(request)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(FeedbackError::Timeout(config.feedback_timeout.as_secs()).into()),
        };

        match outcome {
            Ok(response) => return Ok(response),
            Err(e) => {
                if let Some(feedback_error) = e.downcast_ref::<FeedbackError>() {
                    if feedback_error.is_permanent() {
                        return Err(e);
                    }
                    if let Some(ms) = feedback_error.retry_after_ms() {
                        retry_delay = Duration::from_millis(ms).min(MAX_RETRY_DELAY);
                    }
                }
                tracing::debug!("feedback attempt {} failed: {e:#}", retry + 1);
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| anyhow::anyhow!("unknown error")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::model::{DrillCase, ScoringContext};
    use crate::traits::{TemplateFeedback, TokenUsage};

    const GOLD: &str = "TOWER, UNIT 4, at Gate 2, request taxi to Runway 27.";

    fn drill(id: &str, transcript: Option<&str>, difficulty: Option<Difficulty>) -> DrillCase {
        DrillCase {
            id: id.into(),
            name: format!("Drill {id}"),
            description: String::new(),
            expected: GOLD.into(),
            transcript: transcript.map(Into::into),
            difficulty,
            context: ScoringContext {
                expected_receiver: "TOWER".into(),
                expected_sender: "UNIT 4".into(),
                requires_location: true,
            },
            parameters: None,
            tags: vec![],
        }
    }

    fn drill_set(drills: Vec<DrillCase>) -> DrillSet {
        DrillSet {
            id: "taxi".into(),
            name: "Taxi".into(),
            description: String::new(),
            drills,
            default_difficulty: Difficulty::Hard,
        }
    }

    fn fast_config() -> DrillEngineConfig {
        DrillEngineConfig {
            parallelism: 2,
            feedback_timeout: Duration::from_secs(5),
            max_feedback_retries: 2,
            retry_delay: Duration::from_millis(1),
            trainee: Some("cadet".into()),
        }
    }

    /// Fails a fixed number of times, then succeeds.
    struct FlakyFeedback {
        failures: u32,
        error: fn() -> FeedbackError,
        calls: AtomicU32,
    }

    #[async_trait]
    impl FeedbackGenerator for FlakyFeedback {
        fn name(&self) -> &str {
            "flaky"
        }

        async fn generate(&self, _: &FeedbackRequest) -> Result<FeedbackResponse> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                return Err((self.error)().into());
            }
            Ok(FeedbackResponse {
                narrative: "ok".into(),
                token_usage: TokenUsage::default(),
            })
        }
    }

    struct SlowFeedback;

    #[async_trait]
    impl FeedbackGenerator for SlowFeedback {
        fn name(&self) -> &str {
            "slow"
        }

        async fn generate(&self, _: &FeedbackRequest) -> Result<FeedbackResponse> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            unreachable!("timeout fires first")
        }
    }

    #[derive(Default)]
    struct RecordingReporter {
        skipped: Mutex<Vec<String>>,
        completed: AtomicU32,
    }

    impl ProgressReporter for RecordingReporter {
        fn on_drill_start(&self, _: &str) {}
        fn on_drill_complete(&self, _: &DrillResult) {
            self.completed.fetch_add(1, Ordering::SeqCst);
        }
        fn on_drill_skipped(&self, drill_id: &str, _: &str) {
            self.skipped.lock().unwrap().push(drill_id.to_string());
        }
        fn on_session_complete(&self, _: usize, _: usize, _: usize, _: Duration) {}
    }

    #[tokio::test]
    async fn scores_drills_in_authored_order() {
        let set = drill_set(vec![
            drill("a", Some(GOLD), None),
            drill("b", None, None),
            drill("c", Some("um TOWER, UNIT 4, request taxi"), Some(Difficulty::Easy)),
        ]);
        let engine = DrillEngine::new(fast_config(), None);
        let reporter = RecordingReporter::default();

        let report = engine
            .run(&set, ScoringParameters::for_difficulty, &reporter)
            .await
            .unwrap();

        let ids: Vec<_> = report.results.iter().map(|r| r.drill_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert_eq!(*reporter.skipped.lock().unwrap(), vec!["b".to_string()]);
        assert_eq!(reporter.completed.load(Ordering::SeqCst), 2);

        assert_eq!(report.results[0].difficulty, Difficulty::Hard);
        assert_eq!(report.results[0].result.total, 100);
        assert_eq!(report.results[1].difficulty, Difficulty::Easy);
        assert_eq!(report.drill_set.drill_count, 3);
        assert_eq!(report.trainee.as_deref(), Some("cadet"));
        assert_eq!(report.stats.overall.count, 2);
    }

    #[tokio::test]
    async fn defaults_apply_when_drill_has_no_parameters() {
        let set = drill_set(vec![drill("a", Some("um uh TOWER, UNIT 4, at Gate 2, request taxi to Runway 27."), None)]);
        let engine = DrillEngine::new(fast_config(), None);

        let strict = engine
            .run(&set, ScoringParameters::for_difficulty, &NoopReporter)
            .await
            .unwrap();
        let lenient = engine
            .run(
                &set,
                |_| ScoringParameters {
                    max_allowed_fillers: 5,
                    ..ScoringParameters::default()
                },
                &NoopReporter,
            )
            .await
            .unwrap();

        // Hard tier allows no fillers at 2 points each.
        assert_eq!(strict.results[0].result.fluency.score, 16);
        assert_eq!(lenient.results[0].result.fluency.score, 20);
    }

    #[tokio::test]
    async fn attaches_feedback() {
        let set = drill_set(vec![drill("a", Some(GOLD), None)]);
        let engine = DrillEngine::new(fast_config(), Some(Arc::new(TemplateFeedback)));
        let report = engine
            .run(&set, ScoringParameters::for_difficulty, &NoopReporter)
            .await
            .unwrap();
        let feedback = report.results[0].feedback.as_ref().unwrap();
        assert!(feedback.narrative.contains("Scored 100/100"));
        assert!(report.results[0].feedback_error.is_none());
    }

    #[tokio::test]
    async fn retries_transient_feedback_errors() {
        let generator = Arc::new(FlakyFeedback {
            failures: 2,
            error: || FeedbackError::Unavailable("503".into()),
            calls: AtomicU32::new(0),
        });
        let set = drill_set(vec![drill("a", Some(GOLD), None)]);
        let engine = DrillEngine::new(fast_config(), Some(generator.clone()));
        let report = engine
            .run(&set, ScoringParameters::for_difficulty, &NoopReporter)
            .await
            .unwrap();

        assert_eq!(generator.calls.load(Ordering::SeqCst), 3);
        assert_eq!(report.results[0].feedback.as_ref().unwrap().narrative, "ok");
    }

    #[tokio::test(start_paused = true)]
    async fn huge_retry_after_is_capped() {
        let generator = Arc::new(FlakyFeedback {
            failures: 2,
            error: || FeedbackError::RateLimited {
                retry_after_ms: u64::MAX,
            },
            calls: AtomicU32::new(0),
        });
        let set = drill_set(vec![drill("a", Some(GOLD), None)]);
        let mut config = fast_config();
        config.feedback_timeout = Duration::from_secs(3600);
        let engine = DrillEngine::new(config, Some(generator.clone()));

        let started = tokio::time::Instant::now();
        let report = engine
            .run(&set, ScoringParameters::for_difficulty, &NoopReporter)
            .await
            .unwrap();

        assert_eq!(generator.calls.load(Ordering::SeqCst), 3);
        assert_eq!(report.results[0].feedback.as_ref().unwrap().narrative, "ok");
        assert!(started.elapsed() < MAX_RETRY_DELAY * 3);
    }

    #[tokio::test]
    async fn permanent_feedback_errors_are_not_retried_and_keep_the_score() {
        let generator = Arc::new(FlakyFeedback {
            failures: 10,
            error: || FeedbackError::AuthenticationFailed("bad key".into()),
            calls: AtomicU32::new(0),
        });
        let set = drill_set(vec![drill("a", Some(GOLD), None)]);
        let engine = DrillEngine::new(fast_config(), Some(generator.clone()));
        let report = engine
            .run(&set, ScoringParameters::for_difficulty, &NoopReporter)
            .await
            .unwrap();

        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
        let drill = &report.results[0];
        assert_eq!(drill.result.total, 100);
        assert!(drill.feedback.is_none());
        assert!(drill
            .feedback_error
            .as_deref()
            .unwrap()
            .contains("authentication failed"));
        assert_eq!(report.stats.feedback_failures, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn feedback_timeout_is_recorded() {
        let set = drill_set(vec![drill("a", Some(GOLD), None)]);
        let mut config = fast_config();
        config.max_feedback_retries = 0;
        let engine = DrillEngine::new(config, Some(Arc::new(SlowFeedback)));
        let report = engine
            .run(&set, ScoringParameters::for_difficulty, &NoopReporter)
            .await
            .unwrap();

        let drill = &report.results[0];
        assert_eq!(drill.result.total, 100);
        assert!(drill.feedback_error.as_deref().unwrap().contains("timed out"));
    }
}
