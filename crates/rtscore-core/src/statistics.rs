//! Session statistics over scored drills.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::engine::DrillResult;
use crate::model::Difficulty;
use crate::results::FluencyRating;

/// Averages for one group of drills.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupStats {
    /// Number of scored drills.
    pub count: usize,
    pub mean_total: f64,
    pub mean_structure: f64,
    pub mean_accuracy: f64,
    pub mean_fluency: f64,
    /// Lowest and highest totals.
    pub min_total: u32,
    pub max_total: u32,
    /// Mean WER (percent) over drills scored in the hard tier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mean_wer: Option<f64>,
    pub total_fillers: u32,
    pub total_corrections: u32,
    /// How many drills landed in each fluency band.
    pub ratings: BTreeMap<FluencyRating, usize>,
}

/// Statistics for a whole session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub overall: GroupStats,
    pub per_difficulty: BTreeMap<Difficulty, GroupStats>,
    /// Drills whose narrative feedback failed.
    pub feedback_failures: usize,
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

fn group_stats(results: &[&DrillResult]) -> GroupStats {
    if results.is_empty() {
        return GroupStats::default();
    }

    let mut ratings = BTreeMap::new();
    for r in results {
        *ratings.entry(r.result.fluency.fluency_rating).or_insert(0) += 1;
    }

    GroupStats {
        count: results.len(),
        mean_total: mean(results.iter().map(|r| r.result.total as f64)).unwrap_or(0.0),
        mean_structure: mean(results.iter().map(|r| r.result.structure.score as f64))
            .unwrap_or(0.0),
        mean_accuracy: mean(results.iter().map(|r| r.result.accuracy.score as f64))
            .unwrap_or(0.0),
        mean_fluency: mean(results.iter().map(|r| r.result.fluency.score as f64)).unwrap_or(0.0),
        min_total: results.iter().map(|r| r.result.total).min().unwrap_or(0),
        max_total: results.iter().map(|r| r.result.total).max().unwrap_or(0),
        mean_wer: mean(results.iter().filter_map(|r| r.result.accuracy.wer_score)),
        total_fillers: results.iter().map(|r| r.result.fluency.filler_count).sum(),
        total_corrections: results
            .iter()
            .map(|r| r.result.fluency.correction_count)
            .sum(),
        ratings,
    }
}

/// Compute overall and per-tier statistics for a session.
pub fn compute_session_stats(results: &[DrillResult]) -> SessionStats {
    let all: Vec<&DrillResult> = results.iter().collect();

    let mut per_difficulty = BTreeMap::new();
    for difficulty in Difficulty::ALL {
        let group: Vec<&DrillResult> = results
            .iter()
            .filter(|r| r.difficulty == difficulty)
            .collect();
        if !group.is_empty() {
            per_difficulty.insert(difficulty, group_stats(&group));
        }
    }

    SessionStats {
        overall: group_stats(&all),
        per_difficulty,
        feedback_failures: results.iter().filter(|r| r.feedback_error.is_some()).count(),
    }
}
