//! Session report types with JSON persistence and progress comparison.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::DrillResult;
use crate::statistics::SessionStats;

/// A complete practice session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    /// Unique session identifier.
    pub id: Uuid,
    /// When the session ran.
    pub created_at: DateTime<Utc>,
    /// Who was practising, if configured.
    #[serde(default)]
    pub trainee: Option<String>,
    pub drill_set: DrillSetSummary,
    /// Scored drills in authored order.
    pub results: Vec<DrillResult>,
    pub stats: SessionStats,
    /// Total wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

/// Summary of a drill set (without the drill definitions).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrillSetSummary {
    pub id: String,
    pub name: String,
    pub drill_count: usize,
}

impl SessionReport {
    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: SessionReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// Compare this session against an earlier one, drill by drill.
    ///
    /// A change in total score larger than `threshold` points counts as a
    /// regression or improvement.
    pub fn compare(&self, baseline: &SessionReport, threshold: f64) -> ProgressReport {
        let totals = |report: &SessionReport| -> BTreeMap<String, u32> {
            report
                .results
                .iter()
                .map(|r| (r.drill_id.clone(), r.result.total))
                .collect()
        };

        let baseline_totals = totals(baseline);
        let current_totals = totals(self);

        let mut regressions = Vec::new();
        let mut improvements = Vec::new();
        let mut unchanged = 0usize;
        let mut new_drills = Vec::new();

        for (drill_id, &current) in &current_totals {
            let Some(&previous) = baseline_totals.get(drill_id) else {
                new_drills.push(drill_id.clone());
                continue;
            };
            let delta = current as f64 - previous as f64;
            let change = ScoreChange {
                drill_id: drill_id.clone(),
                baseline_total: previous,
                current_total: current,
                delta,
            };
            if delta < -threshold {
                regressions.push(change);
            } else if delta > threshold {
                improvements.push(change);
            } else {
                unchanged += 1;
            }
        }

        let removed_drills = baseline_totals
            .keys()
            .filter(|k| !current_totals.contains_key(*k))
            .cloned()
            .collect();

        ProgressReport {
            baseline_mean: baseline.stats.overall.mean_total,
            current_mean: self.stats.overall.mean_total,
            regressions,
            improvements,
            unchanged,
            new_drills,
            removed_drills,
        }
    }
}

/// Result of comparing two sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressReport {
    pub baseline_mean: f64,
    pub current_mean: f64,
    /// Drills whose total went down.
    pub regressions: Vec<ScoreChange>,
    /// Drills whose total went up.
    pub improvements: Vec<ScoreChange>,
    /// Drills with no significant change.
    pub unchanged: usize,
    /// Drills in the current session only.
    pub new_drills: Vec<String>,
    /// Drills in the baseline session only.
    pub removed_drills: Vec<String>,
}

/// A drill whose total moved beyond the threshold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreChange {
    pub drill_id: String,
    pub baseline_total: u32,
    pub current_total: u32,
    pub delta: f64,
}

impl ProgressReport {
    /// Format the comparison as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!(
            "**Mean total:** {:.1} -> {:.1}\n\n",
            self.baseline_mean, self.current_mean
        ));
        md.push_str(&format!(
            "**Summary:** {} regressions, {} improvements, {} unchanged\n\n",
            self.regressions.len(),
            self.improvements.len(),
            self.unchanged
        ));

        for (title, changes) in [
            ("Regressions", &self.regressions),
            ("Improvements", &self.improvements),
        ] {
            if changes.is_empty() {
                continue;
            }
            md.push_str(&format!("### {title}\n\n"));
            md.push_str("| Drill | Baseline | Current | Delta |\n");
            md.push_str("|-------|----------|---------|-------|\n");
            for c in changes {
                md.push_str(&format!(
                    "| {} | {} | {} | {:+.0} |\n",
                    c.drill_id, c.baseline_total, c.current_total, c.delta
                ));
            }
            md.push('\n');
        }

        if !self.new_drills.is_empty() {
            md.push_str(&format!("New drills: {}\n", self.new_drills.join(", ")));
        }
        if !self.removed_drills.is_empty() {
            md.push_str(&format!(
                "Removed drills: {}\n",
                self.removed_drills.join(", ")
            ));
        }

        md
    }

    /// Returns true if there are any regressions.
    pub fn has_regressions(&self) -> bool {
        !self.regressions.is_empty()
    }
}
