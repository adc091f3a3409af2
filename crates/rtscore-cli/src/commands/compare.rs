//! The `rtscore compare` command.

use std::path::PathBuf;

use anyhow::Result;

use rtscore_core::report::SessionReport;

pub fn execute(
    baseline_path: PathBuf,
    current_path: PathBuf,
    threshold: f64,
    fail_on_regression: bool,
    format: String,
) -> Result<()> {
    anyhow::ensure!(threshold >= 0.0, "threshold must not be negative");

    let baseline = SessionReport::load_json(&baseline_path)?;
    let current = SessionReport::load_json(&current_path)?;

    if baseline.drill_set.id != current.drill_set.id {
        tracing::warn!(
            "comparing different drill sets: '{}' vs '{}'",
            baseline.drill_set.id,
            current.drill_set.id
        );
    }

    let report = current.compare(&baseline, threshold);

    match format.as_str() {
        "markdown" | "md" => {
            println!("{}", report.to_markdown());
        }
        "json" => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        _ => {
            println!(
                "Mean total: {:.1} -> {:.1}",
                report.baseline_mean, report.current_mean
            );
            println!(
                "Comparison: {} regressions, {} improvements, {} unchanged",
                report.regressions.len(),
                report.improvements.len(),
                report.unchanged
            );

            if !report.regressions.is_empty() {
                println!("\nRegressions:");
                for r in &report.regressions {
                    println!(
                        "  {} {} -> {} ({:+.0})",
                        r.drill_id, r.baseline_total, r.current_total, r.delta
                    );
                }
            }

            if !report.improvements.is_empty() {
                println!("\nImprovements:");
                for i in &report.improvements {
                    println!(
                        "  {} {} -> {} ({:+.0})",
                        i.drill_id, i.baseline_total, i.current_total, i.delta
                    );
                }
            }

            if !report.new_drills.is_empty() {
                println!("\n{} new drill(s)", report.new_drills.len());
            }
            if !report.removed_drills.is_empty() {
                println!("{} removed drill(s)", report.removed_drills.len());
            }
        }
    }

    if fail_on_regression && report.has_regressions() {
        std::process::exit(1);
    }

    Ok(())
}
