//! The `rtscore run` command.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use rtscore_core::config::load_config_from;
use rtscore_core::engine::{DrillEngine, DrillEngineConfig, DrillResult, ProgressReporter};
use rtscore_core::parser;
use rtscore_core::report::SessionReport;
use rtscore_core::traits::{FeedbackGenerator, TemplateFeedback};

/// Console progress reporter.
struct ConsoleReporter;

impl ProgressReporter for ConsoleReporter {
    fn on_drill_start(&self, _drill_id: &str) {}

    fn on_drill_complete(&self, result: &DrillResult) {
        eprintln!(
            "  Done: {} [{}] {}/100",
            result.drill_id, result.difficulty, result.result.total
        );
    }

    fn on_drill_skipped(&self, drill_id: &str, reason: &str) {
        eprintln!("  Skipped: {drill_id} ({reason})");
    }

    fn on_session_complete(&self, total: usize, scored: usize, skipped: usize, elapsed: Duration) {
        eprintln!(
            "\nComplete: {scored}/{total} scored, {skipped} skipped ({:.2}s)",
            elapsed.as_secs_f64()
        );
    }
}

pub async fn execute(
    drill_set_path: PathBuf,
    filter: Option<String>,
    output: Option<PathBuf>,
    format: String,
    feedback: bool,
    config_path: Option<PathBuf>,
) -> Result<()> {
    anyhow::ensure!(
        matches!(format.as_str(), "text" | "json"),
        "unknown format '{format}' (expected text or json)"
    );

    let config = load_config_from(config_path.as_deref())?;

    let mut drill_sets = parser::load_drill_sets(&drill_set_path)?;
    anyhow::ensure!(
        !drill_sets.is_empty(),
        "no drill sets found in {}",
        drill_set_path.display()
    );

    // Apply tag filter
    if let Some(filter_tags) = &filter {
        let tags: Vec<&str> = filter_tags.split(',').map(|s| s.trim()).collect();
        for set in &mut drill_sets {
            set.drills
                .retain(|d| d.tags.iter().any(|t| tags.contains(&t.as_str())));
        }
    }

    let generator: Option<Arc<dyn FeedbackGenerator>> = if feedback {
        Some(Arc::new(TemplateFeedback))
    } else {
        None
    };
    let engine = DrillEngine::new(DrillEngineConfig::from(&config), generator);
    let reporter = ConsoleReporter;

    let mut reports = Vec::with_capacity(drill_sets.len());
    for drill_set in &drill_sets {
        eprintln!(
            "rtscore v{}: scoring {} drills from '{}'",
            env!("CARGO_PKG_VERSION"),
            drill_set.drills.len(),
            drill_set.name
        );

        let report = engine
            .run(drill_set, |d| config.parameters_for(d), &reporter)
            .await?;

        if let Some(dir) = &output {
            let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H%M%S");
            let path = dir.join(format!("session-{}-{timestamp}.json", drill_set.id));
            report.save_json(&path)?;
            eprintln!("Results saved to: {}", path.display());
        }

        if format == "text" {
            print_summary(&report);
        }
        reports.push(report);
    }

    if format == "json" {
        if let [report] = reports.as_slice() {
            println!("{}", serde_json::to_string_pretty(report)?);
        } else {
            println!("{}", serde_json::to_string_pretty(&reports)?);
        }
    }

    Ok(())
}

fn print_summary(report: &SessionReport) {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec![
        "Drill",
        "Tier",
        "Structure",
        "Accuracy",
        "Fluency",
        "Total",
        "Rating",
    ]);

    for r in &report.results {
        table.add_row(vec![
            Cell::new(&r.drill_id),
            Cell::new(r.difficulty),
            Cell::new(r.result.structure.score),
            Cell::new(r.result.accuracy.score),
            Cell::new(r.result.fluency.score),
            Cell::new(r.result.total),
            Cell::new(r.result.fluency.fluency_rating),
        ]);
    }

    println!("{}: {}", report.drill_set.name, report.drill_set.id);
    println!("{table}");

    let overall = &report.stats.overall;
    println!(
        "Mean total {:.1} (structure {:.1}, accuracy {:.1}, fluency {:.1}) over {} drill(s)",
        overall.mean_total,
        overall.mean_structure,
        overall.mean_accuracy,
        overall.mean_fluency,
        overall.count
    );
    if let Some(wer) = overall.mean_wer {
        println!("Mean WER on hard drills: {:.1}%", wer);
    }

    for r in &report.results {
        if let Some(feedback) = &r.feedback {
            println!("\n[{}]\n{}", r.drill_id, feedback.narrative);
        }
    }
}
