//! The `rtscore score` command.

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use rtscore_core::config::load_config_from;
use rtscore_core::model::EvaluationRequest;
use rtscore_core::results::CompositeResult;
use rtscore_core::scoring;

fn read_request(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut payload = String::new();
        std::io::stdin()
            .read_to_string(&mut payload)
            .context("failed to read request from stdin")?;
        Ok(payload)
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("failed to read request: {}", path.display()))
    }
}

pub fn execute(request_path: PathBuf, format: String, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;

    let payload = read_request(&request_path)?;
    let mut request = EvaluationRequest::from_json(&payload)?;
    if request.parameters.is_none() {
        request.parameters = Some(config.parameters_for(request.difficulty));
    }

    let result = scoring::evaluate(&request);

    match format.as_str() {
        "text" => print_text(&result),
        "json" => println!("{}", serde_json::to_string_pretty(&result)?),
        other => anyhow::bail!("unknown format '{other}' (expected json or text)"),
    }

    Ok(())
}

fn print_text(result: &CompositeResult) {
    println!("Total: {}/100", result.total);
    println!(
        "  Structure {:>2}/30  {}",
        result.structure.score, result.structure.explanation
    );
    println!(
        "  Accuracy  {:>2}/50  {}",
        result.accuracy.score, result.accuracy.explanation
    );
    println!(
        "  Fluency   {:>2}/20  {}",
        result.fluency.score, result.fluency.explanation
    );
    if !result.accuracy.missing_elements.is_empty() {
        println!("Missing: {}", result.accuracy.missing_elements.join(", "));
    }
}
