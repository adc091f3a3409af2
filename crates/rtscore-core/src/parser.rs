//! TOML drill-set parser.
//!
//! Loads drill sets from TOML files and directories, and validates them.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::{Difficulty, DrillCase, DrillSet, ScoringContext, ScoringParameters};
use crate::normalize::{match_tokens, normalize};

/// Intermediate TOML structure for parsing drill-set files.
#[derive(Debug, Deserialize)]
struct TomlDrillFile {
    drill_set: TomlDrillSetHeader,
    #[serde(default)]
    drills: Vec<TomlDrill>,
}

#[derive(Debug, Deserialize)]
struct TomlDrillSetHeader {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default = "default_difficulty_str")]
    default_difficulty: String,
}

fn default_difficulty_str() -> String {
    "medium".to_string()
}

#[derive(Debug, Deserialize)]
struct TomlDrill {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
    expected: String,
    #[serde(default)]
    transcript: Option<String>,
    #[serde(default)]
    difficulty: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    context: TomlContext,
    #[serde(default)]
    parameters: Option<ScoringParameters>,
}

#[derive(Debug, Deserialize)]
struct TomlContext {
    expected_receiver: String,
    expected_sender: String,
    #[serde(default = "default_true")]
    requires_location: bool,
}

fn default_true() -> bool {
    true
}

/// Parse a single TOML file into a `DrillSet`.
pub fn parse_drill_set(path: &Path) -> Result<DrillSet> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read drill set file: {}", path.display()))?;

    parse_drill_set_str(&content, path)
}

/// Parse a TOML string into a `DrillSet` (useful for testing).
pub fn parse_drill_set_str(content: &str, source_path: &Path) -> Result<DrillSet> {
    let parsed: TomlDrillFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let default_difficulty = Difficulty::from_label(&parsed.drill_set.default_difficulty);

    let drills = parsed
        .drills
        .into_iter()
        .map(|d| {
            if let Some(params) = &d.parameters {
                params
                    .validate()
                    .with_context(|| format!("drill '{}' has invalid parameters", d.id))?;
            }
            Ok(DrillCase {
                id: d.id,
                name: d.name,
                description: d.description,
                expected: d.expected,
                transcript: d.transcript,
                difficulty: d.difficulty.as_deref().map(Difficulty::from_label),
                context: ScoringContext {
                    expected_receiver: d.context.expected_receiver,
                    expected_sender: d.context.expected_sender,
                    requires_location: d.context.requires_location,
                },
                parameters: d.parameters,
                tags: d.tags,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(DrillSet {
        id: parsed.drill_set.id,
        name: parsed.drill_set.name,
        description: parsed.drill_set.description,
        drills,
        default_difficulty,
    })
}

/// Recursively load all `.toml` drill-set files from a directory.
pub fn load_drill_directory(dir: &Path) -> Result<Vec<DrillSet>> {
    let mut sets = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|e| e.path());

    for entry in entries {
        let path = entry.path();

        if path.is_dir() {
            sets.extend(load_drill_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_drill_set(&path) {
                Ok(set) => sets.push(set),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    Ok(sets)
}

/// Load a file, or every drill set under a directory.
pub fn load_drill_sets(path: &Path) -> Result<Vec<DrillSet>> {
    if path.is_dir() {
        load_drill_directory(path)
    } else {
        Ok(vec![parse_drill_set(path)?])
    }
}

/// A warning from drill-set validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The drill ID (if applicable).
    pub drill_id: Option<String>,
    /// Warning message.
    pub message: String,
}

/// `true` if the callsign's words occur contiguously in `text`.
fn mentions(text: &str, callsign: &str) -> bool {
    let haystack = format!(" {} ", match_tokens(text).join(" "));
    let needle = match_tokens(callsign).join(" ");
    !needle.is_empty() && haystack.contains(&format!(" {needle} "))
}

/// Validate a drill set for common authoring mistakes.
pub fn validate_drill_set(set: &DrillSet) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    // Check for duplicate drill IDs
    let mut seen_ids = std::collections::HashSet::new();
    for drill in &set.drills {
        if !seen_ids.insert(&drill.id) {
            warnings.push(ValidationWarning {
                drill_id: Some(drill.id.clone()),
                message: format!("duplicate drill ID: {}", drill.id),
            });
        }
    }

    for drill in &set.drills {
        if normalize(&drill.expected).is_empty() {
            warnings.push(ValidationWarning {
                drill_id: Some(drill.id.clone()),
                message: "expected message is empty".into(),
            });
            continue;
        }

        if drill.transcript.is_none() {
            warnings.push(ValidationWarning {
                drill_id: Some(drill.id.clone()),
                message: "no transcript recorded; drill will be skipped by `run`".into(),
            });
        }

        for (role, callsign) in [
            ("receiver", &drill.context.expected_receiver),
            ("sender", &drill.context.expected_sender),
        ] {
            if !mentions(&drill.expected, callsign) {
                warnings.push(ValidationWarning {
                    drill_id: Some(drill.id.clone()),
                    message: format!(
                        "expected {role} '{callsign}' does not appear in the expected message"
                    ),
                });
            }
        }
    }

    if set.drills.is_empty() {
        warnings.push(ValidationWarning {
            drill_id: None,
            message: "drill set has no drills".into(),
        });
    }

    warnings
}
