//! rtscore configuration.
//!
//! Holds the per-tier default scoring parameters and the session runner
//! settings.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::model::{Difficulty, ScoringParameters};

/// Per-tier parameter defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierDefaults {
    #[serde(default = "easy_defaults")]
    pub easy: ScoringParameters,
    #[serde(default = "medium_defaults")]
    pub medium: ScoringParameters,
    #[serde(default = "hard_defaults")]
    pub hard: ScoringParameters,
}

fn easy_defaults() -> ScoringParameters {
    ScoringParameters::for_difficulty(Difficulty::Easy)
}
fn medium_defaults() -> ScoringParameters {
    ScoringParameters::for_difficulty(Difficulty::Medium)
}
fn hard_defaults() -> ScoringParameters {
    ScoringParameters::for_difficulty(Difficulty::Hard)
}

impl Default for TierDefaults {
    fn default() -> Self {
        Self {
            easy: easy_defaults(),
            medium: medium_defaults(),
            hard: hard_defaults(),
        }
    }
}

/// Top-level rtscore configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RtscoreConfig {
    /// Scoring parameter defaults by tier.
    #[serde(default)]
    pub defaults: TierDefaults,
    /// Max drills scored concurrently.
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
    /// Timeout for one feedback request, in seconds.
    #[serde(default = "default_feedback_timeout")]
    pub feedback_timeout_secs: u64,
    /// Retries on transient feedback failures.
    #[serde(default = "default_retries")]
    pub max_feedback_retries: u32,
    /// Delay before the first retry, in milliseconds.
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,
    /// Label recorded on session reports (e.g. the learner's name).
    #[serde(default)]
    pub trainee: Option<String>,
}

fn default_parallelism() -> usize {
    4
}
fn default_feedback_timeout() -> u64 {
    20
}
fn default_retries() -> u32 {
    2
}
fn default_retry_delay() -> u64 {
    500
}

impl Default for RtscoreConfig {
    fn default() -> Self {
        Self {
            defaults: TierDefaults::default(),
            parallelism: default_parallelism(),
            feedback_timeout_secs: default_feedback_timeout(),
            max_feedback_retries: default_retries(),
            retry_delay_ms: default_retry_delay(),
            trainee: None,
        }
    }
}

impl RtscoreConfig {
    /// Default parameters for a tier.
    pub fn parameters_for(&self, difficulty: Difficulty) -> ScoringParameters {
        match difficulty {
            Difficulty::Easy => self.defaults.easy,
            Difficulty::Medium => self.defaults.medium,
            Difficulty::Hard => self.defaults.hard,
        }
    }

    /// Check every tier's parameters.
    pub fn validate(&self) -> Result<()> {
        for difficulty in Difficulty::ALL {
            self.parameters_for(difficulty)
                .validate()
                .with_context(|| format!("invalid [defaults.{difficulty}] parameters"))?;
        }
        anyhow::ensure!(self.parallelism >= 1, "parallelism must be at least 1");
        Ok(())
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `rtscore.toml` in the current directory
/// 2. `~/.config/rtscore/config.toml`
///
/// Environment variable override: `RTSCORE_PARALLELISM`.
pub fn load_config() -> Result<RtscoreConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<RtscoreConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("rtscore.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            parse_config_str(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => RtscoreConfig::default(),
    };

    if let Ok(value) = std::env::var("RTSCORE_PARALLELISM") {
        config.parallelism = value
            .trim()
            .parse()
            .with_context(|| format!("invalid RTSCORE_PARALLELISM: '{value}'"))?;
    }

    config.validate()?;
    Ok(config)
}

/// Parse a config document, resolving `${VAR}` references in string values.
pub fn parse_config_str(content: &str) -> Result<RtscoreConfig> {
    let mut config: RtscoreConfig = toml::from_str(content)?;
    config.trainee = config.trainee.as_deref().map(resolve_env_vars);
    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("rtscore"))
}
