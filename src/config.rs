use crate::error::TimerError;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::{fs::File, path::PathBuf};

/// Nanosecond resolution, the finest `Duration` can express.
const MAX_PRECISION: usize = 9;

/// Formatting options for the runtime report.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ReportConfig {
    pub header: Option<String>,
    pub prefix: String,
    pub pending_marker: String,
    pub precision: usize,
    pub unit: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            header: None,
            prefix: String::new(),
            pending_marker: "in progress".to_string(),
            precision: 6,
            unit: String::new(),
        }
    }
}

impl ReportConfig {
    /// Headed, bulleted layout with a `seconds` suffix:
    /// ` - <label>: <secs> seconds` under `Function Runtime Statistics:`.
    #[must_use]
    pub fn statistics() -> Self {
        Self {
            header: Some("Function Runtime Statistics:".to_string()),
            prefix: " - ".to_string(),
            unit: "seconds".to_string(),
            ..Self::default()
        }
    }

    /// Load the config from a YAML file, missing fields take their defaults.
    /// # Errors
    /// Will return an error if the file can't be read, parsed or validated
    pub fn new(config_path: PathBuf) -> Result<Self> {
        let file = File::open(&config_path)
            .with_context(|| format!("Failed to open config file {}", config_path.display()))?;

        let config: Self = serde_yaml::from_reader(file).context("Failed to parse config file")?;

        config.validate()?;

        Ok(config)
    }

    /// # Errors
    /// Will return an error if the YAML is malformed or fails validation
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml).context("Failed to parse config")?;

        config.validate()?;

        Ok(config)
    }

    /// # Errors
    /// `TimerError::InvalidConfig` when the precision is too fine or the
    /// pending marker could be mistaken for a duration
    pub fn validate(&self) -> Result<(), TimerError> {
        if self.precision > MAX_PRECISION {
            return Err(TimerError::InvalidConfig(format!(
                "precision {} exceeds {MAX_PRECISION} digits",
                self.precision
            )));
        }

        let marker = self.pending_marker.trim();

        if marker.is_empty() {
            return Err(TimerError::InvalidConfig(
                "pending_marker must not be empty".to_string(),
            ));
        }

        if marker.parse::<f64>().is_ok() {
            return Err(TimerError::InvalidConfig(format!(
                "pending_marker '{marker}' looks like a duration"
            )));
        }

        Ok(())
    }
}
