//! Application configuration structures.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::output::OutputFormat;

use super::collector::CollectorsConfig;
use super::validation::ConfigError;

// =============================================================================
// Constants
// =============================================================================

/// Default channel capacity for the output pipeline.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 10_000;

/// Default output flush interval (1 second).
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(1);

fn default_channel_capacity() -> usize {
    DEFAULT_CHANNEL_CAPACITY
}

fn default_flush_interval() -> Duration {
    DEFAULT_FLUSH_INTERVAL
}

// =============================================================================
// Output Configuration
// =============================================================================

/// Output pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Sink file path; absent means stdout.
    pub path: Option<PathBuf>,

    /// Sample encoding (default: line_protocol).
    pub format: OutputFormat,

    /// MPSC channel capacity for the writer actor (default: 10000).
    pub channel_capacity: usize,

    /// Batch flush interval (default: "1s").
    #[serde(with = "humantime_serde")]
    pub flush_interval: Duration,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: None,
            format: OutputFormat::default(),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            flush_interval: DEFAULT_FLUSH_INTERVAL,
        }
    }
}

// =============================================================================
// Application Configuration
// =============================================================================

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Output pipeline configuration.
    #[serde(default)]
    pub output: OutputConfig,

    /// Collector configurations grouped by type.
    #[serde(default)]
    pub collectors: CollectorsConfig,

    /// Path to a directory with additional collector config files.
    #[serde(default)]
    pub collector_path: Option<String>,
}

impl AppConfig {
    /// Load configuration from a YAML file.
    ///
    /// # Errors
    /// Returns `ConfigError` if the file cannot be read, parsed, or validated.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    /// Returns `ConfigError::ValidationError` if any field is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.output.channel_capacity == 0 {
            return Err(ConfigError::ValidationError(
                "output channel_capacity must be positive".to_string(),
            ));
        }

        if self.output.flush_interval.is_zero() {
            return Err(ConfigError::ValidationError(
                "output flush_interval must be positive".to_string(),
            ));
        }

        self.collectors.validate()?;

        Ok(())
    }

    /// Load configuration including the collector_path directory.
    ///
    /// If `collector_path` is specified, scans the directory for YAML files
    /// and merges their collector configurations.
    pub fn load_with_collector_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;

        if let Some(ref collector_dir) = config.collector_path {
            let additional = CollectorsConfig::load_from_dir(collector_dir)?;
            config.collectors = config.collectors.merge(additional);
        }

        config.validate()?;
        Ok(config)
    }
}
