//! Collector configuration structures.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::collector::neo4j::Neo4jConfig;

use super::validation::ConfigError;

/// URI schemes the Bolt client accepts.
const GRAPH_URI_SCHEMES: [&str; 6] = [
    "bolt",
    "bolt+s",
    "bolt+ssc",
    "neo4j",
    "neo4j+s",
    "neo4j+ssc",
];

/// Collectors configuration grouped by type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollectorsConfig {
    /// Neo4j transaction collectors.
    #[serde(default)]
    pub neo4j: Vec<Neo4jConfig>,
}

impl CollectorsConfig {
    /// Merge another CollectorsConfig into this one.
    #[must_use]
    pub fn merge(mut self, other: CollectorsConfig) -> Self {
        self.neo4j.extend(other.neo4j);
        self
    }

    /// Validate all collector configurations.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen_names = HashSet::new();

        for neo4j in &self.neo4j {
            if neo4j.name.is_empty() {
                return Err(ConfigError::ValidationError(
                    "neo4j collector name cannot be empty".to_string(),
                ));
            }
            if !seen_names.insert(&neo4j.name) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate collector name: '{}'",
                    neo4j.name
                )));
            }

            // Validate URI (after env expansion, so ${VAR} endpoints work)
            let uri = neo4j.settings().uri;
            let parsed = url::Url::parse(&uri).map_err(|e| {
                ConfigError::ValidationError(format!(
                    "neo4j collector '{}': invalid URI '{}': {}",
                    neo4j.name, uri, e
                ))
            })?;
            if !GRAPH_URI_SCHEMES.contains(&parsed.scheme()) {
                return Err(ConfigError::ValidationError(format!(
                    "neo4j collector '{}': unsupported URI scheme '{}'",
                    neo4j.name,
                    parsed.scheme()
                )));
            }

            // Validate interval vs cron
            if neo4j.interval.is_some() && neo4j.cron.is_some() {
                return Err(ConfigError::ValidationError(format!(
                    "neo4j collector '{}': cannot specify both interval and cron",
                    neo4j.name
                )));
            }
        }

        Ok(())
    }

    /// Load collector configurations from all YAML files in a directory.
    pub fn load_from_dir(dir_path: &str) -> Result<Self, ConfigError> {
        let dir = Path::new(dir_path);
        if !dir.exists() {
            return Err(ConfigError::ValidationError(format!(
                "collector_path '{}' does not exist",
                dir_path
            )));
        }
        if !dir.is_dir() {
            return Err(ConfigError::ValidationError(format!(
                "collector_path '{}' is not a directory",
                dir_path
            )));
        }

        let mut merged = Self::default();
        let entries = std::fs::read_dir(dir)?;

        for entry in entries {
            let entry = entry?;
            let path = entry.path();

            if !path.is_file() {
                continue;
            }

            let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
            if ext != "yaml" && ext != "yml" {
                continue;
            }

            tracing::debug!("Loading collector config from: {}", path.display());
            let content = std::fs::read_to_string(&path)?;
            let file_config: Self = serde_yaml::from_str(&content).map_err(|e| {
                ConfigError::ValidationError(format!("failed to parse '{}': {}", path.display(), e))
            })?;

            merged = merged.merge(file_config);
        }

        Ok(merged)
    }
}
