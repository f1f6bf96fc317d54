//! Configuration module for the graphwatch agent.
//!
//! Provides YAML-based configuration loading and validation for:
//! - Output settings (sink path, encoding, channel capacity)
//! - Collector settings (Neo4j endpoints, credentials, schedules)
//! - Collector include directory

mod app;
mod collector;
mod validation;

pub use app::{AppConfig, OutputConfig};
pub use collector::CollectorsConfig;
pub use validation::{ConfigError, expand_env_vars, parse_duration};

// Re-export constants
pub use app::{DEFAULT_CHANNEL_CAPACITY, DEFAULT_FLUSH_INTERVAL};
