//! Collector Layer
//!
//! Data collection framework with pluggable collectors that submit metric
//! samples to the output pipeline. Each collector runs as a scheduled job.
//!
//! # Architecture
//!
//! - [`Collector`]: Core trait for implementing data collectors
//! - [`Schedule`]: Execution schedule (interval or cron)
//! - [`CollectorRegistry`]: Manages collector lifecycle and graceful shutdown
//! - [`neo4j`]: Neo4j long-running transaction collector
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use graphwatch::collector::neo4j::{Neo4jCollector, Neo4jConfig};
//! use graphwatch::output::{OutputBuilder, OutputTarget};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let handles = OutputBuilder::new(OutputTarget::Stdout).build()?;
//! let config = Neo4jConfig::new("txn-probe", "bolt://localhost:7687")
//!     .with_interval(Duration::from_secs(30));
//! let collector = Neo4jCollector::new(config, Arc::new(handles.writer.clone()));
//! // registry.spawn(collector);
//! # Ok(())
//! # }
//! ```

pub mod neo4j;
mod registry;
mod traits;

pub use registry::{CollectorRegistry, JobInfo};
pub use traits::{Collector, CollectorConfig, CollectorError, MIN_INTERVAL, Schedule};
