//! Graphwatch - Neo4j Transaction Monitoring Library
//!
//! This crate provides the core functionality for the graphwatch agent. It
//! can be used as a library by other Rust projects, or run as a standalone
//! binary with the `graphwatch` executable.
//!
//! # Architecture
//!
//! - **Collectors**: scheduled data collection; the Neo4j collector runs a
//!   fixed `SHOW TRANSACTIONS` query and emits one sample per long-running
//!   transaction
//! - **Graph**: trait seam over the Bolt client (`neo4rs`)
//! - **Output**: accumulator trait, non-blocking writer facade, writer actor
//!   encoding line protocol or JSON lines
//! - **Config**: YAML configuration with validation and env expansion
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use graphwatch::collector::CollectorRegistry;
//! use graphwatch::collector::neo4j::{Neo4jCollector, Neo4jConfig};
//! use graphwatch::output::{OutputBuilder, OutputTarget};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let handles = OutputBuilder::new(OutputTarget::Stdout).build()?;
//!
//!     let config = Neo4jConfig::new("local", "bolt://localhost:7687");
//!     let collector = Neo4jCollector::new(config, Arc::new(handles.writer.clone()));
//!
//!     let registry = CollectorRegistry::new().await?;
//!     registry.spawn(collector).await?;
//!     registry.start().await?;
//!
//!     tokio::signal::ctrl_c().await?;
//!     registry.shutdown().await?;
//!     handles.shutdown()?;
//!     Ok(())
//! }
//! ```

pub mod collector;
pub mod config;
pub mod graph;
pub mod metric;
pub mod output;

pub use collector::neo4j::{Neo4jCollector, Neo4jConfig};
pub use collector::{Collector, CollectorError, CollectorRegistry, Schedule};
pub use config::{AppConfig, ConfigError};
pub use graph::{GraphConnector, GraphDriver, GraphError, GraphRecord, GraphSettings};
pub use metric::{FieldValue, Metric};
pub use output::{Accumulator, MetricBuffer, MetricWriter, OutputBuilder, OutputHandles};
