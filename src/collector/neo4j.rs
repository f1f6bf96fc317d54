//! Neo4j long-running transaction collector.

mod collector;

pub use collector::{Neo4jCollector, Neo4jConfig};
