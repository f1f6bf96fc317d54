//! Driver and connector traits.

use std::sync::Arc;

use crate::graph::{GraphError, GraphRecord, GraphSettings};

/// Factory that turns settings into a live driver handle.
///
/// Construction is the only fallible step collectors retry across cycles;
/// keeping it behind a trait lets tests script connection failures and count
/// construction attempts.
#[async_trait::async_trait]
pub trait GraphConnector: Send + Sync + 'static {
    /// Construct a driver for the given endpoint and credentials.
    async fn connect(&self, settings: &GraphSettings) -> Result<Arc<dyn GraphDriver>, GraphError>;
}

/// Live connection handle to the graph database.
///
/// The handle is created once per collector instance and reused across
/// collection cycles; per-cycle session scoping is the implementation's
/// responsibility and must hold on every exit path.
#[async_trait::async_trait]
pub trait GraphDriver: Send + Sync + 'static {
    /// Execute a statement in a read-only context and materialize the named
    /// columns of every result row.
    async fn run_read(
        &self,
        statement: &str,
        columns: &[&str],
    ) -> Result<Vec<GraphRecord>, GraphError>;
}
