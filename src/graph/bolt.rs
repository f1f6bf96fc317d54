//! Bolt driver backed by `neo4rs`.

use std::sync::Arc;

use neo4rs::{ConfigBuilder, Graph, query};

use crate::graph::{GraphConnector, GraphDriver, GraphError, GraphRecord, GraphSettings};

/// Connector producing [`BoltDriver`] handles.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoltConnector;

#[async_trait::async_trait]
impl GraphConnector for BoltConnector {
    async fn connect(&self, settings: &GraphSettings) -> Result<Arc<dyn GraphDriver>, GraphError> {
        let mut config = ConfigBuilder::default().uri(&settings.uri);
        if settings.has_credentials() {
            config = config
                .user(settings.username.as_deref().unwrap_or_default())
                .password(settings.password.as_deref().unwrap_or_default());
        }
        let config = config
            .build()
            .map_err(|e| GraphError::Connect(e.to_string()))?;

        let graph = Graph::connect(config)
            .await
            .map_err(|e| GraphError::Connect(e.to_string()))?;

        tracing::debug!(uri = %settings.uri, "Bolt driver connected");
        Ok(Arc::new(BoltDriver { graph }))
    }
}

/// Driver handle wrapping a pooled `neo4rs` graph client.
///
/// `neo4rs` scopes one pooled connection per executed query and returns it
/// to the pool when the row stream is dropped, so the per-cycle session is
/// released on every exit path.
pub struct BoltDriver {
    graph: Graph,
}

impl std::fmt::Debug for BoltDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoltDriver").finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl GraphDriver for BoltDriver {
    async fn run_read(
        &self,
        statement: &str,
        columns: &[&str],
    ) -> Result<Vec<GraphRecord>, GraphError> {
        let mut stream = self
            .graph
            .execute(query(statement))
            .await
            .map_err(|e| GraphError::Query(e.to_string()))?;

        let mut records = Vec::new();
        while let Some(row) = stream
            .next()
            .await
            .map_err(|e| GraphError::Query(e.to_string()))?
        {
            let mut record = GraphRecord::new();
            for &column in columns {
                // Probe the narrow types first so integers stay integers.
                if let Ok(v) = row.get::<i64>(column) {
                    record.insert(column, v);
                } else if let Ok(v) = row.get::<f64>(column) {
                    record.insert(column, v);
                } else if let Ok(v) = row.get::<bool>(column) {
                    record.insert(column, v);
                } else if let Ok(v) = row.get::<String>(column) {
                    record.insert(column, v);
                }
                // Anything else stays absent; the consumer defaults it.
            }
            records.push(record);
        }

        Ok(records)
    }
}
