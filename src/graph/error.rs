//! Graph-layer error types.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur when talking to the graph database.
#[derive(Debug, Error)]
pub enum GraphError {
    /// Driver construction failed (bad URI, unreachable host, bad
    /// credentials format).
    #[error("connection error: {0}")]
    Connect(String),

    /// Driver construction did not complete within the connect timeout.
    #[error("connect timed out after {0:?}")]
    ConnectTimeout(Duration),

    /// Query execution or result streaming failed.
    #[error("query error: {0}")]
    Query(String),
}
