//! Output-specific error types.

use thiserror::Error;

/// Errors that can occur in the output pipeline.
#[derive(Debug, Error)]
pub enum OutputError {
    /// Failed to hand a command to the writer actor (channel full or closed).
    #[error("failed to send command to writer actor")]
    ChannelSend,

    /// Sink I/O error.
    #[error("sink error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error (e.g., actor thread join failure).
    #[error("internal error: {0}")]
    Internal(String),
}
