//! Output Layer
//!
//! Channel-based metric output with a single writer thread:
//! - **Writer facade**: non-blocking submission via bounded MPSC
//! - **Writer actor**: owns the sink, batch-buffers, encodes, appends
//!
//! # Components
//!
//! - [`Accumulator`]: sink trait collectors submit samples to
//! - [`MetricWriter`]: cloneable non-blocking facade over the actor channel
//! - [`MetricBuffer`]: in-memory accumulator for tests and embedding
//! - [`OutputBuilder`] / [`OutputHandles`]: initialization and lifecycle
//! - [`OutputFormat`]: line protocol (default) or JSON lines

mod accumulator;
mod actor;
mod builder;
mod encode;
mod error;
mod writer;

pub use accumulator::{Accumulator, MetricBuffer};
pub use builder::{OutputBuilder, OutputHandles, OutputTarget};
pub use encode::{OutputFormat, encode_metric};
pub use error::OutputError;
pub use writer::MetricWriter;
