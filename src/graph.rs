//! Graph Database Layer
//!
//! Trait seam between collectors and the Bolt client. Collectors talk to a
//! [`GraphDriver`] obtained from a [`GraphConnector`]; production code wires
//! in the `neo4rs`-backed [`BoltConnector`], tests script a mock.

mod bolt;
mod error;
mod traits;
mod types;

pub use bolt::{BoltConnector, BoltDriver};
pub use error::GraphError;
pub use traits::{GraphConnector, GraphDriver};
pub use types::{GraphRecord, GraphSettings};
