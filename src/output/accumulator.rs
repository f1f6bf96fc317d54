//! Accumulator trait and the in-memory implementation.

use std::sync::Mutex;

use crate::metric::{FieldMap, Metric, TagMap};
use crate::output::OutputError;

/// Sink for tagged metric samples.
///
/// Collectors call [`add_fields`](Accumulator::add_fields) once per result
/// row; a collection cycle may submit any number of samples, including zero.
/// Implementations must be callable from multiple collectors concurrently.
pub trait Accumulator: Send + Sync {
    /// Submit one sample as a (measurement, tags, fields) triple.
    ///
    /// The implementation stamps the sample with the submission time.
    fn add_fields(
        &self,
        measurement: &str,
        tags: TagMap,
        fields: FieldMap,
    ) -> Result<(), OutputError>;
}

/// In-memory accumulator.
///
/// Buffers submitted samples behind a mutex. Used by tests and by embedders
/// that want to inspect samples without running the writer actor.
#[derive(Debug, Default)]
pub struct MetricBuffer {
    metrics: Mutex<Vec<Metric>>,
}

impl MetricBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of buffered samples.
    pub fn len(&self) -> usize {
        self.metrics.lock().expect("metric buffer poisoned").len()
    }

    /// True if no samples are buffered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drain all buffered samples.
    pub fn take(&self) -> Vec<Metric> {
        std::mem::take(&mut *self.metrics.lock().expect("metric buffer poisoned"))
    }

    /// Clone the buffered samples without draining.
    pub fn snapshot(&self) -> Vec<Metric> {
        self.metrics.lock().expect("metric buffer poisoned").clone()
    }
}

impl Accumulator for MetricBuffer {
    fn add_fields(
        &self,
        measurement: &str,
        tags: TagMap,
        fields: FieldMap,
    ) -> Result<(), OutputError> {
        let metric = Metric::new(measurement).with_tags(tags).with_fields(fields);
        self.metrics
            .lock()
            .expect("metric buffer poisoned")
            .push(metric);
        Ok(())
    }
}
