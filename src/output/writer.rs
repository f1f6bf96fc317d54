//! Non-blocking writer facade over the actor channel.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::SyncSender;

use crate::metric::{FieldMap, Metric, TagMap};
use crate::output::OutputError;
use crate::output::accumulator::Accumulator;
use crate::output::actor::Command;

/// Cloneable, non-blocking metric writer.
///
/// Uses `try_send`: when the channel is full the sample is dropped, the
/// shared dropped counter is incremented and an error is returned. Samples
/// are buffered by the actor and flushed on its batch thresholds.
#[derive(Clone)]
pub struct MetricWriter {
    tx: SyncSender<Command>,
    dropped_samples: Arc<AtomicU64>,
}

impl std::fmt::Debug for MetricWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricWriter").finish_non_exhaustive()
    }
}

impl MetricWriter {
    pub(crate) fn new(tx: SyncSender<Command>) -> Self {
        Self {
            tx,
            dropped_samples: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Total samples dropped because the channel was full.
    pub fn dropped_samples(&self) -> u64 {
        self.dropped_samples.load(Ordering::Relaxed)
    }

    /// Submit one sample. Buffered until the actor's flush threshold.
    pub fn submit(&self, metric: Metric) -> Result<(), OutputError> {
        if self.tx.try_send(Command::Write(metric)).is_err() {
            tracing::warn!("Channel full, dropping metric sample");
            self.dropped_samples.fetch_add(1, Ordering::Relaxed);
            return Err(OutputError::ChannelSend);
        }
        Ok(())
    }

    /// Force flush all buffered samples.
    pub fn flush(&self) -> Result<(), OutputError> {
        self.tx
            .try_send(Command::Flush)
            .map_err(|_| OutputError::ChannelSend)
    }
}

impl Accumulator for MetricWriter {
    fn add_fields(
        &self,
        measurement: &str,
        tags: TagMap,
        fields: FieldMap,
    ) -> Result<(), OutputError> {
        self.submit(Metric::new(measurement).with_tags(tags).with_fields(fields))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn test_writer_submits_commands() {
        let (tx, rx) = mpsc::sync_channel(4);
        let writer = MetricWriter::new(tx);

        writer.submit(Metric::new("neo4j")).unwrap();
        writer.flush().unwrap();

        assert!(matches!(rx.recv().unwrap(), Command::Write(_)));
        assert!(matches!(rx.recv().unwrap(), Command::Flush));
        assert_eq!(writer.dropped_samples(), 0);
    }

    #[test]
    fn test_full_channel_drops_and_counts() {
        let (tx, _rx) = mpsc::sync_channel(1);
        let writer = MetricWriter::new(tx);
        let writer_clone = writer.clone();

        writer.submit(Metric::new("neo4j")).unwrap();
        let err = writer.submit(Metric::new("neo4j")).unwrap_err();
        assert!(matches!(err, OutputError::ChannelSend));

        // The counter is shared across clones.
        assert_eq!(writer.dropped_samples(), 1);
        assert_eq!(writer_clone.dropped_samples(), 1);
    }

    #[test]
    fn test_add_fields_builds_sample() {
        let (tx, rx) = mpsc::sync_channel(4);
        let writer = MetricWriter::new(tx);

        let mut tags = TagMap::new();
        tags.insert("database".to_string(), "neo4j".to_string());
        writer.add_fields("neo4j", tags, FieldMap::new()).unwrap();

        match rx.recv().unwrap() {
            Command::Write(metric) => {
                assert_eq!(metric.measurement, "neo4j");
                assert_eq!(metric.tag("database"), Some("neo4j"));
            }
            other => panic!("expected Write, got {other:?}"),
        }
    }
}
