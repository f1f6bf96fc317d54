//! Writer actor with dedicated sink ownership and MPSC channel.
//!
//! Single-writer pattern: one thread owns the output sink and processes
//! commands via a bounded channel. Samples are batch-buffered and flushed
//! when the buffer reaches the batch size or the flush interval elapses.

use std::io::Write;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use crate::metric::Metric;
use crate::output::encode::{OutputFormat, encode_metric};

/// Default maximum items in the buffer before flush.
pub(crate) const DEFAULT_BATCH_SIZE: usize = 500;

/// Default maximum time before buffer flush.
pub(crate) const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(1);

/// Commands sent to the writer actor.
#[derive(Debug)]
pub enum Command {
    /// Buffer one sample for the next batch.
    Write(Metric),
    /// Force flush all buffered samples.
    Flush,
    /// Flush and stop the actor.
    Shutdown,
}

/// Buffer for batch writes with time-based and size-based flushing.
struct BatchBuffer {
    items: Vec<Metric>,
    last_flush: Instant,
    batch_size: usize,
    flush_interval: Duration,
}

impl BatchBuffer {
    fn new(batch_size: usize, flush_interval: Duration) -> Self {
        Self {
            items: Vec::with_capacity(batch_size),
            last_flush: Instant::now(),
            batch_size,
            flush_interval,
        }
    }

    fn push(&mut self, item: Metric) {
        // Reset the timer on first item so an idle buffer is not overdue.
        if self.items.is_empty() {
            self.last_flush = Instant::now();
        }
        self.items.push(item);
    }

    fn should_flush(&self) -> bool {
        self.items.len() >= self.batch_size
            || (!self.items.is_empty() && self.last_flush.elapsed() >= self.flush_interval)
    }

    fn take(&mut self) -> Vec<Metric> {
        self.last_flush = Instant::now();
        std::mem::take(&mut self.items)
    }

    fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn deadline(&self) -> Option<Instant> {
        if self.items.is_empty() {
            None
        } else {
            Some(self.last_flush + self.flush_interval)
        }
    }
}

/// Writer actor: owns the sink, drains the command channel, batch-writes.
pub struct OutputActor {
    sink: Box<dyn Write + Send>,
    format: OutputFormat,
    rx: Receiver<Command>,
    buffer: BatchBuffer,
}

impl OutputActor {
    pub(crate) fn new(
        sink: Box<dyn Write + Send>,
        format: OutputFormat,
        rx: Receiver<Command>,
        batch_size: usize,
        flush_interval: Duration,
    ) -> Self {
        Self {
            sink,
            format,
            rx,
            buffer: BatchBuffer::new(batch_size, flush_interval),
        }
    }

    pub(crate) fn run(&mut self) {
        tracing::info!("Output actor started");

        loop {
            let now = Instant::now();
            let deadline = self
                .buffer
                .deadline()
                .unwrap_or(now + Duration::from_secs(60));
            let timeout = deadline.saturating_duration_since(now);

            match self.rx.recv_timeout(timeout) {
                Ok(cmd) => {
                    if self.handle_command(cmd) {
                        break;
                    }
                }
                Err(RecvTimeoutError::Timeout) => {
                    // Flush overdue; handled below.
                }
                Err(RecvTimeoutError::Disconnected) => {
                    tracing::warn!("Channel disconnected, shutting down");
                    self.flush();
                    break;
                }
            }

            if self.buffer.should_flush() {
                self.flush();
            }
        }

        tracing::info!("Output actor stopped");
    }

    /// Returns true when shutdown was requested.
    fn handle_command(&mut self, cmd: Command) -> bool {
        match cmd {
            Command::Write(metric) => {
                self.buffer.push(metric);
            }
            Command::Flush => {
                self.flush();
            }
            Command::Shutdown => {
                tracing::info!("Output actor shutting down");
                self.flush();
                return true;
            }
        }
        false
    }

    fn flush(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        let metrics = self.buffer.take();
        let count = metrics.len();
        if let Err(e) = self.write_batch(&metrics) {
            tracing::error!(error = %e, count, "Batch write failed");
        } else {
            tracing::debug!(count, "Batch written");
        }
    }

    fn write_batch(&mut self, metrics: &[Metric]) -> std::io::Result<()> {
        for metric in metrics {
            let line = encode_metric(metric, self.format);
            writeln!(self.sink, "{line}")?;
        }
        self.sink.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::sync::{Arc, Mutex};

    /// Write adapter over a shared byte buffer.
    #[derive(Clone, Default)]
    struct SharedSink(Arc<Mutex<Vec<u8>>>);

    impl SharedSink {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for SharedSink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn spawn_actor(
        sink: SharedSink,
        batch_size: usize,
    ) -> (std::thread::JoinHandle<()>, mpsc::SyncSender<Command>) {
        let (tx, rx) = mpsc::sync_channel(100);
        let mut actor = OutputActor::new(
            Box::new(sink),
            OutputFormat::LineProtocol,
            rx,
            batch_size,
            Duration::from_secs(1),
        );
        let handle = std::thread::spawn(move || actor.run());
        (handle, tx)
    }

    #[test]
    fn test_actor_lifecycle() {
        let sink = SharedSink::default();
        let (handle, tx) = spawn_actor(sink, 10);
        tx.send(Command::Shutdown).unwrap();
        handle.join().unwrap();
    }

    #[test]
    fn test_flush_writes_one_line_per_sample() {
        let sink = SharedSink::default();
        let (handle, tx) = spawn_actor(sink.clone(), 100);

        tx.send(Command::Write(
            Metric::new("neo4j").with_tag("database", "a"),
        ))
        .unwrap();
        tx.send(Command::Write(
            Metric::new("neo4j").with_tag("database", "b"),
        ))
        .unwrap();
        tx.send(Command::Flush).unwrap();
        tx.send(Command::Shutdown).unwrap();
        handle.join().unwrap();

        let lines: Vec<String> = sink.contents().lines().map(str::to_string).collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("neo4j,database=a "));
        assert!(lines[1].starts_with("neo4j,database=b "));
    }

    #[test]
    fn test_batch_size_triggers_flush() {
        let sink = SharedSink::default();
        let (handle, tx) = spawn_actor(sink.clone(), 3);

        for i in 0..3 {
            tx.send(Command::Write(
                Metric::new("neo4j").with_field("n", i as i64),
            ))
            .unwrap();
        }

        // Size threshold reached; the actor flushes without an explicit Flush.
        std::thread::sleep(Duration::from_millis(100));
        assert_eq!(sink.contents().lines().count(), 3);

        tx.send(Command::Shutdown).unwrap();
        handle.join().unwrap();
    }

    #[test]
    fn test_shutdown_flushes_pending_samples() {
        let sink = SharedSink::default();
        let (handle, tx) = spawn_actor(sink.clone(), 100);

        tx.send(Command::Write(Metric::new("neo4j"))).unwrap();
        tx.send(Command::Shutdown).unwrap();
        handle.join().unwrap();

        assert_eq!(sink.contents().lines().count(), 1);
    }
}
