//! Output builder and handles.
//!
//! Builder pattern for constructing the output pipeline and a handles struct
//! owning the writer facade and the actor thread for graceful shutdown.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread::JoinHandle;
use std::time::Duration;

use crate::output::OutputError;
use crate::output::actor::{Command, DEFAULT_BATCH_SIZE, DEFAULT_FLUSH_INTERVAL, OutputActor};
use crate::output::encode::OutputFormat;
use crate::output::writer::MetricWriter;

/// Default channel capacity for writer commands.
///
/// With batch flushing every 500 items or 1 second, this supports roughly
/// 20 seconds of buffering at 500 samples/sec before samples are dropped.
const DEFAULT_CHANNEL_CAPACITY: usize = 10_000;

/// Where encoded samples go.
#[derive(Debug, Clone, Default)]
pub enum OutputTarget {
    /// Append to standard output.
    #[default]
    Stdout,
    /// Append to a file, created if missing.
    File(PathBuf),
}

impl OutputTarget {
    /// Target from an optional path (absent means stdout).
    pub fn from_path(path: Option<&Path>) -> Self {
        match path {
            Some(p) => Self::File(p.to_path_buf()),
            None => Self::Stdout,
        }
    }
}

/// Builder for the output pipeline.
pub struct OutputBuilder {
    target: OutputTarget,
    format: OutputFormat,
    channel_capacity: usize,
    batch_size: usize,
    flush_interval: Duration,
}

impl Default for OutputBuilder {
    fn default() -> Self {
        Self::new(OutputTarget::Stdout)
    }
}

impl OutputBuilder {
    /// Create a builder for the given target.
    pub fn new(target: OutputTarget) -> Self {
        Self {
            target,
            format: OutputFormat::default(),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            batch_size: DEFAULT_BATCH_SIZE,
            flush_interval: DEFAULT_FLUSH_INTERVAL,
        }
    }

    /// Set the sample encoding.
    pub fn format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the command channel capacity.
    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    /// Set the batch size threshold for flushing.
    pub fn batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    /// Set the time threshold for flushing.
    pub fn flush_interval(mut self, interval: Duration) -> Self {
        self.flush_interval = interval;
        self
    }

    /// Open the sink, spawn the writer actor and return the handles.
    pub fn build(self) -> Result<OutputHandles, OutputError> {
        let sink: Box<dyn Write + Send> = match &self.target {
            OutputTarget::Stdout => Box::new(std::io::stdout()),
            OutputTarget::File(path) => {
                if let Some(parent) = path.parent()
                    && !parent.as_os_str().is_empty()
                    && !parent.exists()
                {
                    std::fs::create_dir_all(parent)?;
                }
                Box::new(OpenOptions::new().create(true).append(true).open(path)?)
            }
        };

        let (tx, rx) = mpsc::sync_channel(self.channel_capacity);
        let mut actor = OutputActor::new(sink, self.format, rx, self.batch_size, self.flush_interval);
        let actor_handle = std::thread::spawn(move || actor.run());

        Ok(OutputHandles {
            writer: MetricWriter::new(tx.clone()),
            tx,
            actor_handle: Some(actor_handle),
        })
    }
}

/// Handles to the output pipeline.
pub struct OutputHandles {
    /// Cloneable writer facade handed to collectors.
    pub writer: MetricWriter,
    tx: mpsc::SyncSender<Command>,
    actor_handle: Option<JoinHandle<()>>,
}

impl OutputHandles {
    /// Force flush all buffered samples.
    pub fn flush(&self) -> Result<(), OutputError> {
        self.tx
            .try_send(Command::Flush)
            .map_err(|_| OutputError::ChannelSend)
    }

    /// Gracefully shut down: flush, stop the actor and join its thread.
    pub fn shutdown(mut self) -> Result<(), OutputError> {
        self.tx
            .try_send(Command::Shutdown)
            .map_err(|_| OutputError::ChannelSend)?;

        if let Some(handle) = self.actor_handle.take() {
            handle
                .join()
                .map_err(|_| OutputError::Internal("Failed to join actor thread".to_string()))?;
        }
        Ok(())
    }
}

impl Drop for OutputHandles {
    fn drop(&mut self) {
        if self.actor_handle.is_some() {
            let _ = self.tx.try_send(Command::Shutdown);
            if let Some(handle) = self.actor_handle.take() {
                let _ = handle.join();
            }
        }
    }
}
