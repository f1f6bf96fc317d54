//! Collector registry for managing collector lifecycle.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::collector::{Collector, CollectorConfig, CollectorError, Schedule};

/// Default timeout for graceful shutdown (5 seconds).
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Metadata about a registered job.
#[derive(Debug, Clone)]
pub struct JobInfo {
    /// Job UUID.
    pub id: uuid::Uuid,
    /// Collector name.
    pub name: String,
    /// Schedule description.
    pub schedule: String,
}

/// Registry for managing multiple collector tasks.
///
/// Uses `tokio-cron-scheduler` for job scheduling. Supports both
/// fixed-interval and cron-based scheduling. Each collector gets one job;
/// the job body awaits the full collection cycle, so invocations of a given
/// collector never overlap.
pub struct CollectorRegistry {
    scheduler: JobScheduler,
    jobs: Arc<RwLock<HashMap<uuid::Uuid, JobInfo>>>,
}

impl CollectorRegistry {
    /// Create a new collector registry.
    pub async fn new() -> Result<Self, CollectorError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| CollectorError::Scheduler(e.to_string()))?;

        Ok(Self {
            scheduler,
            jobs: Arc::new(RwLock::new(HashMap::new())),
        })
    }
}

impl std::fmt::Debug for CollectorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectorRegistry")
            .field(
                "job_count",
                &self.jobs.try_read().map(|j| j.len()).unwrap_or(0),
            )
            .finish_non_exhaustive()
    }
}

impl CollectorRegistry {
    /// Register and spawn a collector.
    pub async fn spawn<C: Collector>(&self, collector: C) -> Result<uuid::Uuid, CollectorError> {
        let name = collector.config().name().to_string();
        let schedule_desc = collector.config().schedule().to_string();

        let collector = Arc::new(collector);
        let job = self.create_job(Arc::clone(&collector), &name)?;

        let job_id = self
            .scheduler
            .add(job)
            .await
            .map_err(|e| CollectorError::Scheduler(e.to_string()))?;

        self.jobs.write().await.insert(
            job_id,
            JobInfo {
                id: job_id,
                name: name.clone(),
                schedule: schedule_desc,
            },
        );

        tracing::info!(collector = %name, job_id = %job_id, "Collector registered");
        Ok(job_id)
    }

    /// Start the scheduler.
    pub async fn start(&self) -> Result<(), CollectorError> {
        self.scheduler
            .start()
            .await
            .map_err(|e| CollectorError::Scheduler(e.to_string()))?;
        tracing::info!("Collector scheduler started");
        Ok(())
    }

    /// List all registered jobs.
    pub async fn list_jobs(&self) -> Vec<JobInfo> {
        self.jobs.read().await.values().cloned().collect()
    }

    /// Get the number of registered jobs.
    pub async fn job_count(&self) -> usize {
        self.jobs.read().await.len()
    }

    /// Gracefully shutdown the scheduler with default timeout.
    pub async fn shutdown(self) -> Result<(), CollectorError> {
        self.shutdown_with_timeout(DEFAULT_SHUTDOWN_TIMEOUT).await
    }

    /// Shutdown with custom timeout.
    pub async fn shutdown_with_timeout(mut self, timeout: Duration) -> Result<(), CollectorError> {
        let shutdown_result = tokio::time::timeout(timeout, async {
            self.scheduler
                .shutdown()
                .await
                .map_err(|e| CollectorError::Scheduler(e.to_string()))
        })
        .await;

        match shutdown_result {
            Ok(Ok(())) => {
                tracing::info!("Collector scheduler shutdown complete");
                Ok(())
            }
            Ok(Err(e)) => {
                tracing::error!(error = %e, "Collector scheduler shutdown failed");
                Err(e)
            }
            Err(_) => {
                tracing::warn!("Collector scheduler shutdown timed out");
                Ok(())
            }
        }
    }

    /// Remove a specific collector job by ID.
    pub async fn remove(&self, job_id: &uuid::Uuid) -> Result<(), CollectorError> {
        self.scheduler
            .remove(job_id)
            .await
            .map_err(|e| CollectorError::Scheduler(e.to_string()))?;

        self.jobs.write().await.remove(job_id);

        tracing::info!(job_id = %job_id, "Collector removed");
        Ok(())
    }

    // --- Private helpers ---

    fn create_job<C: Collector>(
        &self,
        collector: Arc<C>,
        name: &str,
    ) -> Result<Job, CollectorError> {
        let name = name.to_owned();
        let schedule = collector.config().schedule();

        let make_callback = move || {
            let (collector, name) = (Arc::clone(&collector), name.clone());
            move |_: uuid::Uuid, _: JobScheduler| {
                let (collector, name) = (Arc::clone(&collector), name.clone());
                Box::pin(async move { run_collection(&collector, &name).await })
                    as std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send>>
            }
        };

        match &schedule {
            Schedule::Interval(d) => Job::new_repeated_async(*d, make_callback()),
            Schedule::Cron(expr) => Job::new_cron_job_async(expr.as_str(), make_callback()),
        }
        .map_err(|e| CollectorError::Scheduler(e.to_string()))
    }
}

/// Execute a single collection cycle and log the result.
async fn run_collection<C: Collector>(collector: &Arc<C>, name: &str) {
    let start = std::time::Instant::now();
    tracing::debug!(collector = %name, "Running collection");

    let result = collector.collect().await;
    let duration_ms = start.elapsed().as_millis();

    match &result {
        Ok(()) => {
            tracing::debug!(collector = %name, duration_ms, "Collection succeeded");
        }
        Err(e) => {
            tracing::error!(collector = %name, duration_ms, error = %e, "Collection failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A mock collector for testing.
    struct MockCollector {
        config: MockConfig,
    }

    #[derive(Clone)]
    struct MockConfig {
        name: String,
        schedule: Schedule,
    }

    impl MockConfig {
        fn new(name: impl Into<String>) -> Self {
            Self {
                name: name.into(),
                schedule: Schedule::interval(Duration::from_secs(60)),
            }
        }
    }

    impl CollectorConfig for MockConfig {
        fn name(&self) -> &str {
            &self.name
        }

        fn schedule(&self) -> Schedule {
            self.schedule.clone()
        }

        fn timeout(&self) -> Duration {
            Duration::from_secs(5)
        }
    }

    #[async_trait::async_trait]
    impl Collector for MockCollector {
        type Config = MockConfig;

        fn category(&self) -> &str {
            "test"
        }

        fn config(&self) -> &Self::Config {
            &self.config
        }

        async fn collect(&self) -> Result<(), CollectorError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_registry_lifecycle() {
        let registry = CollectorRegistry::new().await.unwrap();

        let collector = MockCollector {
            config: MockConfig::new("test-collector"),
        };

        // Spawn collector
        let job_id = registry.spawn(collector).await.unwrap();
        assert_eq!(registry.job_count().await, 1);

        // List jobs
        let jobs = registry.list_jobs().await;
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].name, "test-collector");
        assert!(jobs[0].schedule.contains("60s"));

        // Remove collector
        registry.remove(&job_id).await.unwrap();
        assert_eq!(registry.job_count().await, 0);

        // Shutdown
        registry.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_schedule_cron_validation() {
        let result = Schedule::cron("invalid cron expression");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("invalid cron"));
    }
}
