//! Neo4j long-running transaction collector.
//!
//! Each cycle runs `SHOW TRANSACTIONS` against a Bolt endpoint and emits one
//! tagged sample per transaction that has been running longer than one
//! second. The driver handle is created lazily on the first cycle and reused
//! until [`Neo4jCollector::reset`].

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::time::timeout;

use crate::collector::{Collector, CollectorConfig, CollectorError, Schedule};
use crate::config::expand_env_vars;
use crate::graph::{BoltConnector, GraphConnector, GraphDriver, GraphError, GraphRecord,
    GraphSettings};
use crate::metric::{FieldMap, FieldValue, TagMap};
use crate::output::Accumulator;

/// Measurement name for emitted samples.
const MEASUREMENT: &str = "neo4j";

/// Tag column.
const TAG_DATABASE: &str = "database";

/// Default collection interval (30 seconds).
const DEFAULT_INTERVAL: Duration = Duration::from_secs(30);

/// Default connect timeout (10 seconds).
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Fixed query listing transactions that have been running longer than one
/// second. The 1000 ms threshold is part of the adapter contract, not
/// configurable.
const SHOW_TRANSACTIONS: &str = concat!(
    "SHOW TRANSACTIONS YIELD database, transactionId, currentQueryId, status, ",
    "activeLockCount, pageHits, elapsedTime, cpuTime, waitTime, idleTime ",
    "WHERE elapsedTime.milliseconds > 1000 ",
    "RETURN database, transactionId, currentQueryId, status, activeLockCount, pageHits, ",
    "elapsedTime.milliseconds AS elapsedTimeMillis, ",
    "cpuTime.milliseconds AS cpuTimeMillis, ",
    "waitTime.milliseconds AS waitTimeMillis, ",
    "idleTime.seconds AS idleTimeSeconds",
);

/// Field columns extracted from each row.
const FIELD_COLUMNS: [&str; 7] = [
    "currentQueryId",
    "activeLockCount",
    "pageHits",
    "elapsedTimeMillis",
    "cpuTimeMillis",
    "waitTimeMillis",
    "idleTimeSeconds",
];

/// Columns the driver materializes per row: the tag plus the seven fields.
const RESULT_COLUMNS: [&str; 8] = [
    TAG_DATABASE,
    "currentQueryId",
    "activeLockCount",
    "pageHits",
    "elapsedTimeMillis",
    "cpuTimeMillis",
    "waitTimeMillis",
    "idleTimeSeconds",
];

/// Zero/empty value emitted when a column is missing from a row.
fn default_field(column: &str) -> FieldValue {
    match column {
        "currentQueryId" => FieldValue::Text(String::new()),
        _ => FieldValue::Integer(0),
    }
}

fn default_enabled() -> bool {
    true
}

fn default_group() -> String {
    "default".to_string()
}

fn default_connect_timeout() -> Duration {
    DEFAULT_CONNECT_TIMEOUT
}

/// Configuration for the Neo4j transaction collector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Neo4jConfig {
    /// Unique name for this collector instance.
    pub name: String,
    /// Bolt endpoint URI (e.g. `bolt://localhost:7687`). Supports `${VAR}`
    /// environment expansion.
    pub uri: String,
    /// Username for basic authentication. Empty or absent disables
    /// authentication. Supports `${VAR}` environment expansion.
    #[serde(default)]
    pub username: Option<String>,
    /// Password for basic authentication. Ignored without a username.
    /// Supports `${VAR}` environment expansion.
    #[serde(default)]
    pub password: Option<String>,
    /// Enable this collector (default: true).
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Collector group for organization (default: "default").
    #[serde(default = "default_group")]
    pub group: String,
    /// Collection interval (mutually exclusive with cron).
    #[serde(default, with = "humantime_serde")]
    pub interval: Option<Duration>,
    /// Cron schedule expression (mutually exclusive with interval).
    #[serde(default)]
    pub cron: Option<String>,
    /// Driver construction timeout (default: 10s). The query itself carries
    /// no client-side timeout; the only bound is the elapsed-time filter in
    /// the query.
    #[serde(default = "default_connect_timeout", with = "humantime_serde")]
    pub connect_timeout: Duration,
    /// Static tags merged into every sample.
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    /// Human-readable description.
    #[serde(default)]
    pub description: Option<String>,
}

impl Neo4jConfig {
    /// Create a new collector configuration.
    pub fn new(name: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            uri: uri.into(),
            username: None,
            password: None,
            enabled: true,
            group: "default".to_string(),
            interval: Some(DEFAULT_INTERVAL),
            cron: None,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            tags: BTreeMap::new(),
            description: None,
        }
    }

    /// Get schedule from interval or cron.
    pub fn schedule(&self) -> Schedule {
        if let Some(ref cron_expr) = self.cron {
            Schedule::Cron(cron_expr.clone())
        } else {
            Schedule::Interval(self.interval.unwrap_or(DEFAULT_INTERVAL))
        }
    }

    /// Driver settings with environment expansion applied to the endpoint
    /// and credentials.
    pub fn settings(&self) -> GraphSettings {
        GraphSettings {
            uri: expand_env_vars(&self.uri),
            username: self.username.as_deref().map(expand_env_vars),
            password: self.password.as_deref().map(expand_env_vars),
        }
    }

    /// Set basic-auth credentials.
    pub fn with_basic_auth(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Set the collection interval.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self.cron = None;
        self
    }

    /// Set the cron schedule.
    pub fn with_cron(mut self, cron: impl Into<String>) -> Self {
        self.cron = Some(cron.into());
        self.interval = None;
        self
    }

    /// Set the driver construction timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set static tags.
    pub fn with_static_tags(mut self, tags: BTreeMap<String, String>) -> Self {
        self.tags = tags;
        self
    }

    /// Set description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set enabled.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Set group.
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }
}

impl CollectorConfig for Neo4jConfig {
    fn name(&self) -> &str {
        &self.name
    }

    fn schedule(&self) -> Schedule {
        Neo4jConfig::schedule(self)
    }

    fn timeout(&self) -> Duration {
        self.connect_timeout
    }
}

/// Connection lifecycle of the collector.
///
/// `Disconnected → Connected` happens at most once, on the first cycle that
/// constructs the driver; `reset()` is the only way back.
#[derive(Default)]
enum DriverState {
    #[default]
    Disconnected,
    Connected(Arc<dyn GraphDriver>),
}

/// Neo4j long-running transaction collector.
pub struct Neo4jCollector {
    config: Neo4jConfig,
    accumulator: Arc<dyn Accumulator>,
    connector: Arc<dyn GraphConnector>,
    driver: Mutex<DriverState>,
}

impl Neo4jCollector {
    /// Create a collector backed by the Bolt driver.
    pub fn new(config: Neo4jConfig, accumulator: Arc<dyn Accumulator>) -> Self {
        Self::with_connector(config, accumulator, Arc::new(BoltConnector))
    }

    /// Create a collector with a custom connector (tests, alternative
    /// drivers).
    pub fn with_connector(
        config: Neo4jConfig,
        accumulator: Arc<dyn Accumulator>,
        connector: Arc<dyn GraphConnector>,
    ) -> Self {
        Self {
            config,
            accumulator,
            connector,
            driver: Mutex::new(DriverState::Disconnected),
        }
    }

    /// True when a driver handle exists.
    pub async fn is_connected(&self) -> bool {
        matches!(*self.driver.lock().await, DriverState::Connected(_))
    }

    /// Drop the driver handle; the next cycle reconstructs it.
    ///
    /// Intended for health-check-driven reconnection.
    pub async fn reset(&self) {
        let mut state = self.driver.lock().await;
        if matches!(*state, DriverState::Connected(_)) {
            tracing::info!(name = %self.config.name, "Driver handle reset");
        }
        *state = DriverState::Disconnected;
    }

    /// Return the driver handle, constructing it on first use.
    ///
    /// On construction failure the state stays `Disconnected` so the next
    /// cycle retries.
    async fn driver(&self) -> Result<Arc<dyn GraphDriver>, GraphError> {
        let mut state = self.driver.lock().await;
        if let DriverState::Connected(driver) = &*state {
            return Ok(Arc::clone(driver));
        }

        let settings = self.config.settings();
        let driver = timeout(self.config.connect_timeout, self.connector.connect(&settings))
            .await
            .map_err(|_| GraphError::ConnectTimeout(self.config.connect_timeout))??;

        tracing::info!(name = %self.config.name, uri = %settings.uri, "Driver connected");
        *state = DriverState::Connected(Arc::clone(&driver));
        Ok(driver)
    }

    fn row_tags(&self, record: &GraphRecord) -> TagMap {
        let database = record
            .get(TAG_DATABASE)
            .map(|v| v.to_string())
            .unwrap_or_default();

        let mut tags = self.config.tags.clone();
        tags.insert(TAG_DATABASE.to_string(), database);
        tags
    }

    fn row_fields(&self, record: &GraphRecord) -> FieldMap {
        let mut fields = FieldMap::new();
        for column in FIELD_COLUMNS {
            let value = match record.get(column) {
                Some(value) => value.clone(),
                None => {
                    tracing::warn!(
                        name = %self.config.name,
                        column,
                        "Column missing from result row, emitting default value"
                    );
                    default_field(column)
                }
            };
            fields.insert(column.to_string(), value);
        }
        fields
    }
}

impl std::fmt::Debug for Neo4jCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Neo4jCollector")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl Collector for Neo4jCollector {
    type Config = Neo4jConfig;

    fn category(&self) -> &str {
        "graph"
    }

    fn config(&self) -> &Self::Config {
        &self.config
    }

    async fn collect(&self) -> Result<(), CollectorError> {
        let driver = self.driver().await?;

        let records = driver.run_read(SHOW_TRANSACTIONS, &RESULT_COLUMNS).await?;
        tracing::debug!(
            name = %self.config.name,
            rows = records.len(),
            "Transaction query completed"
        );

        for record in &records {
            self.accumulator
                .add_fields(MEASUREMENT, self.row_tags(record), self.row_fields(record))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::output::MetricBuffer;

    /// Scriptable connector: counts construction attempts and hands out
    /// drivers that replay a fixed outcome.
    #[derive(Default)]
    struct MockConnector {
        connects: AtomicUsize,
        fail_connect: bool,
        rows: Vec<GraphRecord>,
        query_error: Option<String>,
    }

    impl MockConnector {
        fn with_rows(rows: Vec<GraphRecord>) -> Self {
            Self {
                rows,
                ..Self::default()
            }
        }

        fn failing() -> Self {
            Self {
                fail_connect: true,
                ..Self::default()
            }
        }

        fn with_query_error(message: &str) -> Self {
            Self {
                query_error: Some(message.to_string()),
                ..Self::default()
            }
        }

        fn connects(&self) -> usize {
            self.connects.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl GraphConnector for MockConnector {
        async fn connect(
            &self,
            _settings: &GraphSettings,
        ) -> Result<Arc<dyn GraphDriver>, GraphError> {
            self.connects.fetch_add(1, Ordering::SeqCst);
            if self.fail_connect {
                return Err(GraphError::Connect("connection refused".to_string()));
            }
            Ok(Arc::new(MockDriver {
                rows: self.rows.clone(),
                query_error: self.query_error.clone(),
            }))
        }
    }

    struct MockDriver {
        rows: Vec<GraphRecord>,
        query_error: Option<String>,
    }

    #[async_trait::async_trait]
    impl GraphDriver for MockDriver {
        async fn run_read(
            &self,
            _statement: &str,
            _columns: &[&str],
        ) -> Result<Vec<GraphRecord>, GraphError> {
            if let Some(message) = &self.query_error {
                return Err(GraphError::Query(message.clone()));
            }
            Ok(self.rows.clone())
        }
    }

    fn transaction_row(database: &str, query_id: &str) -> GraphRecord {
        GraphRecord::new()
            .with("database", database)
            .with("currentQueryId", query_id)
            .with("activeLockCount", 2i64)
            .with("pageHits", 100i64)
            .with("elapsedTimeMillis", 1500i64)
            .with("cpuTimeMillis", 300i64)
            .with("waitTimeMillis", 50i64)
            .with("idleTimeSeconds", 1i64)
    }

    fn collector(
        connector: Arc<MockConnector>,
        buffer: Arc<MetricBuffer>,
    ) -> Neo4jCollector {
        Neo4jCollector::with_connector(
            Neo4jConfig::new("txn-probe", "bolt://localhost:7687"),
            buffer,
            connector,
        )
    }

    #[tokio::test]
    async fn test_one_sample_per_row() {
        let connector = Arc::new(MockConnector::with_rows(vec![
            transaction_row("neo4j", "query-1"),
            transaction_row("movies", "query-2"),
        ]));
        let buffer = Arc::new(MetricBuffer::new());
        let collector = collector(Arc::clone(&connector), Arc::clone(&buffer));

        collector.collect().await.unwrap();

        let metrics = buffer.take();
        assert_eq!(metrics.len(), 2);
        for metric in &metrics {
            assert_eq!(metric.measurement, "neo4j");
            assert_eq!(metric.tags.len(), 1);
            assert_eq!(metric.fields.len(), 7);
        }
        assert_eq!(metrics[0].tag("database"), Some("neo4j"));
        assert_eq!(metrics[1].tag("database"), Some("movies"));
    }

    #[tokio::test]
    async fn test_row_values_map_exactly() {
        let connector = Arc::new(MockConnector::with_rows(vec![transaction_row(
            "neo4j", "query-5",
        )]));
        let buffer = Arc::new(MetricBuffer::new());
        let collector = collector(Arc::clone(&connector), Arc::clone(&buffer));

        collector.collect().await.unwrap();

        let metrics = buffer.take();
        assert_eq!(metrics.len(), 1);
        let metric = &metrics[0];
        assert_eq!(metric.measurement, "neo4j");
        assert_eq!(metric.tag("database"), Some("neo4j"));
        assert_eq!(
            metric.field("currentQueryId"),
            Some(&FieldValue::Text("query-5".to_string()))
        );
        assert_eq!(metric.field("activeLockCount"), Some(&FieldValue::Integer(2)));
        assert_eq!(metric.field("pageHits"), Some(&FieldValue::Integer(100)));
        assert_eq!(
            metric.field("elapsedTimeMillis"),
            Some(&FieldValue::Integer(1500))
        );
        assert_eq!(metric.field("cpuTimeMillis"), Some(&FieldValue::Integer(300)));
        assert_eq!(metric.field("waitTimeMillis"), Some(&FieldValue::Integer(50)));
        assert_eq!(metric.field("idleTimeSeconds"), Some(&FieldValue::Integer(1)));
    }

    #[tokio::test]
    async fn test_connect_failure_propagates_and_retries() {
        let connector = Arc::new(MockConnector::failing());
        let buffer = Arc::new(MetricBuffer::new());
        let collector = collector(Arc::clone(&connector), Arc::clone(&buffer));

        let err = collector.collect().await.unwrap_err();
        assert!(matches!(
            err,
            CollectorError::Graph(GraphError::Connect(_))
        ));
        assert!(!collector.is_connected().await);
        assert!(buffer.is_empty());

        // The handle stayed unset, so the next cycle retries construction.
        collector.collect().await.unwrap_err();
        assert_eq!(connector.connects(), 2);
    }

    #[tokio::test]
    async fn test_driver_constructed_once_across_cycles() {
        let connector = Arc::new(MockConnector::with_rows(vec![transaction_row(
            "neo4j", "query-1",
        )]));
        let buffer = Arc::new(MetricBuffer::new());
        let collector = collector(Arc::clone(&connector), Arc::clone(&buffer));

        for _ in 0..3 {
            collector.collect().await.unwrap();
        }

        assert_eq!(connector.connects(), 1);
        assert!(collector.is_connected().await);
        assert_eq!(buffer.len(), 3);
    }

    #[tokio::test]
    async fn test_zero_rows_completes_without_samples() {
        let connector = Arc::new(MockConnector::with_rows(Vec::new()));
        let buffer = Arc::new(MetricBuffer::new());
        let collector = collector(Arc::clone(&connector), Arc::clone(&buffer));

        collector.collect().await.unwrap();
        assert!(buffer.is_empty());
    }

    #[tokio::test]
    async fn test_query_error_propagates() {
        let connector = Arc::new(MockConnector::with_query_error("permission denied"));
        let buffer = Arc::new(MetricBuffer::new());
        let collector = collector(Arc::clone(&connector), Arc::clone(&buffer));

        let err = collector.collect().await.unwrap_err();
        assert!(matches!(err, CollectorError::Graph(GraphError::Query(_))));
        assert!(err.to_string().contains("permission denied"));
        assert!(buffer.is_empty());

        // A query failure does not tear down the handle.
        assert!(collector.is_connected().await);
        collector.collect().await.unwrap_err();
        assert_eq!(connector.connects(), 1);
    }

    #[tokio::test]
    async fn test_reset_forces_reconnect() {
        let connector = Arc::new(MockConnector::with_rows(Vec::new()));
        let buffer = Arc::new(MetricBuffer::new());
        let collector = collector(Arc::clone(&connector), Arc::clone(&buffer));

        collector.collect().await.unwrap();
        assert!(collector.is_connected().await);

        collector.reset().await;
        assert!(!collector.is_connected().await);

        collector.collect().await.unwrap();
        assert_eq!(connector.connects(), 2);
    }

    #[tokio::test]
    async fn test_missing_columns_emit_defaults() {
        let sparse = GraphRecord::new()
            .with("database", "neo4j")
            .with("pageHits", 100i64);
        let connector = Arc::new(MockConnector::with_rows(vec![sparse]));
        let buffer = Arc::new(MetricBuffer::new());
        let collector = collector(Arc::clone(&connector), Arc::clone(&buffer));

        collector.collect().await.unwrap();

        let metrics = buffer.take();
        assert_eq!(metrics.len(), 1);
        let metric = &metrics[0];
        assert_eq!(metric.fields.len(), 7);
        assert_eq!(metric.field("pageHits"), Some(&FieldValue::Integer(100)));
        assert_eq!(
            metric.field("currentQueryId"),
            Some(&FieldValue::Text(String::new()))
        );
        assert_eq!(metric.field("activeLockCount"), Some(&FieldValue::Integer(0)));
    }

    #[tokio::test]
    async fn test_static_tags_are_merged() {
        let connector = Arc::new(MockConnector::with_rows(vec![transaction_row(
            "neo4j", "query-1",
        )]));
        let buffer = Arc::new(MetricBuffer::new());
        let mut tags = BTreeMap::new();
        tags.insert("env".to_string(), "staging".to_string());
        let config = Neo4jConfig::new("txn-probe", "bolt://localhost:7687")
            .with_static_tags(tags);
        let collector =
            Neo4jCollector::with_connector(config, Arc::<MetricBuffer>::clone(&buffer), connector);

        collector.collect().await.unwrap();

        let metrics = buffer.take();
        assert_eq!(metrics[0].tag("env"), Some("staging"));
        assert_eq!(metrics[0].tag("database"), Some("neo4j"));
    }

    #[test]
    fn test_config_defaults() {
        let config = Neo4jConfig::new("txn-probe", "bolt://localhost:7687");

        assert_eq!(config.name, "txn-probe");
        assert_eq!(config.uri, "bolt://localhost:7687");
        assert!(config.enabled);
        assert_eq!(config.group, "default");
        assert!(config.username.is_none());
        assert!(matches!(config.schedule(), Schedule::Interval(d) if d == DEFAULT_INTERVAL));
        assert_eq!(config.connect_timeout, DEFAULT_CONNECT_TIMEOUT);
    }

    #[test]
    fn test_config_builder() {
        let config = Neo4jConfig::new("txn-probe", "neo4j://db.internal:7687")
            .with_basic_auth("neo4j", "secret")
            .with_interval(Duration::from_secs(60))
            .with_connect_timeout(Duration::from_secs(3))
            .with_description("production transaction watch");

        assert_eq!(config.username.as_deref(), Some("neo4j"));
        assert_eq!(config.password.as_deref(), Some("secret"));
        assert!(matches!(config.schedule(), Schedule::Interval(d) if d == Duration::from_secs(60)));
        assert_eq!(config.connect_timeout, Duration::from_secs(3));
        assert_eq!(
            config.description.as_deref(),
            Some("production transaction watch")
        );
    }

    #[test]
    fn test_config_settings_auth_switch() {
        let anonymous = Neo4jConfig::new("probe", "bolt://localhost:7687");
        assert!(!anonymous.settings().has_credentials());

        let with_auth =
            Neo4jConfig::new("probe", "bolt://localhost:7687").with_basic_auth("neo4j", "pw");
        assert!(with_auth.settings().has_credentials());

        // Empty username means no authentication.
        let empty_user =
            Neo4jConfig::new("probe", "bolt://localhost:7687").with_basic_auth("", "pw");
        assert!(!empty_user.settings().has_credentials());
    }

    #[test]
    fn test_query_shape() {
        assert!(SHOW_TRANSACTIONS.starts_with("SHOW TRANSACTIONS YIELD"));
        assert!(SHOW_TRANSACTIONS.contains("WHERE elapsedTime.milliseconds > 1000"));
        assert!(SHOW_TRANSACTIONS.contains("idleTime.seconds AS idleTimeSeconds"));
        for column in RESULT_COLUMNS {
            assert!(SHOW_TRANSACTIONS.contains(column), "missing column {column}");
        }
    }
}
