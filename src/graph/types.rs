//! Connection settings and result-row types.

use std::collections::BTreeMap;

use crate::metric::FieldValue;

/// Settings handed to a [`GraphConnector`](crate::graph::GraphConnector).
///
/// A non-empty username selects basic authentication with the
/// username/password pair; otherwise no authentication is attempted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphSettings {
    /// Bolt endpoint URI, e.g. `bolt://localhost:7687`.
    pub uri: String,
    /// Username for basic authentication.
    pub username: Option<String>,
    /// Password for basic authentication.
    pub password: Option<String>,
}

impl GraphSettings {
    /// Settings without authentication.
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            username: None,
            password: None,
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

    /// True when a non-empty username is configured.
    pub fn has_credentials(&self) -> bool {
        self.username.as_deref().is_some_and(|u| !u.is_empty())
    }
}

/// One result row, materialized as a column-name → value map.
///
/// Rows are ephemeral: the collector consumes them during iteration and maps
/// each one into a metric sample. Columns the driver could not convert are
/// simply absent; the consumer applies its own default policy.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphRecord {
    columns: BTreeMap<String, FieldValue>,
}

impl GraphRecord {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a column value.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<FieldValue>) {
        self.columns.insert(column.into(), value.into());
    }

    /// Builder-style insert, for tests and fixtures.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(column, value);
        self
    }

    /// Look up a column value.
    pub fn get(&self, column: &str) -> Option<&FieldValue> {
        self.columns.get(column)
    }

    /// Number of materialized columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// True if no columns were materialized.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
