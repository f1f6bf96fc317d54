//! Metric sample model.
//!
//! A [`Metric`] is one tagged sample: a measurement name, string-valued tags
//! for identity, typed fields for payload, and a UTC timestamp. Samples are
//! produced by collectors and consumed by the output pipeline.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Static tag map used for metric identity.
pub type TagMap = BTreeMap<String, String>;

/// Field map carrying the payload of a sample.
pub type FieldMap = BTreeMap<String, FieldValue>;

/// A typed field value.
///
/// Integer and float are kept distinct so the encoders can preserve the
/// source type (line protocol marks integers with an `i` suffix).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// 64-bit signed integer.
    Integer(i64),
    /// 64-bit float.
    Float(f64),
    /// Boolean.
    Boolean(bool),
    /// UTF-8 string.
    Text(String),
}

impl FieldValue {
    /// The zero/empty value of the same kind.
    pub fn zero_of(&self) -> FieldValue {
        match self {
            Self::Integer(_) => Self::Integer(0),
            Self::Float(_) => Self::Float(0.0),
            Self::Boolean(_) => Self::Boolean(false),
            Self::Text(_) => Self::Text(String::new()),
        }
    }

    /// Integer payload, if this value is an integer.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Text payload, if this value is a string.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v),
            _ => None,
        }
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Boolean(v) => write!(f, "{v}"),
            Self::Text(v) => write!(f, "{v}"),
        }
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        Self::Integer(i64::from(v))
    }
}

impl From<u32> for FieldValue {
    fn from(v: u32) -> Self {
        Self::Integer(i64::from(v))
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

/// One tagged metric sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    /// Measurement name (e.g. "neo4j").
    pub measurement: String,
    /// Identity tags.
    #[serde(default)]
    pub tags: TagMap,
    /// Payload fields.
    #[serde(default)]
    pub fields: FieldMap,
    /// Sample timestamp (UTC).
    pub ts: DateTime<Utc>,
}

impl Metric {
    /// Create an empty sample stamped with the current time.
    pub fn new(measurement: impl Into<String>) -> Self {
        Self {
            measurement: measurement.into(),
            tags: TagMap::new(),
            fields: FieldMap::new(),
            ts: Utc::now(),
        }
    }

    /// Add a tag.
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Add a field.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Replace the whole tag map.
    pub fn with_tags(mut self, tags: TagMap) -> Self {
        self.tags = tags;
        self
    }

    /// Replace the whole field map.
    pub fn with_fields(mut self, fields: FieldMap) -> Self {
        self.fields = fields;
        self
    }

    /// Override the timestamp (used by tests and replay tooling).
    pub fn with_timestamp(mut self, ts: DateTime<Utc>) -> Self {
        self.ts = ts;
        self
    }

    /// Look up a tag value.
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    /// Look up a field value.
    pub fn field(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }
}
