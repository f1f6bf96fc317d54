//! Sample encoders.
//!
//! Two wire shapes: InfluxDB line protocol (default) and one JSON object per
//! line. Both produce exactly one line per sample.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

use crate::metric::{FieldValue, Metric};

/// Output encoding selected in the configuration.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, EnumString, Display,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum OutputFormat {
    /// InfluxDB line protocol.
    #[default]
    LineProtocol,
    /// One JSON object per line.
    Json,
}

/// Encode one sample to a single line (without trailing newline).
pub fn encode_metric(metric: &Metric, format: OutputFormat) -> String {
    match format {
        OutputFormat::LineProtocol => encode_line(metric),
        OutputFormat::Json => encode_json(metric),
    }
}

/// Line protocol: `measurement,tag=value field=value,... <ts-ns>`.
fn encode_line(metric: &Metric) -> String {
    let mut line = escape_measurement(&metric.measurement);

    for (key, value) in &metric.tags {
        line.push(',');
        line.push_str(&escape_tag(key));
        line.push('=');
        line.push_str(&escape_tag(value));
    }

    line.push(' ');
    let mut first = true;
    for (key, value) in &metric.fields {
        if !first {
            line.push(',');
        }
        first = false;
        line.push_str(&escape_tag(key));
        line.push('=');
        line.push_str(&encode_field_value(value));
    }

    line.push(' ');
    line.push_str(&metric.ts.timestamp_nanos_opt().unwrap_or_default().to_string());
    line
}

fn encode_json(metric: &Metric) -> String {
    // Metric is a plain serde struct; failure here would mean a non-string
    // map key, which the types rule out.
    serde_json::to_string(metric).unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to encode metric as JSON");
        String::from("{}")
    })
}

fn encode_field_value(value: &FieldValue) -> String {
    match value {
        FieldValue::Integer(v) => format!("{v}i"),
        FieldValue::Float(v) => format!("{v}"),
        FieldValue::Boolean(v) => format!("{v}"),
        FieldValue::Text(v) => format!("\"{}\"", v.replace('\\', "\\\\").replace('"', "\\\"")),
    }
}

/// Measurement names escape commas and spaces.
fn escape_measurement(s: &str) -> String {
    s.replace(',', "\\,").replace(' ', "\\ ")
}

/// Tag keys, tag values and field keys escape commas, equals signs and spaces.
fn escape_tag(s: &str) -> String {
    s.replace(',', "\\,").replace('=', "\\=").replace(' ', "\\ ")
}
