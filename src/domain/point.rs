//! Single time-stamped records and their line protocol form

use crate::domain::batch::Precision;
use crate::domain::errors::PointError;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;

/// Numeric field value. Integers are written with an `i` suffix so the store
/// keeps their type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue {
    Integer(i64),
    Float(f64),
}

impl FieldValue {
    pub fn as_f64(&self) -> f64 {
        match self {
            FieldValue::Integer(v) => *v as f64,
            FieldValue::Float(v) => *v,
        }
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Integer(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Integer(v) => write!(f, "{v}i"),
            FieldValue::Float(v) => write!(f, "{v}"),
        }
    }
}

/// One measurement: name, tags, numeric fields and a timestamp
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    measurement: String,
    tags: BTreeMap<String, String>,
    fields: BTreeMap<String, FieldValue>,
    time: DateTime<Utc>,
    nanos: i64,
}

impl Point {
    /// Build a point, rejecting anything the store could not parse back
    pub fn new(
        measurement: impl Into<String>,
        tags: BTreeMap<String, String>,
        fields: BTreeMap<String, FieldValue>,
        time: DateTime<Utc>,
    ) -> Result<Self, PointError> {
        let measurement = measurement.into();
        if measurement.is_empty() {
            return Err(PointError::EmptyMeasurement);
        }
        if fields.is_empty() {
            return Err(PointError::NoFields { measurement });
        }
        for (key, value) in &fields {
            if key.is_empty() {
                return Err(PointError::EmptyFieldKey { measurement });
            }
            if let FieldValue::Float(v) = value
                && !v.is_finite()
            {
                return Err(PointError::UnsupportedFieldValue {
                    field: key.clone(),
                    value: *v,
                    measurement,
                });
            }
        }
        let Some(nanos) = time.timestamp_nanos_opt() else {
            return Err(PointError::TimestampOutOfRange { measurement });
        };

        Ok(Self {
            measurement,
            tags,
            fields,
            time,
            nanos,
        })
    }

    pub fn measurement(&self) -> &str {
        &self.measurement
    }

    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    pub fn fields(&self) -> &BTreeMap<String, FieldValue> {
        &self.fields
    }

    pub fn field(&self, key: &str) -> Option<FieldValue> {
        self.fields.get(key).copied()
    }

    pub fn time(&self) -> DateTime<Utc> {
        self.time
    }

    /// Render as one line of line protocol (without trailing newline).
    ///
    /// Tags with an empty key or value are left out.
    pub fn line(&self, precision: Precision) -> String {
        let mut line = escape(&self.measurement, &[',', ' ']);

        for (key, value) in &self.tags {
            if key.is_empty() || value.is_empty() {
                continue;
            }
            line.push(',');
            line.push_str(&escape(key, &[',', '=', ' ']));
            line.push('=');
            line.push_str(&escape(value, &[',', '=', ' ']));
        }

        let fields = self
            .fields
            .iter()
            .map(|(key, value)| format!("{}={value}", escape(key, &[',', '=', ' '])))
            .collect::<Vec<_>>()
            .join(",");

        format!("{line} {fields} {}", self.nanos / precision.nanos())
    }
}

fn escape(s: &str, special: &[char]) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        if special.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
