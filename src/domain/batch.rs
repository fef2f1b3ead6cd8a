//! Batches of points submitted to the store in one write

use crate::domain::errors::BatchError;
use crate::domain::point::Point;
use std::fmt;
use std::str::FromStr;

/// Unit of the timestamps written in a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Precision {
    #[default]
    Nanoseconds,
    Microseconds,
    Milliseconds,
    Seconds,
    Minutes,
    Hours,
}

impl Precision {
    /// Value of the `precision` query parameter of the write endpoint
    pub fn query_value(self) -> &'static str {
        match self {
            Self::Nanoseconds => "ns",
            Self::Microseconds => "u",
            Self::Milliseconds => "ms",
            Self::Seconds => "s",
            Self::Minutes => "m",
            Self::Hours => "h",
        }
    }

    /// Length of one unit in nanoseconds
    pub fn nanos(self) -> i64 {
        match self {
            Self::Nanoseconds => 1,
            Self::Microseconds => 1_000,
            Self::Milliseconds => 1_000_000,
            Self::Seconds => 1_000_000_000,
            Self::Minutes => 60 * 1_000_000_000,
            Self::Hours => 3_600 * 1_000_000_000,
        }
    }
}

impl FromStr for Precision {
    type Err = BatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "n" | "ns" => Ok(Precision::Nanoseconds),
            "u" | "us" | "µs" => Ok(Precision::Microseconds),
            "ms" => Ok(Precision::Milliseconds),
            "s" => Ok(Precision::Seconds),
            "m" => Ok(Precision::Minutes),
            "h" => Ok(Precision::Hours),
            _ => Err(BatchError::InvalidPrecision {
                precision: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.query_value())
    }
}

/// Settings a batch is created with.
///
/// An empty precision means nanoseconds; empty retention policy and write
/// consistency leave the server defaults in place.
#[derive(Debug, Clone, Default)]
pub struct BatchPointsConfig {
    pub precision: String,
    pub database: String,
    pub retention_policy: String,
    pub write_consistency: String,
}

#[derive(Debug, Clone)]
pub struct BatchPoints {
    points: Vec<Point>,
    database: String,
    retention_policy: String,
    write_consistency: String,
    precision: Precision,
}

impl BatchPoints {
    pub fn new(config: BatchPointsConfig) -> Result<Self, BatchError> {
        let precision = if config.precision.is_empty() {
            Precision::default()
        } else {
            config.precision.parse()?
        };

        Ok(Self {
            points: Vec::new(),
            database: config.database,
            retention_policy: config.retention_policy,
            write_consistency: config.write_consistency,
            precision,
        })
    }

    pub fn add_point(&mut self, point: Point) {
        self.points.push(point);
    }

    pub fn add_points(&mut self, points: impl IntoIterator<Item = Point>) {
        self.points.extend(points);
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn retention_policy(&self) -> &str {
        &self.retention_policy
    }

    pub fn write_consistency(&self) -> &str {
        &self.write_consistency
    }

    pub fn precision(&self) -> Precision {
        self.precision
    }

    /// Line protocol body, one newline-terminated line per point
    pub fn body(&self) -> String {
        let mut body = String::new();
        for point in &self.points {
            body.push_str(&point.line(self.precision));
            body.push('\n');
        }
        body
    }
}
