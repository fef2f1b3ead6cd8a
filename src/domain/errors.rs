use thiserror::Error;

/// Errors raised by the metrics registry
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Duplicate metric: {name}")]
    DuplicateMetric { name: String },

    #[error("Metric {name} is a {found}, not a {expected}")]
    KindMismatch {
        name: String,
        expected: &'static str,
        found: &'static str,
    },
}

/// Errors related to building a single record
#[derive(Debug, Error, PartialEq)]
pub enum PointError {
    #[error("Point has an empty measurement name")]
    EmptyMeasurement,

    #[error("Point {measurement} has no fields")]
    NoFields { measurement: String },

    #[error("Point {measurement} has a field with an empty key")]
    EmptyFieldKey { measurement: String },

    #[error("Point {measurement}: {value} is an unsupported value for field {field}")]
    UnsupportedFieldValue {
        measurement: String,
        field: String,
        value: f64,
    },

    #[error("Point {measurement}: timestamp is out of range")]
    TimestampOutOfRange { measurement: String },
}

/// Errors related to batch construction
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BatchError {
    #[error("Invalid precision: {precision}")]
    InvalidPrecision { precision: String },
}

/// Errors related to the remote time-series store and connectivity
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Invalid address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("Unsupported protocol scheme: {scheme}")]
    UnsupportedScheme { scheme: String },

    #[error("Failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Server responded with status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Connection unavailable: {reason}")]
    Unavailable { reason: String },
}

/// Errors that keep a reporter from starting
#[derive(Debug, Error)]
pub enum ReporterError {
    #[error("Invalid reporter config: {reason}")]
    InvalidConfig { reason: String },

    #[error("Unable to make client: {0}")]
    Connect(#[from] ClientError),
}

/// Errors that abort a whole flush cycle
#[derive(Debug, Error)]
pub enum FlushError {
    #[error("Unable to create batch: {0}")]
    Batch(#[from] BatchError),

    #[error("Unable to write batch: {0}")]
    Write(#[from] ClientError),
}
