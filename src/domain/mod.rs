// Instrumentation primitives and registry
pub mod metrics;

// Records and batches
pub mod batch;
pub mod point;

// Port interfaces
pub mod ports;

// Domain-specific error types
pub mod errors;
