// Metric snapshot -> record encoding
pub mod encoder;

// Client handle ownership and health checks
pub mod connection;

// Flush/health-check loop
pub mod reporter;

pub use connection::{ConnectionManager, ConnectionStatus};
pub use reporter::{Reporter, report, report_with, report_with_client};
