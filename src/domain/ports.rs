use crate::domain::batch::BatchPoints;
use crate::domain::errors::ClientError;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Where and how to reach the time-series store
#[derive(Clone, Default)]
pub struct ConnectionConfig {
    pub address: String,
    pub username: String,
    pub password: String,
    pub timeout: Duration,
    pub user_agent: String,
}

impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("address", &self.address)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

/// Result of a successful ping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PingResponse {
    pub rtt: Duration,
    pub version: String,
}

/// Live handle to the time-series store
#[async_trait]
pub trait TimeSeriesClient: Send + Sync {
    async fn ping(&self, timeout: Duration) -> Result<PingResponse, ClientError>;
    async fn write(&self, batch: &BatchPoints) -> Result<(), ClientError>;
}

/// Creates client handles; used for the initial connection and every
/// reconnect after a failed health check
pub trait Connector: Send + Sync {
    fn connect(&self, config: &ConnectionConfig) -> Result<Arc<dyn TimeSeriesClient>, ClientError>;
}
