use crate::domain::errors::ClientError;
use crate::domain::ports::{ConnectionConfig, Connector, TimeSeriesClient};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Timeout of every health-check ping
pub const PING_TIMEOUT: Duration = Duration::from_secs(1);

/// Connectivity to the store as last observed by a health check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
}

/// Owns the current client handle and replaces it when health checks fail.
///
/// The manager is owned by a single task; the handle is never shared for
/// writing, so replacing it needs no lock.
pub struct ConnectionManager {
    connector: Arc<dyn Connector>,
    config: ConnectionConfig,
    client: Arc<dyn TimeSeriesClient>,
    status: ConnectionStatus,
}

impl ConnectionManager {
    /// Create the first handle. Failing here is fatal to the caller.
    pub fn establish(
        connector: Arc<dyn Connector>,
        config: ConnectionConfig,
    ) -> Result<Self, ClientError> {
        let client = connector.connect(&config)?;
        Ok(Self::with_client(connector, config, client))
    }

    /// Adopt a handle built elsewhere; `connector` is still used for reconnects
    pub fn with_client(
        connector: Arc<dyn Connector>,
        config: ConnectionConfig,
        client: Arc<dyn TimeSeriesClient>,
    ) -> Self {
        Self {
            connector,
            config,
            client,
            status: ConnectionStatus::Connected,
        }
    }

    /// Current handle, possibly broken
    pub fn client(&self) -> Arc<dyn TimeSeriesClient> {
        self.client.clone()
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Ping the store; on failure immediately try to build a new handle.
    ///
    /// A failed reconnect keeps the broken handle, so the next health check
    /// goes through the same steps again.
    pub async fn health_check(&mut self) -> ConnectionStatus {
        match self.client.ping(PING_TIMEOUT).await {
            Ok(_) => {
                self.set_status(ConnectionStatus::Connected, None);
            }
            Err(e) => {
                warn!(
                    "ConnectionManager: Ping to {} failed, recreating client: {}",
                    self.config.address, e
                );
                self.set_status(ConnectionStatus::Disconnected, Some(e.to_string()));

                match self.connector.connect(&self.config) {
                    Ok(client) => {
                        self.client = client;
                        info!(
                            "ConnectionManager: Recreated client for {}",
                            self.config.address
                        );
                    }
                    Err(e) => {
                        error!(
                            "ConnectionManager: Unable to recreate client for {}: {}",
                            self.config.address, e
                        );
                    }
                }
            }
        }
        self.status
    }

    fn set_status(&mut self, status: ConnectionStatus, reason: Option<String>) {
        if self.status != status {
            self.status = status;
            info!(
                "ConnectionManager: {} is now {:?}{}",
                self.config.address,
                status,
                reason.map(|r| format!(" ({})", r)).unwrap_or_default()
            );
        }
    }
}
