//! Push-based metrics reporter
//!
//! A single loop owns two timers. Every flush interval the registry is
//! encoded into one batch and written to the store; every health-check
//! interval the store is pinged and the client handle recreated if the ping
//! fails. The two never run concurrently, and no error stops the loop.

use crate::application::connection::{ConnectionManager, ConnectionStatus};
use crate::application::encoder;
use crate::config::{HEALTH_CHECK_INTERVAL, PRECISION, ReporterConfig};
use crate::domain::batch::{BatchPoints, BatchPointsConfig};
use crate::domain::errors::{FlushError, ReporterError};
use crate::domain::metrics::Registry;
use crate::domain::point::Point;
use crate::domain::ports::{Connector, TimeSeriesClient};
use crate::infrastructure::influxdb::HttpConnector;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

pub struct Reporter {
    registry: Arc<Registry>,
    database: String,
    retention_policy: String,
    tags: BTreeMap<String, String>,
    flush_interval: Duration,
    connection: ConnectionManager,
}

impl Reporter {
    /// Create a reporter and its first client handle
    pub fn connect(
        registry: Arc<Registry>,
        config: &ReporterConfig,
        connector: Arc<dyn Connector>,
    ) -> Result<Self, ReporterError> {
        check_config(config)?;
        let connection = ConnectionManager::establish(connector, config.connection_config())?;
        Self::from_parts(registry, config, connection)
    }

    /// Create a reporter around an existing client handle
    pub fn with_client(
        registry: Arc<Registry>,
        config: &ReporterConfig,
        connector: Arc<dyn Connector>,
        client: Arc<dyn TimeSeriesClient>,
    ) -> Result<Self, ReporterError> {
        let connection =
            ConnectionManager::with_client(connector, config.connection_config(), client);
        Self::from_parts(registry, config, connection)
    }

    fn from_parts(
        registry: Arc<Registry>,
        config: &ReporterConfig,
        connection: ConnectionManager,
    ) -> Result<Self, ReporterError> {
        check_config(config)?;
        Ok(Self {
            registry,
            database: config.database.clone(),
            retention_policy: config.retention_policy.clone(),
            tags: config.tags.clone(),
            flush_interval: config.flush_interval,
            connection,
        })
    }

    pub fn connection(&self) -> &ConnectionManager {
        &self.connection
    }

    /// Encode every reportable metric currently in the registry.
    ///
    /// A metric whose record cannot be built is dropped on its own; the rest
    /// are still returned.
    pub fn encode_registry(&self) -> Vec<Point> {
        let mut points = Vec::with_capacity(self.registry.len());
        let mut dropped = 0usize;
        self.registry.each(|name, metric| {
            match encoder::encode(name, metric, &self.tags, Utc::now()) {
                Some(Ok(point)) => points.push(point),
                Some(Err(e)) => {
                    dropped += 1;
                    debug!("Reporter: Dropping {} {}: {}", metric.kind(), name, e);
                }
                None => {}
            }
        });
        if dropped > 0 {
            warn!(
                "Reporter: Dropped {} of {} metrics that could not be encoded",
                dropped,
                dropped + points.len()
            );
        }
        points
    }

    /// Run one flush cycle and return the number of points written.
    ///
    /// The batch is written even when it is empty.
    pub async fn flush(&self) -> Result<usize, FlushError> {
        let points = self.encode_registry();

        let mut batch = BatchPoints::new(BatchPointsConfig {
            precision: PRECISION.to_string(),
            database: self.database.clone(),
            retention_policy: self.retention_policy.clone(),
            ..Default::default()
        })?;
        batch.add_points(points);

        self.connection.client().write(&batch).await?;
        debug!(
            "Reporter: Wrote {} points to {}",
            batch.len(),
            self.database
        );
        Ok(batch.len())
    }

    pub async fn health_check(&mut self) -> ConnectionStatus {
        self.connection.health_check().await
    }

    /// Serve both timers until `shutdown` is cancelled.
    ///
    /// The first flush happens one flush interval after start and the first
    /// health check one health-check interval after start. A slow flush or
    /// ping delays the other timer; missed ticks are not replayed.
    pub async fn run(mut self, shutdown: CancellationToken) {
        info!(
            "Reporter: Starting (database: {}, flush interval: {:?}, health check interval: {:?})",
            self.database, self.flush_interval, HEALTH_CHECK_INTERVAL
        );

        let start = Instant::now();
        let mut flush_ticker = interval_at(start + self.flush_interval, self.flush_interval);
        flush_ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut health_ticker = interval_at(start + HEALTH_CHECK_INTERVAL, HEALTH_CHECK_INTERVAL);
        health_ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    info!("Reporter: Shutdown requested, stopping");
                    break;
                }
                _ = flush_ticker.tick() => {
                    if let Err(e) = self.flush().await {
                        error!(
                            "Reporter: Unable to send metrics to {}: {}",
                            self.connection.config().address, e
                        );
                    }
                }
                _ = health_ticker.tick() => {
                    self.health_check().await;
                }
            }
        }
    }
}

/// Reject settings the loop cannot run with
fn check_config(config: &ReporterConfig) -> Result<(), ReporterError> {
    if config.flush_interval.is_zero() {
        return Err(ReporterError::InvalidConfig {
            reason: "flush interval must be greater than zero".to_string(),
        });
    }
    Ok(())
}

/// Report `registry` over HTTP until `shutdown` is cancelled.
///
/// Returns the error without starting the loop when the config is unusable
/// or the first client cannot be created.
pub async fn report(
    registry: Arc<Registry>,
    config: ReporterConfig,
    shutdown: CancellationToken,
) -> Result<(), ReporterError> {
    report_with(registry, config, Arc::new(HttpConnector::new()), shutdown).await
}

/// Like [`report`], with a caller-chosen connector
pub async fn report_with(
    registry: Arc<Registry>,
    config: ReporterConfig,
    connector: Arc<dyn Connector>,
    shutdown: CancellationToken,
) -> Result<(), ReporterError> {
    let reporter = match Reporter::connect(registry, &config, connector) {
        Ok(reporter) => reporter,
        Err(e) => {
            error!("Reporter: Unable to start for {}: {}", config.address, e);
            return Err(e);
        }
    };
    reporter.run(shutdown).await;
    Ok(())
}

/// Report `registry` through an already constructed client handle
pub async fn report_with_client(
    registry: Arc<Registry>,
    config: ReporterConfig,
    connector: Arc<dyn Connector>,
    client: Arc<dyn TimeSeriesClient>,
    shutdown: CancellationToken,
) -> Result<(), ReporterError> {
    let reporter = match Reporter::with_client(registry, &config, connector, client) {
        Ok(reporter) => reporter,
        Err(e) => {
            error!("Reporter: Unable to start for {}: {}", config.address, e);
            return Err(e);
        }
    };
    reporter.run(shutdown).await;
    Ok(())
}
