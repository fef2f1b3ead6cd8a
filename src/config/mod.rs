//! Configuration module for the reporter.
//!
//! Settings come from environment variables (optionally seeded from a `.env`
//! file) or from a TOML file, organized by concern: the store connection and
//! the reporter schedule.

mod influxdb_config;
mod reporter_env_config;

pub use influxdb_config::{DEFAULT_ADDRESS, InfluxDbEnvConfig};
pub use reporter_env_config::{DEFAULT_FLUSH_INTERVAL_SECS, ReporterEnvConfig, parse_tags};

use crate::domain::ports::ConnectionConfig;
use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::env;
use std::path::Path;
use std::time::Duration;

/// How often the store is pinged
pub const HEALTH_CHECK_INTERVAL: Duration = Duration::from_secs(5);

/// Timeout for creating a client and for its requests
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(1);

/// Timestamp precision of every written batch
pub const PRECISION: &str = "ns";

/// Full reporter configuration.
#[derive(Clone, PartialEq)]
pub struct ReporterConfig {
    pub address: String,
    pub database: String,
    pub username: String,
    pub password: String,
    pub retention_policy: String,
    pub flush_interval: Duration,
    /// Static tags added to every record
    pub tags: BTreeMap<String, String>,
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_string(),
            database: String::new(),
            username: String::new(),
            password: String::new(),
            retention_policy: String::new(),
            flush_interval: Duration::from_secs(DEFAULT_FLUSH_INTERVAL_SECS),
            tags: BTreeMap::new(),
        }
    }
}

/// On-disk layout of a TOML config file
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    address: String,
    database: String,
    username: String,
    password: String,
    retention_policy: String,
    flush_interval_secs: u64,
    tags: BTreeMap<String, String>,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_string(),
            database: String::new(),
            username: String::new(),
            password: String::new(),
            retention_policy: String::new(),
            flush_interval_secs: DEFAULT_FLUSH_INTERVAL_SECS,
            tags: BTreeMap::new(),
        }
    }
}

impl ReporterConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to its
    /// value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let influxdb =
            InfluxDbEnvConfig::from_lookup(&lookup).context("Failed to load InfluxDB config")?;
        let reporter =
            ReporterEnvConfig::from_lookup(&lookup).context("Failed to load reporter config")?;

        let config = Self {
            address: influxdb.address,
            database: influxdb.database,
            username: influxdb.username,
            password: influxdb.password,
            retention_policy: influxdb.retention_policy,
            flush_interval: reporter.flush_interval,
            tags: reporter.tags,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let file: FileConfig = toml::from_str(raw).context("Failed to parse reporter config")?;
        let config = Self {
            address: file.address,
            database: file.database,
            username: file.username,
            password: file.password,
            retention_policy: file.retention_policy,
            flush_interval: Duration::from_secs(file.flush_interval_secs),
            tags: file.tags,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        if self.address.is_empty() {
            bail!("InfluxDB address must not be empty");
        }
        if self.database.is_empty() {
            bail!("InfluxDB database must not be empty");
        }
        if self.flush_interval.is_zero() {
            bail!("Flush interval must be greater than zero");
        }
        if let Some((key, value)) = self
            .tags
            .iter()
            .find(|(k, v)| k.is_empty() || v.is_empty())
        {
            bail!("Invalid tag '{}={}': key and value must be non-empty", key, value);
        }
        Ok(())
    }

    /// Settings used to create (and recreate) the store client
    pub fn connection_config(&self) -> ConnectionConfig {
        ConnectionConfig {
            address: self.address.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            timeout: CONNECT_TIMEOUT,
            user_agent: format!("influx-reporter/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl std::fmt::Debug for ReporterConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReporterConfig")
            .field("address", &self.address)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("retention_policy", &self.retention_policy)
            .field("flush_interval", &self.flush_interval)
            .field("tags", &self.tags)
            .finish()
    }
}
