//! Store connection settings parsed from environment variables.

use anyhow::{Result, bail};

pub const DEFAULT_ADDRESS: &str = "http://127.0.0.1:8086";

/// InfluxDB connection configuration
#[derive(Clone, Default, PartialEq)]
pub struct InfluxDbEnvConfig {
    pub address: String,
    pub database: String,
    pub username: String,
    pub password: String,
    pub retention_policy: String,
}

impl InfluxDbEnvConfig {
    pub fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self> {
        let Some(database) = lookup("INFLUXDB_DATABASE").filter(|d| !d.is_empty()) else {
            bail!("INFLUXDB_DATABASE must be set");
        };

        Ok(Self {
            address: lookup("INFLUXDB_URL").unwrap_or_else(|| DEFAULT_ADDRESS.to_string()),
            database,
            username: lookup("INFLUXDB_USERNAME").unwrap_or_default(),
            password: lookup("INFLUXDB_PASSWORD").unwrap_or_default(),
            retention_policy: lookup("INFLUXDB_RETENTION_POLICY").unwrap_or_default(),
        })
    }
}

impl std::fmt::Debug for InfluxDbEnvConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InfluxDbEnvConfig")
            .field("address", &self.address)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("retention_policy", &self.retention_policy)
            .finish()
    }
}
