//! Reporter scheduling and tagging parsed from environment variables.

use anyhow::{Context, Result, bail};
use std::collections::BTreeMap;
use std::time::Duration;

pub const DEFAULT_FLUSH_INTERVAL_SECS: u64 = 10;

/// Reporter environment configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ReporterEnvConfig {
    pub flush_interval: Duration,
    pub tags: BTreeMap<String, String>,
}

impl Default for ReporterEnvConfig {
    fn default() -> Self {
        Self {
            flush_interval: Duration::from_secs(DEFAULT_FLUSH_INTERVAL_SECS),
            tags: BTreeMap::new(),
        }
    }
}

impl ReporterEnvConfig {
    pub fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self> {
        let interval_secs = match lookup("REPORTER_INTERVAL_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .context("Failed to parse REPORTER_INTERVAL_SECS")?,
            None => DEFAULT_FLUSH_INTERVAL_SECS,
        };
        if interval_secs == 0 {
            bail!("REPORTER_INTERVAL_SECS must be greater than zero");
        }

        let tags = match lookup("REPORTER_TAGS") {
            Some(raw) => parse_tags(&raw).context("Failed to parse REPORTER_TAGS")?,
            None => BTreeMap::new(),
        };

        Ok(Self {
            flush_interval: Duration::from_secs(interval_secs),
            tags,
        })
    }
}

/// Parse `key=value,key=value` into a tag map. Blank entries are ignored.
pub fn parse_tags(raw: &str) -> Result<BTreeMap<String, String>> {
    let mut tags = BTreeMap::new();
    for pair in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let Some((key, value)) = pair.split_once('=') else {
            bail!("Invalid tag '{}': expected key=value", pair);
        };
        let (key, value) = (key.trim(), value.trim());
        if key.is_empty() || value.is_empty() {
            bail!("Invalid tag '{}': key and value must be non-empty", pair);
        }
        tags.insert(key.to_string(), value.to_string());
    }
    Ok(tags)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reporter_config_defaults() {
        let config = ReporterEnvConfig::from_lookup(&|_: &str| None).unwrap();
        assert_eq!(config, ReporterEnvConfig::default());
    }

    #[test]
    fn test_interval_must_be_positive() {
        let err = ReporterEnvConfig::from_lookup(&|key: &str| {
            (key == "REPORTER_INTERVAL_SECS").then(|| "0".to_string())
        })
        .unwrap_err();
        assert!(err.to_string().contains("greater than zero"));

        assert!(
            ReporterEnvConfig::from_lookup(&|key: &str| {
                (key == "REPORTER_INTERVAL_SECS").then(|| "soon".to_string())
            })
            .is_err()
        );
    }

    #[test]
    fn test_parse_tags() {
        let tags = parse_tags(" host=web-1, region = eu-west ,,").unwrap();
        assert_eq!(tags.len(), 2);
        assert_eq!(tags["host"], "web-1");
        assert_eq!(tags["region"], "eu-west");

        assert!(parse_tags("host").is_err());
        assert!(parse_tags("=web-1").is_err());
        assert!(parse_tags("").unwrap().is_empty());
    }
}
