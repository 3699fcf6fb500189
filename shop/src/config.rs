//! Configuration management for the shop.
//!
//! Loads configuration from environment variables with sensible defaults.
//! A variable that is set but unparsable is an error, not a default.

use crate::error::ConfigError;
use crate::products_api::DEFAULT_KEEP_UNUSED;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use storefront_catalog::DEFAULT_BASE_URL;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopConfig {
    /// Catalog configuration
    pub catalog: CatalogConfig,
    /// Store and query cache configuration
    pub store: StoreSettings,
    /// Prometheus scrape address; metrics are off when unset
    pub metrics_addr: Option<SocketAddr>,
}

/// Catalog client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Base URL of the catalog API (`CATALOG_BASE_URL`)
    pub base_url: String,
    /// Per-request timeout in seconds, 0 for none (`CATALOG_TIMEOUT_SECS`)
    pub timeout_secs: u64,
}

/// Store configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSettings {
    /// Seconds an unused query entry is kept (`QUERY_KEEP_UNUSED_SECS`)
    pub keep_unused_secs: u64,
    /// Seconds a query waits for its result (`QUERY_WAIT_SECS`)
    pub query_wait_secs: u64,
    /// Capacity of the action broadcast channel (`STORE_BROADCAST_CAPACITY`)
    pub broadcast_capacity: usize,
    /// Graceful shutdown timeout in seconds (`SHUTDOWN_TIMEOUT`)
    pub shutdown_timeout_secs: u64,
}

impl Default for ShopConfig {
    fn default() -> Self {
        Self {
            catalog: CatalogConfig {
                base_url: DEFAULT_BASE_URL.to_string(),
                timeout_secs: 30,
            },
            store: StoreSettings {
                keep_unused_secs: DEFAULT_KEEP_UNUSED.as_secs(),
                query_wait_secs: 30,
                broadcast_capacity: 16,
                shutdown_timeout_secs: 30,
            },
            metrics_addr: None,
        }
    }
}

impl ShopConfig {
    /// Load configuration from the process environment.
    ///
    /// A `.env` file, if present, is read first.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if a variable is set but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if a variable is set but invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Ok(Self {
            catalog: CatalogConfig {
                base_url: lookup("CATALOG_BASE_URL").unwrap_or(defaults.catalog.base_url),
                timeout_secs: parse_var(&lookup, "CATALOG_TIMEOUT_SECS")?
                    .unwrap_or(defaults.catalog.timeout_secs),
            },
            store: StoreSettings {
                keep_unused_secs: parse_var(&lookup, "QUERY_KEEP_UNUSED_SECS")?
                    .unwrap_or(defaults.store.keep_unused_secs),
                query_wait_secs: parse_var(&lookup, "QUERY_WAIT_SECS")?
                    .unwrap_or(defaults.store.query_wait_secs),
                broadcast_capacity: parse_var(&lookup, "STORE_BROADCAST_CAPACITY")?
                    .unwrap_or(defaults.store.broadcast_capacity),
                shutdown_timeout_secs: parse_var(&lookup, "SHUTDOWN_TIMEOUT")?
                    .unwrap_or(defaults.store.shutdown_timeout_secs),
            },
            metrics_addr: parse_var(&lookup, "METRICS_ADDR")?,
        })
    }

    /// Catalog request timeout, `None` when disabled
    #[must_use]
    pub const fn catalog_timeout(&self) -> Option<Duration> {
        match self.catalog.timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    /// Grace period for unused query entries
    #[must_use]
    pub const fn keep_unused(&self) -> Duration {
        Duration::from_secs(self.store.keep_unused_secs)
    }

    /// How long a query waits for its result
    #[must_use]
    pub const fn query_wait(&self) -> Duration {
        Duration::from_secs(self.store.query_wait_secs)
    }

    /// Graceful shutdown timeout
    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.store.shutdown_timeout_secs)
    }
}

fn parse_var<F, T>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    let Some(value) = lookup(var) else {
        return Ok(None);
    };
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse()
        .map(Some)
        .map_err(|_| ConfigError::InvalidValue { var, value })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Tests can unwrap
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |var| vars.get(var).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = ShopConfig::from_lookup(lookup(&[])).unwrap();

        assert_eq!(config, ShopConfig::default());
        assert_eq!(config.catalog.base_url, "https://fakestoreapi.com/");
        assert_eq!(config.keep_unused(), Duration::from_secs(60));
        assert_eq!(config.catalog_timeout(), Some(Duration::from_secs(30)));
        assert!(config.metrics_addr.is_none());
    }

    #[test]
    fn reads_overrides() {
        let config = ShopConfig::from_lookup(lookup(&[
            ("CATALOG_BASE_URL", "http://localhost:3000/"),
            ("CATALOG_TIMEOUT_SECS", "0"),
            ("QUERY_KEEP_UNUSED_SECS", "5"),
            ("STORE_BROADCAST_CAPACITY", "64"),
            ("METRICS_ADDR", "127.0.0.1:9090"),
        ]))
        .unwrap();

        assert_eq!(config.catalog.base_url, "http://localhost:3000/");
        assert_eq!(config.catalog_timeout(), None);
        assert_eq!(config.keep_unused(), Duration::from_secs(5));
        assert_eq!(config.store.broadcast_capacity, 64);
        assert_eq!(config.metrics_addr, Some("127.0.0.1:9090".parse().unwrap()));
    }

    #[test]
    fn rejects_unparsable_values() {
        let error = ShopConfig::from_lookup(lookup(&[("QUERY_KEEP_UNUSED_SECS", "soon")])).unwrap_err();

        assert_eq!(
            error,
            ConfigError::InvalidValue {
                var: "QUERY_KEEP_UNUSED_SECS",
                value: "soon".to_string(),
            }
        );
    }
}
