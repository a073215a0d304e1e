//! Configuration for the strategy host server.
//!
//! Defaults can be overridden via environment variables:
//!
//! - `BRIDGE_BIND_ADDR`         (default: "0.0.0.0")
//! - `BRIDGE_PORT`              (default: "6474")
//! - `BRIDGE_MAX_CLIENTS`       (default: "64")
//! - `BRIDGE_READ_TIMEOUT_SECS` (default: "0", meaning no timeout)
//! - `BRIDGE_CAPACITY_VOLUME`   (default: "10000000" base units)

use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// IP address / interface to bind to (e.g. "0.0.0.0" or "127.0.0.1").
    pub bind_addr: String,

    pub port: u16,

    /// Maximum number of simultaneously connected terminals.
    pub max_clients: usize,

    /// Seconds a session may wait for the terminal; 0 waits forever.
    pub read_timeout_secs: u64,

    /// Total volume all expert advisors may hold at once.
    pub capacity_volume: i64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind_addr: "0.0.0.0".to_string(),
            port: 6474,
            max_clients: 64,
            read_timeout_secs: 0,
            capacity_volume: 10_000_000,
        }
    }
}

impl Config {
    /// Construct a `Config` from environment variables, falling back
    /// to the defaults.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let defaults = Config::default();
        Ok(Config {
            bind_addr: lookup("BRIDGE_BIND_ADDR").unwrap_or(defaults.bind_addr),
            port: read_or_default(&lookup, "BRIDGE_PORT", defaults.port)?,
            max_clients: read_or_default(&lookup, "BRIDGE_MAX_CLIENTS", defaults.max_clients)?,
            read_timeout_secs: read_or_default(
                &lookup,
                "BRIDGE_READ_TIMEOUT_SECS",
                defaults.read_timeout_secs,
            )?,
            capacity_volume: read_or_default(
                &lookup,
                "BRIDGE_CAPACITY_VOLUME",
                defaults.capacity_volume,
            )?,
        })
    }

    /// Convenience: `addr:port` socket string.
    pub fn socket_addr_string(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        (self.read_timeout_secs > 0).then(|| Duration::from_secs(self.read_timeout_secs))
    }
}

fn read_or_default<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(val) => val
            .trim()
            .parse::<T>()
            .with_context(|| format!("invalid value {:?} for {}", val, key)),
        None => Ok(default),
    }
}
