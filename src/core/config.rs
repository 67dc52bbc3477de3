//! # Lifecycle configuration.
//!
//! Provides [`Config`], the settings consumed by
//! [`Lifecycle`](crate::Lifecycle).
//!
//! Connection retry pacing is deliberately **not** configurable here: the
//! attempt budget and backoff schedule are fixed constants of the
//! connection establisher.
//!
//! ## Field semantics
//! - `database_url`: connection string handed to the database collaborator
//! - `port`: listener port (used by [`Config::bind_addr`])
//! - `start_timeout`: deadline for the listener start during boot
//! - `shutdown_timeout`: deadline for the whole teardown sequence
//! - `bus_capacity`: event bus ring buffer size (min 1; clamped by Bus)

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

/// Failure loading configuration from the environment.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A variable was set to a value that does not parse.
    #[error("invalid value for {name}: {reason}")]
    Invalid {
        /// Environment variable name.
        name: &'static str,
        /// Parse failure description.
        reason: String,
    },
}

/// Settings for a supervised service lifecycle.
///
/// ## Notes
/// All fields are public; [`Config::from_env`] fills them from the
/// environment with the documented defaults for anything unset.
#[derive(Clone, Debug)]
pub struct Config {
    /// Connection string handed to the database collaborator.
    pub database_url: String,

    /// Listener port.
    pub port: u16,

    /// Maximum time to wait for the listener to start during boot.
    ///
    /// When exceeded, startup fails and the lifecycle shuts down with a
    /// startup-failure reason.
    pub start_timeout: Duration,

    /// Maximum time to wait for close operations during teardown.
    ///
    /// When exceeded, the shutdown reports a timeout error and the exit
    /// disposition is a failure.
    pub shutdown_timeout: Duration,

    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Slow subscribers that lag behind more than `bus_capacity` messages
    /// will receive `Lagged` and skip older items. Minimum value is 1
    /// (enforced by Bus).
    pub bus_capacity: usize,
}

impl Config {
    /// Loads configuration from the environment.
    ///
    /// Reads `DATABASE_URL`, `PORT`, `SERVER_START_TIMEOUT` (ms),
    /// `SERVER_SHUTDOWN_TIMEOUT` (ms) and `BUS_CAPACITY`; anything unset
    /// keeps its [`Default`] value. A set-but-unparsable variable is an
    /// error rather than a silent fallback.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut cfg = Config::default();

        if let Ok(url) = std::env::var("DATABASE_URL") {
            cfg.database_url = url;
        }
        if let Some(port) = parse_var::<u16>("PORT")? {
            cfg.port = port;
        }
        if let Some(ms) = parse_var::<u64>("SERVER_START_TIMEOUT")? {
            cfg.start_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_var::<u64>("SERVER_SHUTDOWN_TIMEOUT")? {
            cfg.shutdown_timeout = Duration::from_millis(ms);
        }
        if let Some(cap) = parse_var::<usize>("BUS_CAPACITY")? {
            cfg.bus_capacity = cap;
        }

        Ok(cfg)
    }

    /// The all-interfaces socket address for [`Config::port`].
    #[inline]
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.port))
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `database_url = ""` (must be provided for a real deployment)
    /// - `port = 8080`
    /// - `start_timeout = 30s`
    /// - `shutdown_timeout = 10s`
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            database_url: String::new(),
            port: 8080,
            start_timeout: Duration::from_millis(30_000),
            shutdown_timeout: Duration::from_millis(10_000),
            bus_capacity: 1024,
        }
    }
}

/// Reads and parses one optional environment variable.
fn parse_var<T>(name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::Invalid {
                name,
                reason: e.to_string(),
            }),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Environment is process-global; serialize tests that touch it.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn defaults_match_contract() {
        let cfg = Config::default();
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.start_timeout, Duration::from_millis(30_000));
        assert_eq!(cfg.shutdown_timeout, Duration::from_millis(10_000));
        assert_eq!(cfg.bus_capacity, 1024);
        assert!(cfg.database_url.is_empty());
    }

    #[test]
    fn from_env_reads_overrides() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::set_var("DATABASE_URL", "postgres://localhost/app");
        std::env::set_var("PORT", "9090");
        std::env::set_var("SERVER_START_TIMEOUT", "5000");
        std::env::set_var("SERVER_SHUTDOWN_TIMEOUT", "2500");

        let cfg = Config::from_env().unwrap();
        assert_eq!(cfg.database_url, "postgres://localhost/app");
        assert_eq!(cfg.port, 9090);
        assert_eq!(cfg.start_timeout, Duration::from_millis(5000));
        assert_eq!(cfg.shutdown_timeout, Duration::from_millis(2500));

        std::env::remove_var("DATABASE_URL");
        std::env::remove_var("PORT");
        std::env::remove_var("SERVER_START_TIMEOUT");
        std::env::remove_var("SERVER_SHUTDOWN_TIMEOUT");
    }

    #[test]
    fn from_env_rejects_garbage() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::set_var("PORT", "not-a-port");

        let err = Config::from_env().unwrap_err();
        assert!(err.to_string().contains("PORT"));

        std::env::remove_var("PORT");
    }

    #[test]
    fn bind_addr_uses_port() {
        let cfg = Config {
            port: 4321,
            ..Config::default()
        };
        assert_eq!(cfg.bind_addr().port(), 4321);
    }
}
