//! Configuration Module
//!
//! Handles loading and managing cache configuration from environment variables.

use std::env;
use std::time::Duration;

/// Default entry lifetime: 30 days.
pub const DEFAULT_TTL_SECS: u64 = 30 * 24 * 60 * 60;

/// Default upper bound on a single provider call.
pub const DEFAULT_COMPUTE_TIMEOUT_MS: u64 = 120_000;

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// TTL in seconds applied when a caller does not pass one
    pub default_ttl: u64,
    /// HTTP server port
    pub server_port: u16,
    /// Expired-entry sweep interval in seconds, 0 = lazy eviction only
    pub cleanup_interval: u64,
    /// Share one provider call between concurrent misses on the same key
    pub coalesce: bool,
    /// Provider call deadline in milliseconds, 0 = unbounded
    pub compute_timeout_ms: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `DEFAULT_TTL` - Default TTL in seconds (default: 2592000)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CLEANUP_INTERVAL` - Sweep frequency in seconds (default: 0, disabled)
    /// - `COALESCE` - `true`/`false`/`1`/`0` (default: true)
    /// - `COMPUTE_TIMEOUT_MS` - Provider deadline (default: 120000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            default_ttl: env::var("DEFAULT_TTL")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|ttl| *ttl > 0)
                .unwrap_or(defaults.default_ttl),
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.server_port),
            cleanup_interval: env::var("CLEANUP_INTERVAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.cleanup_interval),
            coalesce: env::var("COALESCE")
                .ok()
                .and_then(|v| parse_bool(&v))
                .unwrap_or(defaults.coalesce),
            compute_timeout_ms: env::var("COMPUTE_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.compute_timeout_ms),
        }
    }

    /// Default TTL as a Duration.
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl)
    }

    /// Provider deadline, or None when unbounded.
    pub fn compute_timeout(&self) -> Option<Duration> {
        (self.compute_timeout_ms > 0).then(|| Duration::from_millis(self.compute_timeout_ms))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_ttl: DEFAULT_TTL_SECS,
            server_port: 3000,
            cleanup_interval: 0,
            coalesce: true,
            compute_timeout_ms: DEFAULT_COMPUTE_TIMEOUT_MS,
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.default_ttl, 2_592_000);
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.cleanup_interval, 0);
        assert!(config.coalesce);
        assert_eq!(config.compute_timeout(), Some(Duration::from_secs(120)));
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        env::remove_var("DEFAULT_TTL");
        env::remove_var("SERVER_PORT");
        env::remove_var("CLEANUP_INTERVAL");
        env::remove_var("COALESCE");
        env::remove_var("COMPUTE_TIMEOUT_MS");

        let config = Config::from_env();
        assert_eq!(config.default_ttl(), Duration::from_secs(DEFAULT_TTL_SECS));
        assert_eq!(config.server_port, 3000);
        assert!(config.coalesce);
    }

    #[test]
    fn test_zero_timeout_disables_deadline() {
        let config = Config {
            compute_timeout_ms: 0,
            ..Config::default()
        };
        assert!(config.compute_timeout().is_none());
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool(" 0 "), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
