use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{Error, Result};

/// Configuration for the time synchronization service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeSyncConfig {
    /// NTP server hostname or IP literal
    pub server: String,
    /// UDP port of the NTP server
    pub port: u16,
    /// How long a single request may wait for its reply
    #[serde(serialize_with = "super::serde::serialize_duration")]
    #[serde(deserialize_with = "super::serde::deserialize_duration")]
    pub request_timeout: Duration,
    /// Delay between attempts.
    ///
    /// `None` reuses the request timeout and counts from the start of each
    /// attempt. An explicit interval is waited in full after a failed attempt.
    #[serde(serialize_with = "super::serde::serialize_opt_duration")]
    #[serde(deserialize_with = "super::serde::deserialize_opt_duration")]
    pub retry_interval: Option<Duration>,
}

impl TimeSyncConfig {
    /// Creates a configuration for the given server with default timings
    pub fn with_server(server: impl Into<String>) -> Self {
        TimeSyncConfig {
            server: server.into(),
            ..Default::default()
        }
    }

    /// Effective delay between two attempts
    pub fn retry_interval(&self) -> Duration {
        self.retry_interval.unwrap_or(self.request_timeout)
    }

    /// Checks that the configuration can drive the retry loop
    pub fn validate(&self) -> Result<()> {
        if self.server.trim().is_empty() {
            return Err(Error::config("Server hostname is empty"));
        }

        if self.port == 0 {
            return Err(Error::config("Server port must be non-zero"));
        }

        if self.request_timeout.is_zero() {
            return Err(Error::config("Request timeout must be non-zero"));
        }

        if self.request_timeout > Duration::from_secs(super::MAX_REQUEST_TIMEOUT_SECS) {
            return Err(Error::config(format!(
                "Request timeout {:?} exceeds {}s",
                self.request_timeout,
                super::MAX_REQUEST_TIMEOUT_SECS
            )));
        }

        if self.retry_interval().is_zero() {
            return Err(Error::config("Retry interval must be non-zero"));
        }

        Ok(())
    }
}

impl Default for TimeSyncConfig {
    fn default() -> Self {
        TimeSyncConfig {
            server: super::DEFAULT_SERVER.to_string(),
            port: super::DEFAULT_PORT,
            request_timeout: Duration::from_secs(super::DEFAULT_REQUEST_TIMEOUT_SECS),
            retry_interval: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TimeSyncConfig::default();
        assert_eq!(config.server, "time.google.com");
        assert_eq!(config.port, 123);
        assert_eq!(config.request_timeout, Duration::from_secs(3));
        // Retry interval follows the timeout unless set
        assert_eq!(config.retry_interval(), Duration::from_secs(3));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let config = TimeSyncConfig::with_server("  ");
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let config = TimeSyncConfig {
            port: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = TimeSyncConfig {
            request_timeout: Duration::ZERO,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = TimeSyncConfig {
            request_timeout: Duration::from_secs(11),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = TimeSyncConfig {
            retry_interval: Some(Duration::ZERO),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = TimeSyncConfig {
            request_timeout: Duration::from_millis(200),
            retry_interval: Some(Duration::from_millis(300)),
            ..TimeSyncConfig::with_server("127.0.0.1")
        };
        assert!(config.validate().is_ok());
        assert_eq!(config.retry_interval(), Duration::from_millis(300));
    }

    #[test]
    fn test_config_from_json() {
        let config: TimeSyncConfig = serde_json::from_str(
            r#"{ "server": "pool.ntp.org", "request_timeout": 5 }"#,
        )
        .unwrap();
        assert_eq!(config.server, "pool.ntp.org");
        assert_eq!(config.port, 123);
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.retry_interval(), Duration::from_secs(5));

        let config: TimeSyncConfig = serde_json::from_str(
            r#"{ "port": 1123, "retry_interval": 1.5 }"#,
        )
        .unwrap();
        assert_eq!(config.server, "time.google.com");
        assert_eq!(config.port, 1123);
        assert_eq!(config.retry_interval(), Duration::from_millis(1500));
    }
}
