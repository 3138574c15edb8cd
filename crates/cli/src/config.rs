use std::time::Duration;

use taguato_core::limits::{MAX_POLL_ATTEMPTS, POLL_INTERVAL, SEND_DELAY};
use taguato_dispatch::{DispatchConfig, WatchConfig};

/// Default per-request HTTP timeout in seconds.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;

/// Panel configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct PanelConfig {
    /// Gateway base URL (required).
    pub gateway_url: String,
    /// Value of the `apikey` header, if the gateway needs one.
    pub api_key: Option<String>,
    /// Pause between bulk sends (default: `500` ms).
    pub send_delay: Duration,
    /// Pairing poll interval (default: `3` s).
    pub poll_interval: Duration,
    /// Pairing poll budget (default: `40`).
    pub max_poll_attempts: u32,
    /// HTTP request timeout (default: `15` s).
    pub request_timeout: Duration,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),

    #[error("{name} must be a valid {expected}, got {value:?}")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

impl PanelConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default |
    /// |------------------------|---------|
    /// | `GATEWAY_URL`          | --      |
    /// | `GATEWAY_API_KEY`      | --      |
    /// | `SEND_DELAY_MS`        | `500`   |
    /// | `POLL_INTERVAL_SECS`   | `3`     |
    /// | `MAX_POLL_ATTEMPTS`    | `40`    |
    /// | `REQUEST_TIMEOUT_SECS` | `15`    |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let non_empty = |name| lookup(name).filter(|v: &String| !v.trim().is_empty());

        let gateway_url = non_empty("GATEWAY_URL").ok_or(ConfigError::Missing("GATEWAY_URL"))?;
        let api_key = non_empty("GATEWAY_API_KEY");

        let send_delay_ms = parse_or(
            "SEND_DELAY_MS",
            non_empty("SEND_DELAY_MS"),
            SEND_DELAY.as_millis() as u64,
        )?;
        let poll_interval_secs = parse_or(
            "POLL_INTERVAL_SECS",
            non_empty("POLL_INTERVAL_SECS"),
            POLL_INTERVAL.as_secs(),
        )?;
        let max_poll_attempts = parse_or(
            "MAX_POLL_ATTEMPTS",
            non_empty("MAX_POLL_ATTEMPTS"),
            MAX_POLL_ATTEMPTS,
        )?;
        let request_timeout_secs = parse_or(
            "REQUEST_TIMEOUT_SECS",
            non_empty("REQUEST_TIMEOUT_SECS"),
            DEFAULT_REQUEST_TIMEOUT_SECS,
        )?;

        if poll_interval_secs == 0 {
            return Err(ConfigError::Invalid {
                name: "POLL_INTERVAL_SECS",
                expected: "positive integer",
                value: "0".to_string(),
            });
        }

        Ok(Self {
            gateway_url,
            api_key,
            send_delay: Duration::from_millis(send_delay_ms),
            poll_interval: Duration::from_secs(poll_interval_secs),
            max_poll_attempts,
            request_timeout: Duration::from_secs(request_timeout_secs),
        })
    }

    pub fn dispatch_config(&self) -> DispatchConfig {
        DispatchConfig {
            send_delay: self.send_delay,
            ..DispatchConfig::default()
        }
    }

    pub fn watch_config(&self) -> WatchConfig {
        WatchConfig {
            interval: self.poll_interval,
            max_attempts: self.max_poll_attempts,
        }
    }
}

fn parse_or<T: std::str::FromStr>(
    name: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
            name,
            expected: std::any::type_name::<T>(),
            value,
        }),
    }
}
