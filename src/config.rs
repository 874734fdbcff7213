//! Configuration management for tp-mcp.
//!
//! Configuration can be set via environment variables:
//! - `TP_AUTH_COOKIE` - Optional. Session cookie override; read by the credential resolver, not here.
//! - `TP_MCP_CONFIG_DIR` - Optional. Directory for `credentials.enc`. Defaults to `~/.config/trainingpeaks-mcp`.
//! - `TP_API_BASE_URL` - Optional. TrainingPeaks API base URL. Defaults to `https://tpapi.trainingpeaks.com`.
//! - `TP_REQUEST_TIMEOUT_SECS` - Optional. Validation request timeout. Defaults to `10`.
//! - `TP_MIN_REQUEST_INTERVAL_MS` - Optional. Minimum spacing between API requests. Defaults to `150`.
//! - `TP_MCP_KEY_PASSWORD` - Optional. Extra input to the file encryption key.
//! - `TP_MCP_DISABLE_KEYRING` - Optional. Skip the OS keyring and use the file only.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::auth::validator::{TP_API_BASE, VALIDATION_TIMEOUT};
use crate::client::throttle::MIN_REQUEST_INTERVAL;
use crate::util::{default_config_dir, parse_bool};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Runtime configuration.
#[derive(Clone)]
pub struct Config {
    /// Directory holding the encrypted credential file
    pub config_dir: PathBuf,

    /// TrainingPeaks API base URL (no trailing slash)
    pub api_base_url: String,

    /// Timeout for a single validation request
    pub request_timeout: Duration,

    /// Minimum spacing between outbound API requests
    pub min_request_interval: Duration,

    /// Optional password mixed into the file key
    pub key_password: Option<String>,

    /// Never touch the OS keyring
    pub disable_keyring: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self::new(default_config_dir())
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("config_dir", &self.config_dir)
            .field("api_base_url", &self.api_base_url)
            .field("request_timeout", &self.request_timeout)
            .field("min_request_interval", &self.min_request_interval)
            .field(
                "key_password",
                &self.key_password.as_ref().map(|_| "<redacted>"),
            )
            .field("disable_keyring", &self.disable_keyring)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if a numeric variable does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let config_dir = non_empty("TP_MCP_CONFIG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(default_config_dir);

        let api_base_url = non_empty("TP_API_BASE_URL")
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .unwrap_or_else(|| TP_API_BASE.to_string());

        let request_timeout = match non_empty("TP_REQUEST_TIMEOUT_SECS") {
            Some(value) => Duration::from_secs(parse_positive("TP_REQUEST_TIMEOUT_SECS", &value)?),
            None => VALIDATION_TIMEOUT,
        };

        let min_request_interval = match non_empty("TP_MIN_REQUEST_INTERVAL_MS") {
            Some(value) => Duration::from_millis(
                value
                    .trim()
                    .parse()
                    .map_err(|e| invalid("TP_MIN_REQUEST_INTERVAL_MS", e))?,
            ),
            None => MIN_REQUEST_INTERVAL,
        };

        let key_password = non_empty("TP_MCP_KEY_PASSWORD");

        let disable_keyring = lookup("TP_MCP_DISABLE_KEYRING")
            .map(|v| parse_bool(&v))
            .unwrap_or(false);

        Ok(Self {
            config_dir,
            api_base_url,
            request_timeout,
            min_request_interval,
            key_password,
            disable_keyring,
        })
    }

    /// Create a config with custom values (useful for testing).
    pub fn new(config_dir: PathBuf) -> Self {
        Self {
            config_dir,
            api_base_url: TP_API_BASE.to_string(),
            request_timeout: VALIDATION_TIMEOUT,
            min_request_interval: MIN_REQUEST_INTERVAL,
            key_password: None,
            disable_keyring: false,
        }
    }
}

fn parse_positive(name: &str, value: &str) -> Result<u64, ConfigError> {
    let parsed: u64 = value.trim().parse().map_err(|e| invalid(name, e))?;
    if parsed == 0 {
        return Err(ConfigError::InvalidValue(
            name.to_string(),
            "must be greater than zero".to_string(),
        ));
    }
    Ok(parsed)
}

fn invalid(name: &str, error: impl fmt::Display) -> ConfigError {
    ConfigError::InvalidValue(name.to_string(), format!("{}", error))
}
