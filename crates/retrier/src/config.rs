//! Retry configuration loaded from files or the environment.

use crate::delay::Delay;
use crate::error::ConfigError;
use crate::strategy::Retrier;
use serde::{Deserialize, Serialize};
use std::env::{self, VarError};
use std::str::FromStr;
use std::time::Duration;

/// Prefix used by [`RetryConfig::from_env`].
pub const DEFAULT_ENV_PREFIX: &str = "RETRY";

/// Attempt budget and delay policy, as stored in configuration.
///
/// # Examples
///
/// ```rust
/// use retrier::{Delay, RetryConfig};
/// use std::time::Duration;
///
/// let config = RetryConfig::from_toml_str(
///     r#"
///     max_retries = 5
///
///     [delay]
///     kind = "exponential"
///     initial_delay_ms = 100
///     coefficient = 2.0
///     "#,
/// )
/// .unwrap();
///
/// assert_eq!(config.max_retries, 5);
/// assert_eq!(config.delay, Delay::exponential(Duration::from_millis(100), 2.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retries after the first attempt; `0` means a single attempt
    #[serde(default)]
    pub max_retries: u32,

    /// Pause after failing attempts
    #[serde(default)]
    pub delay: Delay,
}

impl RetryConfig {
    /// Configuration with the given budget and delay.
    pub fn new(max_retries: u32, delay: Delay) -> Self {
        Self { max_retries, delay }
    }

    /// Parse configuration from TOML.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Load configuration from `RETRY_*` environment variables.
    ///
    /// See [`RetryConfig::from_env_with_prefix`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with_prefix(DEFAULT_ENV_PREFIX)
    }

    /// Load configuration from `<PREFIX>_*` environment variables.
    ///
    /// This will look for:
    /// - `<PREFIX>_MAX_RETRIES`: retry budget (default 0)
    /// - `<PREFIX>_DELAY_MS`: fixed delay, or initial backoff delay
    /// - `<PREFIX>_BACKOFF_COEFFICIENT`: switches to exponential backoff;
    ///   requires `<PREFIX>_DELAY_MS`
    ///
    /// Unset variables fall back to defaults. Set but unparseable values are
    /// reported as [`ConfigError::InvalidValue`].
    pub fn from_env_with_prefix(prefix: &str) -> Result<Self, ConfigError> {
        let max_retries_var = format!("{prefix}_MAX_RETRIES");
        let delay_var = format!("{prefix}_DELAY_MS");
        let coefficient_var = format!("{prefix}_BACKOFF_COEFFICIENT");

        let max_retries = read_var::<u32>(&max_retries_var)?.unwrap_or_default();
        let delay_ms = read_var::<u64>(&delay_var)?;
        let coefficient = read_var::<f64>(&coefficient_var)?;

        let delay = match (delay_ms, coefficient) {
            (Some(ms), Some(coefficient)) => {
                Delay::exponential(Duration::from_millis(ms), coefficient)
            }
            (None, Some(_)) => return Err(ConfigError::MissingDelay { var: delay_var }),
            (Some(ms), None) => Delay::fixed(Duration::from_millis(ms)),
            (None, None) => Delay::None,
        };

        Ok(Self { max_retries, delay })
    }

    /// A [`Retrier`] using this configuration's delay policy.
    ///
    /// Pass [`RetryConfig::max_retries`] as the budget of each call.
    pub fn retrier(&self) -> Retrier {
        Retrier::new(self.delay)
    }
}

fn read_var<T: FromStr>(var: &str) -> Result<Option<T>, ConfigError> {
    match env::var(var) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                var: var.to_string(),
                value,
            }),
        Err(VarError::NotPresent) => Ok(None),
        Err(VarError::NotUnicode(raw)) => Err(ConfigError::InvalidValue {
            var: var.to_string(),
            value: raw.to_string_lossy().into_owned(),
        }),
    }
}
