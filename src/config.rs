//! Client configuration parsed from environment variables.
//!
//! The credential itself comes from the command line (see `main.rs`); the
//! values here are optional tunables with production defaults.

use std::time::Duration;

use crate::error::ConfigError;
use crate::resolver::DEFAULT_API_BASE_URL;
use crate::session::{SessionConfig, VariantErrorPolicy};

pub const DEFAULT_HEARTBEAT_SECS: u64 = 5;
pub const DEFAULT_CLOSE_GRACE_MS: u64 = 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub session: SessionConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_owned(),
            session: SessionConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Build typed config from the process environment.
    ///
    /// Optional:
    /// - `SLACK_API_BASE_URL`: default `https://slack.com/api`
    /// - `SLACK_HEARTBEAT_SECS`: default 5, must be positive
    /// - `SLACK_CLOSE_GRACE_MS`: default 1000
    /// - `SLACK_VARIANT_ERRORS`: `skip` (default) or `fatal`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] naming the first variable that does
    /// not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as [`ClientConfig::from_env`] with an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// See [`ClientConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_base_url = lookup("SLACK_API_BASE_URL")
            .map(|value| value.trim().trim_end_matches('/').to_owned())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_owned());

        let heartbeat_secs = parse_u64(
            "SLACK_HEARTBEAT_SECS",
            lookup("SLACK_HEARTBEAT_SECS").as_deref(),
            DEFAULT_HEARTBEAT_SECS,
        )?;
        if heartbeat_secs == 0 {
            return Err(ConfigError::Parse {
                var: "SLACK_HEARTBEAT_SECS",
                message: "must be greater than zero".to_owned(),
            });
        }

        let close_grace_ms = parse_u64(
            "SLACK_CLOSE_GRACE_MS",
            lookup("SLACK_CLOSE_GRACE_MS").as_deref(),
            DEFAULT_CLOSE_GRACE_MS,
        )?;
        let variant_errors = parse_variant_policy(lookup("SLACK_VARIANT_ERRORS").as_deref())?;

        Ok(Self {
            api_base_url,
            session: SessionConfig {
                heartbeat_interval: Duration::from_secs(heartbeat_secs),
                close_grace: Duration::from_millis(close_grace_ms),
                variant_errors,
                ..SessionConfig::default()
            },
        })
    }
}

fn parse_u64(var: &'static str, value: Option<&str>, default: u64) -> Result<u64, ConfigError> {
    match value.map(str::trim) {
        None | Some("") => Ok(default),
        Some(raw) => raw.parse::<u64>().map_err(|e| ConfigError::Parse {
            var,
            message: format!("`{raw}`: {e}"),
        }),
    }
}

fn parse_variant_policy(value: Option<&str>) -> Result<VariantErrorPolicy, ConfigError> {
    match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        None | Some("" | "skip") => Ok(VariantErrorPolicy::Skip),
        Some("fatal") => Ok(VariantErrorPolicy::Fatal),
        Some(other) => Err(ConfigError::Parse {
            var: "SLACK_VARIANT_ERRORS",
            message: format!("`{other}`: expected `skip` or `fatal`"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
