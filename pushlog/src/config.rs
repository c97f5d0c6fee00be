//! Configuration module for environment variable parsing.
//!
//! All settings are read once at process start and never change afterwards.
//! A variable that is set but cannot be parsed is a startup error rather than
//! a silent fallback to the default.

use std::env;
use std::net::IpAddr;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use tracing::warn;

/// Default HTTP port, matching the port GitHub test hooks are usually pointed at.
pub const DEFAULT_PORT: u16 = 5000;

/// Default display poll interval in seconds.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 15;

/// Default storage location.
pub const DEFAULT_DATABASE_PATH: &str = "pushlog.db";

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {value:?} ({reason})")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address for the web server to bind to
    pub host: IpAddr,

    /// Port for the web server to listen on
    pub port: u16,

    /// SQLite database file, or `memory` for the in-process store
    pub database_path: String,

    /// Shared secret for `X-Hub-Signature-256` verification
    pub github_webhook_secret: Option<String>,

    /// Interval between display polls
    pub poll_interval: Duration,

    /// Maximum number of records fetched per display poll (`None` = all)
    pub display_limit: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: IpAddr::from([0, 0, 0, 0]),
            port: DEFAULT_PORT,
            database_path: DEFAULT_DATABASE_PATH.to_string(),
            github_webhook_secret: None,
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            display_limit: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let poll_interval_secs: u64 = parse_var(&lookup, "POLL_INTERVAL_SECS")?
            .unwrap_or(DEFAULT_POLL_INTERVAL_SECS);
        if poll_interval_secs == 0 {
            return Err(ConfigError::Invalid {
                name: "POLL_INTERVAL_SECS",
                value: "0".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        let display_limit: Option<usize> = parse_var(&lookup, "DISPLAY_LIMIT")?;
        if display_limit == Some(0) {
            return Err(ConfigError::Invalid {
                name: "DISPLAY_LIMIT",
                value: "0".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        let github_webhook_secret = lookup("GITHUB_WEBHOOK_SECRET").filter(|s| !s.trim().is_empty());
        if github_webhook_secret.is_none() {
            warn!("github_webhook_secret_not_configured");
        }

        Ok(Config {
            host: parse_var(&lookup, "HOST")?.unwrap_or(defaults.host),
            port: parse_var(&lookup, "PORT")?.unwrap_or(defaults.port),
            database_path: lookup("DATABASE_PATH")
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or(defaults.database_path),
            github_webhook_secret,
            poll_interval: Duration::from_secs(poll_interval_secs),
            display_limit,
        })
    }
}

/// Parse an optional variable, treating blank values as unset.
fn parse_var<F, T>(lookup: &F, name: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = match lookup(name) {
        Some(v) if !v.trim().is_empty() => v,
        _ => return Ok(None),
    };

    raw.trim()
        .parse::<T>()
        .map(Some)
        .map_err(|e| ConfigError::Invalid {
            name,
            value: raw.clone(),
            reason: e.to_string(),
        })
}
