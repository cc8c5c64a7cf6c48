//! Configuration types for the PierceFlare client
//!
//! Configuration comes from `PIERCEFLARE_*` environment variables only.
//! [`ClientConfig::from_lookup`] takes any key lookup so loading can be
//! exercised without touching the process environment.

use std::str::FromStr;
use std::time::Duration;

/// Minimum check interval, in seconds. Lower values are clamped.
pub const MIN_CHECK_INTERVAL_SECS: u64 = 10;

/// Default check interval, in seconds (5 minutes)
pub const DEFAULT_CHECK_INTERVAL_SECS: u64 = 300;

/// Default number of unchanged ticks between two success notices
pub const DEFAULT_SUCCESS_LOG_PERIOD: u32 = 10;

/// Environment variable names
pub mod env {
    pub const API_KEY: &str = "PIERCEFLARE_API_KEY";
    pub const SERVER_URL: &str = "PIERCEFLARE_SERVER_URL";
    pub const CHECK_INTERVAL: &str = "PIERCEFLARE_CHECK_INTERVAL";
    pub const ONE_SHOT: &str = "PIERCEFLARE_ONE_SHOT";
    pub const DUMMY_UPDATES: &str = "PIERCEFLARE_DUMMY_UPDATES";
    pub const LOG_LEVEL: &str = "PIERCEFLARE_LOG_LEVEL";
    pub const LOG_TIMESTAMP: &str = "PIERCEFLARE_LOG_TIMESTAMP";
    pub const SUCCESS_LOG_PERIOD: &str = "PIERCEFLARE_SUCCESS_LOG_PERIOD";
}

/// Log verbosity accepted by `PIERCEFLARE_LOG_LEVEL`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    /// Errors only
    Error,
    /// General information and errors
    #[default]
    Info,
    /// Everything, including per-request details
    Debug,
}

impl FromStr for LogLevel {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            other => Err(crate::Error::config(format!(
                "{} '{}' is not valid. Valid levels: error, info, debug",
                env::LOG_LEVEL,
                other
            ))),
        }
    }
}

/// Full client configuration, validated before the runner starts
#[derive(Clone)]
pub struct ClientConfig {
    /// Bearer token for the PierceFlare API
    pub api_key: String,

    /// API base URL, without trailing slash
    pub server_url: String,

    /// Seconds between two checks in continuous mode
    pub check_interval_secs: u64,

    /// Run a single forced update then exit
    pub one_shot: bool,

    /// Send heartbeat updates when the IP is unchanged
    pub dummy_updates: bool,

    /// Log verbosity
    pub log_level: LogLevel,

    /// Prefix log lines with a timestamp
    pub log_timestamp: bool,

    /// Unchanged ticks between two success notices (0 = every tick)
    pub success_log_period: u32,
}

// Keeps the API key out of logs
impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"<REDACTED>")
            .field("server_url", &self.server_url)
            .field("check_interval_secs", &self.check_interval_secs)
            .field("one_shot", &self.one_shot)
            .field("dummy_updates", &self.dummy_updates)
            .field("log_level", &self.log_level)
            .field("log_timestamp", &self.log_timestamp)
            .field("success_log_period", &self.success_log_period)
            .finish()
    }
}

impl ClientConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, crate::Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    ///
    /// Empty values are treated as unset. Required values are
    /// `PIERCEFLARE_API_KEY` and `PIERCEFLARE_SERVER_URL`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, crate::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = get(env::API_KEY).ok_or_else(|| {
            crate::Error::config(format!(
                "{} is required. Set it via: export {}=your_token",
                env::API_KEY,
                env::API_KEY
            ))
        })?;

        let server_url = get(env::SERVER_URL).ok_or_else(|| {
            crate::Error::config(format!(
                "{} is required. Set it via: export {}=https://pierceflare.example.com",
                env::SERVER_URL,
                env::SERVER_URL
            ))
        })?;

        let check_interval_secs = match get(env::CHECK_INTERVAL) {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| {
                    crate::Error::config(format!(
                        "{} must be a whole number of seconds. Got: {}",
                        env::CHECK_INTERVAL,
                        raw
                    ))
                })?;
                if secs < MIN_CHECK_INTERVAL_SECS {
                    eprintln!(
                        "WARNING: {} ({}s) is below the minimum. Using {} seconds.",
                        env::CHECK_INTERVAL,
                        secs,
                        MIN_CHECK_INTERVAL_SECS
                    );
                    MIN_CHECK_INTERVAL_SECS
                } else {
                    secs
                }
            }
            None => DEFAULT_CHECK_INTERVAL_SECS,
        };

        let log_level = match get(env::LOG_LEVEL) {
            Some(raw) => raw.trim().parse()?,
            None => LogLevel::default(),
        };

        let success_log_period = match get(env::SUCCESS_LOG_PERIOD) {
            Some(raw) => raw.trim().parse().map_err(|_| {
                crate::Error::config(format!(
                    "{} must be a non-negative integer. Got: {}",
                    env::SUCCESS_LOG_PERIOD,
                    raw
                ))
            })?,
            None => DEFAULT_SUCCESS_LOG_PERIOD,
        };

        let config = Self {
            api_key: api_key.trim().to_string(),
            server_url: server_url.trim().trim_end_matches('/').to_string(),
            check_interval_secs,
            one_shot: parse_flag(env::ONE_SHOT, get(env::ONE_SHOT), false)?,
            dummy_updates: parse_flag(env::DUMMY_UPDATES, get(env::DUMMY_UPDATES), false)?,
            log_level,
            log_timestamp: parse_flag(env::LOG_TIMESTAMP, get(env::LOG_TIMESTAMP), true)?,
            success_log_period,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.api_key.is_empty() {
            return Err(crate::Error::config(format!("{} cannot be empty", env::API_KEY)));
        }

        if self.api_key.chars().any(char::is_whitespace) {
            return Err(crate::Error::config(format!(
                "{} must not contain whitespace",
                env::API_KEY
            )));
        }

        if !self.server_url.starts_with("https://") && !self.server_url.starts_with("http://") {
            return Err(crate::Error::config(format!(
                "{} must use HTTP or HTTPS scheme. Got: {}",
                env::SERVER_URL,
                self.server_url
            )));
        }

        if self.check_interval_secs < MIN_CHECK_INTERVAL_SECS {
            return Err(crate::Error::config(format!(
                "{} must be at least {} seconds. Got: {}",
                env::CHECK_INTERVAL,
                MIN_CHECK_INTERVAL_SECS,
                self.check_interval_secs
            )));
        }

        Ok(())
    }

    /// Settings consumed by [`crate::FlareRunner`]
    pub fn runner_config(&self) -> RunnerConfig {
        RunnerConfig {
            check_interval_secs: self.check_interval_secs,
            dummy_updates: self.dummy_updates,
            success_log_period: self.success_log_period,
            ..RunnerConfig::default()
        }
    }
}

fn parse_flag(key: &str, value: Option<String>, default: bool) -> Result<bool, crate::Error> {
    let Some(raw) = value else {
        return Ok(default);
    };

    match raw.trim().to_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(crate::Error::config(format!(
            "{} must be 'true' or 'false'. Got: {}",
            key, raw
        ))),
    }
}

/// Scheduler settings
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Seconds between two ticks in continuous mode
    pub check_interval_secs: u64,

    /// Send a heartbeat update on every unchanged tick
    pub dummy_updates: bool,

    /// Unchanged ticks between two success notices (0 = every tick)
    pub success_log_period: u32,

    /// Capacity of the runner event channel
    ///
    /// When full, new events are dropped with a warning.
    pub event_channel_capacity: usize,
}

impl RunnerConfig {
    /// Interval between two ticks
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }

    /// Validate the runner settings
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.check_interval_secs == 0 {
            return Err(crate::Error::config("Check interval must be > 0"));
        }
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }
        Ok(())
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            check_interval_secs: default_check_interval_secs(),
            dummy_updates: false,
            success_log_period: default_success_log_period(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn default_check_interval_secs() -> u64 {
    DEFAULT_CHECK_INTERVAL_SECS
}

fn default_success_log_period() -> u32 {
    DEFAULT_SUCCESS_LOG_PERIOD
}

fn default_event_channel_capacity() -> usize {
    64
}
