//! Configuration and secrets

use crate::error::{Error, Result};
use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Fires every night at 4:00AM UTC (12:00AM EDT)
pub const DEFAULT_SCHEDULE: &str = "0 4 * * *";

pub const DEFAULT_API_BASE: &str = "https://api.twilio.com";

pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// SMS provider credentials, read once at startup
#[derive(Clone, PartialEq)]
pub struct Secrets {
    pub account_sid: String,
    pub auth_token: String,
    pub phone_number: String,
}

impl Secrets {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Missing or blank values are an error.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| Error::Config(format!("missing secret {}", key)))
        };

        Ok(Self {
            account_sid: require("TWILIO_ACCOUNT_SID")?,
            auth_token: require("TWILIO_AUTH_TOKEN")?,
            phone_number: require("TWILIO_PHONE_NUMBER")?,
        })
    }
}

impl fmt::Debug for Secrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secrets")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &"<redacted>")
            .field("phone_number", &self.phone_number)
            .finish()
    }
}

/// Paths, listen addresses and provider settings
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub public_addr: SocketAddr,
    pub internal_addr: SocketAddr,
    pub schedule: String,
    pub api_base: String,
    pub http_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));

        Self {
            db_path: data_dir.join("daily-word/numbers.db"),
            public_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            // Internal routes stay on loopback unless overridden
            internal_addr: SocketAddr::from(([127, 0, 0, 1], 8081)),
            schedule: DEFAULT_SCHEDULE.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
        }
    }
}

impl Config {
    /// Defaults overridden by `DAILY_WORD_*` / `TWILIO_API_BASE` variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = lookup("DAILY_WORD_DB") {
            config.db_path = PathBuf::from(path);
        }
        if let Some(addr) = lookup("DAILY_WORD_PUBLIC_ADDR") {
            config.public_addr = parse_addr("DAILY_WORD_PUBLIC_ADDR", &addr)?;
        }
        if let Some(addr) = lookup("DAILY_WORD_INTERNAL_ADDR") {
            config.internal_addr = parse_addr("DAILY_WORD_INTERNAL_ADDR", &addr)?;
        }
        if let Some(schedule) = lookup("DAILY_WORD_SCHEDULE") {
            config.schedule = schedule;
        }
        if let Some(base) = lookup("TWILIO_API_BASE") {
            config.api_base = base.trim_end_matches('/').to_string();
        }
        if let Some(secs) = lookup("DAILY_WORD_HTTP_TIMEOUT_SECS") {
            config.http_timeout_secs = secs.parse().map_err(|e| {
                Error::Config(format!("DAILY_WORD_HTTP_TIMEOUT_SECS={}: {}", secs, e))
            })?;
        }

        Ok(config)
    }

    /// Create config for testing with custom paths
    pub fn for_test(temp_dir: &Path) -> Self {
        Self {
            db_path: temp_dir.join("numbers.db"),
            public_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            internal_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            schedule: DEFAULT_SCHEDULE.to_string(),
            api_base: "http://127.0.0.1:9".to_string(),
            http_timeout_secs: 5,
        }
    }
}

fn parse_addr(key: &str, value: &str) -> Result<SocketAddr> {
    value
        .parse()
        .map_err(|e| Error::Config(format!("{}={}: {}", key, value, e)))
}
