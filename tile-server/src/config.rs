//! Server configuration, read from `TILEWORLD_*` environment variables.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tileworld_core::logging::LogLevel;
use tileworld_core::GeneratorConfig;

use crate::error::ServerError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub world: GeneratorConfig,
    /// Outbound frames buffered per session before broadcasts start dropping
    pub outbound_buffer: usize,
    /// Upper bound on one socket write
    pub send_timeout_ms: u64,
    pub log_level: LogLevel,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 5000,
            world: GeneratorConfig::default(),
            outbound_buffer: 256,
            send_timeout_ms: 5000,
            log_level: LogLevel::Info,
        }
    }
}

impl ServerConfig {
    /// Defaults overridden by the process environment. Without
    /// `TILEWORLD_SEED` every run gets a fresh, time-based world.
    pub fn from_env() -> Result<Self, ServerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ServerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let time_seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(defaults.world.seed);

        let log_level = match lookup("TILEWORLD_LOG_LEVEL") {
            Some(raw) => LogLevel::parse(&raw).ok_or(ServerError::Config {
                key: "TILEWORLD_LOG_LEVEL",
                value: raw,
            })?,
            None => defaults.log_level,
        };

        let config = Self {
            host: lookup("TILEWORLD_HOST").unwrap_or(defaults.host),
            port: parse_or(&lookup, "TILEWORLD_PORT", defaults.port)?,
            world: GeneratorConfig {
                width: parse_or(&lookup, "TILEWORLD_WIDTH", defaults.world.width)?,
                height: parse_or(&lookup, "TILEWORLD_HEIGHT", defaults.world.height)?,
                seed: parse_or(&lookup, "TILEWORLD_SEED", time_seed)?,
            },
            outbound_buffer: parse_or(&lookup, "TILEWORLD_OUTBOUND_BUFFER", defaults.outbound_buffer)?,
            send_timeout_ms: parse_or(&lookup, "TILEWORLD_SEND_TIMEOUT_MS", defaults.send_timeout_ms)?,
            log_level,
        };

        if config.world.width == 0 {
            return Err(ServerError::Config {
                key: "TILEWORLD_WIDTH",
                value: "0".into(),
            });
        }
        if config.world.height == 0 {
            return Err(ServerError::Config {
                key: "TILEWORLD_HEIGHT",
                value: "0".into(),
            });
        }
        if config.outbound_buffer == 0 {
            return Err(ServerError::Config {
                key: "TILEWORLD_OUTBOUND_BUFFER",
                value: "0".into(),
            });
        }
        Ok(config)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }
}

fn parse_or<T, F>(lookup: &F, key: &'static str, default: T) -> Result<T, ServerError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ServerError::Config { key, value: raw }),
        None => Ok(default),
    }
}
