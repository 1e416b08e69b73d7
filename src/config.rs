use std::net::SocketAddr;

use thiserror::Error;

use crate::constants::{DEFAULT_BIND_ADDRESS, DEFAULT_MAX_CONNECTIONS};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database_url: String,
    pub bind_address: SocketAddr,
    pub max_connections: u32,
    pub run_migrations: bool,
}

impl Config {
    /// Reads `.env` if present, then the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|url| !url.trim().is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let bind_address = parse_or(&lookup, "BIND_ADDRESS", || {
            DEFAULT_BIND_ADDRESS.parse().ok()
        })?;
        let max_connections =
            parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", || Some(DEFAULT_MAX_CONNECTIONS))?;

        let run_migrations = match lookup("RUN_MIGRATIONS") {
            None => true,
            Some(value) => match value.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "RUN_MIGRATIONS",
                        value,
                    })
                }
            },
        };

        Ok(Self {
            database_url,
            bind_address,
            max_connections,
            run_migrations,
        })
    }
}

fn parse_or<F, T>(
    lookup: &F,
    key: &'static str,
    default: impl FnOnce() -> Option<T>,
) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => default().ok_or(ConfigError::Missing(key)),
    }
}
