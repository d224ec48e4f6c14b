//! Application Settings
//!
//! Everything is read from environment variables once at start-up.
//! [`Settings::from_lookup`] takes any lookup function so tests can inject a
//! map instead of mutating the process environment. Empty values count as
//! absent; values that fail to parse fall back to their default with a
//! warning.

use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::database::{
    acquire::{DatabaseMode, DatabaseSettings, MAX_CONNECT_TIMEOUT},
    connection::{FALLBACK_ENV_VARS, PRIMARY_ENV_VAR, locate_url},
};

const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3000,http://localhost:8080";

#[derive(Debug, Clone)]
pub struct Settings {
    pub debug: bool,
    pub environment: String,
    pub log_level: String,
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
    /// Name of the variable the connection string was read from.
    pub database_url_source: Option<&'static str>,
    pub database: DatabaseSettings,
}

impl Settings {
    pub fn from_env() -> Self {
        Settings::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let mode = parse_or(value("DATABASE_MODE"), "DATABASE_MODE", DatabaseMode::Pooled);
        let mut database = DatabaseSettings::new(value(PRIMARY_ENV_VAR), mode);
        database.fallbacks = FALLBACK_ENV_VARS
            .into_iter()
            .filter_map(|name| value(name).map(|url| (name, url)))
            .collect();
        database.min_connections = parse_or(value("DB_POOL_MIN"), "DB_POOL_MIN", database.min_connections);
        database.max_connections = parse_or(value("DB_POOL_MAX"), "DB_POOL_MAX", database.max_connections)
            .max(1);
        if database.min_connections > database.max_connections {
            warn!(
                min = database.min_connections,
                max = database.max_connections,
                "DB_POOL_MIN exceeds DB_POOL_MAX, clamping"
            );
            database.min_connections = database.max_connections;
        }
        let connect_secs = parse_or(
            value("DB_CONNECT_TIMEOUT"),
            "DB_CONNECT_TIMEOUT",
            MAX_CONNECT_TIMEOUT.as_secs(),
        );
        database.connect_timeout = Duration::from_secs(connect_secs).min(MAX_CONNECT_TIMEOUT);
        let command_secs = parse_or(
            value("DB_COMMAND_TIMEOUT"),
            "DB_COMMAND_TIMEOUT",
            database.command_timeout.as_secs(),
        );
        database.command_timeout = Duration::from_secs(command_secs);

        Settings {
            debug: value("DEBUG").map(|v| parse_bool(&v)).unwrap_or(false),
            environment: value("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
            log_level: value("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            host: value("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(value("PORT"), "PORT", 8000),
            cors_origins: split_origins(&value("CORS_ORIGINS").unwrap_or_else(|| DEFAULT_CORS_ORIGINS.to_string())),
            database_url_source: locate_url(&value).map(|(name, _)| name),
            database,
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}

fn parse_or<T: FromStr>(raw: Option<String>, name: &str, default: T) -> T {
    match raw {
        Some(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                warn!(setting = name, value = %raw, "unparsable setting, using default");
                default
            }
        },
        None => default,
    }
}

fn parse_bool(raw: &str) -> bool {
    matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}
