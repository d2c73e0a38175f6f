//! Environment-driven configuration.
//!
//! Every setting has a default, so an empty environment yields a working
//! development setup. Malformed values are fatal at startup.

use std::time::Duration;

use thiserror::Error;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_STORE_URL: &str = "redis://127.0.0.1:6379/";
const DEFAULT_STORE_KEY: &str = "metrics:history";
const DEFAULT_STORE_TIMEOUT_MS: u64 = 2_000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("PORT must be a number between 0 and 65535, got {0:?}")]
    InvalidPort(String),
    #[error("CORS_ORIGIN is not a valid header value: {0:?}")]
    InvalidCorsOrigin(String),
    #[error("STORE_TIMEOUT_MS must be a positive integer, got {0:?}")]
    InvalidStoreTimeout(String),
    #[error("STORE_URL has unsupported scheme: {0:?} (expected redis://, rediss:// or memory://)")]
    UnsupportedStore(String),
}

/// Which store backend `STORE_URL` points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Redis { url: String, key: String },
    Memory,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// Deployment environment label (`NODE_ENV`), echoed by `/info`.
    pub environment: String,
    pub cors_origin: String,
    pub log_level: String,
    pub store: StoreBackend,
    pub store_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            environment: "development".into(),
            cors_origin: "*".into(),
            log_level: "info".into(),
            store: StoreBackend::Redis {
                url: DEFAULT_STORE_URL.into(),
                key: DEFAULT_STORE_KEY.into(),
            },
            store_timeout: Duration::from_millis(DEFAULT_STORE_TIMEOUT_MS),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup so tests never mutate the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match var("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort(raw))?,
            None => defaults.port,
        };

        let cors_origin = var("CORS_ORIGIN").unwrap_or(defaults.cors_origin);
        if cors_origin != "*" && axum::http::HeaderValue::from_str(&cors_origin).is_err() {
            return Err(ConfigError::InvalidCorsOrigin(cors_origin));
        }

        let store_timeout = match var("STORE_TIMEOUT_MS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => Duration::from_millis(ms),
                _ => return Err(ConfigError::InvalidStoreTimeout(raw)),
            },
            None => defaults.store_timeout,
        };

        let url = var("STORE_URL").unwrap_or_else(|| DEFAULT_STORE_URL.into());
        let key = var("STORE_KEY").unwrap_or_else(|| DEFAULT_STORE_KEY.into());
        let store = parse_store(url, key)?;

        Ok(Self {
            port,
            environment: var("NODE_ENV").unwrap_or(defaults.environment),
            cors_origin,
            log_level: var("LOG_LEVEL").unwrap_or(defaults.log_level),
            store,
            store_timeout,
        })
    }
}

fn parse_store(url: String, key: String) -> Result<StoreBackend, ConfigError> {
    let url = url.trim().to_owned();
    if url.starts_with("memory://") {
        Ok(StoreBackend::Memory)
    } else if url.starts_with("redis://") || url.starts_with("rediss://") {
        Ok(StoreBackend::Redis { url, key })
    } else {
        Err(ConfigError::UnsupportedStore(url))
    }
}
