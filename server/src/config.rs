use std::env;
use std::str::FromStr;

use thiserror::Error;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_TOKEN_TTL_DAYS: i64 = 30;
const MAX_TOKEN_TTL_DAYS: i64 = 3650;
pub const DEFAULT_MAX_IMAGE_BYTES: usize = 2 * 1024 * 1024;
const MAX_IMAGE_BYTES_LIMIT: usize = 64 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Where recipes, labels and users are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    /// Process-local storage, lost on restart. Useful for local hacking and tests.
    Memory,
}

impl FromStr for StorageBackend {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "pg" => Ok(Self::Postgres),
            "memory" | "mem" => Ok(Self::Memory),
            _ => Err(()),
        }
    }
}

/// How a free-text tag or ingredient label is matched against a user's existing rows.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum LabelMatch {
    /// Case-insensitive equality: "tea" matches "Tea" but not "Green Tea".
    #[default]
    Exact,
    /// Case-insensitive substring: "tea" also matches "Green Tea".
    Contains,
}

impl FromStr for LabelMatch {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "exact" => Ok(Self::Exact),
            "contains" | "substring" => Ok(Self::Contains),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub storage: StorageBackend,
    pub database_url: Option<String>,
    pub label_match: LabelMatch,
    pub token_ttl_days: i64,
    pub max_image_bytes: usize,
    /// Use minimal argon2 parameters. NOT SECURE FOR PRODUCTION.
    pub insecure_password_hashing: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            storage: StorageBackend::Postgres,
            database_url: None,
            label_match: LabelMatch::default(),
            token_ttl_days: DEFAULT_TOKEN_TTL_DAYS,
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
            insecure_password_hashing: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let storage = parse_var("STORAGE_BACKEND")?.unwrap_or(defaults.storage);
        let database_url = env::var("DATABASE_URL").ok().filter(|s| !s.is_empty());
        if storage == StorageBackend::Postgres && database_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        let token_ttl_days =
            check_token_ttl_days(parse_var("TOKEN_TTL_DAYS")?.unwrap_or(defaults.token_ttl_days))?;
        let max_image_bytes = check_max_image_bytes(
            parse_var("MAX_IMAGE_BYTES")?.unwrap_or(defaults.max_image_bytes),
        )?;

        Ok(Self {
            bind_addr: env::var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            storage,
            database_url,
            label_match: parse_var("LABEL_MATCH")?.unwrap_or(defaults.label_match),
            token_ttl_days,
            max_image_bytes,
            insecure_password_hashing: env::var("INSECURE_PASSWORD_HASHING").is_ok(),
        })
    }
}

/// Between one day and ten years.
fn check_token_ttl_days(days: i64) -> Result<i64, ConfigError> {
    if (1..=MAX_TOKEN_TTL_DAYS).contains(&days) {
        Ok(days)
    } else {
        Err(ConfigError::Invalid {
            name: "TOKEN_TTL_DAYS",
            value: days.to_string(),
        })
    }
}

fn check_max_image_bytes(bytes: usize) -> Result<usize, ConfigError> {
    if (1..=MAX_IMAGE_BYTES_LIMIT).contains(&bytes) {
        Ok(bytes)
    } else {
        Err(ConfigError::Invalid {
            name: "MAX_IMAGE_BYTES",
            value: bytes.to_string(),
        })
    }
}

fn parse_var<T: FromStr>(name: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { name, value }),
        Err(_) => Ok(None),
    }
}
