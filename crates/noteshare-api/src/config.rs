//! Server configuration from environment variables.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `DATABASE_URL` | placeholder `postgres://localhost/noteshare` |
//! | `STORAGE_BACKEND` | `postgres` (`memory` keeps everything in process) |
//! | `HOST` / `PORT` | `0.0.0.0` / `5000` |
//! | `MAX_UPLOAD_SIZE_BYTES` | 10 MiB |
//! | `ALLOWED_ORIGINS` | any origin; comma separated list otherwise |
//! | `DB_MAX_CONNECTIONS` | 10 |

use std::env;
use std::str::FromStr;

use noteshare_core::{defaults, Error};

/// Where notes and file content are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageBackend {
    #[default]
    Postgres,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(Error::Config(format!("unknown STORAGE_BACKEND '{}'", other))),
        }
    }
}

/// Settings for the API server.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub database_url: String,
    pub storage: StorageBackend,
    pub host: String,
    pub port: u16,
    pub max_upload_size: usize,
    /// `None` allows any origin.
    pub allowed_origins: Option<Vec<String>>,
    pub db_max_connections: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            database_url: defaults::DATABASE_URL.to_string(),
            storage: StorageBackend::default(),
            host: defaults::HOST.to_string(),
            port: defaults::PORT,
            max_upload_size: defaults::MAX_UPLOAD_SIZE_BYTES,
            allowed_origins: None,
            db_max_connections: defaults::DB_MAX_CONNECTIONS,
        }
    }
}

impl ApiConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read configuration through an arbitrary key lookup.
    ///
    /// Unparseable numbers fall back to their defaults; an unknown storage
    /// backend is an error.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let default = Self::default();

        let storage = match lookup("STORAGE_BACKEND") {
            Some(v) if !v.trim().is_empty() => v.parse()?,
            _ => default.storage,
        };

        let allowed_origins = lookup("ALLOWED_ORIGINS").and_then(|v| {
            let origins: Vec<String> = v
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
            if origins.is_empty() || origins.iter().any(|o| o == "*") {
                None
            } else {
                Some(origins)
            }
        });

        Ok(Self {
            database_url: lookup("DATABASE_URL").unwrap_or(default.database_url),
            storage,
            host: lookup("HOST").unwrap_or(default.host),
            port: lookup("PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.port),
            max_upload_size: lookup("MAX_UPLOAD_SIZE_BYTES")
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_upload_size),
            allowed_origins,
            db_max_connections: lookup("DB_MAX_CONNECTIONS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.db_max_connections),
        })
    }
}
