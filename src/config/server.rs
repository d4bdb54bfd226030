//! Server settings loaded from environment variables.
//!
//! Every setting has a default so a bare `cargo run` works against a local
//! `SQLite` file. Values present in the environment (or `.env`) but not
//! parseable are reported as configuration errors instead of being ignored.

use crate::errors::{Error, Result};
use std::{env, fmt::Display, path::PathBuf, str::FromStr};
use tracing::info;

/// Default page size when the client does not pass `limit`.
pub const DEFAULT_PAGE_SIZE: u64 = 6;

/// Application-wide settings.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// SeaORM connection string
    pub database_url: String,
    /// Socket address the HTTP server binds to
    pub bind_addr: String,
    /// Directory uploaded images are written to
    pub media_root: PathBuf,
    /// URL prefix media files are served under
    pub media_url: String,
    /// Default page size for paginated lists
    pub page_size: u64,
    /// Path of the TOML file holding the tag seed list
    pub config_path: PathBuf,
}

impl AppConfig {
    /// Reads the settings from the process environment.
    ///
    /// # Errors
    /// Returns [`Error::Config`] when a variable is set to an unparseable value.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database_url: super::database::get_database_url(),
            bind_addr: load("BIND_ADDR", "0.0.0.0:8000")?,
            media_root: load("MEDIA_ROOT", "media")?,
            media_url: load("MEDIA_URL", "/media/")?,
            page_size: load("PAGE_SIZE", &DEFAULT_PAGE_SIZE.to_string())?,
            config_path: load("CONFIG_PATH", "config.toml")?,
        })
    }
}

fn load<T>(key: &str, default: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });
    parse_setting(key, &raw)
}

fn parse_setting<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    raw.parse().map_err(|e| Error::Config {
        message: format!("Invalid {key} value {raw:?}: {e}"),
    })
}
