//! Tag configuration loading from config.toml
//!
//! Tags are reference data managed by the operator. The ones listed in
//! config.toml are seeded into the database at startup or via `seed-tags`;
//! slugs that already exist are left untouched.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// List of tags to seed
    #[serde(default)]
    pub tags: Vec<TagConfig>,
}

/// Configuration for a single tag
#[derive(Debug, Deserialize, Clone)]
pub struct TagConfig {
    /// Display name of the tag
    pub name: String,
    /// HEX color (`#RRGGBB`)
    pub color: Option<String>,
    /// Unique slug used in recipe filters
    pub slug: String,
}

/// Loads tag configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - Required fields are missing
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}
