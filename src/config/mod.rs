/// Database configuration and connection management
pub mod database;

/// Ingredient CSV loading
pub mod ingredients;

/// Environment-driven server settings
pub mod server;

/// Tag configuration loading from config.toml
pub mod tags;
