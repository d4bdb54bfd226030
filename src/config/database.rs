//! Database configuration module for the Foodgram backend.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with `Schema::create_table_from_entity`,
//! so the schema always matches the Rust structs, including the composite primary keys
//! that make favorites, cart entries and subscriptions unique per pair.

use crate::entities::{
    AuthToken, Favorite, Ingredient, Recipe, RecipeIngredient, RecipeTag, ShoppingCart,
    Subscription, Tag, User,
};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};
use std::path::Path;
use tracing::debug;

/// Default location of the database when `DATABASE_URL` is not set.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/foodgram.sqlite?mode=rwc";

/// Gets the database URL from environment variable or returns default `SQLite` path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the database at `database_url`.
///
/// For file-backed `SQLite` URLs the parent directory is created first.
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    if let Some(parent) = sqlite_parent_dir(database_url) {
        std::fs::create_dir_all(parent)?;
    }

    debug!("Connecting to database at {database_url}");
    Database::connect(database_url).await.map_err(Into::into)
}

fn sqlite_parent_dir(database_url: &str) -> Option<&Path> {
    let path = database_url.strip_prefix("sqlite://")?;
    let path = path.split('?').next().unwrap_or(path);
    Path::new(path)
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
}

async fn create_table<C, E>(db: &C, schema: &Schema, entity: E) -> Result<()>
where
    C: ConnectionTrait,
    E: EntityTrait,
{
    let builder = db.get_database_backend();
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(builder.build(&statement)).await?;
    Ok(())
}

/// Creates all necessary database tables, skipping the ones that already exist.
///
/// Referenced tables are created before the tables pointing at them.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let schema = Schema::new(db.get_database_backend());

    create_table(db, &schema, User).await?;
    create_table(db, &schema, Tag).await?;
    create_table(db, &schema, Ingredient).await?;
    create_table(db, &schema, Recipe).await?;
    create_table(db, &schema, RecipeTag).await?;
    create_table(db, &schema, RecipeIngredient).await?;
    create_table(db, &schema, Favorite).await?;
    create_table(db, &schema, ShoppingCart).await?;
    create_table(db, &schema, Subscription).await?;
    create_table(db, &schema, AuthToken).await?;

    Ok(())
}
