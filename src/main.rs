use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use foodgram::{
    api::{self, AppData},
    config::{database, ingredients, server::AppConfig, tags as tag_config},
    core::{ingredients::import_ingredients, media::MediaStorage, tags},
    errors::Result,
};
use sea_orm::DatabaseConnection;
use std::{path::PathBuf, sync::Arc};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Recipe sharing backend
#[derive(Debug, Parser)]
#[command(name = "foodgram", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Bulk-load ingredients from a `name,measurement_unit` CSV file
    ImportIngredients {
        /// Path of the CSV file
        path: PathBuf,
    },
    /// Load tags from the configuration file
    SeedTags,
}

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; variables may also be set externally
    dotenv().ok();

    let cli = Cli::parse();

    // 3. Settings and database
    let config = AppConfig::from_env()?;
    let db = database::create_connection(&config.database_url)
        .await
        .inspect_err(|e| error!("Failed to connect to database: {e}"))?;
    database::create_tables(&db).await?;
    info!("Database ready");

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            if config.config_path.exists() {
                seed_tags(&db, &config).await?;
            } else {
                warn!(
                    "{} not found, skipping tag seeding",
                    config.config_path.display()
                );
            }

            let media = MediaStorage::new(&config.media_root, config.media_url.clone());
            let state = Arc::new(AppData::new(db, media, config.page_size));
            api::serve(&config, state).await?;
        }
        Command::ImportIngredients { path } => {
            let records = ingredients::load_ingredients(&path)?;
            let inserted = import_ingredients(&db, records).await?;
            info!("Loaded {inserted} ingredients from {}", path.display());
        }
        Command::SeedTags => seed_tags(&db, &config).await?,
    }

    Ok(())
}

async fn seed_tags(db: &DatabaseConnection, config: &AppConfig) -> Result<()> {
    let seed = tag_config::load_config(&config.config_path)?;
    tags::seed_tags(db, &seed.tags).await?;
    Ok(())
}
