//! HTTP layer - axum routes, extractors and JSON responses
//!
//! Handlers translate requests into calls to [`crate::core`] and map the
//! results onto status codes. Every path is served with and without a trailing
//! slash.

/// Token authentication extractors
pub mod auth;
/// Error to response mapping
pub mod error;
/// Pagination query parameters and response body
pub mod pagination;
/// Route handlers grouped by resource
pub mod routes;

use crate::{config::server::AppConfig, core::media::MediaStorage, errors::Result};
use axum::{
    Router, ServiceExt,
    extract::{DefaultBodyLimit, Request},
    http::{
        Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
};
use sea_orm::DatabaseConnection;
use std::{sync::Arc, time::Duration};
use tokio::{net::TcpListener, signal};
use tower::Layer;
use tower_http::{
    cors::{Any, CorsLayer},
    normalize_path::{NormalizePath, NormalizePathLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::info;

/// Recipe payloads carry base64 images, well above axum's default limit
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Shared data available to all handlers.
/// This structure holds the database connection, media storage and the
/// settings handlers need per request.
#[derive(Debug)]
pub struct AppData {
    /// Database connection for all database operations
    pub database: DatabaseConnection,
    /// Where recipe images are stored
    pub media: MediaStorage,
    /// Default page size
    pub page_size: u64,
}

impl AppData {
    /// Creates a new `AppData` instance.
    #[must_use]
    pub const fn new(database: DatabaseConnection, media: MediaStorage, page_size: u64) -> Self {
        Self {
            database,
            media,
            page_size,
        }
    }
}

/// State handed to every handler
pub type AppState = Arc<AppData>;

/// Builds the API router plus static media serving.
pub fn router(state: AppState) -> Router {
    let media_path = match state.media.url_prefix().trim_end_matches('/') {
        "" => "/media".to_string(),
        path => path.to_string(),
    };
    let media_files = ServeDir::new(state.media.root());

    Router::new()
        .nest("/api", routes::routes())
        .nest_service(&media_path, media_files)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}

/// The full application: [`router`] accepting paths with a trailing slash.
pub fn app(state: AppState) -> NormalizePath<Router> {
    NormalizePathLayer::trim_trailing_slash().layer(router(state))
}

/// Serves the application until Ctrl-C or SIGTERM.
pub async fn serve(config: &AppConfig, state: AppState) -> Result<()> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    let service = NormalizePathLayer::trim_trailing_slash()
        .layer(router(state).layer(TraceLayer::new_for_http()).layer(cors));

    let listener = TcpListener::bind(&config.bind_addr).await?;
    info!("Server running on {}", config.bind_addr);

    axum::serve(listener, ServiceExt::<Request>::into_make_service(service))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
