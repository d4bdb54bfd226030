//! Route handlers organized by resource.

use super::{AppState, auth::access};
use crate::{core::permissions::Policy, errors::Result};
use axum::{
    Router,
    http::{Method, StatusCode},
};

/// Recipe CRUD, favorites, shopping cart and its export
pub mod recipes;

/// Registration, profiles, subscriptions and tokens
pub mod users;

/// Read-only tag endpoints
pub mod tags;

/// Read-only ingredient endpoints
pub mod ingredients;

/// Method fallback of read-only resources: writes are refused for everyone.
async fn read_only(method: Method) -> Result<StatusCode> {
    Policy::ReadOnly.check(access(&method), None)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Every `/api` route.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(recipes::routes())
        .merge(users::routes())
        .merge(tags::routes())
        .merge(ingredients::routes())
}
