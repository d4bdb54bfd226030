//! `/ingredients` - read-only for everyone, searchable by name.

use super::read_only;
use crate::{
    api::AppState,
    core::ingredients,
    entities::ingredient,
    errors::Result,
};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct IngredientQuery {
    name: Option<String>,
}

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/ingredients", get(list_ingredients).fallback(read_only))
        .route("/ingredients/{id}", get(get_ingredient).fallback(read_only))
}

async fn list_ingredients(
    State(state): State<AppState>,
    Query(query): Query<IngredientQuery>,
) -> Result<Json<Vec<ingredient::Model>>> {
    let found = ingredients::list_ingredients(&state.database, query.name.as_deref()).await?;
    Ok(Json(found))
}

async fn get_ingredient(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ingredient::Model>> {
    Ok(Json(ingredients::get_ingredient(&state.database, id).await?))
}
