//! `/tags` - read-only for everyone.

use super::read_only;
use crate::{
    api::AppState,
    core::tags,
    entities::tag,
    errors::Result,
};
use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/tags", get(list_tags).fallback(read_only))
        .route("/tags/{id}", get(get_tag).fallback(read_only))
}

async fn list_tags(State(state): State<AppState>) -> Result<Json<Vec<tag::Model>>> {
    Ok(Json(tags::list_tags(&state.database).await?))
}

async fn get_tag(State(state): State<AppState>, Path(id): Path<i32>) -> Result<Json<tag::Model>> {
    Ok(Json(tags::get_tag(&state.database, id).await?))
}

#[cfg(test)]
mod tests {
    use crate::{errors::Result, test_utils::*};
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_tags_are_read_only() -> Result<()> {
        let db = setup_test_db().await?;
        let tag = create_test_tag(&db, "breakfast").await?;
        let state = test_state(db);

        let (status, body) = send(&state, get("/api/tags/")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["slug"], "breakfast");
        assert_eq!(body[0]["color"], "#E26C2D");

        let (status, body) = send(&state, get(&format!("/api/tags/{}/", tag.id))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Breakfast");

        let (status, _) = send(&state, post("/api/tags/", &serde_json::json!({}))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) = send(&state, delete(&format!("/api/tags/{}/", tag.id))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = send(&state, get("/api/tags/999/")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        Ok(())
    }
}
