//! `/recipes` - listing and CRUD, favorites, shopping cart and its export.

use crate::{
    api::{
        AppState,
        auth::{CurrentUser, MaybeUser},
        pagination::{PageParams, PageResponse},
    },
    core::{
        recipes::{self, RecipeFilter, RecipePayload, RecipeRead, RecipeShort, RecipeUpdatePayload},
        relations::{self, RecipeRelation},
        shopping_cart,
    },
    errors::Result,
};
use axum::{
    Json, Router,
    extract::{OriginalUri, Path, RawQuery, State},
    http::{
        StatusCode,
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    },
    response::IntoResponse,
    routing::{get, post},
};

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/recipes", get(list_recipes).post(create_recipe))
        .route(
            "/recipes/download_shopping_cart",
            get(download_shopping_cart),
        )
        .route(
            "/recipes/{id}",
            get(get_recipe).patch(update_recipe).delete(delete_recipe),
        )
        .route(
            "/recipes/{id}/favorite",
            post(add_favorite).delete(remove_favorite),
        )
        .route(
            "/recipes/{id}/shopping_cart",
            post(add_to_cart).delete(remove_from_cart),
        )
}

fn is_truthy(value: &str) -> bool {
    matches!(value, "1" | "true" | "True")
}

/// Splits the raw query into filters and paging. `tags` may repeat, which the
/// `Query` extractor cannot express.
fn parse_list_query(query: Option<&str>) -> (RecipeFilter, PageParams) {
    let pairs: Vec<(String, String)> = query
        .and_then(|query| serde_urlencoded::from_str(query).ok())
        .unwrap_or_default();

    let mut filter = RecipeFilter::default();
    let mut params = PageParams::default();
    for (key, value) in pairs {
        match key.as_str() {
            "author" => filter.author = Some(value),
            "tags" => filter.tags.push(value),
            "is_favorited" => filter.is_favorited = is_truthy(&value),
            "is_in_shopping_cart" => filter.is_in_shopping_cart = is_truthy(&value),
            "page" => params.page = value.parse().ok(),
            "limit" => params.limit = value.parse().ok(),
            _ => {}
        }
    }
    (filter, params)
}

async fn list_recipes(
    State(state): State<AppState>,
    viewer: MaybeUser,
    OriginalUri(uri): OriginalUri,
    RawQuery(query): RawQuery,
) -> Result<Json<PageResponse<RecipeRead>>> {
    let (filter, params) = parse_list_query(query.as_deref());

    let page = recipes::list_recipes(
        &state.database,
        &state.media,
        viewer.user(),
        &filter,
        params.request(state.page_size),
    )
    .await?;
    Ok(Json(PageResponse::new(page, &uri)))
}

async fn create_recipe(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Json(payload): Json<RecipePayload>,
) -> Result<(StatusCode, Json<RecipeRead>)> {
    let recipe =
        recipes::create_recipe(&state.database, &state.media, viewer.user(), payload).await?;
    let read = recipes::recipe_read(&state.database, &state.media, viewer.user(), recipe).await?;
    Ok((StatusCode::CREATED, Json(read)))
}

async fn get_recipe(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Path(id): Path<i32>,
) -> Result<Json<RecipeRead>> {
    let read = recipes::get_recipe_read(&state.database, &state.media, viewer.user(), id).await?;
    Ok(Json(read))
}

async fn update_recipe(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Path(id): Path<i32>,
    Json(payload): Json<RecipeUpdatePayload>,
) -> Result<Json<RecipeRead>> {
    let recipe =
        recipes::update_recipe(&state.database, &state.media, viewer.user(), id, payload).await?;
    let read = recipes::recipe_read(&state.database, &state.media, viewer.user(), recipe).await?;
    Ok(Json(read))
}

async fn delete_recipe(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Path(id): Path<i32>,
) -> Result<StatusCode> {
    recipes::delete_recipe(&state.database, &state.media, viewer.user(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn add_relation(
    state: &AppState,
    relation: RecipeRelation,
    user_id: i32,
    recipe_id: i32,
) -> Result<(StatusCode, Json<RecipeShort>)> {
    relations::add_recipe_relation(&state.database, relation, user_id, recipe_id)
        .await?
        .into_result(relation.label())?;

    let recipe = recipes::get_recipe(&state.database, recipe_id).await?;
    Ok((
        StatusCode::CREATED,
        Json(recipes::recipe_short(&state.media, recipe)),
    ))
}

async fn remove_relation(
    state: &AppState,
    relation: RecipeRelation,
    user_id: i32,
    recipe_id: i32,
) -> Result<StatusCode> {
    relations::remove_recipe_relation(&state.database, relation, user_id, recipe_id)
        .await?
        .into_result(relation.label())?;
    Ok(StatusCode::NO_CONTENT)
}

async fn add_favorite(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
) -> Result<(StatusCode, Json<RecipeShort>)> {
    add_relation(&state, RecipeRelation::Favorite, user.id, id).await
}

async fn remove_favorite(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
) -> Result<StatusCode> {
    remove_relation(&state, RecipeRelation::Favorite, user.id, id).await
}

async fn add_to_cart(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
) -> Result<(StatusCode, Json<RecipeShort>)> {
    add_relation(&state, RecipeRelation::ShoppingCart, user.id, id).await
}

async fn remove_from_cart(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
) -> Result<StatusCode> {
    remove_relation(&state, RecipeRelation::ShoppingCart, user.id, id).await
}

async fn download_shopping_cart(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse> {
    let text = shopping_cart::export_shopping_cart(&state.database, user.id).await?;

    let disposition = format!(
        "attachment; filename=\"{}\"",
        shopping_cart::EXPORT_FILE_NAME
    );
    Ok((
        [
            (CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (CONTENT_DISPOSITION, disposition),
        ],
        text,
    ))
}

#[cfg(test)]
mod tests {
    use super::parse_list_query;
    use crate::{
        core::relations::{self, RecipeRelation},
        entities::Recipe,
        errors::Result,
        test_utils::*,
    };
    use axum::http::{
        StatusCode,
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    };
    use sea_orm::{EntityTrait, PaginatorTrait};
    use serde_json::json;

    #[test]
    fn test_parse_list_query() {
        let (filter, params) = parse_list_query(Some(
            "tags=lunch&tags=dinner&author=3&is_favorited=1&is_in_shopping_cart=0&page=2&limit=x",
        ));

        assert_eq!(filter.tags, vec!["lunch", "dinner"]);
        assert_eq!(filter.author.as_deref(), Some("3"));
        assert!(filter.is_favorited);
        assert!(!filter.is_in_shopping_cart);
        assert_eq!(params.page, Some(2));
        assert_eq!(params.limit, None);
    }

    #[tokio::test]
    async fn test_create_recipe_over_http() -> Result<()> {
        let db = setup_test_db().await?;
        let dir = tempfile::tempdir()?;
        let author = create_test_user(&db, "chef").await?;
        let token = create_test_token(&db, &author).await?;
        let salt = create_test_ingredient(&db, "salt", "g").await?;
        let lunch = create_test_tag(&db, "lunch").await?;
        let state = test_state_with_media(db, dir.path());

        let body = json!({
            "ingredients": [{"id": salt.id, "amount": 5}],
            "tags": [lunch.id],
            "image": TEST_IMAGE,
            "name": "Brine",
            "text": "Dissolve.",
            "cooking_time": 1,
        });

        let (status, _) = send(&state, post("/api/recipes/", &body)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, created) = send(&state, authed(post("/api/recipes/", &body), &token)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["name"], "Brine");
        assert_eq!(created["author"]["username"], "chef");
        assert_eq!(created["ingredients"][0]["amount"], 5);
        assert_eq!(created["tags"][0]["slug"], "lunch");
        assert_eq!(created["is_favorited"], false);
        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_recipe_is_rejected() -> Result<()> {
        let db = setup_test_db().await?;
        let author = create_test_user(&db, "chef").await?;
        let token = create_test_token(&db, &author).await?;
        let salt = create_test_ingredient(&db, "salt", "g").await?;
        let state = test_state(db);

        let body = json!({
            "ingredients": [{"id": salt.id, "amount": 5}, {"id": salt.id, "amount": 1}],
            "tags": [],
            "image": TEST_IMAGE,
            "name": "Brine",
            "text": "Dissolve.",
            "cooking_time": 0,
        });

        let (status, error) = send(&state, authed(post("/api/recipes", &body), &token)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(error["errors"].is_string());
        assert_eq!(Recipe::find().count(&state.database).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_edit_permissions() -> Result<()> {
        let (db, author, recipe) = setup_with_recipe().await?;
        let stranger = create_test_user(&db, "stranger").await?;
        let staff = create_test_staff(&db, "moderator").await?;
        let salt = create_test_ingredient(&db, "salt", "g").await?;
        let stranger_token = create_test_token(&db, &stranger).await?;
        let staff_token = create_test_token(&db, &staff).await?;
        let author_token = create_test_token(&db, &author).await?;
        let state = test_state(db);

        let uri = format!("/api/recipes/{}/", recipe.id);
        let body = json!({"ingredients": [{"id": salt.id, "amount": 2}], "tags": [], "name": "Edited"});

        let (status, _) = send(&state, patch(&uri, &body)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, _) = send(&state, delete("/api/recipes/999/")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(&state, authed(patch(&uri, &body), &stranger_token)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = send(&state, authed(delete(&uri), &stranger_token)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, edited) = send(&state, authed(patch(&uri, &body), &staff_token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(edited["name"], "Edited");

        let (status, _) = send(&state, authed(delete(&uri), &author_token)).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send(&state, get(&uri)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        Ok(())
    }

    #[tokio::test]
    async fn test_favorite_toggle_statuses() -> Result<()> {
        let (db, _author, recipe) = setup_with_recipe().await?;
        let fan = create_test_user(&db, "fan").await?;
        let token = create_test_token(&db, &fan).await?;
        let state = test_state(db);
        let uri = format!("/api/recipes/{}/favorite/", recipe.id);

        let (status, short) = send(&state, authed(post(&uri, &json!({})), &token)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(short["id"], recipe.id);
        assert_eq!(short["cooking_time"], recipe.cooking_time);

        let (status, error) = send(&state, authed(post(&uri, &json!({})), &token)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error["errors"], "Already in favorites");

        let (status, _) = send(&state, authed(delete(&uri), &token)).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send(&state, authed(delete(&uri), &token)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&state, post(&uri, &json!({}))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        Ok(())
    }

    #[tokio::test]
    async fn test_list_filters_and_flags() -> Result<()> {
        let (db, author, recipe) = setup_with_recipe().await?;
        let other = create_test_recipe(&db, &author, "Other", &[]).await?;
        let fan = create_test_user(&db, "fan").await?;
        let token = create_test_token(&db, &fan).await?;
        relations::add_recipe_relation(&db, RecipeRelation::Favorite, fan.id, recipe.id).await?;
        relations::add_recipe_relation(&db, RecipeRelation::ShoppingCart, fan.id, other.id).await?;
        let state = test_state(db);

        let (status, page) = send(&state, get("/api/recipes/?limit=1")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(page["count"], 2);
        assert_eq!(page["results"][0]["id"], other.id);
        assert_eq!(page["results"][0]["is_favorited"], false);
        assert_eq!(page["next"], "/api/recipes?limit=1&page=2");
        assert!(page["previous"].is_null());

        let (_, page) = send(&state, authed(get("/api/recipes/?is_favorited=1"), &token)).await;
        assert_eq!(page["count"], 1);
        assert_eq!(page["results"][0]["id"], recipe.id);
        assert_eq!(page["results"][0]["is_favorited"], true);

        let (_, page) = send(&state, get("/api/recipes/?is_favorited=1")).await;
        assert_eq!(page["count"], 0);

        let (_, page) =
            send(&state, authed(get("/api/recipes/?is_in_shopping_cart=1"), &token)).await;
        assert_eq!(page["count"], 1);
        assert_eq!(page["results"][0]["id"], other.id);
        assert_eq!(page["results"][0]["is_in_shopping_cart"], true);

        let (_, page) = send(&state, get("/api/recipes/?is_in_shopping_cart=1")).await;
        assert_eq!(page["count"], 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_token_is_rejected() -> Result<()> {
        let (db, _author, _recipe) = setup_with_recipe().await?;
        let state = test_state(db);

        let (status, error) = send(&state, authed(get("/api/recipes/"), "nonsense")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(error["detail"].is_string());
        Ok(())
    }

    #[tokio::test]
    async fn test_download_shopping_cart() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "shopper").await?;
        let token = create_test_token(&db, &user).await?;
        let salt = create_test_ingredient(&db, "salt", "g").await?;
        let recipe = create_test_recipe(&db, &user, "Brine", &[(salt.id, 10)]).await?;
        relations::add_recipe_relation(&db, RecipeRelation::ShoppingCart, user.id, recipe.id)
            .await?;
        let state = test_state(db);

        let (status, _) = send_raw(&state, get("/api/recipes/download_shopping_cart/")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let response = send_response(
            &state,
            authed(get("/api/recipes/download_shopping_cart/"), &token),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[CONTENT_DISPOSITION],
            "attachment; filename=\"cart.txt\""
        );
        assert!(
            response.headers()[CONTENT_TYPE]
                .to_str()
                .is_ok_and(|value| value.starts_with("text/plain"))
        );

        let (_, text) = send_raw(
            &state,
            authed(get("/api/recipes/download_shopping_cart"), &token),
        )
        .await;
        assert_eq!(text, "Salt (g) - 10\n");
        Ok(())
    }
}
