//! `/users` and `/auth/token` - accounts, subscriptions and tokens.

use crate::{
    api::{
        AppState,
        auth::{CurrentUser, MaybeUser},
        pagination::{PageParams, PageResponse},
    },
    core::{
        auth,
        relations::{self, SUBSCRIPTIONS, SubscriptionRead},
        users::{self, RegisterPayload, RegisteredUser, SetPasswordPayload, UserRead},
    },
    errors::Result,
};
use axum::{
    Json, Router,
    extract::{OriginalUri, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
struct LoginPayload {
    email: String,
    password: String,
}

#[derive(Debug, Serialize)]
struct TokenResponse {
    auth_token: String,
}

#[derive(Debug, Default, Deserialize)]
struct RecipesLimit {
    recipes_limit: Option<u64>,
}

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(register))
        .route("/users/me", get(me))
        .route("/users/set_password", post(set_password))
        .route("/users/subscriptions", get(subscriptions))
        .route("/users/{id}", get(get_user))
        .route("/users/{id}/subscribe", post(subscribe).delete(unsubscribe))
        .route("/auth/token/login", post(login))
        .route("/auth/token/logout", post(logout))
}

async fn list_users(
    State(state): State<AppState>,
    viewer: MaybeUser,
    OriginalUri(uri): OriginalUri,
    Query(params): Query<PageParams>,
) -> Result<Json<PageResponse<UserRead>>> {
    let page =
        users::list_users(&state.database, viewer.user(), params.request(state.page_size)).await?;
    Ok(Json(PageResponse::new(page, &uri)))
}

async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterPayload>,
) -> Result<(StatusCode, Json<RegisteredUser>)> {
    let user = users::register(&state.database, payload).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

async fn get_user(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Path(id): Path<i32>,
) -> Result<Json<UserRead>> {
    Ok(Json(users::get_user_read(&state.database, viewer.user(), id).await?))
}

async fn me(State(state): State<AppState>, CurrentUser(user): CurrentUser) -> Result<Json<UserRead>> {
    let read = users::user_read(&state.database, Some(&user), user.clone()).await?;
    Ok(Json(read))
}

async fn set_password(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<SetPasswordPayload>,
) -> Result<StatusCode> {
    users::set_password(&state.database, &user, payload).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn subscriptions(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    OriginalUri(uri): OriginalUri,
    Query(params): Query<PageParams>,
    Query(limit): Query<RecipesLimit>,
) -> Result<Json<PageResponse<SubscriptionRead>>> {
    let page = relations::list_subscriptions(
        &state.database,
        &state.media,
        &user,
        params.request(state.page_size),
        limit.recipes_limit,
    )
    .await?;
    Ok(Json(PageResponse::new(page, &uri)))
}

async fn subscribe(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(author_id): Path<i32>,
    Query(limit): Query<RecipesLimit>,
) -> Result<(StatusCode, Json<SubscriptionRead>)> {
    relations::subscribe(&state.database, user.id, author_id)
        .await?
        .into_result(SUBSCRIPTIONS)?;

    let author = users::get_user_by_id(&state.database, author_id).await?;
    let read = relations::subscription_read(
        &state.database,
        &state.media,
        Some(&user),
        author,
        limit.recipes_limit,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(read)))
}

async fn unsubscribe(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(author_id): Path<i32>,
) -> Result<StatusCode> {
    relations::unsubscribe(&state.database, user.id, author_id)
        .await?
        .into_result(SUBSCRIPTIONS)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<Json<TokenResponse>> {
    let token = auth::login(&state.database, &payload.email, &payload.password).await?;
    Ok(Json(TokenResponse {
        auth_token: token.key,
    }))
}

async fn logout(State(state): State<AppState>, CurrentUser(user): CurrentUser) -> Result<StatusCode> {
    auth::logout(&state.database, user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
