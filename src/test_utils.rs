//! Shared test utilities for Foodgram.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults. Fixtures are inserted
//! directly so tests do not pay for password hashing or image decoding.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use crate::{
    api::{self, AppData, AppState},
    core::{auth, media::MediaStorage},
    entities::{auth_token, ingredient, recipe, recipe_ingredient, tag, user},
    errors::Result,
};
use axum::{
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
    response::Response,
};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use std::{path::Path, sync::Arc};
use tower::ServiceExt;

/// A 1x1 PNG as a data URL.
pub const TEST_IMAGE: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

/// Password hash that no password verifies against.
const UNUSABLE_PASSWORD: &str = "!";

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

async fn insert_user(db: &DatabaseConnection, name: &str, is_staff: bool) -> Result<user::Model> {
    let user = user::ActiveModel {
        email: Set(format!("{name}@example.com")),
        username: Set(name.to_string()),
        first_name: Set(name.to_string()),
        last_name: Set("Tester".to_string()),
        password: Set(UNUSABLE_PASSWORD.to_string()),
        is_staff: Set(is_staff),
        is_superuser: Set(false),
        ..Default::default()
    };
    Ok(user.insert(db).await?)
}

/// Creates a regular user named `name` with email `<name>@example.com`.
///
/// The user cannot log in; register through `core::users` when a test needs
/// a working password.
pub async fn create_test_user(db: &DatabaseConnection, name: &str) -> Result<user::Model> {
    insert_user(db, name, false).await
}

/// Creates a staff user named `name`.
pub async fn create_test_staff(db: &DatabaseConnection, name: &str) -> Result<user::Model> {
    insert_user(db, name, true).await
}

/// Creates a tag whose slug is `slug` and whose name is the capitalized slug.
pub async fn create_test_tag(db: &DatabaseConnection, slug: &str) -> Result<tag::Model> {
    let mut name = slug.to_string();
    if let Some(first) = name.get_mut(0..1) {
        first.make_ascii_uppercase();
    }

    let tag = tag::ActiveModel {
        name: Set(name),
        color: Set(Some("#E26C2D".to_string())),
        slug: Set(slug.to_string()),
        ..Default::default()
    };
    Ok(tag.insert(db).await?)
}

/// Creates an ingredient.
pub async fn create_test_ingredient(
    db: &DatabaseConnection,
    name: &str,
    measurement_unit: &str,
) -> Result<ingredient::Model> {
    let ingredient = ingredient::ActiveModel {
        name: Set(name.to_string()),
        search_name: Set(name.to_lowercase()),
        measurement_unit: Set(measurement_unit.to_string()),
        ..Default::default()
    };
    Ok(ingredient.insert(db).await?)
}

/// Creates a recipe by `author` with the given `(ingredient_id, amount)` pairs.
///
/// # Defaults
/// * `text`: `"Test recipe"`
/// * `cooking_time`: 10
/// * `image`: a path under the recipe image directory that does not exist
pub async fn create_test_recipe(
    db: &DatabaseConnection,
    author: &user::Model,
    name: &str,
    ingredients: &[(i32, i32)],
) -> Result<recipe::Model> {
    let recipe = recipe::ActiveModel {
        name: Set(name.to_string()),
        text: Set("Test recipe".to_string()),
        cooking_time: Set(10),
        image: Set(format!("{}/test.png", crate::core::media::RECIPE_IMAGE_DIR)),
        author_id: Set(author.id),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    for &(ingredient_id, amount) in ingredients {
        recipe_ingredient::ActiveModel {
            recipe_id: Set(recipe.id),
            ingredient_id: Set(ingredient_id),
            amount: Set(amount),
        }
        .insert(db)
        .await?;
    }
    Ok(recipe)
}

/// Sets up a complete test environment with an author and one recipe.
/// Returns (db, author, recipe) for common test scenarios.
pub async fn setup_with_recipe() -> Result<(DatabaseConnection, user::Model, recipe::Model)> {
    let db = setup_test_db().await?;
    let author = create_test_user(&db, "author").await?;
    let recipe = create_test_recipe(&db, &author, "Test Recipe", &[]).await?;
    Ok((db, author, recipe))
}

/// Media storage for tests that only build URLs and never touch the disk.
#[must_use]
pub fn test_media() -> MediaStorage {
    MediaStorage::new("test-media", "/media/")
}

/// Issues an API token for `user` without going through the password check.
pub async fn create_test_token(db: &DatabaseConnection, user: &user::Model) -> Result<String> {
    let token = auth_token::ActiveModel {
        key: Set(auth::generate_token_key()),
        user_id: Set(user.id),
        created_at: Set(chrono::Utc::now()),
    }
    .insert(db)
    .await?;
    Ok(token.key)
}

/// Handler state over `db` with [`test_media`] storage.
#[must_use]
pub fn test_state(db: DatabaseConnection) -> AppState {
    Arc::new(AppData::new(db, test_media(), 6))
}

/// Handler state over `db` writing media below `media_root`.
#[must_use]
pub fn test_state_with_media(db: DatabaseConnection, media_root: &Path) -> AppState {
    Arc::new(AppData::new(db, MediaStorage::new(media_root, "/media/"), 6))
}

fn json_request(method: Method, uri: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// A GET request.
#[must_use]
pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

/// A DELETE request.
#[must_use]
pub fn delete(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// A POST request with a JSON body.
#[must_use]
pub fn post(uri: &str, body: &serde_json::Value) -> Request<Body> {
    json_request(Method::POST, uri, body)
}

/// A PATCH request with a JSON body.
#[must_use]
pub fn patch(uri: &str, body: &serde_json::Value) -> Request<Body> {
    json_request(Method::PATCH, uri, body)
}

/// Adds `Authorization: Token <token>`.
#[must_use]
pub fn authed(mut request: Request<Body>, token: &str) -> Request<Body> {
    request.headers_mut().insert(
        header::AUTHORIZATION,
        format!("Token {token}").parse().unwrap(),
    );
    request
}

/// Runs one request through the full application.
pub async fn send_response(state: &AppState, request: Request<Body>) -> Response {
    api::app(Arc::clone(state)).oneshot(request).await.unwrap()
}

/// Runs one request and returns the status and the body as text.
pub async fn send_raw(state: &AppState, request: Request<Body>) -> (StatusCode, String) {
    let response = send_response(state, request).await;
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

/// Runs one request and returns the status and the JSON body (`null` when empty).
pub async fn send(state: &AppState, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let (status, text) = send_raw(state, request).await;
    let body = if text.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text))
    };
    (status, body)
}
