//! User business logic - registration, profiles and password changes.
//!
//! Every read that exposes a user also reports whether the viewer follows them.
//! Anonymous viewers always get `is_subscribed = false`.

use crate::{
    core::{
        auth,
        pagination::{Page, PageRequest},
        relations,
    },
    entities::{User, user},
    errors::{Error, Result},
};
use sea_orm::{PaginatorTrait, QueryOrder, Set, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

const MAX_NAME_LENGTH: usize = 150;
const MAX_EMAIL_LENGTH: usize = 254;

/// Registration request body
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterPayload {
    /// Login email, must be unique
    pub email: String,
    /// Public handle, must be unique
    pub username: String,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Plain-text password, hashed before storage
    pub password: String,
}

/// Password change request body
#[derive(Debug, Clone, Deserialize)]
pub struct SetPasswordPayload {
    /// The password currently in use
    pub current_password: String,
    /// The replacement
    pub new_password: String,
}

/// Public representation of a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserRead {
    /// Login email
    pub email: String,
    /// User ID
    pub id: i32,
    /// Public handle
    pub username: String,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Whether the viewer follows this user
    pub is_subscribed: bool,
}

impl UserRead {
    /// Builds the representation from a model and a precomputed flag.
    #[must_use]
    pub fn from_model(user: user::Model, is_subscribed: bool) -> Self {
        Self {
            email: user.email,
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            is_subscribed,
        }
    }
}

/// Reply to a successful registration (no subscription flag, no password)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisteredUser {
    /// Login email
    pub email: String,
    /// User ID
    pub id: i32,
    /// Public handle
    pub username: String,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
}

impl From<user::Model> for RegisteredUser {
    fn from(user: user::Model) -> Self {
        Self {
            email: user.email,
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
        }
    }
}

fn is_valid_username(username: &str) -> bool {
    !username.is_empty()
        && username.chars().count() <= MAX_NAME_LENGTH
        && username
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | '@' | '+' | '-'))
}

fn is_valid_email(email: &str) -> bool {
    email.len() <= MAX_EMAIL_LENGTH
        && email
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'))
}

fn validate_registration(payload: &RegisterPayload) -> Result<()> {
    if !is_valid_email(payload.email.trim()) {
        return Err(Error::validation("Enter a valid email address"));
    }
    if !is_valid_username(&payload.username) {
        return Err(Error::validation(
            "Username may contain only letters, digits and @/./+/-/_",
        ));
    }
    for (field, value) in [
        ("first_name", &payload.first_name),
        ("last_name", &payload.last_name),
    ] {
        if value.trim().is_empty() || value.chars().count() > MAX_NAME_LENGTH {
            return Err(Error::validation(format!(
                "{field} must be between 1 and {MAX_NAME_LENGTH} characters"
            )));
        }
    }
    if payload.password.is_empty() {
        return Err(Error::validation("Password cannot be empty"));
    }
    Ok(())
}

/// Registers a new user after validating the payload and uniqueness of email
/// and username.
#[instrument(skip(db, payload), fields(username = %payload.username))]
pub async fn register(db: &DatabaseConnection, payload: RegisterPayload) -> Result<user::Model> {
    validate_registration(&payload)?;
    let email = auth::normalize_email(&payload.email);

    let taken = User::find()
        .filter(
            user::Column::Email
                .eq(email.as_str())
                .or(user::Column::Username.eq(payload.username.as_str())),
        )
        .one(db)
        .await?;
    if let Some(existing) = taken {
        return Err(if existing.email == email {
            Error::validation("A user with that email already exists")
        } else {
            Error::validation("A user with that username already exists")
        });
    }

    let user = user::ActiveModel {
        email: Set(email),
        username: Set(payload.username),
        first_name: Set(payload.first_name.trim().to_string()),
        last_name: Set(payload.last_name.trim().to_string()),
        password: Set(auth::hash_password(&payload.password).await?),
        is_staff: Set(false),
        is_superuser: Set(false),
        ..Default::default()
    };

    let user = user.insert(db).await?;
    info!("Registered user {}", user.id);
    Ok(user)
}

/// Finds a user by ID or fails with [`Error::NotFound`].
pub async fn get_user_by_id<C>(db: &C, user_id: i32) -> Result<user::Model>
where
    C: ConnectionTrait,
{
    User::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("User", user_id))
}

/// Representation of `user` as seen by `viewer`.
pub async fn user_read(
    db: &DatabaseConnection,
    viewer: Option<&user::Model>,
    user: user::Model,
) -> Result<UserRead> {
    let is_subscribed = relations::is_subscribed(db, viewer, user.id).await?;
    Ok(UserRead::from_model(user, is_subscribed))
}

/// Loads one user and renders it for `viewer`.
pub async fn get_user_read(
    db: &DatabaseConnection,
    viewer: Option<&user::Model>,
    user_id: i32,
) -> Result<UserRead> {
    let user = get_user_by_id(db, user_id).await?;
    user_read(db, viewer, user).await
}

/// Lists all users by ID, one page at a time.
pub async fn list_users(
    db: &DatabaseConnection,
    viewer: Option<&user::Model>,
    request: PageRequest,
) -> Result<Page<UserRead>> {
    let paginator = User::find()
        .order_by_asc(user::Column::Id)
        .paginate(db, request.limit);
    let count = paginator.num_items().await?;
    let users = paginator.fetch_page(request.index()).await?;

    let mut results = Vec::with_capacity(users.len());
    for user in users {
        results.push(user_read(db, viewer, user).await?);
    }
    Ok(Page::new(results, count, request))
}

/// Replaces the password of `user` after checking the current one.
#[instrument(skip(db, user, payload), fields(user_id = user.id))]
pub async fn set_password(
    db: &DatabaseConnection,
    user: &user::Model,
    payload: SetPasswordPayload,
) -> Result<()> {
    if !auth::verify_password(&payload.current_password, &user.password).await? {
        return Err(Error::validation("Invalid password"));
    }
    if payload.new_password.is_empty() {
        return Err(Error::validation("Password cannot be empty"));
    }

    let mut active: user::ActiveModel = user.clone().into();
    active.password = Set(auth::hash_password(&payload.new_password).await?);
    active.update(db).await?;
    info!("Password changed");
    Ok(())
}
