//! Password hashing and API token management.
//!
//! Passwords are stored as argon2 PHC strings. Logging in issues an opaque
//! 40-character token which the client sends back as `Authorization: Token <key>`;
//! a user keeps a single token until they log out.

use crate::{
    entities::{AuthToken, User, auth_token, user},
    errors::{Error, Result},
};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use rand::RngCore;
use sea_orm::{Set, prelude::*};
use tracing::{debug, info, instrument};

/// Hashes a plain-text password with a fresh random salt.
///
/// argon2 is CPU-bound, so the work runs on the blocking thread pool.
pub async fn hash_password(password: &str) -> Result<String> {
    let password = password.to_owned();

    tokio::task::spawn_blocking(move || -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        Ok(Argon2::default()
            .hash_password(password.as_bytes(), &salt)?
            .to_string())
    })
    .await?
}

/// Checks a plain-text password against a stored hash.
///
/// A hash that cannot be parsed (e.g. an unusable fixture password) never
/// matches.
pub async fn verify_password(password: &str, password_hash: &str) -> Result<bool> {
    let password = password.to_owned();
    let password_hash = password_hash.to_owned();

    let verified = tokio::task::spawn_blocking(move || {
        PasswordHash::new(&password_hash).is_ok_and(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
    })
    .await?;
    Ok(verified)
}

/// Canonical form of an email address: trimmed and lower-cased.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Generates a random 40-character hex token key.
#[must_use]
pub fn generate_token_key() -> String {
    let mut bytes = [0u8; 20];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Looks a user up by email and checks their password.
pub async fn authenticate(
    db: &DatabaseConnection,
    email: &str,
    password: &str,
) -> Result<user::Model> {
    let user = User::find()
        .filter(user::Column::Email.eq(normalize_email(email)))
        .one(db)
        .await?
        .ok_or(Error::InvalidCredentials)?;

    if !verify_password(password, &user.password).await? {
        return Err(Error::InvalidCredentials);
    }

    Ok(user)
}

/// Logs a user in, returning their existing token or issuing a new one.
#[instrument(skip(db, password))]
pub async fn login(
    db: &DatabaseConnection,
    email: &str,
    password: &str,
) -> Result<auth_token::Model> {
    let user = authenticate(db, email, password).await?;

    if let Some(token) = AuthToken::find()
        .filter(auth_token::Column::UserId.eq(user.id))
        .one(db)
        .await?
    {
        debug!("Reusing token for user {}", user.id);
        return Ok(token);
    }

    let token = auth_token::ActiveModel {
        key: Set(generate_token_key()),
        user_id: Set(user.id),
        created_at: Set(chrono::Utc::now()),
    };
    let token = token.insert(db).await?;
    info!("Issued token for user {}", user.id);
    Ok(token)
}

/// Revokes every token belonging to `user_id`.
#[instrument(skip(db))]
pub async fn logout(db: &DatabaseConnection, user_id: i32) -> Result<()> {
    let result = AuthToken::delete_many()
        .filter(auth_token::Column::UserId.eq(user_id))
        .exec(db)
        .await?;
    debug!("Revoked {} token(s)", result.rows_affected);
    Ok(())
}

/// Resolves a token key to its user, `None` if the key is unknown.
pub async fn user_for_token(db: &DatabaseConnection, key: &str) -> Result<Option<user::Model>> {
    let found = AuthToken::find_by_id(key.to_string())
        .find_also_related(User)
        .one(db)
        .await?;

    Ok(found.and_then(|(_, user)| user))
}
