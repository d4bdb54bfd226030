//! Request extractors resolving `Authorization: Token <key>` to a user.
//!
//! A missing header means an anonymous request. A header that is malformed or
//! names an unknown token is rejected with 401 even on public endpoints.

use super::AppState;
use crate::{
    core::{
        auth,
        permissions::{Access, Policy},
    },
    entities::user,
    errors::Error,
};
use axum::{
    extract::FromRequestParts,
    http::{Method, header::AUTHORIZATION, request::Parts},
};
use tracing::debug;

const TOKEN_SCHEME: &str = "Token";

/// The authenticated user, if any
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<user::Model>);

impl MaybeUser {
    /// Borrows the user.
    #[must_use]
    pub fn user(&self) -> Option<&user::Model> {
        self.0.as_ref()
    }
}

/// The authenticated user; anonymous requests are rejected with 401
#[derive(Debug, Clone)]
pub struct CurrentUser(pub user::Model);

/// Safe methods read, everything else writes.
pub(super) fn access(method: &Method) -> Access {
    match *method {
        Method::GET | Method::HEAD | Method::OPTIONS => Access::Read,
        _ => Access::Write,
    }
}

fn token_key(header: &str) -> Option<&str> {
    let (scheme, key) = header.trim().split_once(' ')?;
    let key = key.trim();
    (scheme == TOKEN_SCHEME && !key.is_empty()).then_some(key)
}

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(header) = parts.headers.get(AUTHORIZATION) else {
            return Ok(Self(None));
        };

        let key = header
            .to_str()
            .ok()
            .and_then(token_key)
            .ok_or(Error::NotAuthenticated)?;

        let user = auth::user_for_token(&state.database, key)
            .await?
            .ok_or_else(|| {
                debug!("Rejected unknown token");
                Error::NotAuthenticated
            })?;

        Ok(Self(Some(user)))
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let MaybeUser(user) = MaybeUser::from_request_parts(parts, state).await?;
        Policy::Authenticated.check(access(&parts.method), user.as_ref())?;
        user.map(Self).ok_or(Error::NotAuthenticated)
    }
}
