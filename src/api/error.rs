//! Mapping of domain errors onto HTTP responses.

use crate::errors::Error;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

impl Error {
    /// HTTP status code the error is reported with.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { .. }
            | Self::AlreadyPresent { .. }
            | Self::NotPresent { .. }
            | Self::InvalidCredentials => StatusCode::BAD_REQUEST,
            Self::NotAuthenticated => StatusCode::UNAUTHORIZED,
            Self::PermissionDenied => StatusCode::FORBIDDEN,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Config { .. }
            | Self::Database(_)
            | Self::Io(_)
            | Self::Csv(_)
            | Self::Task(_)
            | Self::PasswordHash(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = match status {
            StatusCode::BAD_REQUEST => json!({ "errors": self.to_string() }),
            StatusCode::INTERNAL_SERVER_ERROR => {
                error!("Request failed: {self}");
                json!({ "detail": "Internal server error" })
            }
            _ => json!({ "detail": self.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}
