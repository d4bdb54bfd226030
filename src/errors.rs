use sea_orm::DbErr;
use thiserror::Error;

/// Every failure the service can report, from validation up to storage.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid or missing configuration
    #[error("Configuration error: {message}")]
    Config {
        /// What was wrong with the configuration
        message: String,
    },

    /// Client input that failed validation
    #[error("{message}")]
    Validation {
        /// Human-readable description of the problem
        message: String,
    },

    /// A referenced row does not exist
    #[error("{entity} {id} not found")]
    NotFound {
        /// Kind of row that was looked up
        entity: &'static str,
        /// Identifier that was looked up
        id: String,
    },

    /// The request carries no (valid) credentials
    #[error("Authentication credentials were not provided")]
    NotAuthenticated,

    /// The caller is known but may not perform the action
    #[error("You do not have permission to perform this action")]
    PermissionDenied,

    /// Login with a wrong email or password
    #[error("Unable to log in with provided credentials")]
    InvalidCredentials,

    /// The relation to add already exists
    #[error("Already in {relation}")]
    AlreadyPresent {
        /// Human-readable relation name
        relation: &'static str,
    },

    /// The relation to remove does not exist
    #[error("Not in {relation}")]
    NotPresent {
        /// Human-readable relation name
        relation: &'static str,
    },

    /// Storage failure
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    /// Filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed reference data file
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A blocking task panicked or was cancelled
    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// argon2 failure while hashing or parsing a hash
    #[error("Password hashing error: {0}")]
    PasswordHash(String),
}

impl Error {
    /// Shorthand for [`Error::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Shorthand for [`Error::NotFound`].
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

impl From<argon2::password_hash::Error> for Error {
    fn from(value: argon2::password_hash::Error) -> Self {
        Self::PasswordHash(value.to_string())
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
