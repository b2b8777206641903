use thiserror::Error;

/// Failures reported by the authentication exchange.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("An account with this email already exists")]
    EmailTaken,

    #[error("Network failure: {0}")]
    NetworkFailure(String),

    /// The session was signed out while this request was in flight.
    #[error("Sign-in was superseded by a logout")]
    Superseded,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not signed in")]
    NotAuthenticated,

    #[error("Storage error: {0}")]
    Storage(String),
}

impl AppError {
    /// The authentication failure wrapped by this error, if any.
    pub fn auth_kind(&self) -> Option<&AuthError> {
        match self {
            AppError::Auth(kind) => Some(kind),
            _ => None,
        }
    }
}

/// Convenience type alias for Results with AppError
pub type Result<T> = std::result::Result<T, AppError>;
