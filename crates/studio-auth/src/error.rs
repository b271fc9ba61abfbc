//! Error types for session manager construction.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid backend URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Backend URL cannot be used as a base: {0}")]
    InvalidBackend(String),
}

pub type AuthResult<T> = Result<T, AuthError>;
