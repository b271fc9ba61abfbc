//! Error types for client construction.

use thiserror::Error;

/// Errors raised while setting up a [`crate::PostgrestClient`].
///
/// Query failures are never raised; they come back inside
/// [`crate::PostgrestResponse`].
#[derive(Debug, Error)]
pub enum RestError {
    /// The endpoint root is not a valid absolute URL.
    #[error("Invalid endpoint URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The endpoint root parses but cannot carry path segments (e.g. `mailto:`).
    #[error("Endpoint cannot be used as a base URL: {0}")]
    InvalidEndpoint(String),
}

pub type RestResult<T> = Result<T, RestError>;
