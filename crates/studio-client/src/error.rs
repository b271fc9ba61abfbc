//! Errors raised while assembling the client.

use studio_auth::AuthError;
use studio_core::CoreError;
use studio_rest::RestError;
use studio_storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// Required endpoint settings are empty.
    #[error("Missing required settings: {}", .0.join(", "))]
    MissingSettings(Vec<&'static str>),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Rest(#[from] RestError),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

pub type ClientResult<T> = Result<T, ClientError>;
