use thiserror::Error;

/// Failures while locating, reading or writing client settings.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Cannot resolve data directory: {0}")]
    Path(String),

    #[error("Settings file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Settings file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub type CoreResult<T> = Result<T, CoreError>;
