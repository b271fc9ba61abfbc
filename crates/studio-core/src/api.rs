//! Structured `{data, error}` envelope returned by the client shims.
//!
//! Expected failures (transport errors, HTTP errors, unparsable bodies) are
//! values, not `Err`s: callers can always destructure a response.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error half of the envelope.
///
/// `details` and `hint` are only filled in when the server supplies them
/// (PostgREST does for constraint and syntax errors).
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{message}")]
pub struct ApiError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ApiError {
    /// Transport-level failure (connection refused, DNS, TLS, reset).
    pub const NETWORK_ERROR: &'static str = "NETWORK_ERROR";
    /// A 2xx response whose body was not valid JSON.
    pub const PARSE_ERROR: &'static str = "PARSE_ERROR";
    /// A request payload that could not be serialized.
    pub const SERIALIZATION_ERROR: &'static str = "SERIALIZATION_ERROR";
    /// A request that could not be built (malformed range, unencodable header).
    pub const INVALID_REQUEST: &'static str = "INVALID_REQUEST";

    /// Error with a message and no code.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
            details: None,
            hint: None,
        }
    }

    /// Error with a message and a code.
    pub fn with_code(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            ..Self::new(message)
        }
    }

    /// Wrap a transport failure.
    pub fn network(message: impl Into<String>) -> Self {
        Self::with_code(message, Self::NETWORK_ERROR)
    }

    /// Returns true if this error came from the transport rather than the server.
    pub fn is_network(&self) -> bool {
        self.code.as_deref() == Some(Self::NETWORK_ERROR)
    }
}

/// `{data, error}` envelope.
///
/// Exactly one of the halves is meaningful: `error` set means failure, and
/// `data: None` with `error: None` means a successful absence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

impl<T> ApiResponse<T> {
    /// Successful response carrying data.
    pub fn ok(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
        }
    }

    /// Successful response with nothing to return.
    pub fn empty() -> Self {
        Self {
            data: None,
            error: None,
        }
    }

    /// Failed response.
    pub fn err(error: ApiError) -> Self {
        Self {
            data: None,
            error: Some(error),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Convert into a `Result` for callers that prefer `?`.
    pub fn into_result(self) -> Result<Option<T>, ApiError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.data),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ApiResponse<U> {
        ApiResponse {
            data: self.data.map(f),
            error: self.error,
        }
    }
}
