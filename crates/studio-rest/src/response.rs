//! Response normalisation into `{data, error, count, status}`.

use reqwest::header::CONTENT_RANGE;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use studio_core::ApiError;

/// Result of one executed query.
///
/// Expected failures are reported through `error`; `data` is then `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct PostgrestResponse {
    pub data: Option<Value>,
    pub error: Option<ApiError>,
    /// Total from the `Content-Range` header, when the server reported one.
    pub count: Option<u64>,
    /// HTTP status; `None` when no response was received.
    pub status: Option<u16>,
}

impl PostgrestResponse {
    pub(crate) fn failure(error: ApiError) -> Self {
        Self {
            data: None,
            error: Some(error),
            count: None,
            status: None,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Convert into a `Result` for callers that prefer `?`.
    pub fn into_result(self) -> Result<Option<Value>, ApiError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.data),
        }
    }

    /// Deserialize `data` into a concrete type.
    ///
    /// A shape mismatch is reported as a `PARSE_ERROR`.
    pub fn decode<T: DeserializeOwned>(self) -> Result<Option<T>, ApiError> {
        match self.into_result()? {
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| ApiError::with_code(e.to_string(), ApiError::PARSE_ERROR)),
            None => Ok(None),
        }
    }
}

/// What the request asked for, which decides how the body is read.
#[derive(Debug, Clone)]
pub(crate) struct ResponseShape {
    pub method: Method,
    pub head: bool,
    pub select_called: bool,
    pub maybe_single: bool,
}

pub(crate) async fn normalize(response: reqwest::Response, shape: &ResponseShape) -> PostgrestResponse {
    let status = response.status();
    let count = response
        .headers()
        .get(CONTENT_RANGE)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_content_range);

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let error = error_from_body(&body, status);
        tracing::warn!(
            status = status.as_u16(),
            code = error.code.as_deref().unwrap_or_default(),
            "PostgREST request failed"
        );
        return PostgrestResponse {
            data: None,
            error: Some(error),
            count,
            status: Some(status.as_u16()),
        };
    }

    let skip_body = shape.method == Method::HEAD
        || shape.head
        || (shape.method == Method::DELETE && !shape.select_called);

    let mut result = PostgrestResponse {
        data: None,
        error: None,
        count,
        status: Some(status.as_u16()),
    };
    if skip_body {
        return result;
    }

    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read PostgREST response body");
            result.error = Some(ApiError::network(e.to_string()));
            return result;
        }
    };

    match parse_body(&body, shape.maybe_single) {
        Ok(data) => result.data = data,
        Err(error) => result.error = Some(error),
    }
    result
}

fn parse_body(body: &str, maybe_single: bool) -> Result<Option<Value>, ApiError> {
    if body.trim().is_empty() {
        return Ok(None);
    }
    let value: Value = serde_json::from_str(body)
        .map_err(|e| ApiError::with_code(format!("Invalid JSON response: {}", e), ApiError::PARSE_ERROR))?;
    Ok(if maybe_single {
        collapse_maybe_single(value)
    } else {
        Some(value)
    })
}

/// `[]` is absence and `[x]` is `x`. Longer arrays yield their first row
/// rather than an error; callers relying on that are left alone.
pub(crate) fn collapse_maybe_single(value: Value) -> Option<Value> {
    match value {
        Value::Array(rows) => rows.into_iter().next(),
        Value::Null => None,
        other => Some(other),
    }
}

/// Total from `Content-Range: <range>/<total>`; `*` or junk yields `None`.
pub(crate) fn parse_content_range(header: &str) -> Option<u64> {
    let (_, total) = header.rsplit_once('/')?;
    total.trim().parse().ok()
}

/// Build the error half from a non-2xx body.
fn error_from_body(body: &str, status: StatusCode) -> ApiError {
    let json: Value = serde_json::from_str(body).unwrap_or_else(|_| Value::Object(Default::default()));
    let text = |key: &str| json.get(key).and_then(Value::as_str).map(str::to_string);

    let message = text("message")
        .or_else(|| text("error"))
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .map(str::to_string)
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
        });
    let code = match json.get("code") {
        Some(Value::String(code)) => code.clone(),
        Some(Value::Number(code)) => code.to_string(),
        _ => status.as_u16().to_string(),
    };

    ApiError {
        message,
        code: Some(code),
        details: text("details"),
        hint: text("hint"),
    }
}
