//! Entry point bound to one PostgREST endpoint and service key.

use crate::builder::QueryBuilder;
use crate::error::{RestError, RestResult};
use reqwest::Method;
use serde::Serialize;
use url::Url;

/// PostgREST client.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Clone)]
pub struct PostgrestClient {
    http_client: reqwest::Client,
    endpoint: Url,
    api_key: String,
}

impl PostgrestClient {
    /// Create a client for `endpoint_root` (e.g. `https://db.example.com/rest/v1`).
    ///
    /// The API key is the static service credential sent on every request.
    pub fn new(endpoint_root: &str, api_key: impl Into<String>) -> RestResult<Self> {
        Self::with_http_client(reqwest::Client::new(), endpoint_root, api_key)
    }

    /// Same as [`PostgrestClient::new`] with a caller-supplied HTTP client.
    pub fn with_http_client(
        http_client: reqwest::Client,
        endpoint_root: &str,
        api_key: impl Into<String>,
    ) -> RestResult<Self> {
        let endpoint = Url::parse(endpoint_root)?;
        if endpoint.cannot_be_a_base() {
            return Err(RestError::InvalidEndpoint(endpoint_root.to_string()));
        }
        Ok(Self {
            http_client,
            endpoint,
            api_key: api_key.into(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Start a query against `table`.
    pub fn from(&self, table: &str) -> QueryBuilder {
        QueryBuilder::new(self.http_client.clone(), self.path_url(&[table]), self.api_key.clone())
    }

    /// Call a stored function: `POST {endpoint}/rpc/{function}` with `params` as body.
    pub fn rpc<P: Serialize>(&self, function: &str, params: P) -> QueryBuilder {
        QueryBuilder::new(
            self.http_client.clone(),
            self.path_url(&["rpc", function]),
            self.api_key.clone(),
        )
        .with_body(Method::POST, params)
    }

    fn path_url(&self, segments: &[&str]) -> Url {
        let mut url = self.endpoint.clone();
        url.set_query(None);
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

impl std::fmt::Debug for PostgrestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgrestClient")
            .field("endpoint", &self.endpoint.as_str())
            .finish_non_exhaustive()
    }
}
