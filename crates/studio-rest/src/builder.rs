//! The chainable query descriptor.
//!
//! Every method except [`QueryBuilder::execute`] only records state. The
//! descriptor is consumed by `execute`, which performs exactly one request.

use crate::filter::{Filter, FilterOperator, FilterValue};
use crate::order::{OrderOptions, OrderTerm};
use crate::response::{normalize, PostgrestResponse, ResponseShape};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use studio_core::ApiError;
use url::Url;

const OBJECT_MEDIA_TYPE: &str = "application/vnd.pgrst.object+json";

/// Row-count strategies PostgREST can report through `Content-Range`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountMode {
    Exact,
    Planned,
    Estimated,
}

impl CountMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CountMode::Exact => "exact",
            CountMode::Planned => "planned",
            CountMode::Estimated => "estimated",
        }
    }
}

/// Options for [`QueryBuilder::select_with`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectOptions {
    pub count: Option<CountMode>,
    /// Issue a HEAD request: only the count comes back.
    pub head: bool,
}

/// Options for [`QueryBuilder::upsert_with`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpsertOptions {
    /// Comma-separated unique columns to resolve conflicts on.
    pub on_conflict: Option<String>,
}

/// Accumulated request description for one table or function.
#[derive(Clone)]
pub struct QueryBuilder {
    http_client: reqwest::Client,
    url: Url,
    api_key: String,
    method: Method,
    write_staged: bool,
    select: Option<String>,
    count: Option<CountMode>,
    head: bool,
    filters: Vec<Filter>,
    or_filters: Vec<String>,
    order: Vec<OrderTerm>,
    limit: Option<u64>,
    /// `(offset, rows)` from `range`.
    range: Option<(u64, u64)>,
    single: bool,
    maybe_single: bool,
    upsert: bool,
    on_conflict: Option<String>,
    body: Option<Value>,
    /// First misuse seen while staging; reported by `execute` instead of sending.
    invalid: Option<ApiError>,
}

impl QueryBuilder {
    pub(crate) fn new(http_client: reqwest::Client, url: Url, api_key: String) -> Self {
        Self {
            http_client,
            url,
            api_key,
            method: Method::GET,
            write_staged: false,
            select: None,
            count: None,
            head: false,
            filters: Vec::new(),
            or_filters: Vec::new(),
            order: Vec::new(),
            limit: None,
            range: None,
            single: false,
            maybe_single: false,
            upsert: false,
            on_conflict: None,
            body: None,
            invalid: None,
        }
    }

    /// POST with a JSON body; used for `/rpc/{function}`.
    pub(crate) fn with_body<T: Serialize>(mut self, method: Method, payload: T) -> Self {
        self.stage_write(method, payload);
        self
    }

    fn stage_write<T: Serialize>(&mut self, method: Method, payload: T) {
        self.method = method;
        self.write_staged = true;
        match serde_json::to_value(payload) {
            Ok(body) => self.body = Some(body),
            Err(e) => self.record_invalid(ApiError::with_code(
                format!("Failed to serialize request body: {}", e),
                ApiError::SERIALIZATION_ERROR,
            )),
        }
    }

    fn record_invalid(&mut self, error: ApiError) {
        if self.invalid.is_none() {
            self.invalid = Some(error);
        }
    }

    // ------------------------------------------------------------------
    // Projection and writes
    // ------------------------------------------------------------------

    /// Columns to return. `"*"` (the server default) is not sent.
    pub fn select(self, columns: &str) -> Self {
        self.select_with(columns, SelectOptions::default())
    }

    pub fn select_with(mut self, columns: &str, options: SelectOptions) -> Self {
        self.select = Some(strip_unquoted_whitespace(columns));
        self.count = options.count;
        self.head = options.head;
        if !self.write_staged {
            self.method = if options.head { Method::HEAD } else { Method::GET };
        }
        self
    }

    pub fn insert<T: Serialize>(mut self, payload: T) -> Self {
        self.stage_write(Method::POST, payload);
        self
    }

    pub fn upsert<T: Serialize>(self, payload: T) -> Self {
        self.upsert_with(payload, UpsertOptions::default())
    }

    pub fn upsert_with<T: Serialize>(mut self, payload: T, options: UpsertOptions) -> Self {
        self.stage_write(Method::POST, payload);
        self.upsert = true;
        self.on_conflict = options.on_conflict;
        self
    }

    pub fn update<T: Serialize>(mut self, payload: T) -> Self {
        self.stage_write(Method::PATCH, payload);
        self
    }

    pub fn delete(mut self) -> Self {
        self.method = Method::DELETE;
        self.write_staged = true;
        self.body = None;
        self
    }

    // ------------------------------------------------------------------
    // Filters
    // ------------------------------------------------------------------

    /// Append `column=op.value`.
    pub fn filter(mut self, column: &str, operator: FilterOperator, value: impl Into<FilterValue>) -> Self {
        self.filters.push(Filter {
            column: column.to_string(),
            operator,
            value: value.into(),
            negated: false,
        });
        self
    }

    /// Append `column=not.op.value`.
    pub fn not(mut self, column: &str, operator: FilterOperator, value: impl Into<FilterValue>) -> Self {
        self.filters.push(Filter {
            column: column.to_string(),
            operator,
            value: value.into(),
            negated: true,
        });
        self
    }

    pub fn eq(self, column: &str, value: impl Into<FilterValue>) -> Self {
        self.filter(column, FilterOperator::Eq, value)
    }

    pub fn neq(self, column: &str, value: impl Into<FilterValue>) -> Self {
        self.filter(column, FilterOperator::Neq, value)
    }

    pub fn gt(self, column: &str, value: impl Into<FilterValue>) -> Self {
        self.filter(column, FilterOperator::Gt, value)
    }

    pub fn gte(self, column: &str, value: impl Into<FilterValue>) -> Self {
        self.filter(column, FilterOperator::Gte, value)
    }

    pub fn lt(self, column: &str, value: impl Into<FilterValue>) -> Self {
        self.filter(column, FilterOperator::Lt, value)
    }

    pub fn lte(self, column: &str, value: impl Into<FilterValue>) -> Self {
        self.filter(column, FilterOperator::Lte, value)
    }

    pub fn like(self, column: &str, pattern: &str) -> Self {
        self.filter(column, FilterOperator::Like, pattern)
    }

    pub fn ilike(self, column: &str, pattern: &str) -> Self {
        self.filter(column, FilterOperator::Ilike, pattern)
    }

    /// `is.null`, `is.true`, `is.false`.
    pub fn is(self, column: &str, value: impl Into<FilterValue>) -> Self {
        self.filter(column, FilterOperator::Is, value)
    }

    pub fn in_(self, column: &str, values: impl Into<FilterValue>) -> Self {
        self.filter(column, FilterOperator::In, values)
    }

    /// Raw PostgREST logic tree, sent as `or=(filters)`. Repeated calls add
    /// repeated parameters.
    pub fn or(mut self, filters: &str) -> Self {
        self.or_filters.push(filters.to_string());
        self
    }

    // ------------------------------------------------------------------
    // Ordering and pagination
    // ------------------------------------------------------------------

    pub fn order(self, column: &str) -> Self {
        self.order_with(column, OrderOptions::default())
    }

    pub fn order_with(mut self, column: &str, options: OrderOptions) -> Self {
        self.order.push(OrderTerm {
            column: column.to_string(),
            options,
        });
        self
    }

    pub fn limit(mut self, count: u64) -> Self {
        self.limit = Some(count);
        self
    }

    /// Inclusive row window. Replaces any `limit` on the wire.
    pub fn range(mut self, from: u64, to: u64) -> Self {
        match to.checked_sub(from).and_then(|span| span.checked_add(1)) {
            Some(rows) => self.range = Some((from, rows)),
            None if to < from => self.record_invalid(ApiError::with_code(
                format!("Invalid range: end {} is before start {}", to, from),
                ApiError::INVALID_REQUEST,
            )),
            None => self.record_invalid(ApiError::with_code(
                format!("Invalid range: {}..={} has more rows than a limit can express", from, to),
                ApiError::INVALID_REQUEST,
            )),
        }
        self
    }

    /// Ask for exactly one object rather than an array.
    pub fn single(mut self) -> Self {
        self.single = true;
        self
    }

    /// Collapse an array response to its first row, or to `None` when empty.
    pub fn maybe_single(mut self) -> Self {
        self.maybe_single = true;
        self
    }

    // ------------------------------------------------------------------
    // Serialisation
    // ------------------------------------------------------------------

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Query parameters in wire order.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = Vec::new();

        if let Some(columns) = self.select.as_deref().filter(|columns| *columns != "*") {
            pairs.push(("select".to_string(), columns.to_string()));
        }
        if let Some(target) = &self.on_conflict {
            pairs.push(("on_conflict".to_string(), target.clone()));
        }
        for filter in &self.filters {
            pairs.push((filter.column.clone(), filter.render()));
        }
        for tree in &self.or_filters {
            pairs.push(("or".to_string(), format!("({})", tree)));
        }
        if !self.order.is_empty() {
            let terms: Vec<String> = self.order.iter().map(OrderTerm::render).collect();
            pairs.push(("order".to_string(), terms.join(",")));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }
        if let Some((offset, rows)) = self.range {
            pairs.retain(|(key, _)| key != "offset" && key != "limit");
            pairs.push(("offset".to_string(), offset.to_string()));
            pairs.push(("limit".to_string(), rows.to_string()));
        }

        pairs
    }

    /// Full request URL.
    pub fn url(&self) -> Url {
        let mut url = self.url.clone();
        let pairs = self.query_pairs();
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }
        url
    }

    /// `Prefer` header value, if any preference applies.
    pub fn prefer(&self) -> Option<String> {
        let is_post = self.method == Method::POST;
        let is_patch = self.method == Method::PATCH;
        let mut parts: Vec<String> = Vec::new();

        match self.count {
            Some(mode) => {
                parts.push(format!("count={}", mode.as_str()));
                if self.upsert {
                    parts.push("resolution=merge-duplicates".to_string());
                }
                if (is_post && !self.upsert) || is_patch {
                    parts.push("return=representation".to_string());
                }
            }
            None => {
                if self.upsert {
                    parts.push("resolution=merge-duplicates".to_string());
                }
                if (is_post || is_patch) && self.select.is_some() {
                    parts.push("return=representation".to_string());
                }
            }
        }

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(","))
        }
    }

    fn headers(&self) -> Result<HeaderMap, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(AUTHORIZATION, header_value(&format!("Bearer {}", self.api_key))?);
        if self.single {
            headers.insert(ACCEPT, HeaderValue::from_static(OBJECT_MEDIA_TYPE));
        }
        if let Some(prefer) = self.prefer() {
            headers.insert("Prefer", header_value(&prefer)?);
        }
        Ok(headers)
    }

    /// Send the request and normalise the outcome.
    pub async fn execute(mut self) -> PostgrestResponse {
        if let Some(error) = self.invalid.take() {
            tracing::warn!(error = %error, "Refusing to send malformed query");
            return PostgrestResponse::failure(error);
        }

        let headers = match self.headers() {
            Ok(headers) => headers,
            Err(error) => return PostgrestResponse::failure(error),
        };
        let url = self.url();
        tracing::debug!(
            method = %self.method,
            path = url.path(),
            query = url.query().unwrap_or_default(),
            "Executing PostgREST request"
        );

        let mut request = self
            .http_client
            .request(self.method.clone(), url)
            .headers(headers);
        if let Some(body) = &self.body {
            request = request.json(body);
        }

        let shape = ResponseShape {
            method: self.method,
            head: self.head,
            select_called: self.select.is_some(),
            maybe_single: self.maybe_single,
        };

        match request.send().await {
            Ok(response) => normalize(response, &shape).await,
            Err(e) => {
                tracing::warn!(error = %e, "PostgREST request failed to send");
                PostgrestResponse::failure(ApiError::network(e.to_string()))
            }
        }
    }
}

impl std::fmt::Debug for QueryBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryBuilder")
            .field("method", &self.method)
            .field("url", &self.url().as_str())
            .finish_non_exhaustive()
    }
}

fn header_value(value: &str) -> Result<HeaderValue, ApiError> {
    HeaderValue::from_str(value).map_err(|e| {
        ApiError::with_code(format!("Invalid header value: {}", e), ApiError::INVALID_REQUEST)
    })
}

/// Drop whitespace except inside double-quoted identifiers.
fn strip_unquoted_whitespace(columns: &str) -> String {
    let mut quoted = false;
    columns
        .chars()
        .filter(|c| {
            if *c == '"' {
                quoted = !quoted;
            }
            quoted || !c.is_whitespace()
        })
        .collect()
}
