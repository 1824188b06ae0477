//! Network fetch capability and JSON response validation

use crate::error::{FetchError, FetchResult};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CACHE_CONTROL, CONTENT_TYPE, USER_AGENT};
use serde_json::Value;
use std::time::Duration;

/// User agent for data requests
const USER_AGENT_VALUE: &str = concat!("folio-data/", env!("CARGO_PKG_VERSION"));

/// Raw HTTP response, before any validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    /// HTTP status code
    pub status: u16,
    /// Declared `content-type`, if any
    pub content_type: Option<String>,
    /// Response body as text
    pub body: String,
}

impl FetchResponse {
    /// 200 response with `application/json` content type
    #[must_use]
    pub fn json(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            content_type: Some("application/json; charset=utf-8".to_string()),
            body: body.into(),
        }
    }

    /// Whether the status is in the 2xx range
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Issues GET requests
///
/// Implementations must be cancel-safe: dropping the returned future abandons
/// the request.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// GET `url` and return the raw response
    ///
    /// # Errors
    /// - `FetchError::Network` / `FetchError::Timeout` on transport failure
    async fn get(&self, url: &str) -> FetchResult<FetchResponse>;
}

/// reqwest-backed fetcher
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Create fetcher with a per-request timeout
    ///
    /// # Errors
    /// - `FetchError::Network` if the client cannot be built
    pub fn new(timeout: Duration) -> FetchResult<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        default_headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(default_headers)
            .build()
            .map_err(|e| FetchError::Network(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn get(&self, url: &str) -> FetchResult<FetchResponse> {
        tracing::debug!(url = %url, "GET");
        let response = self.client.get(url).send().await?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().await?;

        Ok(FetchResponse {
            status,
            content_type,
            body,
        })
    }
}

/// Validate a response and parse its body as JSON
///
/// Rejects non-2xx statuses, a content type that is not JSON, and bodies that
/// start with `<` after BOM stripping and trimming. The last two catch static
/// hosts that answer a missing file with their HTML fallback page.
///
/// # Errors
/// - `FetchError::Status` for non-2xx responses
/// - `FetchError::NotJson` for HTML-shaped responses
/// - `FetchError::Parse` if the body is not valid JSON
pub fn decode_json_body(response: &FetchResponse) -> FetchResult<Value> {
    if !response.is_success() {
        return Err(FetchError::Status(response.status));
    }

    let text = response
        .body
        .strip_prefix('\u{feff}')
        .unwrap_or(&response.body)
        .trim();

    let declared_json = response
        .content_type
        .as_deref()
        .is_some_and(|ct| ct.to_ascii_lowercase().contains("application/json"));

    if !declared_json || text.starts_with('<') {
        return Err(FetchError::NotJson);
    }

    Ok(serde_json::from_str(text)?)
}

/// [`decode_json_body`] that additionally requires a JSON object
///
/// # Errors
/// - everything [`decode_json_body`] returns
/// - `FetchError::NotObject` if the document is not an object
pub fn decode_json_object(response: &FetchResponse) -> FetchResult<Value> {
    let value = decode_json_body(response)?;
    if value.is_object() {
        Ok(value)
    } else {
        Err(FetchError::NotObject(json_type_name(&value)))
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
