//! HTTP transport seam for the portal API.
//!
//! DESIGN
//! ======
//! Everything that talks to the backend goes through [`HttpTransport`]. The
//! production implementation wraps a `reqwest::Client` configured with the
//! portal timeouts; tests script responses through a mock. Requests carry
//! the bearer token as data so the refresh middleware can re-send a request
//! with a different token without rebuilding it.
//!
//! ERROR HANDLING
//! ==============
//! The transport only fails for transport reasons (`NetworkError`). Non-2xx
//! statuses are returned as normal responses; callers decide what a 401 or a
//! 500 means for them.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::config::HttpTimeouts;
use crate::error::AuthError;

/// Maximum number of error body characters surfaced to callers.
const MAX_ERROR_CHARS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    fn as_reqwest(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Put => reqwest::Method::PUT,
            Self::Patch => reqwest::Method::PATCH,
            Self::Delete => reqwest::Method::DELETE,
        }
    }
}

/// A single API call: method, path relative to the API base, optional JSON
/// body, optional bearer token.
#[derive(Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
    pub bearer: Option<String>,
}

impl std::fmt::Debug for ApiRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiRequest")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("has_body", &self.body.is_some())
            .field("has_bearer", &self.bearer.is_some())
            .finish()
    }
}

impl ApiRequest {
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self { method, path: path.into(), body: None, bearer: None }
    }

    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    #[must_use]
    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Post, path).with_body(body)
    }

    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    #[must_use]
    pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }
}

/// Status plus raw body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self { status, body: body.into() }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }

    /// Decode the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns `Decode` if the body is not the expected shape.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, AuthError> {
        serde_json::from_str(&self.body).map_err(|e| AuthError::Decode(e.to_string()))
    }

    /// Server-supplied error message from a `{"error": ...}` or
    /// `{"detail": ...}` body, if any.
    #[must_use]
    pub fn error_message(&self) -> Option<String> {
        let value: Value = serde_json::from_str(&self.body).ok()?;
        ["error", "detail", "message"]
            .iter()
            .find_map(|key| value.get(key).and_then(Value::as_str))
            .map(str::trim)
            .filter(|msg| !msg.is_empty())
            .map(ToOwned::to_owned)
    }

    /// Pass 2xx responses through; turn anything else into `AuthError::Http`.
    ///
    /// # Errors
    ///
    /// Returns `Http` with a trimmed, truncated message for non-2xx statuses.
    pub fn error_for_status(self) -> Result<Self, AuthError> {
        if self.is_success() {
            return Ok(self);
        }
        let message = self.error_message().unwrap_or_else(|| sanitize_body(&self.body));
        Err(AuthError::Http { status: self.status, message })
    }
}

/// Anything that can deliver an [`ApiRequest`].
#[async_trait::async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, AuthError>;
}

// =============================================================================
// REQWEST BACKEND
// =============================================================================

pub struct ReqwestTransport {
    http: reqwest::Client,
    base_url: String,
}

impl ReqwestTransport {
    /// Build a transport rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns `NetworkError` if the HTTP client cannot be constructed.
    pub fn new(base_url: &str, timeouts: HttpTimeouts) -> Result<Self, AuthError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeouts.request_secs))
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .build()
            .map_err(|e| AuthError::NetworkError(format!("http client build failed: {e}")))?;
        Ok(Self { http, base_url: base_url.trim().trim_end_matches('/').to_owned() })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait::async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, AuthError> {
        let url = build_url(&self.base_url, &request.path);
        debug!(method = ?request.method, path = %request.path, "sending api request");

        let mut builder = self.http.request(request.method.as_reqwest(), url);
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| AuthError::NetworkError(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| AuthError::NetworkError(e.to_string()))?;
        debug!(status, path = %request.path, "api response received");
        Ok(ApiResponse { status, body })
    }
}

/// Join the API base URL and a request path. Absolute `http(s)://` paths are
/// used as-is so callers can reach media hosts.
#[must_use]
pub fn build_url(base_url: &str, path: &str) -> String {
    let path = path.trim();
    if is_absolute_url(path) {
        return path.to_owned();
    }
    let base = base_url.trim().trim_end_matches('/');
    if base.is_empty() {
        path.to_owned()
    } else {
        format!("{}/{}", base, path.trim_start_matches('/'))
    }
}

pub(crate) fn is_absolute_url(value: &str) -> bool {
    let lowered = value.get(..8).unwrap_or(value).to_ascii_lowercase();
    lowered.starts_with("http://") || lowered.starts_with("https://")
}

fn sanitize_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "Request failed.".to_owned()
    } else {
        trimmed.chars().take(MAX_ERROR_CHARS).collect()
    }
}

#[cfg(test)]
#[path = "transport_test.rs"]
mod transport_test;
