//! API gateway: the single point of outbound calls to the shop backend.
//!
//! Every request goes through [`ApiClient`], which
//! - resolves endpoint paths against the configured base URL,
//! - sends the cookie credentials with every call,
//! - maps HTTP outcomes onto [`ClientError`],
//! - normalizes list responses into [`Listing`].
//!
//! Endpoint paths are relative and end in `/` (`"products/"`), matching the
//! backend's URL scheme.

mod credentials;
mod listing;

use std::collections::BTreeMap;
use std::sync::Arc;

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use url::Url;

pub use credentials::CredentialStore;
pub use listing::Listing;

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};

/// Fallback when an error response carries no usable message.
const GENERIC_FAILURE: &str = "Request failed. Please try again.";

/// Backend health report.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Health {
    pub status: String,
    #[serde(default)]
    pub service: Option<String>,
}

/// HTTP client for the shop backend.
///
/// Cheap to clone; clones share the connection pool and credentials.
#[derive(Clone, Debug)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

#[derive(Debug)]
struct ApiClientInner {
    http: reqwest::Client,
    base_url: Url,
    credentials: Arc<CredentialStore>,
}

impl ApiClient {
    /// Create a client for the configured backend.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Http` if the HTTP client fails to build.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let credentials = Arc::new(CredentialStore::default());

        let http = reqwest::Client::builder()
            .cookie_provider(Arc::clone(&credentials))
            .timeout(config.timeout)
            .user_agent(concat!("vunjabei-client/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                http,
                base_url: config.api_base_url.clone(),
                credentials,
            }),
        })
    }

    /// Base URL every endpoint is resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    // =========================================================================
    // Credentials
    // =========================================================================

    /// Current credential cookies, for persisting with the session.
    #[must_use]
    pub fn export_credentials(&self) -> Option<String> {
        self.inner.credentials.export(&self.inner.base_url)
    }

    /// Reinstall credential cookies exported by a previous run.
    pub fn restore_credentials(&self, cookies: &str) {
        self.inner.credentials.restore(&self.inner.base_url, cookies);
    }

    /// Drop all credential cookies.
    pub fn clear_credentials(&self) {
        self.inner.credentials.clear();
    }

    // =========================================================================
    // Requests
    // =========================================================================

    /// Check that the backend is up.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Unreachable` when the backend cannot be reached.
    #[instrument(skip(self))]
    pub async fn health(&self) -> Result<Health> {
        self.get("health/", &[]).await
    }

    /// `GET` a single JSON document.
    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let url = self.endpoint_with_query(path, query)?;
        let response = self.send(self.inner.http.get(url)).await?;
        decode(response).await
    }

    /// `GET` a list endpoint, accepting either response shape.
    pub(crate) async fn get_listing<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Listing<T>> {
        self.get(path, query).await
    }

    /// Send a JSON body and decode the JSON answer.
    pub(crate) async fn send_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let url = self.endpoint(path)?;
        let response = self
            .send(self.inner.http.request(method, url).json(body))
            .await?;
        decode(response).await
    }

    /// Send a multipart form and decode the JSON answer.
    pub(crate) async fn send_multipart<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<T> {
        let url = self.endpoint(path)?;
        let response = self
            .send(self.inner.http.request(method, url).multipart(form))
            .await?;
        decode(response).await
    }

    /// `DELETE` a record; any success status counts.
    pub(crate) async fn delete(&self, path: &str) -> Result<()> {
        let url = self.endpoint(path)?;
        let response = self.send(self.inner.http.delete(url)).await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        Err(error_from_response(status, response).await)
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.inner
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ClientError::InvalidInput(format!("invalid endpoint {path}: {e}")))
    }

    fn endpoint_with_query(&self, path: &str, query: &[(&str, &str)]) -> Result<Url> {
        let mut url = self.endpoint(path)?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query.iter().copied());
        }
        Ok(url)
    }

    /// Send a request, classifying transport failures.
    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        request.send().await.map_err(|e| {
            if e.is_connect() || e.is_timeout() {
                tracing::warn!(error = %e, "Backend unreachable");
                ClientError::Unreachable(e)
            } else {
                tracing::error!(error = %e, "Request failed");
                ClientError::Http(e)
            }
        })
    }
}

/// Decode a success body, or turn an error status into a `ClientError`.
///
/// An empty success body decodes as JSON `null`.
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        return Err(error_from_response(status, response).await);
    }

    let body = response.text().await?;
    let body = if body.trim().is_empty() { "null" } else { &body };
    serde_json::from_str(body).map_err(|e| {
        tracing::error!(error = %e, "Unexpected response body");
        ClientError::Decode(e.to_string())
    })
}

async fn error_from_response(status: StatusCode, response: Response) -> ClientError {
    let url = response.url().path().to_owned();
    let body = response.text().await.unwrap_or_default();
    let (message, fields) = parse_error_body(&body);
    tracing::warn!(status = status.as_u16(), path = %url, message = %message, "Request rejected");
    classify(status, message, fields)
}

fn classify(status: StatusCode, message: String, fields: BTreeMap<String, Vec<String>>) -> ClientError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ClientError::Auth(message),
        StatusCode::NOT_FOUND => ClientError::NotFound(message),
        s if s.is_client_error() => ClientError::Validation { message, fields },
        s => ClientError::Server {
            status: s.as_u16(),
            message,
        },
    }
}

/// Extract the message (and per-field messages) from an error body.
///
/// Recognized shapes, in order: a JSON string, `{"error": ...}`,
/// `{"detail": ...}`, `{"message": ...}`, and a field map such as
/// `{"price": ["A valid number is required."]}`. Anything else is used as
/// plain text.
fn parse_error_body(body: &str) -> (String, BTreeMap<String, Vec<String>>) {
    let mut fields = BTreeMap::new();
    let trimmed = body.trim();

    let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) else {
        let message = if trimmed.is_empty() || trimmed.starts_with('<') {
            GENERIC_FAILURE.to_string()
        } else {
            trimmed.to_string()
        };
        return (message, fields);
    };

    let object = match value {
        serde_json::Value::String(text) => return (text, fields),
        serde_json::Value::Object(object) => object,
        _ => return (GENERIC_FAILURE.to_string(), fields),
    };

    for key in ["error", "detail", "message"] {
        if let Some(text) = object.get(key).and_then(serde_json::Value::as_str) {
            return (text.to_string(), fields);
        }
    }

    for (key, value) in &object {
        let messages: Vec<String> = match value {
            serde_json::Value::String(text) => vec![text.clone()],
            serde_json::Value::Array(items) => items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_owned))
                .collect(),
            _ => continue,
        };
        if !messages.is_empty() {
            fields.insert(key.clone(), messages);
        }
    }

    let message = fields
        .get("non_field_errors")
        .or_else(|| fields.values().next())
        .and_then(|messages| messages.first())
        .cloned()
        .unwrap_or_else(|| GENERIC_FAILURE.to_string());

    (message, fields)
}
