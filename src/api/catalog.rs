//! MovieStream catalog API client
//!
//! Talks to the backend REST API mounted under `<api_url>/api`.
//! Errors come back as FastAPI `{"detail": ...}` bodies.

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use super::search::SearchQuery;
use crate::config::Config;
use crate::models::{Genre, Movie, TokenValidation};

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default pause before retrying a failed read
pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_millis(500);

/// Reads are attempted at most this many extra times
const MAX_READ_RETRIES: u32 = 1;

/// Catalog API error types
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Not found (404)")]
    NotFound,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Authentication failed ({status}): {message}")]
    Auth { status: u16, message: String },

    #[error("Server error: {0}")]
    Server(u16),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl CatalogError {
    /// Whether a read that failed this way is worth one more attempt
    pub fn is_retryable(&self) -> bool {
        matches!(self, CatalogError::Network(_) | CatalogError::Server(_))
    }

    /// Map a non-success status and its body to an error
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let message = detail_message(body).unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string()
        });

        match status {
            StatusCode::NOT_FOUND => CatalogError::NotFound,
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => CatalogError::Auth {
                status: status.as_u16(),
                message,
            },
            s if s.is_server_error() => CatalogError::Server(s.as_u16()),
            _ => CatalogError::Validation(message),
        }
    }
}

/// MovieStream catalog client
#[derive(Debug, Clone)]
pub struct CatalogClient {
    base_url: String,
    client: reqwest::Client,
    retry_backoff: Duration,
}

impl CatalogClient {
    /// Create a client for the backend at `api_url` (without the `/api` suffix)
    pub fn new(api_url: impl AsRef<str>) -> Self {
        Self::with_settings(api_url, DEFAULT_TIMEOUT, DEFAULT_RETRY_BACKOFF)
    }

    /// Create a client with a custom base URL (for testing).
    /// Requests still go under `/api`, like the real backend.
    pub fn with_base_url(base_url: impl AsRef<str>) -> Self {
        Self::new(base_url)
    }

    /// Create a client with explicit timeout and retry backoff
    pub fn with_settings(api_url: impl AsRef<str>, timeout: Duration, retry_backoff: Duration) -> Self {
        let root = api_url.as_ref().trim_end_matches('/');
        Self {
            base_url: format!("{}/api", root),
            client: http_client(reqwest::Client::builder().timeout(timeout)),
            retry_backoff,
        }
    }

    /// Create a client from the loaded configuration
    pub fn from_config(config: &Config) -> Self {
        Self::with_settings(
            &config.api_url,
            Duration::from_secs(config.request_timeout_secs),
            Duration::from_millis(config.retry_backoff_ms),
        )
    }

    /// Base URL including the `/api` prefix
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // =========================================================================
    // Request plumbing
    // =========================================================================

    pub(crate) fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.client
    }

    /// Send a request and turn non-success statuses into errors
    pub(crate) async fn send(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, CatalogError> {
        let response = request.header("Accept", "application/json").send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(CatalogError::from_status(status, &body))
    }

    /// Decode a JSON body
    pub(crate) async fn decode<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, CatalogError> {
        let body = response.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| CatalogError::InvalidResponse(format!("JSON parse error: {}", e)))
    }

    /// GET with one retry on network and server failures
    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        bearer: Option<&str>,
    ) -> Result<T, CatalogError> {
        let url = self.url(endpoint);
        let mut retries = 0;

        loop {
            let mut request = self.client.get(&url);
            if let Some(token) = bearer {
                request = request.bearer_auth(token);
            }

            let result = match self.send(request).await {
                Ok(response) => Self::decode(response).await,
                Err(e) => Err(e),
            };

            match result {
                Err(e) if e.is_retryable() && retries < MAX_READ_RETRIES => {
                    retries += 1;
                    warn!(url = %url, error = %e, "read failed, retrying");
                    tokio::time::sleep(self.retry_backoff).await;
                }
                other => {
                    debug!(url = %url, ok = other.is_ok(), "GET");
                    return other;
                }
            }
        }
    }

    // =========================================================================
    // Public catalog
    // =========================================================================

    /// List movies in server order
    pub async fn list_movies(&self, limit: u32) -> Result<Vec<Movie>, CatalogError> {
        self.get(&format!("/movies?limit={}", limit), None).await
    }

    /// Get one movie by ID
    pub async fn get_movie(&self, id: &str) -> Result<Movie, CatalogError> {
        self.get(&format!("/movies/{}", urlencoding::encode(id)), None)
            .await
    }

    /// Search by title/synopsis with optional genre and year filters
    pub async fn search_movies(&self, query: &SearchQuery) -> Result<Vec<Movie>, CatalogError> {
        let endpoint = format!("/movies/search/query?{}", query.to_query_string());
        self.get(&endpoint, None).await
    }

    /// List all genres
    pub async fn list_genres(&self) -> Result<Vec<Genre>, CatalogError> {
        self.get("/genres", None).await
    }

    /// Bump the view counter of a movie. Never retried.
    pub async fn increment_view(&self, id: &str) -> Result<(), CatalogError> {
        let url = self.url(&format!("/movies/{}/increment-view", urlencoding::encode(id)));
        self.send(self.client.post(&url)).await?;
        debug!(movie_id = id, "view counted");
        Ok(())
    }

    /// Ask the backend whether an admin token is accepted.
    /// The endpoint answers 200 for both outcomes.
    pub async fn validate_token(&self, token: &str) -> Result<TokenValidation, CatalogError> {
        let url = self.url("/admin/validate-token");
        let response = self.send(self.client.post(&url).bearer_auth(token)).await?;
        Self::decode(response).await
    }
}

// =============================================================================
// Error body parsing
// =============================================================================

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

/// Extract a readable message from a FastAPI error body.
///
/// `detail` is a string for `HTTPException`s and an array of
/// `{loc, msg}` objects for request validation errors.
fn detail_message(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    match parsed.detail {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Array(items) => {
            let parts: Vec<String> = items
                .iter()
                .filter_map(|item| {
                    let msg = item.get("msg")?.as_str()?;
                    let field = item
                        .get("loc")
                        .and_then(|l| l.as_array())
                        .and_then(|l| l.last())
                        .and_then(|f| f.as_str());
                    Some(match field {
                        Some(f) => format!("{}: {}", f, msg),
                        None => msg.to_string(),
                    })
                })
                .collect();
            if parts.is_empty() {
                None
            } else {
                Some(parts.join("; "))
            }
        }
        _ => None,
    }
}

/// Build the HTTP client, falling back to reqwest's defaults (no request
/// timeout) when the builder is rejected
fn http_client(builder: reqwest::ClientBuilder) -> reqwest::Client {
    match builder.build() {
        Ok(client) => client,
        Err(e) => {
            warn!(error = %e, "HTTP client setup failed, requests will have no timeout");
            reqwest::Client::new()
        }
    }
}
