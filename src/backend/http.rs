//! # HTTP Backend
//!
//! [`TelemetryBackend`] over `reqwest`.
//!
//! Non-success responses are turned into [`PollerError::Status`] with the
//! reason taken from the body (`detail`, then `error`, then raw text), and
//! 401 into [`PollerError::Unauthorized`].
//!
//! Session ids are opaque and always sent as a single percent-encoded path
//! segment.

use async_trait::async_trait;
use reqwest::header::CACHE_CONTROL;
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use super::TelemetryBackend;
use crate::config::BackendConfig;
use crate::error::{PollerError, Result};
use crate::telemetry::sample::{HistoryPoint, LatestPayload, SessionTotals};

/// Backend reached over HTTP
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base: Url,
    base_url: String,
}

impl HttpBackend {
    /// Build a backend client from configuration
    ///
    /// # Errors
    ///
    /// Returns [`PollerError::Transport`] if the HTTP client cannot be built
    /// (e.g. TLS backend initialisation fails) and [`PollerError::InvalidUrl`]
    /// if the base URL does not parse.
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| PollerError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        let base_url = config.base_url.trim().trim_end_matches('/').to_string();
        let base = Url::parse(&base_url)
            .map_err(|e| PollerError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if base.cannot_be_a_base() {
            return Err(PollerError::InvalidUrl(format!("{}: cannot hold a path", base_url)));
        }

        Ok(Self {
            client,
            base,
            base_url,
        })
    }

    /// Base URL every endpoint hangs off
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Base URL with `segments` appended, each percent-encoded on its own.
    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| PollerError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// URL under `sessions/{id}`
    fn session_url(&self, session_id: &str, tail: Option<&str>) -> Result<Url> {
        // Dot segments would be dropped or resolved instead of encoded
        if session_id.is_empty() || session_id == "." || session_id == ".." {
            return Err(PollerError::InvalidUrl(format!("session id {:?}", session_id)));
        }

        let mut segments = vec!["sessions", session_id];
        segments.extend(tail);
        self.url(&segments)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        debug!("GET {}", url);

        let response = self
            .client
            .get(url.clone())
            .header(CACHE_CONTROL, "no-store")
            .send()
            .await
            .map_err(|e| PollerError::Transport(format!("GET {} failed: {}", url, e)))?;

        decode_json(check_status(response).await?).await
    }
}

/// Pass successful responses through; turn the rest into errors.
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(PollerError::from_response(
        status.as_u16(),
        structured_reason(&body),
        raw_reason(&body),
    ))
}

async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let body = response
        .text()
        .await
        .map_err(|e| PollerError::Transport(format!("Failed to read response body: {}", e)))?;
    Ok(serde_json::from_str(&body)?)
}

/// Reason from a JSON error body: `detail` (string), then `error` (string).
pub fn structured_reason(body: &str) -> Option<String> {
    let value = serde_json::from_str::<Value>(body).ok()?;
    ["detail", "error"]
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

fn raw_reason(body: &str) -> Option<String> {
    let trimmed = body.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Extract a human-readable reason from an error body.
///
/// Looks at `detail` (string), then `error` (string), then the raw body.
pub fn error_reason(body: &str) -> Option<String> {
    structured_reason(body).or_else(|| raw_reason(body))
}

#[async_trait]
impl TelemetryBackend for HttpBackend {
    async fn collect(&self, session_id: Option<&str>) -> Result<()> {
        let url = self.url(&["collect"])?;
        let body = match session_id {
            Some(id) => json!({ "session_id": id }),
            None => json!({}),
        };
        debug!("POST {}", url);

        let response = self
            .client
            .post(url.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| PollerError::Transport(format!("POST {} failed: {}", url, e)))?;

        check_status(response).await?;
        Ok(())
    }

    async fn latest(&self) -> Result<LatestPayload> {
        self.get_json(self.url(&["latest"])?).await
    }

    async fn session_totals(&self, session_id: &str) -> Result<SessionTotals> {
        self.get_json(self.session_url(session_id, None)?).await
    }

    async fn session_measures(&self, session_id: &str) -> Result<Vec<HistoryPoint>> {
        self.get_json(self.session_url(session_id, Some("measures"))?).await
    }
}
