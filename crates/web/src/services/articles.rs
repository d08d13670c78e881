//! Connectivity probe for the external health articles API.
//!
//! Used by `/test_api` to confirm the upstream is reachable and returns the
//! expected JSON array.

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use url::Url;

/// Upstream request timeout.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Number of upstream items echoed back.
pub const PREVIEW_LEN: usize = 5;

/// Errors that can occur while probing the articles API.
#[derive(Debug, Error)]
pub enum ArticlesError {
    /// Request failed or timed out.
    #[error("{0}")]
    Http(#[from] reqwest::Error),

    /// Body was not valid JSON.
    #[error("invalid JSON response: {0}")]
    Decode(String),

    /// Body was JSON but not an array.
    #[error("unexpected response shape: expected a JSON array, got {0}")]
    UnexpectedShape(&'static str),
}

/// Upstream status and the first few items of its response.
#[derive(Debug, Serialize)]
pub struct ArticlesPreview {
    pub status: u16,
    pub response: Vec<Value>,
}

/// GET `url` and preview its JSON array body.
///
/// The upstream status is reported as-is; a non-2xx answer with an array
/// body is still a successful probe.
///
/// # Errors
///
/// Returns `ArticlesError` on network failure, timeout, a non-JSON body, or
/// a JSON body that is not an array.
#[tracing::instrument(skip(client), fields(url = %url))]
pub async fn probe(client: &reqwest::Client, url: &Url) -> Result<ArticlesPreview, ArticlesError> {
    let response = client
        .get(url.clone())
        .timeout(PROBE_TIMEOUT)
        .send()
        .await?;
    let status = response.status().as_u16();
    let body = response.bytes().await?;

    let value: Value =
        serde_json::from_slice(&body).map_err(|e| ArticlesError::Decode(e.to_string()))?;
    let response = preview(value)?;

    tracing::debug!(status, items = response.len(), "Articles API probed");
    Ok(ArticlesPreview { status, response })
}

/// First [`PREVIEW_LEN`] items of a JSON array.
fn preview(value: Value) -> Result<Vec<Value>, ArticlesError> {
    match value {
        Value::Array(items) => Ok(items.into_iter().take(PREVIEW_LEN).collect()),
        other => Err(ArticlesError::UnexpectedShape(json_kind(&other))),
    }
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
