//! Encyclopedia lookups for symptom text.
//!
//! The diagnosis flow only needs two things from an encyclopedia: candidate
//! article titles for a query, and an article's URL and lead summary. Both
//! live behind the [`Encyclopedia`] trait. [`WikipediaClient`] implements it
//! against the `MediaWiki` action API of one Wikipedia language edition.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

/// Per-request timeout for Wikipedia calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Wikipedia asks API clients to identify themselves.
const USER_AGENT: &str = concat!("diagnostico/", env!("CARGO_PKG_VERSION"));

/// Errors that can occur when talking to the encyclopedia.
#[derive(Debug, Error)]
pub enum EncyclopediaError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with an error object.
    #[error("API error: {code} - {info}")]
    Api { code: String, info: String },

    /// No page exists under the requested title.
    #[error("Page not found: {0}")]
    NotFound(String),

    /// The title resolves to a disambiguation page.
    #[error("'{0}' is a disambiguation page")]
    Disambiguation(String),

    /// The response could not be interpreted.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// An encyclopedia article reduced to what a diagnosis shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    pub title: String,
    pub url: String,
    /// Plain-text lead section.
    pub summary: String,
}

/// Lookup collaborator used by the diagnosis flow.
#[async_trait]
pub trait Encyclopedia: Send + Sync {
    /// Titles of up to `limit` articles matching `query`, best match first.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<String>, EncyclopediaError>;

    /// Fetch one article by title.
    async fn article(&self, title: &str) -> Result<Article, EncyclopediaError>;
}

/// Wikipedia client for a single language edition.
#[derive(Clone)]
pub struct WikipediaClient {
    client: reqwest::Client,
    endpoint: Url,
}

impl WikipediaClient {
    /// Create a client for `https://{language}.wikipedia.org`.
    ///
    /// # Errors
    ///
    /// Returns error if the endpoint URL is invalid or the HTTP client fails
    /// to build.
    pub fn new(language: &str) -> Result<Self, EncyclopediaError> {
        let endpoint = Url::parse(&format!("https://{language}.wikipedia.org/w/api.php"))
            .map_err(|e| EncyclopediaError::Parse(format!("invalid language '{language}': {e}")))?;
        Self::with_endpoint(endpoint)
    }

    /// Create a client for an explicit `api.php` endpoint.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn with_endpoint(endpoint: Url) -> Result<Self, EncyclopediaError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self { client, endpoint })
    }

    fn query_url(&self, params: &[(&str, &str)]) -> Url {
        let mut url = self.endpoint.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("action", "query")
                .append_pair("format", "json")
                .append_pair("formatversion", "2");
            for (key, value) in params {
                pairs.append_pair(key, value);
            }
        }
        url
    }

    async fn get<T: for<'de> Deserialize<'de>>(&self, url: Url) -> Result<T, EncyclopediaError> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        let envelope: ApiEnvelope<T> = response
            .json()
            .await
            .map_err(|e| EncyclopediaError::Parse(e.to_string()))?;
        envelope.into_result()
    }
}

#[async_trait]
impl Encyclopedia for WikipediaClient {
    #[tracing::instrument(skip(self))]
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<String>, EncyclopediaError> {
        let limit = limit.to_string();
        let url = self.query_url(&[
            ("list", "search"),
            ("srsearch", query),
            ("srlimit", &limit),
            ("srprop", ""),
        ]);

        let result: SearchQuery = self.get(url).await?;
        Ok(result.search.into_iter().map(|hit| hit.title).collect())
    }

    #[tracing::instrument(skip(self))]
    async fn article(&self, title: &str) -> Result<Article, EncyclopediaError> {
        let url = self.query_url(&[
            ("prop", "extracts|info|pageprops"),
            ("exintro", "1"),
            ("explaintext", "1"),
            ("inprop", "url"),
            ("ppprop", "disambiguation"),
            ("redirects", "1"),
            ("titles", title),
        ]);

        let result: PagesQuery = self.get(url).await?;
        result.into_article(title)
    }
}

// =============================================================================
// Response types
// =============================================================================

/// Top-level API response: either `query` data or an `error` object.
#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    query: Option<T>,
    error: Option<ApiErrorBody>,
}

impl<T> ApiEnvelope<T> {
    fn into_result(self) -> Result<T, EncyclopediaError> {
        if let Some(error) = self.error {
            return Err(EncyclopediaError::Api {
                code: error.code,
                info: error.info,
            });
        }
        self.query
            .ok_or_else(|| EncyclopediaError::Parse("response has no query data".to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    code: String,
    #[serde(default)]
    info: String,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    title: String,
}

#[derive(Debug, Deserialize)]
struct PagesQuery {
    #[serde(default)]
    pages: Vec<Page>,
}

#[derive(Debug, Deserialize)]
struct Page {
    title: String,
    #[serde(default)]
    missing: bool,
    #[serde(default)]
    invalid: bool,
    fullurl: Option<String>,
    extract: Option<String>,
    pageprops: Option<PageProps>,
}

#[derive(Debug, Deserialize)]
struct PageProps {
    disambiguation: Option<serde_json::Value>,
}

impl PagesQuery {
    fn into_article(self, requested: &str) -> Result<Article, EncyclopediaError> {
        let page = self
            .pages
            .into_iter()
            .next()
            .ok_or_else(|| EncyclopediaError::NotFound(requested.to_string()))?;

        if page.missing || page.invalid {
            return Err(EncyclopediaError::NotFound(page.title));
        }
        if page
            .pageprops
            .is_some_and(|props| props.disambiguation.is_some())
        {
            return Err(EncyclopediaError::Disambiguation(page.title));
        }

        let url = page
            .fullurl
            .ok_or_else(|| EncyclopediaError::Parse(format!("page '{}' has no URL", page.title)))?;

        Ok(Article {
            title: page.title,
            url,
            summary: page.extract.unwrap_or_default(),
        })
    }
}
