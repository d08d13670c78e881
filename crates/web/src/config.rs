//! Application configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `DATABASE_URL` - `PostgreSQL` connection string
//!
//! ## Optional
//! - `DIAGNOSTICO_HOST` - Bind address (default: 127.0.0.1)
//! - `DIAGNOSTICO_PORT` - Listen port (default: 5000)
//! - `WIKIPEDIA_LANGUAGE` - Wikipedia edition to search (default: es)
//! - `ARTICLES_API_URL` - Endpoint probed by `/test_api`
//!   (default: <https://www.healthcare.gov/api/articles.json>)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

/// Default endpoint probed by the `/test_api` handler.
pub const DEFAULT_ARTICLES_API_URL: &str = "https://www.healthcare.gov/api/articles.json";

/// Default Wikipedia language edition.
pub const DEFAULT_WIKIPEDIA_LANGUAGE: &str = "es";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Diagnostico application configuration.
///
/// Implements `Debug` manually to redact the database URL, which carries
/// the database password.
#[derive(Clone)]
pub struct AppConfig {
    /// `PostgreSQL` database connection URL
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Wikipedia language edition used for symptom lookups (e.g. `es`)
    pub wikipedia_language: String,
    /// External articles endpoint probed by `/test_api`
    pub articles_api_url: Url,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name (e.g. `production`)
    pub sentry_environment: Option<String>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("database_url", &"[REDACTED]")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("wikipedia_language", &self.wikipedia_language)
            .field("articles_api_url", &self.articles_api_url.as_str())
            .field("sentry_dsn", &self.sentry_dsn.as_ref().map(|_| "[REDACTED]"))
            .field("sentry_environment", &self.sentry_environment)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `DATABASE_URL` is missing or any optional
    /// variable is set to an unparseable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = SecretString::from(get_required_env("DATABASE_URL")?);
        let host = parse_env("DIAGNOSTICO_HOST", "127.0.0.1", |raw| {
            raw.parse::<IpAddr>().map_err(|e| e.to_string())
        })?;
        let port = parse_env("DIAGNOSTICO_PORT", "5000", |raw| {
            raw.parse::<u16>().map_err(|e| e.to_string())
        })?;
        let wikipedia_language = parse_env(
            "WIKIPEDIA_LANGUAGE",
            DEFAULT_WIKIPEDIA_LANGUAGE,
            validate_language,
        )?;
        let articles_api_url = parse_env("ARTICLES_API_URL", DEFAULT_ARTICLES_API_URL, |raw| {
            Url::parse(raw).map_err(|e| e.to_string())
        })?;

        Ok(Self {
            database_url,
            host,
            port,
            wikipedia_language,
            articles_api_url,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable, treating blank values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Read an environment variable (or its default) and parse it.
fn parse_env<T>(
    key: &str,
    default: &str,
    parse: impl FnOnce(&str) -> Result<T, String>,
) -> Result<T, ConfigError> {
    let raw = get_optional_env(key).unwrap_or_else(|| default.to_string());
    parse(raw.trim()).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e))
}

/// Wikipedia language codes are short ASCII subdomains (`es`, `en`, `simple`).
fn validate_language(raw: &str) -> Result<String, String> {
    let valid = !raw.is_empty()
        && raw.len() <= 12
        && raw.chars().all(|c| c.is_ascii_lowercase() || c == '-');
    if valid {
        Ok(raw.to_string())
    } else {
        Err(format!("'{raw}' is not a Wikipedia language code"))
    }
}
