//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::Store;
use crate::services::Encyclopedia;

/// Application state shared across all handlers.
///
/// Built once in `main` and handed to the router. Cheaply cloneable via
/// `Arc`; holds no mutable state of its own.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AppConfig,
    store: Arc<dyn Store>,
    encyclopedia: Arc<dyn Encyclopedia>,
    http: reqwest::Client,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Application configuration
    /// * `store` - Persistence for users and diagnostics
    /// * `encyclopedia` - Symptom lookup collaborator
    /// * `http` - Client for the articles API probe
    #[must_use]
    pub fn new(
        config: AppConfig,
        store: Arc<dyn Store>,
        encyclopedia: Arc<dyn Encyclopedia>,
        http: reqwest::Client,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                encyclopedia,
                http,
            }),
        }
    }

    /// Get a reference to the application configuration.
    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    /// Get a reference to the store.
    #[must_use]
    pub fn store(&self) -> &dyn Store {
        self.inner.store.as_ref()
    }

    /// Get a reference to the encyclopedia client.
    #[must_use]
    pub fn encyclopedia(&self) -> &dyn Encyclopedia {
        self.inner.encyclopedia.as_ref()
    }

    /// Get a reference to the outbound HTTP client.
    #[must_use]
    pub fn http(&self) -> &reqwest::Client {
        &self.inner.http
    }
}
