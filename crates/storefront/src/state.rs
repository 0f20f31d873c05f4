//! Application state shared across handlers.

use std::sync::Arc;

use crate::api::{ApiError, ApiSession, PlazeClient};
use crate::config::StorefrontConfig;
use crate::session::TowerSessionStore;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Holds no per-user data; the session lives
/// in the request.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    api: PlazeClient,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: StorefrontConfig) -> Result<Self, ApiError> {
        let api = PlazeClient::new(&config.api)?;
        Ok(Self {
            inner: Arc::new(AppStateInner { config, api }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the Plaze API client.
    #[must_use]
    pub fn api(&self) -> &PlazeClient {
        &self.inner.api
    }

    /// The API client authenticated from a request's session.
    #[must_use]
    pub fn api_for<'a>(&'a self, store: &'a TowerSessionStore) -> ApiSession<'a, TowerSessionStore> {
        self.inner.api.with_session(store)
    }
}
