//! Builder for configuring gateway instances

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;

use super::fetch::FetchGateway;
use super::refresher::HttpRefresher;
use crate::auth::{CredentialStore, MemoryCredentialStore, RefreshCoordinator, TokenRefresher};
use crate::cache::{CacheConfig, CacheStore};
use crate::endpoints::catalog::REFRESH_TOKEN;
use crate::version::user_agent;
use crate::{Result, SatchelError};

/// Base URL used when neither the builder nor the environment sets one.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/api";

/// Environment variable overriding the base URL.
pub const BASE_URL_ENV: &str = "SATCHEL_API_URL";

/// Default transport timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Main entry point for creating gateway instances.
pub struct Satchel;

impl Satchel {
    /// Create a new builder for configuring the gateway.
    pub fn builder() -> SatchelBuilder {
        SatchelBuilder::new()
    }
}

/// Builder for configuring gateway instances.
pub struct SatchelBuilder {
    base_url: Option<String>,
    timeout_secs: Option<u64>,
    cache: CacheConfig,
    credentials: Option<Arc<dyn CredentialStore>>,
    refresher: Option<Arc<dyn TokenRefresher>>,
}

impl SatchelBuilder {
    pub fn new() -> Self {
        Self {
            base_url: None,
            timeout_secs: None,
            cache: CacheConfig::default(),
            credentials: None,
            refresher: None,
        }
    }

    /// Set the API base URL (default: `$SATCHEL_API_URL`, then
    /// [`DEFAULT_BASE_URL`]).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the transport timeout for every request (seconds).
    pub fn timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Configure the response cache.
    pub fn cache(mut self, config: CacheConfig) -> Self {
        self.cache = config;
        self
    }

    /// Set the durable credential store (default: in-memory).
    pub fn credential_store(mut self, store: Arc<dyn CredentialStore>) -> Self {
        self.credentials = Some(store);
        self
    }

    /// Replace the HTTP refresh call (default: [`HttpRefresher`] against
    /// `{base_url}/users/refresh-token`).
    pub fn token_refresher(mut self, refresher: Arc<dyn TokenRefresher>) -> Self {
        self.refresher = Some(refresher);
        self
    }

    /// Build the gateway.
    pub fn build(self) -> Result<FetchGateway> {
        let base_url = resolve_base_url(self.base_url)?;
        let timeout = Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS));

        let http = Client::builder()
            .timeout(timeout)
            .cookie_store(true)
            .user_agent(user_agent())
            .build()
            .map_err(|e| SatchelError::Configuration(format!("failed to build HTTP client: {e}")))?;

        let cache = Arc::new(CacheStore::new(&self.cache));
        let credentials: Arc<dyn CredentialStore> = match self.credentials {
            Some(store) => store,
            None => Arc::new(MemoryCredentialStore::new()),
        };
        let refresher: Arc<dyn TokenRefresher> = match self.refresher {
            Some(refresher) => refresher,
            None => {
                let url = format!("{base_url}{}", REFRESH_TOKEN.path);
                Arc::new(HttpRefresher::new(http.clone(), url))
            }
        };
        let refresh = Arc::new(RefreshCoordinator::new(
            refresher,
            Arc::clone(&credentials),
            Arc::clone(&cache),
        ));

        Ok(FetchGateway::new(http, base_url, cache, credentials, refresh))
    }
}

impl Default for SatchelBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Explicit value, then environment, then the hard-coded fallback.
fn resolve_base_url(explicit: Option<String>) -> Result<String> {
    let url = explicit
        .or_else(|| std::env::var(BASE_URL_ENV).ok().filter(|v| !v.is_empty()))
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(SatchelError::Configuration(format!(
            "base URL must be http(s): {url}"
        )));
    }
    Ok(url.trim_end_matches('/').to_string())
}
