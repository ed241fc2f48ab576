//! FetchGateway - one logical request, end to end.
//!
//! ```text
//! cache lookup ─hit──────────────────────────────────────────▶ payload
//!      │miss
//!      ▼
//!   send ──401──▶ RefreshCoordinator ──token──▶ send once more
//!      │                    │failed                 │
//!      │                    ▼                       ▼
//!      │                  error            401: purge session, error
//!      ▼
//!  non-2xx: normalised Api error
//!  2xx: write-through invalidation, cache write, payload
//! ```

use std::sync::Arc;

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use super::options::RequestOptions;
use crate::auth::{CredentialStore, RefreshCoordinator};
use crate::cache::{CacheStore, InvalidationPattern, cache_key, is_user_resource};
use crate::endpoints::catalog::is_refresh_endpoint;
use crate::telemetry;
use crate::types::ApiResponse;
use crate::{Result, SatchelError};

/// Entry point for every API call.
///
/// Cheap to clone; clones share the cache, the credential store, and the
/// refresh coordinator.
#[derive(Clone)]
pub struct FetchGateway {
    http: Client,
    base_url: String,
    cache: Arc<CacheStore>,
    credentials: Arc<dyn CredentialStore>,
    refresh: Arc<RefreshCoordinator>,
}

impl FetchGateway {
    pub(crate) fn new(
        http: Client,
        base_url: String,
        cache: Arc<CacheStore>,
        credentials: Arc<dyn CredentialStore>,
        refresh: Arc<RefreshCoordinator>,
    ) -> Self {
        Self {
            http,
            base_url,
            cache,
            credentials,
            refresh,
        }
    }

    /// Perform a request and return the raw JSON payload.
    ///
    /// `path` is relative to the base URL unless it is already absolute.
    /// With `skip_cache`, the cache is neither read nor written.
    ///
    /// A 401 triggers at most one token refresh and one retry. Transport
    /// failures are returned as is and never retried.
    pub async fn request(
        &self,
        path: &str,
        options: &RequestOptions,
        skip_cache: bool,
    ) -> Result<Arc<Value>> {
        let url = self.url_for(path);
        let key = cache_key(options.method.as_str(), &url, options.body.as_ref());

        if !skip_cache {
            if let Some(hit) = self.cache.get(&key) {
                return Ok(hit);
            }
        }

        let token = self.credentials.access_token();
        let mut response = self.send(&url, options, token.as_deref()).await?;

        if response.status() == StatusCode::UNAUTHORIZED && !is_refresh_endpoint(&url) {
            debug!(%url, "access token rejected");
            let fresh = self
                .refresh
                .ensure_fresh_credential(token.as_deref())
                .await?;
            response = self.send(&url, options, Some(&fresh)).await?;

            if response.status() == StatusCode::UNAUTHORIZED {
                warn!(%url, "refreshed token rejected, clearing session");
                let err = error_from_response(response).await;
                self.clear_session();
                return Err(err);
            }
        }

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let payload = Arc::new(read_json(response).await?);

        if options.method != Method::GET && is_user_resource(&url) {
            self.invalidate(InvalidationPattern::User);
            self.invalidate(InvalidationPattern::Auth);
        }
        if !skip_cache {
            self.cache.put(key, Arc::clone(&payload));
        }

        Ok(payload)
    }

    /// [`request()`](Self::request), deserialized into `T`.
    pub async fn request_json<T: DeserializeOwned>(
        &self,
        path: &str,
        options: &RequestOptions,
        skip_cache: bool,
    ) -> Result<T> {
        let payload = self.request(path, options, skip_cache).await?;
        Ok(T::deserialize(&*payload)?)
    }

    /// [`request()`](Self::request), deserialized as a `{ data: T }` envelope.
    pub async fn request_envelope<T: DeserializeOwned>(
        &self,
        path: &str,
        options: &RequestOptions,
        skip_cache: bool,
    ) -> Result<ApiResponse<T>> {
        self.request_json(path, options, skip_cache).await
    }

    /// Absolute URL for `path`.
    pub fn url_for(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!(
                "{}/{}",
                self.base_url.trim_end_matches('/'),
                path.trim_start_matches('/')
            )
        }
    }

    /// Cache key a request for `path` with `options` would use.
    pub fn cache_key_for(&self, path: &str, options: &RequestOptions) -> String {
        cache_key(
            options.method.as_str(),
            &self.url_for(path),
            options.body.as_ref(),
        )
    }

    /// Remove every cached response matching `pattern`.
    pub fn invalidate(&self, pattern: InvalidationPattern) -> usize {
        self.cache.invalidate_by_pattern(pattern)
    }

    /// Forget the stored credential and every cached response.
    pub fn clear_session(&self) {
        if let Err(e) = self.credentials.clear() {
            warn!(error = %e, "failed to clear stored credential");
        }
        self.cache.clear();
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn cache(&self) -> &Arc<CacheStore> {
        &self.cache
    }

    pub fn credentials(&self) -> &Arc<dyn CredentialStore> {
        &self.credentials
    }

    pub fn refresh_coordinator(&self) -> &Arc<RefreshCoordinator> {
        &self.refresh
    }

    async fn send(
        &self,
        url: &str,
        options: &RequestOptions,
        token: Option<&str>,
    ) -> Result<Response> {
        let mut request = self
            .http
            .request(options.method.clone(), url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json");
        for (name, value) in &options.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = &options.body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| SatchelError::Http(e.to_string()))?;

        metrics::counter!(telemetry::REQUESTS_TOTAL,
            "method" => options.method.to_string(),
            "status" => response.status().as_u16().to_string(),
        )
        .increment(1);
        debug!(method = %options.method, url, status = response.status().as_u16(), "response");

        Ok(response)
    }
}

/// Parse a success body. An empty body reads as `null`.
async fn read_json(response: Response) -> Result<Value> {
    let body = response
        .text()
        .await
        .map_err(|e| SatchelError::Http(e.to_string()))?;
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(&body)?)
}

/// Normalise a non-2xx response into [`SatchelError::Api`].
pub(crate) async fn error_from_response(response: Response) -> SatchelError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    SatchelError::api(status, error_message(status, &body))
}

/// Best-effort error message for a failed response.
///
/// Preference: JSON `message`, JSON `error`, raw body text, then
/// `request failed with status N`.
pub fn error_message(status: u16, body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<Value>(body) {
        let field = ["message", "error"]
            .iter()
            .filter_map(|name| json.get(name).and_then(Value::as_str))
            .find(|msg| !msg.trim().is_empty());
        if let Some(msg) = field {
            return msg.to_string();
        }
    }
    let text = body.trim();
    if text.is_empty() {
        format!("request failed with status {status}")
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_field_wins() {
        let body = r#"{"message":"Role not allowed","error":"Forbidden"}"#;
        assert_eq!(error_message(403, body), "Role not allowed");
    }

    #[test]
    fn error_field_is_second_choice() {
        assert_eq!(error_message(404, r#"{"error":"Test not found"}"#), "Test not found");
    }

    #[test]
    fn raw_text_fallback() {
        assert_eq!(error_message(502, "Bad Gateway"), "Bad Gateway");
    }

    #[test]
    fn generic_fallback() {
        assert_eq!(error_message(500, ""), "request failed with status 500");
        assert_eq!(error_message(500, "  \n"), "request failed with status 500");
    }
}
