//! HTTP implementation of [`TokenRefresher`].

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde_json::Value;
use tracing::debug;

use super::fetch::error_from_response;
use crate::auth::TokenRefresher;
use crate::telemetry;
use crate::{Result, SatchelError};

/// Calls `POST /users/refresh-token`.
///
/// The session is carried by the http-only cookie in the shared cookie
/// jar; no `Authorization` header is sent. A successful body carries the
/// new token at `data.accessToken`.
#[derive(Clone)]
pub struct HttpRefresher {
    http: Client,
    url: String,
}

impl HttpRefresher {
    pub fn new(http: Client, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl TokenRefresher for HttpRefresher {
    async fn refresh(&self) -> Result<String> {
        debug!(url = %self.url, "refreshing access token");
        let response = self
            .http
            .post(&self.url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| SatchelError::Http(e.to_string()))?;

        metrics::counter!(telemetry::REQUESTS_TOTAL,
            "method" => "POST",
            "status" => response.status().as_u16().to_string(),
        )
        .increment(1);

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let body: Value = response.json().await?;
        access_token(&body)
    }
}

/// Extract `data.accessToken` from a refresh response body.
fn access_token(body: &Value) -> Result<String> {
    body.pointer("/data/accessToken")
        .and_then(Value::as_str)
        .filter(|token| !token.is_empty())
        .map(str::to_owned)
        .ok_or_else(|| {
            SatchelError::InvalidResponse("refresh response missing data.accessToken".into())
        })
}
