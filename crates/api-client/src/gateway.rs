//! Authenticated request gateway
//!
//! Every outbound call goes through `ApiClient::send`, which:
//! 1. asks the `TokenManager` for a token and sets `Authorization: Bearer ...`
//!    when one exists (no header when nobody is signed in)
//! 2. aborts before sending if token acquisition itself fails
//! 3. ends the session when the backend answers 401 (awaited, so the caller
//!    sees a signed-out session), then returns the 401
//!
//! Other error statuses are returned unchanged apart from extracting the
//! backend's error message.

use std::sync::Arc;
use std::time::Duration;

use identity::TokenManager;
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, error, instrument, warn};

use crate::error::{ApiError, Result};
use crate::metrics;
use crate::request::RequestDescriptor;

/// Backend used when nothing is configured
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client bound to one backend and one token lifecycle.
///
/// Cheap to clone; clones share the connection pool and the token manager.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
    tokens: Arc<TokenManager>,
}

impl ApiClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, tokens: Arc<TokenManager>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            timeout: DEFAULT_TIMEOUT,
            tokens,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn tokens(&self) -> &Arc<TokenManager> {
        &self.tokens
    }

    /// Attach the bearer token for the active account, if any.
    pub async fn prepare(&self, request: &mut RequestDescriptor) -> Result<()> {
        let Some(token) = self.tokens.acquire_token().await? else {
            return Ok(());
        };
        let value = HeaderValue::from_str(&token.bearer()).map_err(|_| {
            ApiError::Preparation(identity::AuthError::Provider(
                "access token is not a valid header value".into(),
            ))
        })?;
        request.headers.insert(AUTHORIZATION, value);
        Ok(())
    }

    /// Prepare, send and classify one request.
    #[instrument(skip_all, fields(request_id = %new_request_id(), method = %request.method, path = %request.path))]
    pub async fn send(&self, mut request: RequestDescriptor) -> Result<reqwest::Response> {
        if let Err(e) = self.prepare(&mut request).await {
            error!(error = %e, "request preparation failed, not sending");
            return Err(e);
        }

        let url = request.url(&self.base_url);
        let method = request.method.clone();
        let mut builder = self
            .http
            .request(method.clone(), &url)
            .headers(request.headers)
            .timeout(self.timeout);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            metrics::record_transport_error();
            error!(error = %e, "request failed before a response arrived");
            ApiError::Transport(e.to_string())
        })?;

        let status = response.status();
        metrics::record_request(method.as_str(), status.as_u16());
        if status.is_success() {
            debug!(status = status.as_u16(), "request succeeded");
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = error_message(status, &body);

        if status == StatusCode::UNAUTHORIZED {
            warn!(message = %message, "backend rejected credentials, ending session");
            self.force_logout().await;
            return Err(ApiError::Unauthorized { message });
        }

        warn!(status = status.as_u16(), message = %message, "request returned error status");
        Err(ApiError::Status {
            status: status.as_u16(),
            message,
        })
    }

    /// End the session after a 401. `TokenManager::logout` logs and swallows
    /// its own failures, so the 401 is always what the caller gets back.
    async fn force_logout(&self) {
        metrics::record_forced_logout();
        self.tokens.logout().await;
    }

    /// GET `path` with `query` and decode the JSON body.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: Vec<(String, String)>,
    ) -> Result<T> {
        let response = self
            .send(RequestDescriptor::get(path).with_query(query))
            .await?;
        decode(response).await
    }

    /// POST a JSON body and decode the JSON reply.
    pub async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let body = serde_json::to_value(body)
            .map_err(|e| ApiError::Decode(format!("serializing request body: {e}")))?;
        let response = self.send(RequestDescriptor::post_json(path, body)).await?;
        decode(response).await
    }

    pub async fn delete(&self, path: &str) -> Result<()> {
        self.send(RequestDescriptor::delete(path)).await?;
        Ok(())
    }
}

fn new_request_id() -> String {
    format!("req_{}", uuid::Uuid::new_v4().simple())
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    response
        .json::<T>()
        .await
        .map_err(|e| ApiError::Decode(e.to_string()))
}

/// Pull a readable message out of an error body.
///
/// The backend reports `{"detail": "..."}` from route handlers and
/// `{"status": "error", "message": "..."}` from its global handlers.
fn error_message(status: StatusCode, body: &str) -> String {
    let reason = || {
        status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string()
    };
    if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
        return ["detail", "message"]
            .into_iter()
            .find_map(|key| json.get(key).and_then(|v| v.as_str()))
            .map(str::to_string)
            .unwrap_or_else(reason);
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        reason()
    } else {
        trimmed.to_string()
    }
}
