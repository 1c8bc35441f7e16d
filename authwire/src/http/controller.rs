//! Forwards signup and signin to the external auth controller.
//!
//! Bodies and content types are relayed verbatim in both directions; this
//! service never interprets them.

use axum::body::Bytes;
use axum::http::header::CONTENT_TYPE;
use axum::http::HeaderValue;
use axum::response::{IntoResponse, Response};
use tracing::{debug, warn};

use super::error::ApiError;

#[derive(Debug, Clone)]
pub struct AuthController {
    http: reqwest::Client,
    upstream: Option<String>,
}

impl AuthController {
    pub fn new(upstream: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            upstream: upstream.map(|url| url.trim_end_matches('/').to_string()),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.upstream.is_some()
    }

    pub async fn signup(
        &self,
        content_type: Option<&HeaderValue>,
        body: Bytes,
    ) -> Result<Response, ApiError> {
        self.forward("signup", content_type, body).await
    }

    pub async fn login(
        &self,
        content_type: Option<&HeaderValue>,
        body: Bytes,
    ) -> Result<Response, ApiError> {
        self.forward("signin", content_type, body).await
    }

    async fn forward(
        &self,
        action: &str,
        content_type: Option<&HeaderValue>,
        body: Bytes,
    ) -> Result<Response, ApiError> {
        let Some(upstream) = self.upstream.as_deref() else {
            warn!(action, "no auth controller configured");
            return Err(ApiError::NotConfigured);
        };

        let mut request = self.http.post(format!("{upstream}/{action}")).body(body);
        if let Some(value) = content_type {
            request = request.header(CONTENT_TYPE, value.clone());
        }

        let upstream_response = request.send().await.map_err(|err| {
            warn!(action, error = %err, "auth controller request failed");
            ApiError::Upstream(err)
        })?;
        let status = upstream_response.status();
        let upstream_content_type = upstream_response.headers().get(CONTENT_TYPE).cloned();
        let bytes = upstream_response.bytes().await.map_err(ApiError::Upstream)?;
        debug!(action, status = status.as_u16(), "auth controller responded");

        let mut response = (status, bytes).into_response();
        match upstream_content_type {
            Some(value) => {
                response.headers_mut().insert(CONTENT_TYPE, value);
            }
            None => {
                response.headers_mut().remove(CONTENT_TYPE);
            }
        }
        Ok(response)
    }
}
