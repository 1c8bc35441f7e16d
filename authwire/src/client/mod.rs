//! API client: bearer attachment on the way out, failure classification on the
//! way back.

mod error;
pub mod redirect;
pub mod store;

use std::sync::Arc;

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::ClientConfig;

pub use error::ClientError;
pub use redirect::{ChannelNavigator, LoginRedirect};
pub use store::{CredentialStore, FileStore};

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    store: Arc<dyn CredentialStore>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    pub fn new(config: &ClientConfig, store: Arc<dyn CredentialStore>) -> Self {
        Self::with_http(reqwest::Client::new(), &config.api_url, store)
    }

    pub fn with_http(
        http: reqwest::Client,
        base_url: &str,
        store: Arc<dyn CredentialStore>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            store,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Builds a request, attaching `Authorization: Bearer <token>` when a
    /// non-empty token is stored. Never fails; an unreadable store counts as
    /// no token.
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, self.url(path));
        match self.store.get() {
            Ok(Some(token)) if !token.is_empty() => {
                debug!(path, "attaching bearer token");
                builder.bearer_auth(token)
            }
            Ok(_) => builder,
            Err(err) => {
                warn!(error = %err, "credential store unreadable; sending without token");
                builder
            }
        }
    }

    /// Sends the request and classifies the outcome. 2xx responses pass
    /// through untouched; a 401 clears the stored token before returning.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, ClientError> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(err) => {
                warn!(status = status.as_u16(), error = %err, "failed to read error body");
                String::new()
            }
        };
        if status == StatusCode::UNAUTHORIZED {
            if let Err(err) = self.store.clear() {
                warn!(error = %err, "failed to clear credential store");
            }
            warn!("request unauthorized; stored token cleared");
            return Err(ClientError::Unauthorized { body });
        }

        debug!(status = status.as_u16(), "request failed");
        Err(ClientError::Status { status, body })
    }

    pub async fn get(&self, path: &str) -> Result<Response, ClientError> {
        self.send(self.request(Method::GET, path)).await
    }

    pub async fn post_json<T>(&self, path: &str, body: &T) -> Result<Response, ClientError>
    where
        T: Serialize + ?Sized,
    {
        self.send(self.request(Method::POST, path).json(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<Response, ClientError> {
        self.send(self.request(Method::DELETE, path)).await
    }
}
