//! # authwire
//!
//! Bearer-token API client and signup/signin route table.
//!
//! ## Architecture
//!
//! - **Client**: reqwest wrapper that attaches the stored token and clears it on 401
//! - **Redirect**: sends the user to `/login` when the client reports an expired session
//! - **Routes**: `POST /signup` and `POST /signin`, delegated to an external auth controller
//! - **HTTP**: Axum host with rate limiting, request IDs, and graceful shutdown

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used, clippy::expect_used)]

mod client;
mod config;
mod http;

use std::sync::Arc;

use anyhow::Context;
use axum::serve;
use clap::Parser;
use reqwest::Response;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::client::{
    ApiClient, ChannelNavigator, ClientError, CredentialStore, FileStore, LoginRedirect,
};
use crate::config::{Cli, ClientConfig, Command, ServerConfig, TokenCommand};
use crate::http::{router, AppState, AuthController, RateLimit};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging().context("failed to initialize logging")?;

    let cli = Cli::parse();
    let client_config = ClientConfig::from_cli(cli.api_url, cli.token_file);

    match cli.command {
        Command::Serve(args) => {
            let config = ServerConfig::from_args(args).context("failed to load configuration")?;
            serve_api(config).await
        }
        Command::Token(command) => manage_token(&client_config, command),
        Command::Get { path } => {
            let target = path.as_str();
            call(&client_config, target, |client| async move {
                client.get(target).await
            })
            .await
        }
        Command::Post { path, data } => {
            let body: serde_json::Value = match data {
                Some(raw) => serde_json::from_str(&raw).context("--data is not valid JSON")?,
                None => serde_json::json!({}),
            };
            let target = path.as_str();
            call(&client_config, target, |client| async move {
                client.post_json(target, &body).await
            })
            .await
        }
        Command::Delete { path } => {
            let target = path.as_str();
            call(&client_config, target, |client| async move {
                client.delete(target).await
            })
            .await
        }
    }
}

/// Initialize tracing subscriber with `RUST_LOG` env filter (default: `info`).
/// Logs go to stderr so response bodies on stdout stay pipeable.
fn init_logging() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    Ok(())
}

async fn serve_api(config: ServerConfig) -> anyhow::Result<()> {
    info!(
        bind = %config.bind,
        upstream = ?config.upstream,
        rate_limit_replenish_ms = config.rate_limit_replenish_ms,
        rate_limit_burst = config.rate_limit_burst,
        "configuration loaded"
    );
    if config.upstream.is_none() {
        warn!("no auth controller upstream configured; signup and signin will answer 501");
    }

    let state = AppState::new(
        AuthController::new(config.upstream.clone()),
        RateLimit {
            replenish_ms: config.rate_limit_replenish_ms,
            burst: config.rate_limit_burst,
        },
    );
    let app = router(state).context("failed to build router")?;
    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;

    let shutdown = tokio::signal::ctrl_c();
    info!(bind = %config.bind, "authwire listening");

    serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = shutdown.await;
            info!("shutting down gracefully");
        })
        .await
        .context("server exited with error")
}

fn manage_token(config: &ClientConfig, command: TokenCommand) -> anyhow::Result<()> {
    let store = FileStore::new(&config.token_file);
    let path = store.path().display().to_string();
    match command {
        TokenCommand::Set { token } => {
            let token = token.trim();
            anyhow::ensure!(!token.is_empty(), "refusing to store an empty token");
            store.set(token).context("failed to store token")?;
            info!(path = %path, "token stored");
        }
        TokenCommand::Clear => {
            store.clear().context("failed to clear token")?;
            info!(path = %path, "token cleared");
        }
        TokenCommand::Show => match store.get().context("failed to read token")? {
            Some(token) => println!("{token}"),
            None => println!("no token stored in {path}"),
        },
    }
    Ok(())
}

/// Runs one request through the client, reporting a login redirect on stderr
/// and the response body on stdout.
async fn call<F, Fut>(config: &ClientConfig, path: &str, issue: F) -> anyhow::Result<()>
where
    F: FnOnce(ApiClient) -> Fut,
    Fut: std::future::Future<Output = Result<Response, ClientError>>,
{
    let store: Arc<dyn CredentialStore> = Arc::new(FileStore::new(&config.token_file));
    let client = ApiClient::new(config, store);
    debug!(base_url = client.base_url(), path, "issuing request");
    let (navigator, mut navigations) = ChannelNavigator::new(1);
    let redirect = LoginRedirect::new(navigator);

    let result = redirect.observe(issue(client).await);
    if let Ok(location) = navigations.try_recv() {
        eprintln!("session expired; sign in again at {location}");
    }

    let response = match result {
        Ok(response) => response,
        Err(err) => {
            error!(path, status = ?err.status(), "request failed");
            if let Some(body) = err.body().filter(|body| !body.is_empty()) {
                println!("{body}");
            }
            return Err(err).with_context(|| format!("request to {path} failed"));
        }
    };

    let status = response.status();
    let body = response
        .text()
        .await
        .context("failed to read response body")?;
    info!(path, status = status.as_u16(), "request complete");
    println!("{body}");
    Ok(())
}
