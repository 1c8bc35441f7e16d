use std::sync::Arc;

use anyhow::Context;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::HeaderMap;
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::GlobalKeyExtractor, GovernorLayer,
};

use super::error::ApiError;
use super::routes::auth_routes;
use super::state::AppState;

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    upstream_configured: bool,
}

/// Full service router: the auth table under `/api` plus `/health`.
pub fn router(state: AppState) -> anyhow::Result<Router> {
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_millisecond(state.rate_limit.replenish_ms)
            .burst_size(state.rate_limit.burst)
            .key_extractor(GlobalKeyExtractor)
            .finish()
            .context("invalid rate limit configuration")?,
    );

    Ok(Router::new()
        .route("/health", get(health))
        .nest("/api", auth_routes(signup, login))
        .layer(GovernorLayer::new(governor_conf))
        // Set must wrap Propagate so the id exists before it is copied back.
        .layer(tower_http::request_id::PropagateRequestIdLayer::new(
            axum::http::header::HeaderName::from_static("x-request-id"),
        ))
        .layer(tower_http::request_id::SetRequestIdLayer::new(
            axum::http::header::HeaderName::from_static("x-request-id"),
            tower_http::request_id::MakeRequestUuid::default(),
        ))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state))
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        upstream_configured: state.controller.is_configured(),
    })
}

async fn signup(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    state.controller.signup(headers.get(CONTENT_TYPE), body).await
}

async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    state.controller.login(headers.get(CONTENT_TYPE), body).await
}
