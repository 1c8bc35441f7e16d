use std::sync::Arc;

use super::controller::AuthController;

#[derive(Debug, Clone, Copy)]
/// Token bucket for the whole service: one request replenished every
/// `replenish_ms`, up to `burst` at once.
pub struct RateLimit {
    pub replenish_ms: u64,
    pub burst: u32,
}

impl Default for RateLimit {
    fn default() -> Self {
        Self {
            replenish_ms: 50,
            burst: 50,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub controller: Arc<AuthController>,
    pub rate_limit: RateLimit,
}

impl AppState {
    pub fn new(controller: AuthController, rate_limit: RateLimit) -> Self {
        Self {
            controller: Arc::new(controller),
            rate_limit,
        }
    }
}
