//! HTTP layer: the auth route table and the service that hosts it.

mod controller;
mod error;
mod handlers;
mod routes;
mod state;


pub use controller::AuthController;
pub use handlers::router;
pub use state::{AppState, RateLimit};
