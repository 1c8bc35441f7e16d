use axum::handler::Handler;
use axum::routing::post;
use axum::Router;

/// Route table for account creation and sign-in. Holds no logic of its own;
/// both paths delegate to the supplied handlers.
pub fn auth_routes<S, HS, TS, HL, TL>(signup: HS, login: HL) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    HS: Handler<TS, S>,
    TS: 'static,
    HL: Handler<TL, S>,
    TL: 'static,
{
    Router::new()
        .route("/signup", post(signup))
        .route("/signin", post(login))
}
