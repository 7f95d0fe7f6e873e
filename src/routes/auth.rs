use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::middleware::auth::auth_middleware;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/profile",
            get(crate::handlers::auth::profile).route_layer(middleware::from_fn(auth_middleware)),
        )
        .route("/register", post(crate::handlers::auth::register))
        .route("/login", post(crate::handlers::auth::login))
}
