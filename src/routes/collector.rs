use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::middleware::auth::auth_middleware;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(crate::handlers::collector::collector_dashboard))
        .route("/pickups/:id/claim", post(crate::handlers::collector::claim_pickup))
        .route("/pickups/:id", post(crate::handlers::collector::update_pickup))
        .route_layer(middleware::from_fn(auth_middleware))
}
