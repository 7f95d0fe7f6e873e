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
            "/",
            get(crate::handlers::pickups::pickup_history).post(crate::handlers::pickups::create_pickup),
        )
        .route("/dashboard", get(crate::handlers::pickups::customer_dashboard))
        .route("/:id/cancel", post(crate::handlers::pickups::cancel_pickup))
        .route_layer(middleware::from_fn(auth_middleware))
}
