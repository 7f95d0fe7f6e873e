use axum::{middleware, routing::post, Router};

use crate::middleware::auth::auth_middleware;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/:pickup_id/initiate",
            post(crate::handlers::payments::initiate_payment)
                .route_layer(middleware::from_fn(auth_middleware)),
        )
        // Gateway callbacks carry no bearer token.
        .route("/success", post(crate::handlers::payments::payment_success))
        .route("/failure", post(crate::handlers::payments::payment_failure))
}
