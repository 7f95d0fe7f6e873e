use axum::{
    middleware,
    routing::{delete, get, patch},
    Router,
};

use crate::middleware::auth::auth_middleware;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(crate::handlers::admin::admin_dashboard))
        .route("/users", get(crate::handlers::admin::list_users))
        .route("/users/:id", delete(crate::handlers::admin::delete_user))
        .route("/pickups/:id", delete(crate::handlers::admin::delete_pickup))
        .route(
            "/categories",
            get(crate::handlers::categories::list_all_categories)
                .post(crate::handlers::categories::create_category),
        )
        .route(
            "/categories/:id",
            patch(crate::handlers::categories::update_category)
                .delete(crate::handlers::categories::delete_category),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}
