use axum::{routing::get, Router};

use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(crate::handlers::categories::list_active_categories))
}
