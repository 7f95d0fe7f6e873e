use axum::extract::State;
use axum::{http::Method, response::Json, routing::get, Router};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber;

mod config;
mod database;
mod dtos;
mod errors;
mod handlers;
mod middleware;
mod models;
mod routes;
mod services;
mod state;

use database::connection::{ensure_indexes, get_db_client};
use services::esewa_service::EsewaService;
use state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let db = get_db_client().await;

    if let Err(e) = ensure_indexes(&db).await {
        tracing::error!("❌ Failed to create indexes: {}", e);
        panic!("Failed to create indexes: {}", e);
    }

    let app_state = initialize_app_state(db);

    let app = build_router(app_state);
    start_server(app).await;
}

fn initialize_app_state(db: mongodb::Database) -> AppState {
    let jwt_secret = std::env::var("JWT_SECRET")
        .unwrap_or_else(|_| "your-secret-key-change-in-production".to_string());

    let mut app_state = AppState::new(db, jwt_secret);

    tracing::info!("🔧 Attempting to initialize eSewa service...");

    match config::EsewaConfig::from_env() {
        Ok(esewa_config) => {
            tracing::info!("✅ eSewa config loaded successfully");
            tracing::info!("🏪 Merchant: {}", esewa_config.merchant_id);
            tracing::info!("🌐 Environment: {}", esewa_config.environment);

            let esewa_service = Arc::new(EsewaService::new(esewa_config));
            app_state = app_state.with_esewa(esewa_service);
            tracing::info!("✅ eSewa service initialized and ready");
        }
        Err(e) => {
            tracing::warn!("eSewa config missing ({}), digital payments disabled", e);
        }
    }

    app_state
}

fn build_router(app_state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
        .allow_credentials(false);

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_check))
        .route("/api/health", get(api_health_check))
        .nest("/api/auth", routes::auth::routes())
        .nest("/api/categories", routes::categories::routes())
        .nest("/api/pickups", routes::pickups::routes())
        .nest("/api/collector", routes::collector::routes())
        .nest("/api/payments", routes::payments::routes())
        .nest("/api/admin", routes::admin::routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

async fn start_server(app: Router) {
    let port = std::env::var("PORT").unwrap_or_else(|_| "10000".to_string());
    let addr = SocketAddr::from(([0, 0, 0, 0], port.parse().unwrap_or(10000)));

    tracing::info!("🚀 Server starting on {}", addr);

    match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => {
            axum::serve(listener, app).await.unwrap();
        }
        Err(e) => {
            tracing::error!("Failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        }
    }
}

async fn root_handler() -> &'static str {
    "♻️ EcoCycle Waste Pickup API"
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

async fn api_health_check(State(state): State<AppState>) -> Json<Value> {
    use mongodb::bson::doc;

    let db_status = match state.db.run_command(doc! {"ping": 1}).await {
        Ok(_) => "connected",
        Err(_) => "disconnected",
    };

    Json(json!({
        "status": "healthy",
        "database": db_status,
        "esewa": state.esewa_service.is_some(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
