use std::sync::Arc;
use mongodb::Database;

use crate::services::esewa_service::EsewaService;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub jwt_secret: String,
    pub esewa_service: Option<Arc<EsewaService>>,
}

impl AppState {
    pub fn new(db: Database, jwt_secret: String) -> Self {
        AppState {
            db,
            jwt_secret,
            esewa_service: None,
        }
    }

    pub fn with_esewa(mut self, esewa_service: Arc<EsewaService>) -> Self {
        self.esewa_service = Some(esewa_service);
        self
    }
}
