// config.rs
use std::env;

use crate::errors::{AppError, Result};

/// eSewa gateway settings. The gateway is optional: when the env block is
/// missing the API boots with digital payments disabled and cash-only
/// settlement still works.
#[derive(Debug, Clone)]
pub struct EsewaConfig {
    pub merchant_id: String,
    pub success_url: String,
    pub failure_url: String,
    pub environment: String,
}

impl EsewaConfig {
    pub fn from_env() -> Result<Self> {
        let merchant_id = env::var("ESEWA_MERCHANT_ID")
            .map_err(|_| AppError::ConfigurationError("ESEWA_MERCHANT_ID must be set".to_string()))?;
        let success_url = env::var("ESEWA_SUCCESS_URL")
            .map_err(|_| AppError::ConfigurationError("ESEWA_SUCCESS_URL must be set".to_string()))?;
        let failure_url = env::var("ESEWA_FAILURE_URL")
            .map_err(|_| AppError::ConfigurationError("ESEWA_FAILURE_URL must be set".to_string()))?;
        let environment =
            env::var("ESEWA_ENVIRONMENT").unwrap_or_else(|_| "sandbox".to_string());

        Ok(EsewaConfig {
            merchant_id,
            success_url,
            failure_url,
            environment,
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
