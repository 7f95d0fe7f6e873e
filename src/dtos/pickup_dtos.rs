use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use validator::Validate;

use crate::models::pickup::PickupStatus;

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePickupRequest {
    pub category_id: String,

    #[validate(range(min = 0.01, message = "Estimated weight must be a positive number of kg"))]
    pub estimated_weight_kg: f64,

    pub pickup_date: NaiveDate,
    pub pickup_time: NaiveTime,

    #[validate(length(min = 5, message = "A pickup address is required"))]
    pub address: String,

    #[serde(default)]
    pub special_instructions: String,
}

/// Collector-side update: a target status plus the fields that go with it.
#[derive(Debug, Deserialize)]
pub struct CollectorUpdateRequest {
    pub status: PickupStatus,
    pub actual_weight_kg: Option<f64>,
    pub special_instructions: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, message = "Category name is required"))]
    pub name: String,

    #[validate(range(min = 0.0, message = "Rate per kg cannot be negative"))]
    pub rate_per_kg: f64,

    #[serde(default)]
    pub description: String,

    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,

    #[validate(range(min = 0.0, message = "Rate per kg cannot be negative"))]
    pub rate_per_kg: Option<f64>,

    pub description: Option<String>,
    pub is_active: Option<bool>,
}
