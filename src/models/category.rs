use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use mongodb::bson::oid::ObjectId;
use mongodb::bson;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WasteCategory {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    pub name: String,
    pub rate_per_kg: f64,
    pub description: String,
    pub is_active: bool,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

/// Public projection served by GET /api/categories.
#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    pub id: String,
    pub name: String,
    pub rate_per_kg: f64,
    pub description: String,
}

impl From<WasteCategory> for CategoryResponse {
    fn from(category: WasteCategory) -> Self {
        CategoryResponse {
            id: category.id.map(|id| id.to_hex()).unwrap_or_default(),
            name: category.name,
            rate_per_kg: category.rate_per_kg,
            description: category.description,
        }
    }
}

/// Admin projection: includes the active flag.
#[derive(Debug, Serialize)]
pub struct AdminCategoryResponse {
    pub id: String,
    pub name: String,
    pub rate_per_kg: f64,
    pub description: String,
    pub is_active: bool,
}

impl From<WasteCategory> for AdminCategoryResponse {
    fn from(category: WasteCategory) -> Self {
        AdminCategoryResponse {
            id: category.id.map(|id| id.to_hex()).unwrap_or_default(),
            name: category.name,
            rate_per_kg: category.rate_per_kg,
            description: category.description,
            is_active: category.is_active,
        }
    }
}
