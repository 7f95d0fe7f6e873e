use axum::{
    extract::{Path, State},
    response::Json,
    Extension,
};
use chrono::Utc;
use futures_util::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, Document};
use mongodb::Collection;
use tracing::info;
use validator::Validate;

use crate::dtos::pickup_dtos::{CreateCategoryRequest, UpdateCategoryRequest};
use crate::errors::{AppError, Result};
use crate::models::category::{AdminCategoryResponse, CategoryResponse, WasteCategory};
use crate::models::pickup::PickupRequest;
use crate::models::transaction::Transaction;
use crate::models::user::{Claims, Permission};
use crate::state::AppState;

/// Public endpoint: active categories only, in catalog order.
pub async fn list_active_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<CategoryResponse>>> {
    let collection: Collection<WasteCategory> = state.db.collection("waste_categories");

    let cursor = collection.find(doc! { "is_active": true }).await?;
    let mut categories: Vec<WasteCategory> = cursor.try_collect().await?;

    categories.sort_by(|a, b| a.name.cmp(&b.name));

    Ok(Json(categories.into_iter().map(CategoryResponse::from).collect()))
}

pub async fn list_all_categories(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<AdminCategoryResponse>>> {
    claims.role.require(Permission::ManageCategories)?;

    let collection: Collection<WasteCategory> = state.db.collection("waste_categories");

    let cursor = collection.find(doc! {}).await?;
    let mut categories: Vec<WasteCategory> = cursor.try_collect().await?;

    categories.sort_by(|a, b| a.name.cmp(&b.name));

    Ok(Json(categories.into_iter().map(AdminCategoryResponse::from).collect()))
}

pub async fn create_category(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateCategoryRequest>,
) -> Result<Json<AdminCategoryResponse>> {
    claims.role.require(Permission::ManageCategories)?;
    payload.validate()?;

    let collection: Collection<WasteCategory> = state.db.collection("waste_categories");

    if collection
        .find_one(doc! { "name": &payload.name })
        .await?
        .is_some()
    {
        return Err(AppError::DuplicateKey);
    }

    let category = WasteCategory {
        id: Some(ObjectId::new()),
        name: payload.name,
        rate_per_kg: payload.rate_per_kg,
        description: payload.description,
        is_active: payload.is_active,
        created_at: Utc::now(),
    };

    collection.insert_one(&category).await?;

    info!("♻️ Category created: {} @ {}/kg", category.name, category.rate_per_kg);

    Ok(Json(AdminCategoryResponse::from(category)))
}

pub async fn update_category(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateCategoryRequest>,
) -> Result<Json<AdminCategoryResponse>> {
    claims.role.require(Permission::ManageCategories)?;
    payload.validate()?;

    let collection: Collection<WasteCategory> = state.db.collection("waste_categories");

    let mut set = Document::new();
    if let Some(name) = &payload.name {
        set.insert("name", name);
    }
    if let Some(rate) = payload.rate_per_kg {
        set.insert("rate_per_kg", rate);
    }
    if let Some(description) = &payload.description {
        set.insert("description", description);
    }
    if let Some(is_active) = payload.is_active {
        set.insert("is_active", is_active);
    }
    if set.is_empty() {
        return Err(AppError::invalid_data("No fields to update"));
    }

    let category = collection
        .find_one_and_update(doc! { "_id": ObjectId::parse_str(&id)? }, doc! { "$set": set })
        .return_document(mongodb::options::ReturnDocument::After)
        .await?
        .ok_or(AppError::DocumentNotFound)?;

    Ok(Json(AdminCategoryResponse::from(category)))
}

/// Deleting a category cascades to its pickups, and those pickups'
/// transactions, mirroring relational ON DELETE CASCADE.
pub async fn delete_category(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    claims.role.require(Permission::ManageCategories)?;

    let category_id = ObjectId::parse_str(&id)?;

    let categories: Collection<WasteCategory> = state.db.collection("waste_categories");
    let pickups: Collection<PickupRequest> = state.db.collection("pickup_requests");
    let transactions: Collection<Transaction> = state.db.collection("transactions");

    let result = categories.delete_one(doc! { "_id": category_id }).await?;
    if result.deleted_count == 0 {
        return Err(AppError::DocumentNotFound);
    }

    let cursor = pickups.find(doc! { "category_id": &id }).await?;
    let doomed: Vec<PickupRequest> = cursor.try_collect().await?;
    let pickup_ids: Vec<String> = doomed
        .iter()
        .filter_map(|pickup| pickup.id.map(|oid| oid.to_hex()))
        .collect();

    if !pickup_ids.is_empty() {
        transactions
            .delete_many(doc! { "pickup_id": { "$in": pickup_ids } })
            .await?;
    }
    let removed = pickups.delete_many(doc! { "category_id": &id }).await?;

    info!("🗑️ Category {} deleted with {} pickups", id, removed.deleted_count);

    Ok(Json(serde_json::json!({
        "success": true,
        "deleted_pickups": removed.deleted_count,
    })))
}
