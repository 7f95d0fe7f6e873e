use axum::{
    extract::{Path, Query, State},
    response::Json,
    Extension,
};
use chrono::Utc;
use futures_util::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId};
use mongodb::Collection;
use serde_json::json;
use tracing::info;
use validator::Validate;

use crate::dtos::pickup_dtos::{CreatePickupRequest, HistoryQuery};
use crate::errors::{AppError, Result};
use crate::models::category::WasteCategory;
use crate::models::impact::ImpactResponse;
use crate::models::pickup::{PickupRequest, PickupResponse, PickupStatus};
use crate::models::user::{Claims, Permission};
use crate::services::impact_service;
use crate::state::AppState;

pub async fn create_pickup(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreatePickupRequest>,
) -> Result<Json<PickupResponse>> {
    claims.role.require(Permission::RequestPickup)?;
    payload.validate()?;

    let categories: Collection<WasteCategory> = state.db.collection("waste_categories");
    let category = categories
        .find_one(doc! { "_id": ObjectId::parse_str(&payload.category_id)? })
        .await?
        .ok_or(AppError::DocumentNotFound)?;

    // Inactive categories are closed to new requests; existing pickups
    // keep the category they were created with.
    if !category.is_active {
        return Err(AppError::invalid_data(
            "This waste category is not accepting new pickups",
        ));
    }

    let now = Utc::now();
    let pickup = PickupRequest {
        id: Some(ObjectId::new()),
        customer_id: claims.sub.clone(),
        collector_id: None,
        category_id: payload.category_id,
        category_name: category.name,
        rate_per_kg: category.rate_per_kg,
        estimated_weight_kg: payload.estimated_weight_kg,
        actual_weight_kg: None,
        pickup_date: payload.pickup_date,
        pickup_time: payload.pickup_time,
        address: payload.address,
        special_instructions: payload.special_instructions,
        status: PickupStatus::Pending,
        created_at: now,
        updated_at: now,
        completed_at: None,
    };

    let collection: Collection<PickupRequest> = state.db.collection("pickup_requests");
    collection.insert_one(&pickup).await?;

    info!(
        "📦 Pickup requested by {}: {} kg of {}",
        claims.username, pickup.estimated_weight_kg, pickup.category_name
    );

    Ok(Json(PickupResponse::from(pickup)))
}

pub async fn pickup_history(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<serde_json::Value>> {
    claims.role.require(Permission::ViewPickupHistory)?;

    let collection: Collection<PickupRequest> = state.db.collection("pickup_requests");

    let cursor = collection.find(doc! { "customer_id": &claims.sub }).await?;
    let mut pickups: Vec<PickupRequest> = cursor.try_collect().await?;

    pickups.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let total_earnings: f64 = pickups
        .iter()
        .filter(|p| p.status == PickupStatus::Completed)
        .map(|p| p.actual_price())
        .sum();

    let total = pickups.len() as u64;
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(10).clamp(1, 100);
    let start = ((page - 1) * per_page) as usize;

    let page_items: Vec<PickupResponse> = pickups
        .into_iter()
        .skip(start)
        .take(per_page as usize)
        .map(PickupResponse::from)
        .collect();

    Ok(Json(json!({
        "pickups": page_items,
        "page": page,
        "per_page": per_page,
        "total_pickups": total,
        "total_earnings": total_earnings,
    })))
}

/// Cancellation is a single conditional update: only a pickup still in
/// pending or assigned matches the filter, so a pickup that has already
/// moved on is left untouched.
pub async fn cancel_pickup(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<PickupResponse>> {
    claims.role.require(Permission::CancelPickup)?;

    let pickup_id = ObjectId::parse_str(&id)?;
    let collection: Collection<PickupRequest> = state.db.collection("pickup_requests");

    let pickup = collection
        .find_one(doc! { "_id": pickup_id, "customer_id": &claims.sub })
        .await?
        .ok_or(AppError::DocumentNotFound)?;

    if !pickup.status.is_cancellable() {
        return Err(AppError::state_conflict(
            "Cannot cancel a pickup in its current status",
        ));
    }

    // The status set repeats in the filter so a pickup claimed between the
    // read above and this write is left untouched.
    let filter = doc! {
        "_id": pickup_id,
        "customer_id": &claims.sub,
        "status": { "$in": [
            PickupStatus::Pending.as_str(),
            PickupStatus::Assigned.as_str(),
        ] },
    };
    let update = doc! {
        "$set": {
            "status": PickupStatus::Cancelled.as_str(),
            "updated_at": mongodb::bson::DateTime::from_chrono(Utc::now()),
        }
    };

    let cancelled = collection
        .find_one_and_update(filter, update)
        .return_document(mongodb::options::ReturnDocument::After)
        .await?
        .ok_or_else(|| {
            AppError::state_conflict("Cannot cancel a pickup in its current status")
        })?;

    info!("🚫 Pickup {} cancelled by {}", id, claims.username);

    Ok(Json(PickupResponse::from(cancelled)))
}

pub async fn customer_dashboard(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<serde_json::Value>> {
    claims.role.require(Permission::ViewPickupHistory)?;

    let collection: Collection<PickupRequest> = state.db.collection("pickup_requests");

    let cursor = collection.find(doc! { "customer_id": &claims.sub }).await?;
    let mut pickups: Vec<PickupRequest> = cursor.try_collect().await?;

    pickups.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let pending = pickups
        .iter()
        .filter(|p| p.status == PickupStatus::Pending)
        .count();
    let completed = pickups
        .iter()
        .filter(|p| p.status == PickupStatus::Completed)
        .count();
    let total_earnings: f64 = pickups
        .iter()
        .filter(|p| p.status == PickupStatus::Completed)
        .map(|p| p.actual_price())
        .sum();

    // Recomputed on every dashboard read, which also covers customers
    // registered before impact records existed.
    let impact = impact_service::recompute_impact(&state.db, &claims.sub).await?;

    let recent: Vec<PickupResponse> = pickups
        .iter()
        .take(5)
        .cloned()
        .map(PickupResponse::from)
        .collect();

    Ok(Json(json!({
        "pickup_stats": {
            "pending": pending,
            "completed": completed,
            "total": pickups.len(),
        },
        "recent_pickups": recent,
        "impact": ImpactResponse::from(impact),
        "total_earnings": total_earnings,
    })))
}
