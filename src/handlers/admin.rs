use axum::{
    extract::{Path, State},
    response::Json,
    Extension,
};
use chrono::{Datelike, Utc};
use futures_util::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId};
use mongodb::Collection;
use serde_json::json;
use tracing::info;

use crate::errors::{AppError, Result};
use crate::models::category::{AdminCategoryResponse, WasteCategory};
use crate::models::impact::RecyclingImpact;
use crate::models::pickup::{PickupRequest, PickupResponse, PickupStatus};
use crate::models::transaction::Transaction;
use crate::models::user::{Claims, Permission, Role, User, UserResponse};
use crate::state::AppState;

pub async fn admin_dashboard(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<serde_json::Value>> {
    claims.role.require(Permission::ViewAdminDashboard)?;

    let users: Collection<User> = state.db.collection("users");
    let pickups: Collection<PickupRequest> = state.db.collection("pickup_requests");
    let categories: Collection<WasteCategory> = state.db.collection("waste_categories");

    let cursor = users.find(doc! {}).await?;
    let mut all_users: Vec<User> = cursor.try_collect().await?;
    all_users.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let user_stats = json!({
        "total": all_users.len(),
        "customers": all_users.iter().filter(|u| u.role == Role::Customer).count(),
        "collectors": all_users.iter().filter(|u| u.role == Role::Collector).count(),
        "admins": all_users.iter().filter(|u| u.role == Role::Admin).count(),
    });

    let cursor = pickups.find(doc! {}).await?;
    let mut all_pickups: Vec<PickupRequest> = cursor.try_collect().await?;
    all_pickups.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let now = Utc::now();
    let pickup_stats = json!({
        "total": all_pickups.len(),
        "pending": all_pickups.iter().filter(|p| p.status == PickupStatus::Pending).count(),
        "completed": all_pickups.iter().filter(|p| p.status == PickupStatus::Completed).count(),
        "this_month": all_pickups
            .iter()
            .filter(|p| p.created_at.month() == now.month() && p.created_at.year() == now.year())
            .count(),
    });

    let total_weight_collected: f64 = all_pickups
        .iter()
        .filter(|p| p.status == PickupStatus::Completed)
        .filter_map(|p| p.actual_weight_kg)
        .sum();

    let recent_pickups: Vec<PickupResponse> = all_pickups
        .into_iter()
        .take(10)
        .map(PickupResponse::from)
        .collect();

    let recent_users: Vec<UserResponse> = all_users
        .into_iter()
        .take(5)
        .map(UserResponse::from)
        .collect();

    let cursor = categories.find(doc! {}).await?;
    let all_categories: Vec<WasteCategory> = cursor.try_collect().await?;

    Ok(Json(json!({
        "user_stats": user_stats,
        "pickup_stats": pickup_stats,
        "total_weight_collected": total_weight_collected,
        "recent_pickups": recent_pickups,
        "recent_users": recent_users,
        "waste_categories": all_categories
            .into_iter()
            .map(AdminCategoryResponse::from)
            .collect::<Vec<_>>(),
    })))
}

pub async fn list_users(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<UserResponse>>> {
    claims.role.require(Permission::ManageUsers)?;

    let users: Collection<User> = state.db.collection("users");

    let cursor = users.find(doc! {}).await?;
    let mut all_users: Vec<User> = cursor.try_collect().await?;
    all_users.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    Ok(Json(all_users.into_iter().map(UserResponse::from).collect()))
}

/// Removing a user mirrors the relational cascade rules: their pickups
/// (as customer) go, along with those pickups' transactions and the
/// impact record; pickups they collected survive with collector unset.
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    claims.role.require(Permission::ManageUsers)?;

    let user_id = ObjectId::parse_str(&id)?;

    let users: Collection<User> = state.db.collection("users");
    let pickups: Collection<PickupRequest> = state.db.collection("pickup_requests");
    let transactions: Collection<Transaction> = state.db.collection("transactions");
    let impacts: Collection<RecyclingImpact> = state.db.collection("recycling_impacts");

    let result = users.delete_one(doc! { "_id": user_id }).await?;
    if result.deleted_count == 0 {
        return Err(AppError::DocumentNotFound);
    }

    let cursor = pickups.find(doc! { "customer_id": &id }).await?;
    let owned: Vec<PickupRequest> = cursor.try_collect().await?;
    let pickup_ids: Vec<String> = owned
        .iter()
        .filter_map(|pickup| pickup.id.map(|oid| oid.to_hex()))
        .collect();

    if !pickup_ids.is_empty() {
        transactions
            .delete_many(doc! { "pickup_id": { "$in": pickup_ids } })
            .await?;
    }
    let removed = pickups.delete_many(doc! { "customer_id": &id }).await?;

    pickups
        .update_many(
            doc! { "collector_id": &id },
            doc! { "$set": { "collector_id": null } },
        )
        .await?;

    impacts.delete_one(doc! { "user_id": &id }).await?;

    info!("🗑️ User {} deleted with {} pickups", id, removed.deleted_count);

    Ok(Json(json!({
        "success": true,
        "deleted_pickups": removed.deleted_count,
    })))
}

/// Deleting a pickup cascades to its transaction.
pub async fn delete_pickup(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    claims.role.require(Permission::ManageUsers)?;

    let pickup_id = ObjectId::parse_str(&id)?;

    let pickups: Collection<PickupRequest> = state.db.collection("pickup_requests");
    let transactions: Collection<Transaction> = state.db.collection("transactions");

    let result = pickups.delete_one(doc! { "_id": pickup_id }).await?;
    if result.deleted_count == 0 {
        return Err(AppError::DocumentNotFound);
    }

    transactions.delete_one(doc! { "pickup_id": &id }).await?;

    info!("🗑️ Pickup {} deleted", id);

    Ok(Json(json!({ "success": true })))
}
