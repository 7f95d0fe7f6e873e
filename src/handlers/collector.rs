use axum::{
    extract::{Path, State},
    response::Json,
    Extension,
};
use chrono::Utc;
use futures_util::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId};
use mongodb::Collection;
use serde_json::json;
use tracing::info;

use crate::dtos::pickup_dtos::CollectorUpdateRequest;
use crate::errors::{AppError, Result};
use crate::models::pickup::{PickupRequest, PickupResponse, PickupStatus};
use crate::models::transaction::{PaymentStatus, Transaction};
use crate::models::user::{Claims, Permission};
use crate::services::impact_service;
use crate::state::AppState;

const COLLECTOR_COMMISSION: f64 = 0.10;

pub async fn collector_dashboard(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<serde_json::Value>> {
    claims.role.require(Permission::UpdatePickup)?;

    let collection: Collection<PickupRequest> = state.db.collection("pickup_requests");

    let cursor = collection.find(doc! { "collector_id": &claims.sub }).await?;
    let mut assigned: Vec<PickupRequest> = cursor.try_collect().await?;
    assigned.sort_by(|a, b| a.pickup_date.cmp(&b.pickup_date));

    let cursor = collection
        .find(doc! {
            "status": PickupStatus::Pending.as_str(),
            "collector_id": null,
        })
        .await?;
    let mut available: Vec<PickupRequest> = cursor.try_collect().await?;
    available.sort_by(|a, b| a.pickup_date.cmp(&b.pickup_date));
    available.truncate(10);

    let today = Utc::now().date_naive();
    let today_pickups: Vec<PickupResponse> = assigned
        .iter()
        .filter(|p| p.pickup_date == today)
        .cloned()
        .map(PickupResponse::from)
        .collect();

    let completed: Vec<&PickupRequest> = assigned
        .iter()
        .filter(|p| p.status == PickupStatus::Completed)
        .collect();
    let total_earnings: f64 = completed
        .iter()
        .map(|p| p.actual_price() * COLLECTOR_COMMISSION)
        .sum();
    let completed_count = completed.len();

    Ok(Json(json!({
        "assigned_pickups": assigned.iter().cloned().map(PickupResponse::from).collect::<Vec<_>>(),
        "available_pickups": available.into_iter().map(PickupResponse::from).collect::<Vec<_>>(),
        "today_pickups": today_pickups,
        "total_earnings": total_earnings,
        "completed_count": completed_count,
    })))
}

/// Filter for the claim compare-and-set: only a pickup that is still
/// pending and unassigned matches, so of N racing collectors exactly one
/// update finds a document and wins. Never read-then-write.
fn claim_filter(pickup_id: ObjectId) -> mongodb::bson::Document {
    doc! {
        "_id": pickup_id,
        "status": PickupStatus::Pending.as_str(),
        "collector_id": null,
    }
}

fn claim_update(collector_id: &str) -> mongodb::bson::Document {
    doc! {
        "$set": {
            "status": PickupStatus::Assigned.as_str(),
            "collector_id": collector_id,
            "updated_at": mongodb::bson::DateTime::from_chrono(Utc::now()),
        }
    }
}

pub async fn claim_pickup(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<PickupResponse>> {
    claims.role.require(Permission::ClaimPickup)?;

    let pickup_id = ObjectId::parse_str(&id)?;
    let collection: Collection<PickupRequest> = state.db.collection("pickup_requests");

    let claimed = collection
        .find_one_and_update(claim_filter(pickup_id), claim_update(&claims.sub))
        .return_document(mongodb::options::ReturnDocument::After)
        .await?;

    match claimed {
        Some(pickup) => {
            info!("🚚 Pickup {} claimed by {}", id, claims.username);
            Ok(Json(PickupResponse::from(pickup)))
        }
        None => {
            let exists = collection.find_one(doc! { "_id": pickup_id }).await?;
            match exists {
                Some(_) => Err(AppError::state_conflict(
                    "Pickup is no longer available for assignment",
                )),
                None => Err(AppError::DocumentNotFound),
            }
        }
    }
}

/// Collector-side status update. The target status must be reachable from
/// the current one per the transition table; completion additionally
/// requires an actual weight and triggers settlement and impact update.
pub async fn update_pickup(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    Json(payload): Json<CollectorUpdateRequest>,
) -> Result<Json<PickupResponse>> {
    claims.role.require(Permission::UpdatePickup)?;

    let pickup_id = ObjectId::parse_str(&id)?;
    let collection: Collection<PickupRequest> = state.db.collection("pickup_requests");

    // Ownership check: the pickup must be assigned to this collector.
    let pickup = collection
        .find_one(doc! { "_id": pickup_id, "collector_id": &claims.sub })
        .await?
        .ok_or(AppError::DocumentNotFound)?;

    let current = pickup.status;
    let target = payload.status;

    if current.is_terminal() {
        return Err(AppError::state_conflict(format!(
            "Pickup is already {}",
            current.as_str()
        )));
    }
    if !current.can_transition_to(target) {
        return Err(AppError::state_conflict(format!(
            "Cannot move pickup from {} to {}",
            current.as_str(),
            target.as_str()
        )));
    }

    if target == PickupStatus::Completed {
        let weight = payload
            .actual_weight_kg
            .ok_or_else(|| AppError::invalid_data("Actual weight is required to complete a pickup"))?;
        if weight <= 0.0 {
            return Err(AppError::invalid_data("Actual weight must be positive"));
        }
        return complete_pickup(&state, &claims, pickup, weight, payload.special_instructions).await;
    }

    if payload.actual_weight_kg.is_some() {
        return Err(AppError::invalid_data(
            "Actual weight can only be recorded when completing a pickup",
        ));
    }

    let mut set = doc! {
        "status": target.as_str(),
        "updated_at": mongodb::bson::DateTime::from_chrono(Utc::now()),
    };
    if let Some(instructions) = &payload.special_instructions {
        set.insert("special_instructions", instructions);
    }

    // Expected current status in the filter keeps concurrent updates from
    // applying a transition twice.
    let updated = collection
        .find_one_and_update(
            doc! {
                "_id": pickup_id,
                "collector_id": &claims.sub,
                "status": current.as_str(),
            },
            doc! { "$set": set },
        )
        .return_document(mongodb::options::ReturnDocument::After)
        .await?
        .ok_or_else(|| AppError::state_conflict("Pickup was modified concurrently, try again"))?;

    info!("📝 Pickup {} moved to {}", id, target.as_str());

    Ok(Json(PickupResponse::from(updated)))
}

async fn complete_pickup(
    state: &AppState,
    claims: &Claims,
    pickup: PickupRequest,
    actual_weight_kg: f64,
    special_instructions: Option<String>,
) -> Result<Json<PickupResponse>> {
    let pickup_id = pickup.id.ok_or(AppError::DocumentNotFound)?;
    let collection: Collection<PickupRequest> = state.db.collection("pickup_requests");

    let now = Utc::now();
    let mut set = doc! {
        "status": PickupStatus::Completed.as_str(),
        "actual_weight_kg": actual_weight_kg,
        "completed_at": now.to_rfc3339(),
        "updated_at": mongodb::bson::DateTime::from_chrono(now),
    };
    if let Some(instructions) = &special_instructions {
        set.insert("special_instructions", instructions);
    }

    let completed = collection
        .find_one_and_update(
            doc! {
                "_id": pickup_id,
                "collector_id": &claims.sub,
                "status": pickup.status.as_str(),
            },
            doc! { "$set": set },
        )
        .return_document(mongodb::options::ReturnDocument::After)
        .await?
        .ok_or_else(|| AppError::state_conflict("Pickup was modified concurrently, try again"))?;

    let amount = completed.actual_price();

    // Settlement: one transaction per pickup. The upsert is keyed on
    // pickup_id (unique index), so a concurrent completion cannot produce
    // a duplicate. Cash settlement is marked paid on the spot; a digital
    // payment later flips the method and gateway fields.
    upsert_cash_transaction(state, &completed, amount).await?;

    impact_service::recompute_impact(&state.db, &completed.customer_id).await?;

    info!(
        "✅ Pickup {} completed by {}: {} kg, Rs.{:.2}",
        pickup_id.to_hex(),
        claims.username,
        actual_weight_kg,
        amount
    );

    Ok(Json(PickupResponse::from(completed)))
}

/// Settlement update for a completed pickup. $set applies on repeat
/// completions (amount may change if the weight was corrected), while the
/// cash defaults only land when the document is first inserted.
fn cash_settlement_update(
    pickup_hex: &str,
    customer_id: &str,
    amount: f64,
) -> mongodb::bson::Document {
    let now = mongodb::bson::DateTime::from_chrono(Utc::now());

    doc! {
        "$set": {
            "amount": amount,
            "is_paid": true,
            "updated_at": now,
        },
        "$setOnInsert": {
            "pickup_id": pickup_hex,
            "customer_id": customer_id,
            "payment_method": "cash",
            "payment_gateway": "",
            "gateway_transaction_id": "",
            "payment_status": PaymentStatus::Pending.as_str(),
            "transaction_date": now,
        },
    }
}

async fn upsert_cash_transaction(
    state: &AppState,
    pickup: &PickupRequest,
    amount: f64,
) -> Result<()> {
    let transactions: Collection<Transaction> = state.db.collection("transactions");
    let pickup_hex = pickup.id.map(|oid| oid.to_hex()).unwrap_or_default();

    transactions
        .update_one(
            doc! { "pickup_id": &pickup_hex },
            cash_settlement_update(&pickup_hex, &pickup.customer_id, amount),
        )
        .upsert(true)
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claim_filter_only_matches_unassigned_pending() {
        let id = ObjectId::new();
        let filter = claim_filter(id);

        assert_eq!(filter.get_str("status").unwrap(), "pending");
        assert!(matches!(
            filter.get("collector_id"),
            Some(mongodb::bson::Bson::Null)
        ));
        assert_eq!(filter.get_object_id("_id").unwrap(), id);
    }

    #[test]
    fn claim_update_assigns_and_sets_collector() {
        let update = claim_update("collector-42");
        let set = update.get_document("$set").unwrap();

        assert_eq!(set.get_str("status").unwrap(), "assigned");
        assert_eq!(set.get_str("collector_id").unwrap(), "collector-42");
    }

    #[test]
    fn settlement_amount_is_weight_times_rate() {
        // 4.0 kg at 15/kg settles at 60.00.
        let update = cash_settlement_update("p1", "c1", 4.0 * 15.0);
        let set = update.get_document("$set").unwrap();

        assert_eq!(set.get_f64("amount").unwrap(), 60.0);
        assert!(set.get_bool("is_paid").unwrap());
    }

    #[test]
    fn settlement_insert_defaults_are_cash() {
        let update = cash_settlement_update("p1", "c1", 25.0);
        let on_insert = update.get_document("$setOnInsert").unwrap();

        assert_eq!(on_insert.get_str("pickup_id").unwrap(), "p1");
        assert_eq!(on_insert.get_str("payment_method").unwrap(), "cash");
        assert_eq!(on_insert.get_str("payment_status").unwrap(), "pending");
    }
}
