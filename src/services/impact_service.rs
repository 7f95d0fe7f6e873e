// services/impact_service.rs
use chrono::Utc;
use futures_util::TryStreamExt;
use mongodb::{
    bson::doc,
    options::ReturnDocument,
    Collection, Database,
};
use tracing::info;

use crate::errors::Result;
use crate::models::impact::{ImpactTotals, RecyclingImpact};
use crate::models::pickup::{PickupRequest, PickupStatus};

/// Recompute a customer's environmental impact from scratch: sum the
/// recorded weight of every completed pickup and overwrite the stored
/// aggregate. The result depends only on the current completed set, so
/// calling this repeatedly is safe.
pub async fn recompute_impact(db: &Database, user_id: &str) -> Result<RecyclingImpact> {
    let pickups: Collection<PickupRequest> = db.collection("pickup_requests");

    let filter = doc! {
        "customer_id": user_id,
        "status": PickupStatus::Completed.as_str(),
        "actual_weight_kg": { "$ne": null },
    };

    let cursor = pickups.find(filter).await?;
    let completed: Vec<PickupRequest> = cursor.try_collect().await?;

    let total_weight: f64 = completed
        .iter()
        .filter_map(|pickup| pickup.actual_weight_kg)
        .sum();

    let totals = ImpactTotals::from_weight(total_weight);

    let impacts: Collection<RecyclingImpact> = db.collection("recycling_impacts");
    let update = doc! {
        "$set": {
            "total_weight_recycled": totals.total_weight_recycled,
            "trees_saved": totals.trees_saved,
            "co2_reduced_kg": totals.co2_reduced_kg,
            "water_saved_liters": totals.water_saved_liters,
            "last_updated": mongodb::bson::DateTime::from_chrono(Utc::now()),
        },
        "$setOnInsert": { "user_id": user_id },
    };

    let impact = impacts
        .find_one_and_update(doc! { "user_id": user_id }, update)
        .upsert(true)
        .return_document(ReturnDocument::After)
        .await?
        // Upsert with ReturnDocument::After always yields a document.
        .ok_or(crate::errors::AppError::DocumentNotFound)?;

    info!(
        "🌱 Impact recomputed for user {}: {} kg over {} pickups",
        user_id,
        totals.total_weight_recycled,
        completed.len()
    );

    Ok(impact)
}

/// Seed a zeroed impact record at customer registration. Upsert keyed by
/// user_id, so re-registration races cannot create duplicates.
pub async fn ensure_impact_record(db: &Database, user_id: &str) -> Result<()> {
    let impacts: Collection<RecyclingImpact> = db.collection("recycling_impacts");

    let update = doc! {
        "$setOnInsert": {
            "user_id": user_id,
            "total_weight_recycled": 0.0,
            "trees_saved": 0.0,
            "co2_reduced_kg": 0.0,
            "water_saved_liters": 0.0,
            "last_updated": mongodb::bson::DateTime::from_chrono(Utc::now()),
        },
    };

    impacts
        .update_one(doc! { "user_id": user_id }, update)
        .upsert(true)
        .await?;

    Ok(())
}
