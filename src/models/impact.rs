use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use mongodb::bson::oid::ObjectId;
use mongodb::bson;

// Approximate per-kg conversion factors for recycled material.
pub const TREES_SAVED_PER_KG: f64 = 0.017;
pub const CO2_REDUCED_KG_PER_KG: f64 = 0.82;
pub const WATER_SAVED_LITERS_PER_KG: f64 = 13.2;

/// Per-customer environmental aggregate. Always recomputed from the full
/// set of completed pickups with a recorded weight, never incremented, so
/// repeated recomputation converges on the same values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecyclingImpact {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    pub user_id: String,
    pub total_weight_recycled: f64,
    pub trees_saved: f64,
    pub co2_reduced_kg: f64,
    pub water_saved_liters: f64,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub last_updated: DateTime<Utc>,
}

/// The derived metrics as a pure function of total weight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImpactTotals {
    pub total_weight_recycled: f64,
    pub trees_saved: f64,
    pub co2_reduced_kg: f64,
    pub water_saved_liters: f64,
}

impl ImpactTotals {
    pub fn from_weight(total_weight_kg: f64) -> Self {
        ImpactTotals {
            total_weight_recycled: total_weight_kg,
            trees_saved: total_weight_kg * TREES_SAVED_PER_KG,
            co2_reduced_kg: total_weight_kg * CO2_REDUCED_KG_PER_KG,
            water_saved_liters: total_weight_kg * WATER_SAVED_LITERS_PER_KG,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ImpactResponse {
    pub total_weight_recycled: f64,
    pub trees_saved: f64,
    pub co2_reduced_kg: f64,
    pub water_saved_liters: f64,
    pub last_updated: DateTime<Utc>,
}

impl From<RecyclingImpact> for ImpactResponse {
    fn from(impact: RecyclingImpact) -> Self {
        ImpactResponse {
            total_weight_recycled: impact.total_weight_recycled,
            trees_saved: impact.trees_saved,
            co2_reduced_kg: impact.co2_reduced_kg,
            water_saved_liters: impact.water_saved_liters,
            last_updated: impact.last_updated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn reference_totals_for_two_completed_pickups() {
        // Weights 2.0 kg and 3.5 kg.
        let totals = ImpactTotals::from_weight(2.0 + 3.5);
        assert!(close(totals.total_weight_recycled, 5.5));
        assert!(close(totals.trees_saved, 0.0935));
        assert!(close(totals.co2_reduced_kg, 4.51));
        assert!(close(totals.water_saved_liters, 72.6));
    }

    #[test]
    fn zero_weight_means_zero_impact() {
        let totals = ImpactTotals::from_weight(0.0);
        assert_eq!(totals.total_weight_recycled, 0.0);
        assert_eq!(totals.trees_saved, 0.0);
        assert_eq!(totals.co2_reduced_kg, 0.0);
        assert_eq!(totals.water_saved_liters, 0.0);
    }

    #[test]
    fn recomputation_is_idempotent() {
        let first = ImpactTotals::from_weight(12.75);
        let second = ImpactTotals::from_weight(12.75);
        assert_eq!(first, second);
    }
}
