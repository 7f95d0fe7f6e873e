use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use mongodb::bson::oid::ObjectId;
use mongodb::bson;

/// Lifecycle of a pickup request. The happy path is
/// pending -> assigned -> in_progress -> completed; cancelled, failed and
/// completed are terminal. Rescheduled is a non-terminal holding state a
/// collector can park a pickup in and move it on from later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PickupStatus {
    Pending,
    Assigned,
    InProgress,
    Completed,
    Cancelled,
    Failed,
    Rescheduled,
}

impl PickupStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PickupStatus::Pending => "pending",
            PickupStatus::Assigned => "assigned",
            PickupStatus::InProgress => "in_progress",
            PickupStatus::Completed => "completed",
            PickupStatus::Cancelled => "cancelled",
            PickupStatus::Failed => "failed",
            PickupStatus::Rescheduled => "rescheduled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PickupStatus::Completed | PickupStatus::Cancelled | PickupStatus::Failed
        )
    }

    /// The transition table. Disallowed transitions are rejected uniformly
    /// by every caller instead of per-endpoint ad hoc checks.
    pub fn can_transition_to(&self, next: PickupStatus) -> bool {
        use PickupStatus::*;
        match (self, next) {
            (Pending, Assigned) => true,
            (Assigned, InProgress) => true,
            (InProgress, Completed) => true,
            (InProgress, Failed) => true,
            (Pending | Assigned, Cancelled) => true,
            (Pending | Assigned | InProgress, Rescheduled) => true,
            (Rescheduled, Assigned | InProgress | Cancelled) => true,
            _ => false,
        }
    }

    /// States a customer may cancel from.
    pub fn is_cancellable(&self) -> bool {
        matches!(self, PickupStatus::Pending | PickupStatus::Assigned)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PickupRequest {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    pub customer_id: String,
    pub collector_id: Option<String>,

    pub category_id: String,
    pub category_name: String,
    // Rate snapshot taken at creation; a later category edit or
    // deactivation does not reprice existing requests.
    pub rate_per_kg: f64,

    pub estimated_weight_kg: f64,
    pub actual_weight_kg: Option<f64>,

    pub pickup_date: NaiveDate,
    pub pickup_time: NaiveTime,
    pub address: String,
    pub special_instructions: String,

    pub status: PickupStatus,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl PickupRequest {
    pub fn estimated_price(&self) -> f64 {
        self.estimated_weight_kg * self.rate_per_kg
    }

    /// Zero until a collector has recorded an actual weight.
    pub fn actual_price(&self) -> f64 {
        match self.actual_weight_kg {
            Some(weight) => weight * self.rate_per_kg,
            None => 0.0,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PickupResponse {
    pub id: String,
    pub customer_id: String,
    pub collector_id: Option<String>,
    pub category_id: String,
    pub category_name: String,
    pub rate_per_kg: f64,
    pub estimated_weight_kg: f64,
    pub actual_weight_kg: Option<f64>,
    pub estimated_price: f64,
    pub actual_price: f64,
    pub pickup_date: NaiveDate,
    pub pickup_time: NaiveTime,
    pub address: String,
    pub special_instructions: String,
    pub status: PickupStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<PickupRequest> for PickupResponse {
    fn from(pickup: PickupRequest) -> Self {
        let estimated_price = pickup.estimated_price();
        let actual_price = pickup.actual_price();

        PickupResponse {
            id: pickup.id.map(|id| id.to_hex()).unwrap_or_default(),
            customer_id: pickup.customer_id,
            collector_id: pickup.collector_id,
            category_id: pickup.category_id,
            category_name: pickup.category_name,
            rate_per_kg: pickup.rate_per_kg,
            estimated_weight_kg: pickup.estimated_weight_kg,
            actual_weight_kg: pickup.actual_weight_kg,
            estimated_price,
            actual_price,
            pickup_date: pickup.pickup_date,
            pickup_time: pickup.pickup_time,
            address: pickup.address,
            special_instructions: pickup.special_instructions,
            status: pickup.status,
            created_at: pickup.created_at,
            completed_at: pickup.completed_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use PickupStatus::*;

    fn pickup_with(rate: f64, estimated: f64, actual: Option<f64>) -> PickupRequest {
        PickupRequest {
            id: None,
            customer_id: "c1".to_string(),
            collector_id: None,
            category_id: "cat1".to_string(),
            category_name: "Paper".to_string(),
            rate_per_kg: rate,
            estimated_weight_kg: estimated,
            actual_weight_kg: actual,
            pickup_date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            pickup_time: NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
            address: "Baneshwor, Kathmandu".to_string(),
            special_instructions: String::new(),
            status: Pending,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            completed_at: None,
        }
    }

    #[test]
    fn happy_path_transitions() {
        assert!(Pending.can_transition_to(Assigned));
        assert!(Assigned.can_transition_to(InProgress));
        assert!(InProgress.can_transition_to(Completed));
    }

    #[test]
    fn no_skipping_in_progress() {
        assert!(!Pending.can_transition_to(Completed));
        assert!(!Assigned.can_transition_to(Completed));
        assert!(!Pending.can_transition_to(InProgress));
    }

    #[test]
    fn terminal_states_have_no_exits() {
        for terminal in [Completed, Cancelled, Failed] {
            assert!(terminal.is_terminal());
            for next in [
                Pending, Assigned, InProgress, Completed, Cancelled, Failed, Rescheduled,
            ] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn failure_only_from_in_progress() {
        assert!(InProgress.can_transition_to(Failed));
        assert!(!Pending.can_transition_to(Failed));
        assert!(!Assigned.can_transition_to(Failed));
        assert!(!Rescheduled.can_transition_to(Failed));
    }

    #[test]
    fn reschedule_from_any_non_terminal_working_state() {
        assert!(Pending.can_transition_to(Rescheduled));
        assert!(Assigned.can_transition_to(Rescheduled));
        assert!(InProgress.can_transition_to(Rescheduled));
        assert!(Rescheduled.can_transition_to(InProgress));
    }

    #[test]
    fn cancellable_only_while_pending_or_assigned() {
        assert!(Pending.is_cancellable());
        assert!(Assigned.is_cancellable());
        for status in [InProgress, Completed, Cancelled, Failed, Rescheduled] {
            assert!(!status.is_cancellable());
        }
    }

    #[test]
    fn estimated_price_is_weight_times_rate() {
        let pickup = pickup_with(10.0, 2.5, None);
        assert_eq!(pickup.estimated_price(), 25.0);
    }

    #[test]
    fn actual_price_is_zero_without_actual_weight() {
        let pickup = pickup_with(15.0, 4.0, None);
        assert_eq!(pickup.actual_price(), 0.0);
    }

    #[test]
    fn actual_price_uses_recorded_weight() {
        let pickup = pickup_with(15.0, 3.0, Some(4.0));
        assert_eq!(pickup.actual_price(), 60.0);
    }

    #[test]
    fn status_strings_match_serde_form() {
        assert_eq!(InProgress.as_str(), "in_progress");
        let json = serde_json::to_string(&InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
    }
}
