// handlers/payments.rs
use std::collections::HashMap;

use axum::{
    extract::{Form, Path, State},
    response::Json,
    Extension,
};
use chrono::Utc;
use mongodb::bson::{doc, oid::ObjectId, Document};
use mongodb::Collection;
use serde_json::json;
use tracing::{error, info, warn};

use crate::errors::{AppError, Result};
use crate::models::pickup::{PickupRequest, PickupStatus};
use crate::models::transaction::{PaymentStatus, Transaction, TransactionResponse};
use crate::models::user::{Claims, Permission};
use crate::state::AppState;

/// Customer kicks off a digital payment for a completed pickup. The
/// response carries the gateway redirect form; settlement lands later via
/// the success callback.
pub async fn initiate_payment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(pickup_id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    claims.role.require(Permission::InitiatePayment)?;

    let esewa = match &state.esewa_service {
        Some(service) => service,
        None => {
            error!("Payment initiation requested but eSewa service is not configured");
            return Err(AppError::ServiceUnavailable(
                "Digital payments are not available".to_string(),
            ));
        }
    };

    let oid = ObjectId::parse_str(&pickup_id)?;
    let pickups: Collection<PickupRequest> = state.db.collection("pickup_requests");

    let pickup = pickups
        .find_one(doc! { "_id": oid, "customer_id": &claims.sub })
        .await?
        .ok_or(AppError::DocumentNotFound)?;

    if pickup.status != PickupStatus::Completed {
        return Err(AppError::state_conflict(
            "Payment can only be made for completed pickups",
        ));
    }

    let amount = pickup.actual_price();
    let transactions: Collection<Transaction> = state.db.collection("transactions");
    let now = mongodb::bson::DateTime::from_chrono(Utc::now());

    // Upsert keyed by pickup_id: flips an existing cash transaction over
    // to the digital path, or creates one if completion never wrote it.
    let update = doc! {
        "$set": {
            "amount": amount,
            "payment_method": "digital",
            "payment_gateway": "esewa",
            "updated_at": now,
        },
        "$setOnInsert": {
            "pickup_id": &pickup_id,
            "customer_id": &claims.sub,
            "gateway_transaction_id": "",
            "payment_status": PaymentStatus::Pending.as_str(),
            "is_paid": false,
            "transaction_date": now,
        },
    };

    let transaction = transactions
        .find_one_and_update(doc! { "pickup_id": &pickup_id }, update)
        .upsert(true)
        .return_document(mongodb::options::ReturnDocument::After)
        .await?
        .ok_or(AppError::DocumentNotFound)?;

    let tx_id = transaction.id.ok_or(AppError::DocumentNotFound)?.to_hex();

    info!("💳 Payment initiated for pickup {} (tx {})", pickup_id, tx_id);

    let mut response = esewa.redirect_fields(&tx_id, amount);
    response["transaction"] = json!(TransactionResponse::from(transaction));

    Ok(Json(response))
}

/// Gateway success callback. eSewa posts back form-urlencoded data with
/// our transaction id as `oid` and its own reference as `refId`; the rest
/// of the payload is stored verbatim with no schema. The gateway is the
/// source of truth here, nothing is re-verified.
pub async fn payment_success(
    State(state): State<AppState>,
    Form(payload): Form<HashMap<String, String>>,
) -> Result<Json<serde_json::Value>> {
    let oid = payload
        .get("oid")
        .cloned()
        .ok_or(AppError::InvalidTransaction)?;
    let ref_id = payload.get("refId").cloned().unwrap_or_default();

    let tx_id = ObjectId::parse_str(&oid).map_err(|_| AppError::InvalidTransaction)?;

    let mut gateway_response = Document::new();
    for (key, value) in &payload {
        gateway_response.insert(key.clone(), value.clone());
    }

    let transactions: Collection<Transaction> = state.db.collection("transactions");
    let update = doc! {
        "$set": {
            "is_paid": true,
            "payment_status": PaymentStatus::Success.as_str(),
            "gateway_transaction_id": &ref_id,
            "gateway_response": gateway_response,
            "updated_at": mongodb::bson::DateTime::from_chrono(Utc::now()),
        }
    };

    let transaction = transactions
        .find_one_and_update(doc! { "_id": tx_id }, update)
        .return_document(mongodb::options::ReturnDocument::After)
        .await?
        .ok_or(AppError::InvalidTransaction)?;

    info!("✅ Payment success for transaction {} (refId {})", oid, ref_id);

    Ok(Json(json!({
        "success": true,
        "message": format!("Payment successful! Amount: Rs.{:.2}", transaction.amount),
        "transaction": TransactionResponse::from(transaction),
    })))
}

/// Gateway failure callback. Acknowledges and mutates nothing; the
/// transaction stays pending and the customer can retry from history.
pub async fn payment_failure() -> Json<serde_json::Value> {
    warn!("❌ Payment failure callback received");

    Json(json!({
        "success": false,
        "message": "Payment failed. Please try again.",
    }))
}
