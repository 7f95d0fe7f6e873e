// models/transaction.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use mongodb::bson::{oid::ObjectId, Document};
use mongodb::bson;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Success,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Success => "success",
            PaymentStatus::Failed => "failed",
        }
    }
}

/// One transaction per pickup, enforced by a unique index on pickup_id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    pub pickup_id: String,
    pub customer_id: String,
    pub amount: f64,

    pub payment_method: String, // "cash" | "digital"
    pub payment_gateway: String,
    pub gateway_transaction_id: String,

    pub payment_status: PaymentStatus,
    pub is_paid: bool,

    // Whatever the gateway posts back, stored verbatim. No schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway_response: Option<Document>,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub transaction_date: DateTime<Utc>,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    pub id: String,
    pub pickup_id: String,
    pub amount: f64,
    pub payment_method: String,
    pub payment_gateway: String,
    pub payment_status: PaymentStatus,
    pub is_paid: bool,
    pub transaction_date: DateTime<Utc>,
}

impl From<Transaction> for TransactionResponse {
    fn from(tx: Transaction) -> Self {
        TransactionResponse {
            id: tx.id.map(|id| id.to_hex()).unwrap_or_default(),
            pickup_id: tx.pickup_id,
            amount: tx.amount,
            payment_method: tx.payment_method,
            payment_gateway: tx.payment_gateway,
            payment_status: tx.payment_status,
            is_paid: tx.is_paid,
            transaction_date: tx.transaction_date,
        }
    }
}
