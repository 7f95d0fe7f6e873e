// services/esewa_service.rs
use serde_json::{json, Value};
use tracing::info;

use crate::config::EsewaConfig;

const SANDBOX_PAYMENT_URL: &str = "https://uat.esewa.com.np/epay/main";
const PRODUCTION_PAYMENT_URL: &str = "https://esewa.com.np/epay/main";

/// Legacy eSewa ePay integration. The flow is redirect-based: we hand the
/// client a set of form fields to POST to the gateway, and the gateway
/// calls back into /api/payments/success (with `oid`/`refId`) or
/// /api/payments/failure. There is no outbound API call.
pub struct EsewaService {
    config: EsewaConfig,
}

impl EsewaService {
    pub fn new(config: EsewaConfig) -> Self {
        info!("💳 eSewa environment: {}", config.environment);
        EsewaService { config }
    }

    pub fn payment_url(&self) -> &'static str {
        if self.config.is_production() {
            PRODUCTION_PAYMENT_URL
        } else {
            SANDBOX_PAYMENT_URL
        }
    }

    /// Form fields for the gateway redirect. `pid` is our transaction id;
    /// the gateway echoes it back as `oid` in the success callback.
    pub fn redirect_fields(&self, transaction_id: &str, amount: f64) -> Value {
        json!({
            "payment_url": self.payment_url(),
            "fields": {
                "amt": amount,
                "txAmt": 0,
                "psc": 0,
                "pdc": 0,
                "tAmt": amount,
                "pid": transaction_id,
                "scd": self.config.merchant_id,
                "su": self.config.success_url,
                "fu": self.config.failure_url,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(environment: &str) -> EsewaService {
        EsewaService::new(EsewaConfig {
            merchant_id: "EPAYTEST".to_string(),
            success_url: "https://example.com/api/payments/success".to_string(),
            failure_url: "https://example.com/api/payments/failure".to_string(),
            environment: environment.to_string(),
        })
    }

    #[test]
    fn sandbox_and_production_urls() {
        assert_eq!(service("sandbox").payment_url(), SANDBOX_PAYMENT_URL);
        assert_eq!(service("production").payment_url(), PRODUCTION_PAYMENT_URL);
    }

    #[test]
    fn redirect_fields_carry_transaction_id_and_amount() {
        let fields = service("sandbox").redirect_fields("64f0aa", 60.0);
        assert_eq!(fields["fields"]["pid"], "64f0aa");
        assert_eq!(fields["fields"]["amt"], 60.0);
        assert_eq!(fields["fields"]["tAmt"], 60.0);
        assert_eq!(fields["fields"]["scd"], "EPAYTEST");
    }
}
