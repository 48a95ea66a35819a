//! HTTP DTOs for checkout endpoints.

use serde::{Deserialize, Serialize};

use crate::application::handlers::checkout::CheckoutHistoryView;
use crate::domain::checkout::{AttemptStatus, CheckoutAttempt};
use crate::domain::foundation::{CartId, Money};

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Request to initiate payment for a cart.
#[derive(Debug, Clone, Deserialize)]
pub struct InitiateCheckoutRequest {
    pub cart_id: CartId,
    pub phone: String,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// One checkout attempt as served to clients.
#[derive(Debug, Clone, Serialize)]
pub struct AttemptResponse {
    pub id: String,
    pub cart_id: String,
    pub phone: String,
    pub amount: Money,
    pub status: AttemptStatus,
    pub attempt_number: u32,
    pub is_active: bool,
    pub checkout_request_id: Option<String>,
    pub receipt: Option<String>,
    pub error_message: Option<String>,
    pub created_at: String,
}

impl From<CheckoutAttempt> for AttemptResponse {
    fn from(attempt: CheckoutAttempt) -> Self {
        Self {
            id: attempt.id.to_string(),
            cart_id: attempt.cart_id.to_string(),
            phone: attempt.phone.to_string(),
            amount: attempt.amount,
            status: attempt.status,
            attempt_number: attempt.attempt_number,
            is_active: attempt.is_active,
            checkout_request_id: attempt.checkout_request_id,
            receipt: attempt.receipt,
            error_message: attempt.error_message,
            created_at: attempt.created_at.to_rfc3339(),
        }
    }
}

/// Attempt history for a cart.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutHistoryResponse {
    pub cart_id: String,
    pub checkout_history: Vec<AttemptResponse>,
    pub total_attempts: usize,
    pub successful_checkouts: usize,
    pub failed_checkouts: usize,
    pub pending_checkouts: usize,
}

impl From<CheckoutHistoryView> for CheckoutHistoryResponse {
    fn from(view: CheckoutHistoryView) -> Self {
        Self {
            cart_id: view.cart_id.to_string(),
            checkout_history: view.attempts.into_iter().map(Into::into).collect(),
            total_attempts: view.total_attempts,
            successful_checkouts: view.successful,
            failed_checkouts: view.failed,
            pending_checkouts: view.pending,
        }
    }
}

/// The acknowledgment body the gateway expects, whatever happened inside.
#[derive(Debug, Clone, Serialize)]
pub struct CallbackAck {
    #[serde(rename = "ResultCode")]
    pub result_code: i32,
    #[serde(rename = "ResultDesc")]
    pub result_desc: String,
}

impl CallbackAck {
    pub fn accepted() -> Self {
        Self {
            result_code: 0,
            result_desc: "Accepted".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ack_serializes_in_gateway_format() {
        let json = serde_json::to_value(CallbackAck::accepted()).unwrap();
        assert_eq!(json["ResultCode"], 0);
        assert_eq!(json["ResultDesc"], "Accepted");
    }

    #[test]
    fn attempt_response_serializes_wire_status() {
        use crate::domain::foundation::PhoneNumber;
        let attempt = CheckoutAttempt::new(
            CartId::new(),
            PhoneNumber::new("254700000000").unwrap(),
            Money::new(rust_decimal_macros::dec!(25.00)),
        );
        let json = serde_json::to_value(AttemptResponse::from(attempt)).unwrap();
        assert_eq!(json["status"], "PENDING");
        assert_eq!(json["attempt_number"], 1);
    }
}
