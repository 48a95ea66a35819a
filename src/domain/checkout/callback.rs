//! Daraja STK callback payload and audit records.
//!
//! The gateway posts callbacks shaped as
//! `{"Body": {"stkCallback": {...}}}` over an at-least-once channel. This
//! module owns deserialization of that envelope and the append-only
//! `CallbackRecord` audit trail.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::foundation::{CheckoutId, Timestamp};
use uuid::Uuid;

/// Result code the gateway uses for a successful payment.
const RESULT_CODE_SUCCESS: i64 = 0;

/// Metadata item name carrying the M-Pesa receipt number.
const RECEIPT_ITEM_NAME: &str = "MpesaReceiptNumber";

/// Outermost callback envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StkCallbackEnvelope {
    #[serde(rename = "Body")]
    pub body: StkCallbackBody,
}

/// The `Body` wrapper around the actual callback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StkCallbackBody {
    #[serde(rename = "stkCallback")]
    pub stk_callback: StkCallback,
}

/// The callback proper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StkCallback {
    /// Correlation id issued when the STK push was initiated.
    #[serde(rename = "CheckoutRequestID")]
    pub checkout_request_id: String,

    /// Gateway-side request id. Informational only.
    #[serde(rename = "MerchantRequestID", default)]
    pub merchant_request_id: Option<String>,

    /// Zero for success, anything else for failure.
    #[serde(rename = "ResultCode")]
    pub result_code: i64,

    /// Human-readable outcome description.
    #[serde(rename = "ResultDesc")]
    pub result_desc: String,

    /// Present on success only.
    #[serde(rename = "CallbackMetadata", default)]
    pub callback_metadata: Option<CallbackMetadata>,
}

/// Metadata list attached to successful callbacks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallbackMetadata {
    #[serde(rename = "Item")]
    pub item: Vec<MetadataItem>,
}

/// Single name/value metadata entry.
///
/// `Value` is absent for some names (the gateway sends bare `{"Name": ...}`
/// entries), so it stays optional and untyped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataItem {
    #[serde(rename = "Name")]
    pub name: String,

    #[serde(rename = "Value", default)]
    pub value: Option<Value>,
}

impl StkCallbackEnvelope {
    /// The callback inside the double wrapper.
    pub fn callback(&self) -> &StkCallback {
        &self.body.stk_callback
    }
}

impl StkCallback {
    /// True if the gateway reports the payment went through.
    pub fn is_success(&self) -> bool {
        self.result_code == RESULT_CODE_SUCCESS
    }

    /// Extracts the M-Pesa receipt number from the metadata, if present.
    pub fn receipt(&self) -> Option<String> {
        let metadata = self.callback_metadata.as_ref()?;
        metadata
            .item
            .iter()
            .find(|item| item.name == RECEIPT_ITEM_NAME)
            .and_then(|item| item.value.as_ref())
            .and_then(|value| match value {
                Value::String(s) => Some(s.clone()),
                // Receipts are alphanumeric, but tolerate a numeric encoding.
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
    }
}

/// Append-only audit record of one received callback.
///
/// Every callback that names a known attempt is recorded, including
/// duplicates and callbacks that arrive after the attempt is terminal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallbackRecord {
    /// Unique identifier.
    pub id: Uuid,

    /// The attempt the callback correlates to.
    pub attempt_id: CheckoutId,

    /// The raw payload as received, for debugging and dispute handling.
    pub payload: Value,

    /// Result code as reported by the gateway.
    pub result_code: i64,

    /// Result description as reported by the gateway.
    pub result_desc: String,

    /// When the callback was received.
    pub received_at: Timestamp,
}

impl CallbackRecord {
    /// Builds an audit record for `attempt_id` from a parsed callback.
    pub fn new(attempt_id: CheckoutId, callback: &StkCallback, raw_payload: Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            attempt_id,
            payload: raw_payload,
            result_code: callback.result_code,
            result_desc: callback.result_desc.clone(),
            received_at: Timestamp::now(),
        }
    }
}
