//! PaymentGateway port for the outbound mobile-money integration.
//!
//! Defines the contract for issuing STK push requests against the Daraja
//! API (or a stand-in during development and tests). The inbound half of
//! the integration - the asynchronous callback - arrives over HTTP and is
//! handled by the reconciliation engine, not through this port.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{Money, PhoneNumber};

/// Port for initiating push payments.
///
/// Implementations must apply a bounded request timeout: a hung gateway
/// call must never wedge checkout initiation.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Sends an STK push to the subscriber's handset.
    ///
    /// Returns the gateway's acknowledgment, carrying the correlation id
    /// that the later asynchronous callback will reference.
    async fn request_stk_push(&self, request: PaymentRequest) -> Result<StkPushAck, GatewayError>;
}

/// Outbound STK push request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRequest {
    /// Subscriber to prompt.
    pub phone: PhoneNumber,

    /// Amount to charge.
    pub amount: Money,

    /// Short reference shown on the customer's statement.
    pub account_reference: String,

    /// Free-text description of the transaction.
    pub description: String,
}

/// Gateway acknowledgment of an accepted STK push.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StkPushAck {
    /// Correlation id tying the future callback back to this push.
    pub checkout_request_id: String,

    /// Gateway-side request id.
    pub merchant_request_id: Option<String>,

    /// Message shown to the customer, if the gateway supplies one.
    pub customer_message: Option<String>,
}

/// Errors from gateway operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayError {
    /// Error category.
    pub code: GatewayErrorCode,

    /// Human-readable message.
    pub message: String,

    /// Whether retrying the same request may succeed.
    pub retryable: bool,
}

impl GatewayError {
    /// Creates a new gateway error.
    pub fn new(code: GatewayErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            retryable: code.is_retryable(),
        }
    }

    /// Network connectivity or timeout failure.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::Network, message)
    }

    /// Credential or token failure.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::Authentication, message)
    }

    /// The gateway understood the request and declined it.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::Rejected, message)
    }

    /// The gateway answered with a body this crate cannot interpret.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::InvalidResponse, message)
    }
}

impl std::fmt::Display for GatewayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for GatewayError {}

/// Gateway error categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayErrorCode {
    /// Connectivity issue or request timeout.
    Network,

    /// OAuth token request failed or credentials were refused.
    Authentication,

    /// The push request was declined by the gateway.
    Rejected,

    /// Unparseable or contract-violating response body.
    InvalidResponse,

    /// Anything else.
    Unknown,
}

impl GatewayErrorCode {
    /// Check if this error type is typically retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, GatewayErrorCode::Network)
    }
}

impl std::fmt::Display for GatewayErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            GatewayErrorCode::Network => "network",
            GatewayErrorCode::Authentication => "authentication",
            GatewayErrorCode::Rejected => "rejected",
            GatewayErrorCode::InvalidResponse => "invalid_response",
            GatewayErrorCode::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}
