//! Mock payment gateway for tests and gateway-less development.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use async_trait::async_trait;

use crate::ports::{GatewayError, PaymentGateway, PaymentRequest, StkPushAck};

/// Gateway stand-in that acknowledges every push with a deterministic
/// correlation id.
#[derive(Default)]
pub struct MockPaymentGateway {
    counter: AtomicU32,
    fail_next: AtomicBool,
}

impl MockPaymentGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next push fail with a network error.
    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    /// Number of pushes that reached the gateway (successful ones).
    pub fn push_count(&self) -> u32 {
        self.counter.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn request_stk_push(&self, request: PaymentRequest) -> Result<StkPushAck, GatewayError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(GatewayError::network("mock gateway offline"));
        }
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(StkPushAck {
            checkout_request_id: format!("ws_CO_mock_{}_{}", request.phone, n),
            merchant_request_id: Some(format!("mock-mr-{}", n)),
            customer_message: Some("Success. Request accepted for processing".to_string()),
        })
    }
}
