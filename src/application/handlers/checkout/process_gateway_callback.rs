//! ProcessGatewayCallbackHandler - command handler for inbound callbacks.
//!
//! Parsing happens here, before any audit write: a payload that is not
//! even shaped like an STK callback is rejected with a validation error
//! (the only case where the gateway sees a non-acknowledgment). Everything
//! after a successful parse is the reconciliation engine's business.

use std::sync::Arc;

use serde_json::Value;

use crate::domain::checkout::{
    CheckoutError, ReconciliationEngine, ReconciliationOutcome, StkCallbackEnvelope,
};
use crate::domain::foundation::ValidationError;

/// Command carrying one raw callback payload.
#[derive(Debug, Clone)]
pub struct ProcessGatewayCallbackCommand {
    pub payload: Value,
}

/// Handler for gateway callbacks.
pub struct ProcessGatewayCallbackHandler {
    engine: Arc<ReconciliationEngine>,
}

impl ProcessGatewayCallbackHandler {
    pub fn new(engine: Arc<ReconciliationEngine>) -> Self {
        Self { engine }
    }

    pub async fn handle(
        &self,
        cmd: ProcessGatewayCallbackCommand,
    ) -> Result<ReconciliationOutcome, CheckoutError> {
        let envelope: StkCallbackEnvelope =
            serde_json::from_value(cmd.payload.clone()).map_err(|e| {
                CheckoutError::ValidationFailed(ValidationError::invalid_format(
                    "payload",
                    format!("not an STK callback: {}", e),
                ))
            })?;

        self.engine
            .handle_callback(&envelope, cmd.payload)
            .await
            .map_err(CheckoutError::from)
    }
}
