//! CallbackRecordStore port - append-only callback audit trail.

use async_trait::async_trait;

use crate::domain::checkout::CallbackRecord;
use crate::domain::foundation::{CheckoutId, DomainError};

/// Port for the callback audit trail.
///
/// The gateway delivers at-least-once, so the same callback may be stored
/// several times. That is intentional: the trail records what was received,
/// not what was acted on.
#[async_trait]
pub trait CallbackRecordStore: Send + Sync {
    /// Appends one received callback. Never updates or deletes.
    async fn append(&self, record: CallbackRecord) -> Result<(), DomainError>;

    /// All callbacks recorded for an attempt, oldest first.
    async fn list_for_attempt(
        &self,
        attempt_id: &CheckoutId,
    ) -> Result<Vec<CallbackRecord>, DomainError>;
}
