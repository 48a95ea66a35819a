//! AttemptStatus state machine.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::StateMachine;

/// Lifecycle status of a checkout attempt.
///
/// `Pending` is the only non-terminal state. Once a gateway callback lands
/// the attempt in `Success` or `Failed`, later callbacks for the same
/// attempt are recorded for audit but never move the status again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttemptStatus {
    /// STK push issued (or about to be); waiting on the gateway callback.
    Pending,
    /// Payment confirmed by the gateway. Terminal.
    Success,
    /// Payment rejected, cancelled, or timed out. Terminal.
    Failed,
}

impl StateMachine for AttemptStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        matches!(
            (self, target),
            (AttemptStatus::Pending, AttemptStatus::Success)
                | (AttemptStatus::Pending, AttemptStatus::Failed)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        match self {
            AttemptStatus::Pending => vec![AttemptStatus::Success, AttemptStatus::Failed],
            AttemptStatus::Success | AttemptStatus::Failed => vec![],
        }
    }
}
