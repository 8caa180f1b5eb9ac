//! Batches of actions awaiting submission.

use serde::{Deserialize, Serialize};
use shared_types::{Action, BatchId};

/// Lifecycle of a batch.
///
/// ```text
/// Pending ──► Submitting ──► Confirmed
///                 │  ▲
///                 ▼  │
///              Retrying ──► Reverted
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    /// Waiting behind the head of the queue, or the queue is idle.
    Pending,
    /// Head batch, attempt in flight.
    Submitting,
    /// Head batch, at least one attempt failed.
    Retrying,
    /// Accepted by the ledger and removed.
    Confirmed,
    /// Discarded by a terminal failure.
    Reverted,
}

/// Ordered group of actions submitted as one ledger transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionBatch {
    /// Creation-ordered identifier.
    pub id: BatchId,
    /// Actions in enqueue order, before bundling.
    pub actions: Vec<Action>,
    /// Failed attempts so far.
    pub retries: u32,
    /// Error of the last failed attempt.
    pub last_error: Option<String>,
}

impl ActionBatch {
    /// A fresh batch.
    pub fn new(id: BatchId, actions: Vec<Action>) -> Self {
        Self {
            id,
            actions,
            retries: 0,
            last_error: None,
        }
    }

    /// Number of actions before bundling.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// True when the batch holds no actions.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Status of this batch given its position.
    pub fn status(&self, is_head: bool, draining: bool) -> BatchStatus {
        match (is_head && draining, self.retries) {
            (false, _) => BatchStatus::Pending,
            (true, 0) => BatchStatus::Submitting,
            (true, _) => BatchStatus::Retrying,
        }
    }
}

/// Read-only view of a batch for status reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Batch id.
    pub id: BatchId,
    /// Actions before bundling.
    pub actions: usize,
    /// Failed attempts so far.
    pub retries: u32,
    /// Last error, if any.
    pub last_error: Option<String>,
    /// Lifecycle state.
    pub status: BatchStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_by_position() {
        let mut batch = ActionBatch::new(BatchId(1), Vec::new());
        assert!(batch.is_empty());
        assert_eq!(batch.status(false, true), BatchStatus::Pending);
        assert_eq!(batch.status(true, false), BatchStatus::Pending);
        assert_eq!(batch.status(true, true), BatchStatus::Submitting);

        batch.retries = 1;
        assert_eq!(batch.status(true, true), BatchStatus::Retrying);
    }
}
