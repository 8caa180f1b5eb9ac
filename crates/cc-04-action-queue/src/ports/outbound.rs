//! Outbound ports (driven side - SPI)

use crate::error::TransportError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared_types::{Action, BatchId, TxHash};

/// Raw answer of a ledger submission.
///
/// Success is a well-formed `transaction_hash` with no `error` marker;
/// any other shape counts as a failed attempt.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionResult {
    /// Hash of the transaction carrying the batch
    #[serde(default)]
    pub transaction_hash: Option<String>,

    /// Error marker set by the ledger
    #[serde(default)]
    pub error: Option<String>,
}

impl SubmissionResult {
    /// A successful answer.
    pub fn accepted(hash: impl Into<String>) -> Self {
        Self {
            transaction_hash: Some(hash.into()),
            error: None,
        }
    }

    /// An answer carrying an error marker.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            transaction_hash: None,
            error: Some(error.into()),
        }
    }
}

/// Port: submit one batch as a single ledger transaction
#[async_trait]
pub trait LedgerTransport: Send + Sync {
    /// Submit the (already bundled) actions of a batch
    async fn submit(&self, actions: &[Action]) -> Result<SubmissionResult, TransportError>;
}

/// Port: wait for a submitted transaction to be accepted
#[async_trait]
pub trait ConfirmationWaiter: Send + Sync {
    /// `true` once the transaction is final, `false` if it was dropped
    async fn confirm(&self, tx_hash: &TxHash) -> Result<bool, TransportError>;
}

/// Port: roll local state back after a terminal failure
#[async_trait]
pub trait RevertHandler: Send + Sync {
    /// Restore the last consistent state. Errors are logged, never retried.
    async fn revert(&self) -> anyhow::Result<()>;
}

/// Port: learn which batches the ledger has accepted
#[async_trait]
pub trait ConfirmationObserver: Send + Sync {
    /// Called after every confirmation, in batch order. `settled` is true
    /// when nothing was buffered or batched behind it.
    async fn confirmed(&self, batch_id: BatchId, settled: bool);
}
