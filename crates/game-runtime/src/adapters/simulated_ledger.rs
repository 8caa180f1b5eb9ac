//! In-process ledger used by the demo binary and the integration suite.
//!
//! A batch's transaction hash is `0x` followed by the hex SHA-256 of its
//! JSON encoding, so identical batches hash identically. Failures come from
//! an explicit script (`fail_next`) first, then from `failure_rate`.

use async_trait::async_trait;
use cc_04_action_queue::{ConfirmationWaiter, LedgerTransport, SubmissionResult, TransportError};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use shared_types::{Action, TxHash};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tracing::debug;

/// Simulated ledger behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatedLedgerConfig {
    /// Delay before a submission answers.
    pub submit_latency_ms: u64,
    /// Delay before a confirmation answers.
    pub confirm_latency_ms: u64,
    /// Probability in `[0, 1]` that a submission fails with a network error.
    pub failure_rate: f64,
}

impl Default for SimulatedLedgerConfig {
    fn default() -> Self {
        Self {
            submit_latency_ms: 200,
            confirm_latency_ms: 300,
            failure_rate: 0.0,
        }
    }
}

impl SimulatedLedgerConfig {
    /// No latency, no random failures.
    pub fn instant() -> Self {
        Self {
            submit_latency_ms: 0,
            confirm_latency_ms: 0,
            failure_rate: 0.0,
        }
    }
}

/// A batch the ledger accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedBatch {
    /// Hash returned for it.
    pub tx_hash: String,
    /// Actions as submitted (after bundling).
    pub actions: Vec<Action>,
}

/// Ledger transport and confirmer living in memory.
#[derive(Debug, Default)]
pub struct SimulatedLedger {
    config: SimulatedLedgerConfig,
    forced_failures: AtomicU32,
    attempts: AtomicU32,
    accepted: Mutex<Vec<AcceptedBatch>>,
    known: Mutex<HashSet<String>>,
}

impl SimulatedLedger {
    /// Ledger with the given behavior.
    pub fn new(config: SimulatedLedgerConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Make the next `count` submissions fail.
    pub fn fail_next(&self, count: u32) {
        self.forced_failures.store(count, Ordering::SeqCst);
    }

    /// Submission attempts so far, failed ones included.
    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Accepted batches, oldest first.
    pub fn accepted(&self) -> Vec<AcceptedBatch> {
        self.accepted.lock().clone()
    }

    /// Hash a batch the way the ledger does.
    pub fn transaction_hash(actions: &[Action]) -> Result<String, TransportError> {
        let encoded = serde_json::to_vec(actions)
            .map_err(|e| TransportError::Rejected(format!("unencodable batch: {e}")))?;
        Ok(format!("0x{}", hex::encode(Sha256::digest(&encoded))))
    }

    fn should_fail(&self) -> bool {
        let forced = self
            .forced_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        forced || rand::random::<f64>() < self.config.failure_rate
    }
}

#[async_trait]
impl LedgerTransport for SimulatedLedger {
    async fn submit(&self, actions: &[Action]) -> Result<SubmissionResult, TransportError> {
        if self.config.submit_latency_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.submit_latency_ms)).await;
        }
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;

        if self.should_fail() {
            debug!(attempt, "Simulated ledger dropped a submission");
            return Err(TransportError::Network("simulated outage".into()));
        }

        let tx_hash = Self::transaction_hash(actions)?;
        self.known.lock().insert(tx_hash.clone());
        self.accepted.lock().push(AcceptedBatch {
            tx_hash: tx_hash.clone(),
            actions: actions.to_vec(),
        });
        debug!(attempt, tx_hash = %tx_hash, calls = actions.len(), "Simulated ledger accepted batch");
        Ok(SubmissionResult::accepted(tx_hash))
    }
}

#[async_trait]
impl ConfirmationWaiter for SimulatedLedger {
    async fn confirm(&self, tx_hash: &TxHash) -> Result<bool, TransportError> {
        if self.config.confirm_latency_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.confirm_latency_ms)).await;
        }
        Ok(self.known.lock().contains(tx_hash.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{ContractAddress, Entrypoint, TierId};

    fn batch() -> Vec<Action> {
        vec![Action::for_tier(
            ContractAddress::new("0xgame"),
            Entrypoint::MineBlock,
            TierId::BASE,
            vec![],
        )]
    }

    #[test]
    fn test_hash_is_deterministic_and_well_formed() {
        let a = SimulatedLedger::transaction_hash(&batch()).unwrap();
        let b = SimulatedLedger::transaction_hash(&batch()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 2 + 64);
        assert!(TxHash::parse(&a).is_ok());
    }

    #[tokio::test]
    async fn test_accepts_and_confirms() {
        let ledger = SimulatedLedger::new(SimulatedLedgerConfig::instant());
        let answer = ledger.submit(&batch()).await.unwrap();
        let hash = TxHash::parse(answer.transaction_hash.as_deref().unwrap()).unwrap();

        assert!(ledger.confirm(&hash).await.unwrap());
        assert_eq!(ledger.accepted().len(), 1);
        assert_eq!(ledger.attempts(), 1);

        let unknown = TxHash::parse("0x1").unwrap();
        assert!(!ledger.confirm(&unknown).await.unwrap());
    }

    #[tokio::test]
    async fn test_forced_failures_run_out() {
        let ledger = SimulatedLedger::new(SimulatedLedgerConfig::instant());
        ledger.fail_next(2);

        assert!(ledger.submit(&batch()).await.is_err());
        assert!(ledger.submit(&batch()).await.is_err());
        assert!(ledger.submit(&batch()).await.is_ok());
        assert_eq!(ledger.attempts(), 3);
        assert_eq!(ledger.accepted().len(), 1);
    }

    #[tokio::test]
    async fn test_certain_failure_rate() {
        let ledger = SimulatedLedger::new(SimulatedLedgerConfig {
            failure_rate: 1.0,
            ..SimulatedLedgerConfig::instant()
        });
        let err = ledger.submit(&batch()).await.unwrap_err();
        assert!(matches!(err, TransportError::Network(_)));
    }
}
