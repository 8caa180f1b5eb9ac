//! Metrics collection for the action queue

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for queue activity
#[derive(Debug, Default)]
pub struct QueueMetrics {
    /// Actions accepted into the buffer
    pub actions_enqueued: AtomicU64,

    /// Actions dropped at enqueue (missing target or reverting)
    pub actions_dropped: AtomicU64,

    /// Batches sealed
    pub batches_formed: AtomicU64,

    /// Batches confirmed by the ledger
    pub batches_confirmed: AtomicU64,

    /// Failed attempts that were retried
    pub retries: AtomicU64,

    /// Terminal failures
    pub terminal_failures: AtomicU64,

    /// Ledger calls saved by bundling
    pub calls_saved: AtomicU64,
}

/// Point-in-time copy of [`QueueMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QueueMetricsSnapshot {
    /// Actions accepted into the buffer
    pub actions_enqueued: u64,
    /// Actions dropped at enqueue
    pub actions_dropped: u64,
    /// Batches sealed
    pub batches_formed: u64,
    /// Batches confirmed
    pub batches_confirmed: u64,
    /// Retried attempts
    pub retries: u64,
    /// Terminal failures
    pub terminal_failures: u64,
    /// Calls saved by bundling
    pub calls_saved: u64,
}

impl QueueMetrics {
    /// Create new metrics collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an accepted action
    pub fn record_enqueued(&self) {
        self.actions_enqueued.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a dropped action
    pub fn record_dropped(&self) {
        self.actions_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a sealed batch
    pub fn record_batch_formed(&self) {
        self.batches_formed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a confirmed batch and what bundling saved on it
    pub fn record_confirmed(&self, calls_saved: usize) {
        self.batches_confirmed.fetch_add(1, Ordering::Relaxed);
        self.calls_saved
            .fetch_add(calls_saved as u64, Ordering::Relaxed);
    }

    /// Record a retried attempt
    pub fn record_retry(&self) {
        self.retries.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a terminal failure
    pub fn record_terminal_failure(&self) {
        self.terminal_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Copy every counter
    pub fn snapshot(&self) -> QueueMetricsSnapshot {
        QueueMetricsSnapshot {
            actions_enqueued: self.actions_enqueued.load(Ordering::Relaxed),
            actions_dropped: self.actions_dropped.load(Ordering::Relaxed),
            batches_formed: self.batches_formed.load(Ordering::Relaxed),
            batches_confirmed: self.batches_confirmed.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
            terminal_failures: self.terminal_failures.load(Ordering::Relaxed),
            calls_saved: self.calls_saved.load(Ordering::Relaxed),
        }
    }
}
