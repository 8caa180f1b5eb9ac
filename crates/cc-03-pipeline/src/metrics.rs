//! Metrics collection for the production pipeline

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for pipeline activity
#[derive(Debug, Default)]
pub struct PipelineMetrics {
    /// Units counted by a stage
    pub units_accepted: AtomicU64,

    /// Units that hit a built, full or missing stage
    pub units_rejected: AtomicU64,

    /// Built transitions across all stages
    pub stages_completed: AtomicU64,
}

impl PipelineMetrics {
    /// Create new metrics collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an accepted unit
    pub fn record_accepted(&self) {
        self.units_accepted.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a rejected unit
    pub fn record_rejected(&self) {
        self.units_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Record built stages
    pub fn record_completions(&self, count: u64) {
        self.stages_completed.fetch_add(count, Ordering::Relaxed);
    }

    /// Get accepted units
    pub fn units_accepted(&self) -> u64 {
        self.units_accepted.load(Ordering::Relaxed)
    }

    /// Get rejected units
    pub fn units_rejected(&self) -> u64 {
        self.units_rejected.load(Ordering::Relaxed)
    }

    /// Get completed stages
    pub fn stages_completed(&self) -> u64 {
        self.stages_completed.load(Ordering::Relaxed)
    }
}
