//! # Game Events
//!
//! Game events and the receive-side filter.

use serde::{Deserialize, Serialize};
use shared_types::{BatchId, StageKind, TierId, TxHash, U256};

/// Something observable happened in a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    // =========================================================================
    // PRODUCTION PIPELINE
    // =========================================================================
    /// A stage reached capacity and paid out its reward.
    StageCompleted {
        /// Tier the stage belongs to.
        tier: TierId,
        /// Which stage completed.
        stage: StageKind,
        /// Identity of the completed stage instance.
        stage_id: u64,
        /// Amount credited to the balance.
        reward: U256,
    },

    // =========================================================================
    // ECONOMY
    // =========================================================================
    /// An upgrade, automation or feature was purchased.
    PurchaseCompleted {
        /// Tier the item belongs to.
        tier: TierId,
        /// Item label, e.g. `upgrade:block_size`.
        item: String,
        /// Level after the purchase.
        level: i32,
        /// Amount debited.
        cost: U256,
    },

    // =========================================================================
    // ACTION QUEUE
    // =========================================================================
    /// A batch was confirmed by the ledger and left the queue.
    BatchConfirmed {
        /// Confirmed batch.
        batch_id: BatchId,
        /// Ledger transaction that carried it.
        tx_hash: TxHash,
        /// Number of actions in the batch before bundling.
        actions: usize,
    },

    /// A batch submission failed and will be retried.
    BatchRetrying {
        /// Failing batch.
        batch_id: BatchId,
        /// Retry counter after this failure.
        attempt: u32,
        /// Failure description.
        error: String,
    },

    /// A batch exhausted its retries; the whole queue was discarded.
    TerminalFailure {
        /// Batch that failed permanently.
        batch_id: BatchId,
        /// Last error observed for it.
        last_error: String,
    },

    /// The queue was cleared manually.
    QueueCleared {
        /// Batches discarded.
        batches: usize,
        /// Buffered actions discarded.
        buffered: usize,
    },

    // =========================================================================
    // REVERT PROTOCOL
    // =========================================================================
    /// Local state is being rolled back; input should be blocked.
    RevertStarted {
        /// Monotonic revert counter after increment.
        revert_counter: u64,
    },

    /// Rollback finished (successfully or not); input may resume.
    RevertCompleted {
        /// Monotonic revert counter of this revert.
        revert_counter: u64,
        /// Whether the revert handler reported success.
        success: bool,
    },
}

impl GameEvent {
    /// Topic used by `EventFilter`.
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::StageCompleted { .. } => EventTopic::Pipeline,
            Self::PurchaseCompleted { .. } => EventTopic::Economy,
            Self::BatchConfirmed { .. }
            | Self::BatchRetrying { .. }
            | Self::QueueCleared { .. } => EventTopic::Queue,
            Self::TerminalFailure { .. }
            | Self::RevertStarted { .. }
            | Self::RevertCompleted { .. } => EventTopic::Revert,
        }
    }

    /// Tier this event concerns, when it concerns exactly one.
    #[must_use]
    pub fn tier(&self) -> Option<TierId> {
        match self {
            Self::StageCompleted { tier, .. } | Self::PurchaseCompleted { tier, .. } => Some(*tier),
            _ => None,
        }
    }
}

/// Coarse event grouping for filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// Stage completions.
    Pipeline,
    /// Purchases.
    Economy,
    /// Batch lifecycle.
    Queue,
    /// Terminal failures and revert bracketing.
    Revert,
    /// All events (no filtering).
    All,
}

/// Receive-side filter by topic and tier.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Accepted topics; empty accepts every topic.
    pub topics: Vec<EventTopic>,
    /// Tiers to include. Empty means all tiers; tier-less events always pass.
    pub tiers: Vec<TierId>,
}

impl EventFilter {
    /// Accept everything.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Accept only these topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self {
            topics,
            tiers: Vec::new(),
        }
    }

    /// Create a filter for events concerning specific tiers.
    #[must_use]
    pub fn for_tiers(tiers: Vec<TierId>) -> Self {
        Self {
            topics: Vec::new(),
            tiers,
        }
    }

    /// True when the event passes both topic and tier checks.
    #[must_use]
    pub fn matches(&self, event: &GameEvent) -> bool {
        let topic_match = self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic());

        let tier_match = self.tiers.is_empty()
            || event.tier().map_or(true, |tier| self.tiers.contains(&tier));

        topic_match && tier_match
    }
}
