//! # Game Session
//!
//! The composition root: one player's economy, pipeline, action queue and
//! automation, wired together.
//!
//! ```text
//!   tap / automation tick ──► ProductionPipeline ──push_action──► ActionQueue ──► LedgerTransport
//!            ▲                        │ credit                         │
//!            │                        ▼                                │ batch N confirmed
//!            │                  EconomyLedger ◄──── purchase            ▼
//!            │                  UpgradeBook                      checkpoint := boundary N
//!            │                        ▲                                │
//!            └─ refresh ◄─────────────┴──── restore ◄─── terminal failure (RevertHandler)
//! ```
//!
//! ## Checkpoints
//!
//! The fresh game is the first checkpoint. Whenever a tap, purchase or
//! flush seals a batch with nothing buffered behind it, the state at that
//! moment is recorded as the boundary of that batch. When the ledger
//! confirms batch N, the newest boundary at or before N becomes the
//! checkpoint; a confirmation that leaves the queue settled checkpoints the
//! current state. A terminal failure restores the checkpoint.

mod state;
mod hooks;

pub use self::state::Checkpoint;

use self::state::SessionCore;
use self::hooks::{CheckpointHooks, SessionDriver};
use crate::adapters::SimulatedLedger;
use crate::config::GameConfig;
use crate::error::Result;
use cc_02_economy::{AutomationId, EconomyLedger, Feature, Item, Purchase, UpgradeBook, UpgradeId};
use cc_03_pipeline::{ProductionPipeline, Stage, UnitOutcome};
use cc_04_action_queue::{
    ActionQueue, ConfirmationWaiter, LedgerTransport, QueueMetricsSnapshot, QueuePorts,
    QueueStatus,
};
use cc_05_automation::{AutomationKey, AutomationScheduler};
use parking_lot::Mutex;
use primitive_types::U256;
use serde::Serialize;
use shared_bus::{EventFilter, InMemoryEventBus, Subscription};
use shared_types::{BatchId, StageKind, TierId};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::info;

/// Per-tier part of [`SessionStatus`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TierStatus {
    /// Tier.
    pub tier: TierId,
    /// Chain feature unlocked.
    pub unlocked: bool,
    /// Blocks sequenced.
    pub height: u64,
}

/// Point-in-time view of a session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionStatus {
    /// Balance.
    pub balance: U256,
    /// Every catalog tier.
    pub tiers: Vec<TierStatus>,
    /// Queue state.
    pub queue: QueueStatus,
    /// Queue counters.
    pub queue_metrics: QueueMetricsSnapshot,
    /// Pairs with a running automation task.
    pub automation: Vec<AutomationKey>,
    /// Automation global switch.
    pub automation_enabled: bool,
}

/// One player's game.
pub struct GameSession {
    core: Arc<SessionCore>,
}

impl GameSession {
    /// Build a session submitting to `transport`, optionally waiting on
    /// `confirmer` after each submission.
    pub fn new(
        config: GameConfig,
        transport: Arc<dyn LedgerTransport>,
        confirmer: Option<Arc<dyn ConfirmationWaiter>>,
    ) -> Result<Self> {
        config.validate()?;

        let bus = Arc::new(InMemoryEventBus::new());
        let hooks = Arc::new(CheckpointHooks::default());
        let queue = ActionQueue::new(
            config.queue.clone(),
            QueuePorts {
                transport,
                confirmer,
                reverter: hooks.clone(),
                observer: Some(hooks.clone()),
                events: bus.clone(),
            },
        )?;

        let ledger = Arc::new(EconomyLedger::new());
        let book = Arc::new(UpgradeBook::new(Arc::new(config.economy.clone())));
        let pipeline = ProductionPipeline::new(
            Arc::clone(&ledger),
            Arc::clone(&book),
            config.game_contract.clone(),
        );

        let core = Arc::new_cyclic(|weak| {
            let scheduler = AutomationScheduler::new(Arc::new(SessionDriver { core: weak.clone() }));
            scheduler.set_enabled(config.automation.enabled);
            SessionCore {
                checkpoint: Mutex::new(Checkpoint {
                    balance: ledger.snapshot(),
                    levels: book.snapshot(),
                    pipeline: pipeline.snapshot(),
                    after: None,
                }),
                boundaries: Mutex::new(VecDeque::new()),
                ledger,
                book,
                pipeline: Mutex::new(pipeline),
                queue,
                scheduler,
                bus,
            }
        });
        hooks.bind(Arc::downgrade(&core));

        info!(
            tiers = config.economy.tier_count(),
            contract = %config.game_contract,
            automation = config.automation.enabled,
            "[runtime] Game session created"
        );
        Ok(Self { core })
    }

    /// Session backed by an in-process [`SimulatedLedger`] for both
    /// submission and confirmation.
    pub fn with_simulated_ledger(config: GameConfig, ledger: Arc<SimulatedLedger>) -> Result<Self> {
        Self::new(config, ledger.clone(), Some(ledger))
    }

    // =========================================================================
    // MANUAL INPUT
    // =========================================================================

    /// Tap the Mining stage: one transaction paying the current fee.
    pub fn add_transaction(&self, tier: TierId) -> Result<UnitOutcome> {
        self.core.tap(tier, StageKind::Mining)
    }

    /// Tap the Sequencing stage: one confirmation click.
    pub fn click_sequencer(&self, tier: TierId) -> Result<UnitOutcome> {
        self.core.tap(tier, StageKind::Sequencing)
    }

    /// Whether a tap on `kind` would be accepted now.
    pub fn is_ready(&self, tier: TierId, kind: StageKind) -> bool {
        !self.core.queue.is_reverting() && self.core.pipeline.lock().is_ready(tier, kind)
    }

    // =========================================================================
    // PURCHASES
    // =========================================================================

    /// Buy the next level of an upgrade.
    pub fn buy_upgrade(&self, tier: TierId, upgrade: UpgradeId) -> Result<Purchase> {
        self.core.purchase(tier, Item::Upgrade(upgrade))
    }

    /// Buy the next level of an automation and (re)start its task.
    pub fn buy_automation(&self, tier: TierId, automation: AutomationId) -> Result<Purchase> {
        self.core.purchase(tier, Item::Automation(automation))
    }

    /// Unlock a feature (a tier's chain, DA or proving).
    pub fn unlock_feature(&self, tier: TierId, feature: Feature) -> Result<Purchase> {
        self.core.purchase(tier, Item::Feature(feature))
    }

    /// Price of the next level of an item.
    pub fn cost_of_next(&self, tier: TierId, item: Item) -> Result<U256> {
        Ok(self.core.book.cost_of_next(tier, item)?)
    }

    // =========================================================================
    // AUTOMATION
    // =========================================================================

    /// Stop one pair from ticking.
    pub fn pause_automation(&self, key: AutomationKey) {
        self.core.scheduler.pause(key);
    }

    /// Let a paused pair tick again.
    pub fn resume_automation(&self, key: AutomationKey) {
        self.core.scheduler.resume(key);
    }

    /// Global automation switch.
    pub fn set_automation_enabled(&self, enabled: bool) {
        self.core.scheduler.set_enabled(enabled);
    }

    /// Automated taps performed so far.
    pub fn automation_ticks(&self) -> u64 {
        self.core.scheduler.ticks()
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    /// Current balance.
    pub fn balance(&self) -> U256 {
        self.core.ledger.balance()
    }

    /// Current level of an item.
    pub fn level(&self, tier: TierId, item: Item) -> i32 {
        self.core.book.level(tier, item)
    }

    /// Blocks sequenced on a tier.
    pub fn height(&self, tier: TierId) -> u64 {
        self.core.pipeline.lock().height(tier)
    }

    /// Copy of the current stage of a kind.
    pub fn stage(&self, tier: TierId, kind: StageKind) -> Option<Stage> {
        self.core.pipeline.lock().stage(tier, kind).cloned()
    }

    /// Last known-good state.
    pub fn checkpoint(&self) -> Checkpoint {
        self.core.checkpoint.lock().clone()
    }

    /// The session's action queue.
    pub fn queue(&self) -> &ActionQueue {
        &self.core.queue
    }

    /// The session's event bus.
    pub fn events(&self) -> Arc<InMemoryEventBus> {
        Arc::clone(&self.core.bus)
    }

    /// Subscribe to session events.
    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        self.core.bus.subscribe(filter)
    }

    /// Full status report.
    pub fn status(&self) -> SessionStatus {
        let tiers = {
            let pipeline = self.core.pipeline.lock();
            (0..self.core.book.catalog().tier_count() as u32)
                .map(TierId)
                .map(|tier| TierStatus {
                    tier,
                    unlocked: self.core.book.tier_unlocked(tier),
                    height: pipeline.height(tier),
                })
                .collect()
        };
        SessionStatus {
            balance: self.core.ledger.balance(),
            tiers,
            queue: self.core.queue.status(),
            queue_metrics: self.core.queue.metrics(),
            automation: self.core.scheduler.scheduled(),
            automation_enabled: self.core.scheduler.is_enabled(),
        }
    }

    // =========================================================================
    // LIFECYCLE
    // =========================================================================

    /// Seal buffered actions into a batch below capacity.
    pub fn flush(&self) -> Option<BatchId> {
        self.core.flush()
    }

    /// Start a fresh game: stop automation, discard the queue without
    /// reverting, reset every piece of state and checkpoint it.
    pub async fn reset(&self) {
        self.core.scheduler.stop_all();
        let (batches, buffered) = self.core.queue.clear().await;
        {
            let mut pipeline = self.core.pipeline.lock();
            self.core.ledger.reset();
            self.core.book.reset();
            pipeline.reset();
            self.core.drop_boundaries();
            self.core.store_checkpoint(&pipeline, None);
        }
        self.core.refresh_automation();
        info!(batches, buffered, "[runtime] Game reset");
    }

    /// Stop automation, flush the buffer and wait for the queue to go idle.
    pub async fn shutdown(&self) {
        self.core.scheduler.stop_all();
        self.flush();
        self.core.queue.wait_idle().await;
        info!(
            balance = %self.balance(),
            reverts = self.core.queue.revert_counter(),
            "[runtime] Session shut down"
        );
    }
}
