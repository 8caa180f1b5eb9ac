//! State shared by the session, its hooks and its automation driver.

use crate::error::{Result, SessionError};
use cc_02_economy::{AutomationId, EconomyLedger, Item, LevelSnapshot, Purchase, UpgradeBook};
use cc_03_pipeline::{PipelineSnapshot, ProductionPipeline, UnitOutcome};
use cc_04_action_queue::{ActionQueue, EnqueueOutcome};
use cc_05_automation::{AutomationKey, AutomationScheduler};
use parking_lot::Mutex;
use primitive_types::U256;
use shared_bus::{GameEvent, InMemoryEventBus};
use shared_types::{BatchId, StageKind, TierId};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, info};

/// Last known-good local state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkpoint {
    /// Balance.
    pub balance: U256,
    /// Item levels.
    pub levels: LevelSnapshot,
    /// Pipeline stages.
    pub pipeline: PipelineSnapshot,
    /// Batch whose confirmation produced this checkpoint; `None` for a fresh
    /// game.
    pub after: Option<BatchId>,
}

/// Stages automation can drive.
pub(crate) const AUTOMATED_STAGES: [StageKind; 2] = [StageKind::Mining, StageKind::Sequencing];

/// The pipeline mutex doubles as the session's state lock: every change to
/// ledger, levels or stages, and the enqueue that mirrors it, happens under
/// it. Lock order is pipeline, then book, then ledger, then queue.
///
/// `boundaries` holds one snapshot per sealed batch that had nothing
/// buffered behind it, oldest first. Confirming batch N promotes the newest
/// boundary at or before N to the checkpoint.
pub(crate) struct SessionCore {
    pub(crate) ledger: Arc<EconomyLedger>,
    pub(crate) book: Arc<UpgradeBook>,
    pub(crate) pipeline: Mutex<ProductionPipeline>,
    pub(crate) checkpoint: Mutex<Checkpoint>,
    pub(crate) boundaries: Mutex<VecDeque<Checkpoint>>,
    pub(crate) queue: ActionQueue,
    pub(crate) scheduler: AutomationScheduler,
    pub(crate) bus: Arc<InMemoryEventBus>,
}

impl SessionCore {
    /// Feed the unit a tap on `kind` produces; shared by manual taps and
    /// automation ticks.
    pub(crate) fn tap(&self, tier: TierId, kind: StageKind) -> Result<UnitOutcome> {
        let outcome = {
            let mut pipeline = self.pipeline.lock();
            if self.queue.is_reverting() {
                return Err(SessionError::Reverting);
            }
            let before = self.queue.sealed_tail();
            let mut sink = self.queue.clone();
            let outcome = pipeline.tap(tier, kind, &mut sink)?;
            self.record_boundary(&pipeline, before);
            outcome
        };

        for done in outcome.completions() {
            self.bus.emit(GameEvent::StageCompleted {
                tier: done.tier,
                stage: done.kind,
                stage_id: done.stage_id,
                reward: done.reward,
            });
        }
        Ok(outcome)
    }

    /// Buy the next level of an item and queue its ledger action as its own
    /// batch.
    pub(crate) fn purchase(&self, tier: TierId, item: Item) -> Result<Purchase> {
        let purchase = {
            let pipeline = self.pipeline.lock();
            if self.queue.is_reverting() {
                return Err(SessionError::Reverting);
            }
            let before = self.queue.sealed_tail();
            let purchase = self.book.purchase(tier, item, &self.ledger)?;
            let queued = self
                .queue
                .enqueue_forced(purchase.action(pipeline.target().clone()));
            if let EnqueueOutcome::Dropped(reason) = queued {
                debug!(
                    tier = %tier,
                    item = %item,
                    ?reason,
                    "[runtime] Purchase kept locally, ledger action dropped"
                );
            }
            self.record_boundary(&pipeline, before);
            purchase
        };

        self.bus.emit(GameEvent::PurchaseCompleted {
            tier,
            item: item.to_string(),
            level: purchase.level,
            cost: purchase.cost,
        });
        if let Item::Automation(id) = item {
            self.scheduler.refresh(AutomationKey::new(tier, id.stage()));
        }
        Ok(purchase)
    }

    /// Every automatable pair of the catalog.
    pub(crate) fn automation_keys(&self) -> Vec<AutomationKey> {
        let tiers = self.book.catalog().tier_count() as u32;
        (0..tiers)
            .flat_map(|tier| {
                AUTOMATED_STAGES
                    .iter()
                    .map(move |stage| AutomationKey::new(TierId(tier), *stage))
            })
            .collect()
    }

    pub(crate) fn refresh_automation(&self) {
        self.scheduler.refresh_all(self.automation_keys());
    }

    /// Automation rate of a pair; zero for stages without an automation.
    pub(crate) fn automation_rate(&self, key: AutomationKey) -> u32 {
        AutomationId::for_stage(key.stage)
            .map_or(0, |id| self.book.automation_rate(key.tier, id))
    }

    /// Store the current state as the checkpoint. Caller holds the
    /// pipeline lock.
    pub(crate) fn store_checkpoint(&self, pipeline: &ProductionPipeline, after: Option<BatchId>) {
        let checkpoint = Checkpoint {
            balance: self.ledger.snapshot(),
            levels: self.book.snapshot(),
            pipeline: pipeline.snapshot(),
            after,
        };
        debug!(balance = %checkpoint.balance, ?after, "[runtime] Checkpoint taken");
        *self.checkpoint.lock() = checkpoint;
    }

    /// Seal the buffer under the state lock so the sealed batch gets a
    /// boundary snapshot.
    pub(crate) fn flush(&self) -> Option<BatchId> {
        let pipeline = self.pipeline.lock();
        let before = self.queue.sealed_tail();
        let sealed = self.queue.flush();
        self.record_boundary(&pipeline, before);
        sealed
    }

    /// Snapshot the state if the last entry point sealed a batch and left
    /// nothing buffered. Caller holds the pipeline lock.
    fn record_boundary(&self, pipeline: &ProductionPipeline, before: Option<BatchId>) {
        let Some(tail) = self.queue.sealed_tail() else {
            return;
        };
        if before == Some(tail) {
            return;
        }
        let boundary = Checkpoint {
            balance: self.ledger.snapshot(),
            levels: self.book.snapshot(),
            pipeline: pipeline.snapshot(),
            after: Some(tail),
        };
        self.boundaries.lock().push_back(boundary);
        debug!(batch_id = %tail, "[runtime] Batch boundary recorded");
    }

    /// Move the checkpoint up to a confirmed batch.
    ///
    /// A settled queue checkpoints the current state; otherwise the newest
    /// boundary at or before `confirmed` is promoted.
    pub(crate) fn on_batch_confirmed(&self, confirmed: BatchId, settled: bool) {
        let pipeline = self.pipeline.lock();
        let promoted = {
            let mut boundaries = self.boundaries.lock();
            let mut promoted = None;
            while boundaries
                .front()
                .is_some_and(|b| b.after.is_some_and(|after| after <= confirmed))
            {
                promoted = boundaries.pop_front();
            }
            promoted
        };

        if settled && self.queue.is_settled() {
            self.store_checkpoint(&pipeline, Some(confirmed));
        } else if let Some(checkpoint) = promoted {
            debug!(
                batch_id = %confirmed,
                balance = %checkpoint.balance,
                "[runtime] Checkpoint moved to batch boundary"
            );
            *self.checkpoint.lock() = checkpoint;
        } else {
            debug!(batch_id = %confirmed, "[runtime] No boundary for confirmed batch");
        }
    }

    /// Forget boundaries of batches that will never confirm.
    pub(crate) fn drop_boundaries(&self) {
        self.boundaries.lock().clear();
    }

    /// Roll ledger, levels and pipeline back to the checkpoint.
    pub(crate) fn restore_checkpoint(&self) -> Checkpoint {
        let checkpoint = {
            let mut pipeline = self.pipeline.lock();
            let checkpoint = self.checkpoint.lock().clone();
            self.drop_boundaries();
            self.ledger.restore(checkpoint.balance);
            self.book.restore(&checkpoint.levels);
            pipeline.restore(&checkpoint.pipeline);
            checkpoint
        };
        info!(
            balance = %checkpoint.balance,
            after = ?checkpoint.after,
            "[runtime] Local state restored from checkpoint"
        );
        self.refresh_automation();
        checkpoint
    }
}
