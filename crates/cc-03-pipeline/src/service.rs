//! Production pipeline service.
//!
//! ```text
//!   tx ──► Mining ──built──► Sequencing ──built──► height += 1
//!           │ add_transaction     │ mine_block         │
//!           │                     │                    ├──► DataAvailability ──► store_da
//!           ▼                     ▼                    └──► Proving          ──► prove_batch
//!        credit(base + fees)   credit(mev)                  credit(sum of per-block rewards)
//! ```
//!
//! Every built transition credits exactly one reward and pushes at most one
//! completion action, inside the same `add_unit` call.

use crate::domain::{AddOutcome, Stage, StageParams, StageUnit, TierState};
use crate::error::{PipelineError, Result};
use crate::metrics::PipelineMetrics;
use cc_02_economy::{EconomyLedger, Feature, UpgradeBook};
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use shared_types::{Action, ActionSink, ContractAddress, Entrypoint, StageKind, TierId};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, trace};

/// A unit of input to the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    /// A transaction for the Mining stage.
    Transaction {
        /// Fee the transaction pays.
        fee: U256,
    },
    /// A confirmation click for the Sequencing stage.
    Click,
}

/// A stage that was built during an `add_unit` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageCompletion {
    /// Tier of the stage.
    pub tier: TierId,
    /// Kind of the stage.
    pub kind: StageKind,
    /// Identity of the stage.
    pub stage_id: u64,
    /// Reward credited.
    pub reward: U256,
}

/// What an `add_unit` call did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitOutcome {
    /// The target stage was built, full, or absent. Nothing changed.
    Rejected,
    /// The unit was counted.
    Accepted,
    /// The unit was counted and one or more stages were built.
    Completed(Vec<StageCompletion>),
}

impl UnitOutcome {
    /// Completions carried by this outcome.
    #[must_use]
    pub fn completions(&self) -> &[StageCompletion] {
        match self {
            UnitOutcome::Completed(done) => done,
            UnitOutcome::Rejected | UnitOutcome::Accepted => &[],
        }
    }
}

/// Captured pipeline state for checkpoint/restore.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineSnapshot {
    tiers: BTreeMap<TierId, TierState>,
}

/// Owner of every tier's stages.
pub struct ProductionPipeline {
    ledger: Arc<EconomyLedger>,
    book: Arc<UpgradeBook>,
    target: ContractAddress,
    tiers: BTreeMap<TierId, TierState>,
    next_stage_id: u64,
    metrics: Arc<PipelineMetrics>,
}

impl ProductionPipeline {
    /// Create a pipeline reading levels from `book` and crediting `ledger`.
    ///
    /// Emitted actions are addressed to `target`.
    #[must_use]
    pub fn new(ledger: Arc<EconomyLedger>, book: Arc<UpgradeBook>, target: ContractAddress) -> Self {
        Self {
            ledger,
            book,
            target,
            tiers: BTreeMap::new(),
            next_stage_id: 1,
            metrics: Arc::new(PipelineMetrics::new()),
        }
    }

    /// Shared metrics handle.
    #[must_use]
    pub fn metrics(&self) -> Arc<PipelineMetrics> {
        Arc::clone(&self.metrics)
    }

    // =========================================================================
    // INPUT
    // =========================================================================

    /// Offer one unit to a tier.
    pub fn add_unit(
        &mut self,
        tier: TierId,
        unit: Unit,
        sink: &mut dyn ActionSink,
    ) -> Result<UnitOutcome> {
        self.ensure_tier(tier)?;

        let outcome = match unit {
            Unit::Transaction { fee } => self.add_transaction(tier, fee, sink),
            Unit::Click => self.add_click(tier, sink),
        };

        match &outcome {
            UnitOutcome::Rejected => self.metrics.record_rejected(),
            UnitOutcome::Accepted => self.metrics.record_accepted(),
            UnitOutcome::Completed(done) => {
                self.metrics.record_accepted();
                self.metrics.record_completions(done.len() as u64);
            }
        }
        Ok(outcome)
    }

    /// Offer the unit a manual tap on `kind` produces.
    pub fn tap(
        &mut self,
        tier: TierId,
        kind: StageKind,
        sink: &mut dyn ActionSink,
    ) -> Result<UnitOutcome> {
        let unit = match kind {
            StageKind::Mining => Unit::Transaction {
                fee: self.book.tx_fee(tier),
            },
            StageKind::Sequencing => Unit::Click,
            StageKind::DataAvailability | StageKind::Proving => {
                return Err(PipelineError::NotTappable(kind))
            }
        };
        self.add_unit(tier, unit, sink)
    }

    /// Whether a tap on `kind` would currently be accepted.
    #[must_use]
    pub fn is_ready(&self, tier: TierId, kind: StageKind) -> bool {
        if !self.book.tier_unlocked(tier) {
            return false;
        }
        let state = self.tiers.get(&tier);
        match kind {
            StageKind::Mining => state.map_or(true, |s| !s.mining.is_built()),
            StageKind::Sequencing => state.map_or(false, |s| s.mining.is_built()),
            StageKind::DataAvailability | StageKind::Proving => false,
        }
    }

    fn add_transaction(&mut self, tier: TierId, fee: U256, sink: &mut dyn ActionSink) -> UnitOutcome {
        let Some(state) = self.tiers.get_mut(&tier) else {
            return UnitOutcome::Rejected;
        };

        let added = state.mining.add_unit(StageUnit::valued(fee));
        if added == AddOutcome::Rejected {
            trace!(tier = %tier, "[cc-03] Transaction rejected: block already built");
            return UnitOutcome::Rejected;
        }

        sink.push_action(Action::for_tier(
            self.target.clone(),
            Entrypoint::AddTransaction,
            tier,
            vec![fee],
        ));

        if added == AddOutcome::Accepted {
            return UnitOutcome::Accepted;
        }

        let mining = state.mining.clone();
        let reward = mining.reward();
        self.ledger.credit(reward);

        let sequencing = self.build_stage(
            tier,
            StageKind::Sequencing,
            StageParams {
                capacity: mining.difficulty(),
                difficulty: mining.difficulty(),
                base_reward: self.book.base_reward_for(tier, StageKind::Sequencing),
                fixed_reward: None,
            },
        );
        if let Some(state) = self.tiers.get_mut(&tier) {
            state.sequencing = Some(sequencing);
        }

        debug!(
            tier = %tier,
            stage_id = mining.id(),
            %reward,
            genesis = mining.is_genesis(),
            "[cc-03] Block built"
        );
        UnitOutcome::Completed(vec![StageCompletion {
            tier,
            kind: StageKind::Mining,
            stage_id: mining.id(),
            reward,
        }])
    }

    fn add_click(&mut self, tier: TierId, sink: &mut dyn ActionSink) -> UnitOutcome {
        let Some(state) = self.tiers.get_mut(&tier) else {
            return UnitOutcome::Rejected;
        };
        let Some(sequencing) = state.sequencing.as_mut() else {
            trace!(tier = %tier, "[cc-03] Click rejected: no block to sequence");
            return UnitOutcome::Rejected;
        };

        match sequencing.add_unit(StageUnit::valued(U256::zero())) {
            AddOutcome::Rejected => return UnitOutcome::Rejected,
            AddOutcome::Accepted => return UnitOutcome::Accepted,
            AddOutcome::Built => {}
        }

        let stage_id = sequencing.id();
        let reward = sequencing.reward();
        let block = state.height;
        state.height += 1;
        state.sequencing = None;

        self.ledger.credit(reward);
        sink.push_action(Action::for_tier(
            self.target.clone(),
            Entrypoint::MineBlock,
            tier,
            vec![],
        ));

        let fresh = self.mining_stage(tier, None);
        if let Some(state) = self.tiers.get_mut(&tier) {
            state.mining = fresh;
        }

        info!(tier = %tier, height = block + 1, %reward, "[cc-03] Block sequenced");

        let mut completions = vec![StageCompletion {
            tier,
            kind: StageKind::Sequencing,
            stage_id,
            reward,
        }];
        for kind in [StageKind::DataAvailability, StageKind::Proving] {
            if let Some(done) = self.hand_off(tier, kind, block, sink) {
                completions.push(done);
            }
        }
        UnitOutcome::Completed(completions)
    }

    /// Feed a sequenced block to an aggregator stage (DA or Proving).
    fn hand_off(
        &mut self,
        tier: TierId,
        kind: StageKind,
        block: u64,
        sink: &mut dyn ActionSink,
    ) -> Option<StageCompletion> {
        if !self.book.is_unlocked(tier, Feature::for_stage(kind)) {
            trace!(tier = %tier, stage = %kind, block, "[cc-03] Hand-off dropped: feature locked");
            return None;
        }

        let per_block = self.book.per_block_reward(tier, kind);
        if self.tiers.get(&tier)?.stage(kind).is_none() {
            let fresh = self.aggregator_stage(tier, kind);
            *self.tiers.get_mut(&tier)?.aggregator_mut(kind)? = Some(fresh);
        }

        let slot = self.tiers.get_mut(&tier)?.aggregator_mut(kind)?;
        let stage = slot.as_mut()?;
        if stage.add_unit(StageUnit::block(block, per_block)) != AddOutcome::Built {
            return None;
        }

        let completion = StageCompletion {
            tier,
            kind,
            stage_id: stage.id(),
            reward: stage.reward(),
        };
        let consumed = stage.blocks().len();
        *slot = None;

        self.ledger.credit(completion.reward);
        let entrypoint = match kind {
            StageKind::DataAvailability => Entrypoint::StoreDa,
            _ => Entrypoint::ProveBatch,
        };
        sink.push_action(Action::for_tier(self.target.clone(), entrypoint, tier, vec![]));

        let replacement = self.aggregator_stage(tier, kind);
        if let Some(slot) = self.tiers.get_mut(&tier).and_then(|s| s.aggregator_mut(kind)) {
            *slot = Some(replacement);
        }

        info!(
            tier = %tier,
            stage = %kind,
            blocks = consumed,
            reward = %completion.reward,
            "[cc-03] Aggregation complete"
        );
        Some(completion)
    }

    // =========================================================================
    // CONSTRUCTION
    // =========================================================================

    fn ensure_tier(&mut self, tier: TierId) -> Result<()> {
        if !self.book.tier_unlocked(tier) {
            return Err(PipelineError::TierLocked(tier));
        }
        if !self.tiers.contains_key(&tier) {
            let genesis = self.mining_stage(tier, Some(self.book.genesis_reward(tier)));
            self.tiers.insert(tier, TierState::new(tier, genesis));
            debug!(tier = %tier, "[cc-03] Tier initialized with genesis block");
        }
        Ok(())
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_stage_id;
        self.next_stage_id += 1;
        id
    }

    fn build_stage(&mut self, tier: TierId, kind: StageKind, params: StageParams) -> Stage {
        let id = self.next_id();
        Stage::new(id, kind, tier, params)
    }

    fn mining_stage(&mut self, tier: TierId, fixed_reward: Option<U256>) -> Stage {
        let params = StageParams {
            capacity: self.book.capacity_for(tier, StageKind::Mining),
            difficulty: self.book.difficulty_for(tier),
            base_reward: self.book.base_reward_for(tier, StageKind::Mining),
            fixed_reward,
        };
        self.build_stage(tier, StageKind::Mining, params)
    }

    fn aggregator_stage(&mut self, tier: TierId, kind: StageKind) -> Stage {
        let params = StageParams {
            capacity: self.book.capacity_for(tier, kind),
            difficulty: 1,
            base_reward: self.book.base_reward_for(tier, kind),
            fixed_reward: None,
        };
        self.build_stage(tier, kind, params)
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    /// State of a tier, once it has been touched.
    #[must_use]
    pub fn tier_state(&self, tier: TierId) -> Option<&TierState> {
        self.tiers.get(&tier)
    }

    /// Current stage of a kind on a tier.
    #[must_use]
    pub fn stage(&self, tier: TierId, kind: StageKind) -> Option<&Stage> {
        self.tiers.get(&tier).and_then(|s| s.stage(kind))
    }

    /// Blocks sequenced on a tier.
    #[must_use]
    pub fn height(&self, tier: TierId) -> u64 {
        self.tiers.get(&tier).map_or(0, TierState::height)
    }

    /// Contract address emitted actions carry.
    #[must_use]
    pub fn target(&self) -> &ContractAddress {
        &self.target
    }

    // =========================================================================
    // CHECKPOINTING
    // =========================================================================

    /// Capture every tier.
    #[must_use]
    pub fn snapshot(&self) -> PipelineSnapshot {
        PipelineSnapshot {
            tiers: self.tiers.clone(),
        }
    }

    /// Replace every tier with a snapshot. The stage id counter keeps
    /// counting, so stages built after a restore still get fresh ids.
    pub fn restore(&mut self, snapshot: &PipelineSnapshot) {
        self.tiers = snapshot.tiers.clone();
        debug!(tiers = self.tiers.len(), "[cc-03] Pipeline restored");
    }

    /// Drop all tiers; each is rebuilt with a genesis block on next use.
    pub fn reset(&mut self) {
        self.tiers.clear();
    }
}
