//! A single production stage.
//!
//! A stage collects units until it reaches its capacity, at which point it is
//! built and frozen. Capacity, difficulty and base reward are fixed when the
//! stage is constructed; later upgrades only affect the next stage.

use primitive_types::U256;
use serde::{Deserialize, Serialize};
use shared_types::{StageKind, TierId};

/// One unit of work offered to a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageUnit {
    /// Fee or per-block reward carried by the unit; zero for clicks.
    pub value: U256,
    /// Block height, for units that are sequenced blocks.
    pub block: Option<u64>,
}

impl StageUnit {
    /// A unit carrying only a value.
    #[must_use]
    pub fn valued(value: U256) -> Self {
        Self { value, block: None }
    }

    /// A sequenced block carrying its per-block reward.
    #[must_use]
    pub fn block(height: u64, reward: U256) -> Self {
        Self {
            value: reward,
            block: Some(height),
        }
    }
}

/// Result of offering a unit to a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// Stage was already built; nothing changed.
    Rejected,
    /// Unit counted; stage still open.
    Accepted,
    /// Unit counted and the stage is now built.
    Built,
}

/// Frozen construction parameters of a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageParams {
    /// Units needed to build the stage (clamped to at least 1).
    pub capacity: u64,
    /// Sequencer clicks the resulting block will need.
    pub difficulty: u64,
    /// Fixed part of the payout.
    pub base_reward: U256,
    /// Overrides `base_reward` for a genesis block.
    pub fixed_reward: Option<U256>,
}

/// A production stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    id: u64,
    kind: StageKind,
    tier: TierId,
    capacity: u64,
    difficulty: u64,
    units: u64,
    built: bool,
    fixed_reward: Option<U256>,
    base_reward: U256,
    accrued: U256,
    blocks: Vec<u64>,
}

impl Stage {
    /// Construct an empty stage.
    #[must_use]
    pub fn new(id: u64, kind: StageKind, tier: TierId, params: StageParams) -> Self {
        Self {
            id,
            kind,
            tier,
            capacity: params.capacity.max(1),
            difficulty: params.difficulty.max(1),
            units: 0,
            built: false,
            fixed_reward: params.fixed_reward,
            base_reward: params.base_reward,
            accrued: U256::zero(),
            blocks: Vec::new(),
        }
    }

    /// Offer one unit.
    pub fn add_unit(&mut self, unit: StageUnit) -> AddOutcome {
        if self.built || self.units >= self.capacity {
            return AddOutcome::Rejected;
        }

        self.units += 1;
        self.accrued = self.accrued.saturating_add(unit.value);
        if let Some(height) = unit.block {
            self.blocks.push(height);
        }

        if self.units == self.capacity {
            self.built = true;
            AddOutcome::Built
        } else {
            AddOutcome::Accepted
        }
    }

    /// Payout of the stage: fixed or base reward plus accrued value.
    #[must_use]
    pub fn reward(&self) -> U256 {
        self.fixed_reward
            .unwrap_or(self.base_reward)
            .saturating_add(self.accrued)
    }

    /// Stage identity; strictly increasing across the pipeline.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Stage kind.
    #[must_use]
    pub fn kind(&self) -> StageKind {
        self.kind
    }

    /// Owning tier.
    #[must_use]
    pub fn tier(&self) -> TierId {
        self.tier
    }

    /// Units needed to build.
    #[must_use]
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Frozen difficulty.
    #[must_use]
    pub fn difficulty(&self) -> u64 {
        self.difficulty
    }

    /// Units accepted so far.
    #[must_use]
    pub fn units(&self) -> u64 {
        self.units
    }

    /// True once `units == capacity`.
    #[must_use]
    pub fn is_built(&self) -> bool {
        self.built
    }

    /// True for a genesis block.
    #[must_use]
    pub fn is_genesis(&self) -> bool {
        self.fixed_reward.is_some()
    }

    /// Accumulated fees or per-block rewards.
    #[must_use]
    pub fn accrued(&self) -> U256 {
        self.accrued
    }

    /// Block heights consumed, for DA and Proving stages.
    #[must_use]
    pub fn blocks(&self) -> &[u64] {
        &self.blocks
    }
}
