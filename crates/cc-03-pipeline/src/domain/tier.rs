//! Per-tier pipeline state.

use super::stage::Stage;
use serde::{Deserialize, Serialize};
use shared_types::{StageKind, TierId};

/// Stages and block height of one tier.
///
/// Sequencing exists only while the Mining block is built. DA and Proving
/// are created on first hand-off once their feature is unlocked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierState {
    pub(crate) tier: TierId,
    pub(crate) height: u64,
    pub(crate) mining: Stage,
    pub(crate) sequencing: Option<Stage>,
    pub(crate) data_availability: Option<Stage>,
    pub(crate) proving: Option<Stage>,
}

impl TierState {
    pub(crate) fn new(tier: TierId, genesis: Stage) -> Self {
        Self {
            tier,
            height: 0,
            mining: genesis,
            sequencing: None,
            data_availability: None,
            proving: None,
        }
    }

    /// Tier id.
    #[must_use]
    pub fn tier(&self) -> TierId {
        self.tier
    }

    /// Blocks sequenced so far.
    #[must_use]
    pub fn height(&self) -> u64 {
        self.height
    }

    /// Current stage of a kind, if it exists.
    #[must_use]
    pub fn stage(&self, kind: StageKind) -> Option<&Stage> {
        match kind {
            StageKind::Mining => Some(&self.mining),
            StageKind::Sequencing => self.sequencing.as_ref(),
            StageKind::DataAvailability => self.data_availability.as_ref(),
            StageKind::Proving => self.proving.as_ref(),
        }
    }

    pub(crate) fn aggregator_mut(&mut self, kind: StageKind) -> Option<&mut Option<Stage>> {
        match kind {
            StageKind::DataAvailability => Some(&mut self.data_availability),
            StageKind::Proving => Some(&mut self.proving),
            StageKind::Mining | StageKind::Sequencing => None,
        }
    }
}
