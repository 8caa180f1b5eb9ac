//! Purchasable items and their ledger encoding.

use primitive_types::U256;
use serde::{Deserialize, Serialize};
use shared_types::{Action, ContractAddress, Entrypoint, StageKind, TierId};
use std::fmt;

/// Level of an item that has not been bought yet.
pub const LOCKED_LEVEL: i32 = -1;

/// Per-tier upgrades. Every upgrade starts at level 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpgradeId {
    /// Fee carried by each manual or automated transaction.
    TxFee,
    /// Transactions per block.
    BlockSize,
    /// Sequencer clicks needed to seal a block.
    BlockDifficulty,
    /// Base reward of a mined block.
    BlockReward,
    /// Reward paid when sequencing completes.
    MevBoost,
    /// Blocks per data-availability batch.
    DaSize,
    /// Reward per block stored for data availability.
    DaReward,
    /// Blocks per proof.
    ProofSize,
    /// Reward per block proven.
    ProofReward,
}

impl UpgradeId {
    /// Every upgrade, in ledger code order.
    pub const ALL: [UpgradeId; 9] = [
        UpgradeId::TxFee,
        UpgradeId::BlockSize,
        UpgradeId::BlockDifficulty,
        UpgradeId::BlockReward,
        UpgradeId::MevBoost,
        UpgradeId::DaSize,
        UpgradeId::DaReward,
        UpgradeId::ProofSize,
        UpgradeId::ProofReward,
    ];

    /// Snake-case name used in labels and config files.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            UpgradeId::TxFee => "tx_fee",
            UpgradeId::BlockSize => "block_size",
            UpgradeId::BlockDifficulty => "block_difficulty",
            UpgradeId::BlockReward => "block_reward",
            UpgradeId::MevBoost => "mev_boost",
            UpgradeId::DaSize => "da_size",
            UpgradeId::DaReward => "da_reward",
            UpgradeId::ProofSize => "proof_size",
            UpgradeId::ProofReward => "proof_reward",
        }
    }
}

/// Per-tier automations. Locked until bought.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutomationId {
    /// Submits transactions to the Mining stage.
    Miner,
    /// Clicks the Sequencing stage.
    Sequencer,
}

impl AutomationId {
    /// Every automation, in ledger code order.
    pub const ALL: [AutomationId; 2] = [AutomationId::Miner, AutomationId::Sequencer];

    /// Stage this automation drives.
    #[must_use]
    pub fn stage(self) -> StageKind {
        match self {
            AutomationId::Miner => StageKind::Mining,
            AutomationId::Sequencer => StageKind::Sequencing,
        }
    }

    /// Automation that drives a stage, if any.
    #[must_use]
    pub fn for_stage(kind: StageKind) -> Option<Self> {
        match kind {
            StageKind::Mining => Some(AutomationId::Miner),
            StageKind::Sequencing => Some(AutomationId::Sequencer),
            StageKind::DataAvailability | StageKind::Proving => None,
        }
    }

    /// Snake-case name used in labels and config files.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            AutomationId::Miner => "miner",
            AutomationId::Sequencer => "sequencer",
        }
    }
}

/// Per-tier features, unlocked once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    /// The tier itself.
    Chain,
    /// Data-availability stage.
    DataAvailability,
    /// Proving stage.
    Proving,
}

impl Feature {
    /// Every feature, in ledger code order.
    pub const ALL: [Feature; 3] = [Feature::Chain, Feature::DataAvailability, Feature::Proving];

    /// Feature gating a stage; Mining and Sequencing are gated by `Chain`.
    #[must_use]
    pub fn for_stage(kind: StageKind) -> Self {
        match kind {
            StageKind::Mining | StageKind::Sequencing => Feature::Chain,
            StageKind::DataAvailability => Feature::DataAvailability,
            StageKind::Proving => Feature::Proving,
        }
    }

    /// Snake-case name used in labels and config files.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Feature::Chain => "chain",
            Feature::DataAvailability => "data_availability",
            Feature::Proving => "proving",
        }
    }
}

/// Anything the level book tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Item {
    /// An upgrade.
    Upgrade(UpgradeId),
    /// An automation.
    Automation(AutomationId),
    /// A feature.
    Feature(Feature),
}

impl Item {
    /// Level an item has before any purchase.
    #[must_use]
    pub fn initial_level(self, tier: TierId) -> i32 {
        match self {
            Item::Upgrade(_) => 0,
            Item::Feature(Feature::Chain) if tier == TierId::BASE => 0,
            Item::Automation(_) | Item::Feature(_) => LOCKED_LEVEL,
        }
    }

    /// Ledger code of the item, its index within its kind.
    #[must_use]
    pub fn code(self) -> u32 {
        let index = match self {
            Item::Upgrade(id) => UpgradeId::ALL.iter().position(|u| *u == id),
            Item::Automation(id) => AutomationId::ALL.iter().position(|a| *a == id),
            Item::Feature(f) => Feature::ALL.iter().position(|x| *x == f),
        };
        index.unwrap_or_default() as u32
    }

    /// Entrypoint that records a purchase of this item.
    #[must_use]
    pub fn entrypoint(self) -> Entrypoint {
        match self {
            Item::Upgrade(_) => Entrypoint::BuyUpgrade,
            Item::Automation(_) => Entrypoint::BuyAutomation,
            Item::Feature(_) => Entrypoint::UnlockFeature,
        }
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Item::Upgrade(id) => write!(f, "upgrade:{}", id.name()),
            Item::Automation(id) => write!(f, "automation:{}", id.name()),
            Item::Feature(feature) => write!(f, "feature:{}", feature.name()),
        }
    }
}

/// A completed purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Purchase {
    /// Tier the item belongs to.
    pub tier: TierId,
    /// Item bought.
    pub item: Item,
    /// Level after the purchase.
    pub level: i32,
    /// Amount debited.
    pub cost: U256,
}

impl Purchase {
    /// Ledger action recording this purchase: `[tier, item_code]`.
    #[must_use]
    pub fn action(&self, target: ContractAddress) -> Action {
        Action::for_tier(
            target,
            self.item.entrypoint(),
            self.tier,
            vec![U256::from(self.item.code())],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_levels() {
        assert_eq!(Item::Upgrade(UpgradeId::BlockSize).initial_level(TierId(1)), 0);
        assert_eq!(Item::Automation(AutomationId::Miner).initial_level(TierId(0)), -1);
        assert_eq!(Item::Feature(Feature::Chain).initial_level(TierId(0)), 0);
        assert_eq!(Item::Feature(Feature::Chain).initial_level(TierId(1)), -1);
        assert_eq!(Item::Feature(Feature::Proving).initial_level(TierId(0)), -1);
    }

    #[test]
    fn test_codes_follow_declaration_order() {
        assert_eq!(Item::Upgrade(UpgradeId::TxFee).code(), 0);
        assert_eq!(Item::Upgrade(UpgradeId::ProofReward).code(), 8);
        assert_eq!(Item::Automation(AutomationId::Sequencer).code(), 1);
        assert_eq!(Item::Feature(Feature::Proving).code(), 2);
    }

    #[test]
    fn test_purchase_action_encoding() {
        let purchase = Purchase {
            tier: TierId(1),
            item: Item::Upgrade(UpgradeId::BlockSize),
            level: 1,
            cost: U256::from(50),
        };
        let action = purchase.action(ContractAddress::new("0x0game"));

        assert_eq!(action.entrypoint, Entrypoint::BuyUpgrade);
        assert_eq!(action.calldata, vec![U256::from(1), U256::from(1)]);
    }

    #[test]
    fn test_item_labels() {
        assert_eq!(Item::Upgrade(UpgradeId::MevBoost).to_string(), "upgrade:mev_boost");
        assert_eq!(
            Item::Feature(Feature::DataAvailability).to_string(),
            "feature:data_availability"
        );
        assert_eq!(AutomationId::for_stage(StageKind::Proving), None);
        assert_eq!(AutomationId::Sequencer.stage(), StageKind::Sequencing);
    }
}
