//! Tier catalog: level tables, genesis rewards and unlock costs.
//!
//! The catalog is static data. It is loaded once (default or JSON) and
//! shared read-only; all mutable progress lives in the level book.

use crate::domain::{AutomationId, Feature, UpgradeId};
use crate::error::{EconomyError, Result};
use serde::{Deserialize, Serialize};
use shared_types::TierId;
use std::collections::BTreeMap;

/// Values and purchase costs indexed by level.
///
/// `costs[l]` is the price of reaching level `l`. For upgrades, which start
/// at level 0, `costs[0]` is never charged.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelTable {
    /// Effect at each level
    pub values: Vec<u64>,
    /// Price of reaching each level
    pub costs: Vec<u64>,
}

impl LevelTable {
    /// Build a table from parallel slices.
    #[must_use]
    pub fn new(values: &[u64], costs: &[u64]) -> Self {
        Self {
            values: values.to_vec(),
            costs: costs.to_vec(),
        }
    }

    /// Highest reachable level.
    #[must_use]
    pub fn max_level(&self) -> i32 {
        self.values.len() as i32 - 1
    }

    /// Effect at `level`; `None` when locked or out of range.
    #[must_use]
    pub fn value_at(&self, level: i32) -> Option<u64> {
        usize::try_from(level)
            .ok()
            .and_then(|l| self.values.get(l).copied())
    }

    /// Price of reaching `level`.
    #[must_use]
    pub fn cost_to_reach(&self, level: i32) -> Option<u64> {
        usize::try_from(level)
            .ok()
            .and_then(|l| self.costs.get(l).copied())
    }
}

/// Catalog entry for one tier.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierCatalog {
    /// Display name
    pub name: String,
    /// Fixed reward of the tier's genesis block
    pub genesis_reward: u64,
    /// Upgrade tables
    pub upgrades: BTreeMap<UpgradeId, LevelTable>,
    /// Automation tables; values are units per second
    pub automations: BTreeMap<AutomationId, LevelTable>,
    /// One-off unlock costs
    pub features: BTreeMap<Feature, u64>,
}

/// Full economy catalog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EconomyConfig {
    /// Tiers in order; index equals `TierId`
    pub tiers: Vec<TierCatalog>,
}

impl EconomyConfig {
    /// Parse and validate a catalog from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| EconomyError::InvalidConfig(format!("catalog JSON: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Catalog entry for a tier.
    pub fn tier(&self, tier: TierId) -> Result<&TierCatalog> {
        self.tiers
            .get(tier.0 as usize)
            .ok_or(EconomyError::UnknownTier(tier))
    }

    /// Number of tiers.
    #[must_use]
    pub fn tier_count(&self) -> usize {
        self.tiers.len()
    }

    /// Check that every tier carries every item with consistent tables.
    pub fn validate(&self) -> Result<()> {
        if self.tiers.is_empty() {
            return Err(EconomyError::InvalidConfig("catalog has no tiers".into()));
        }

        for (index, tier) in self.tiers.iter().enumerate() {
            let label = format!("tier {} ({})", index, tier.name);
            for id in UpgradeId::ALL {
                let table = tier.upgrades.get(&id).ok_or_else(|| {
                    EconomyError::InvalidConfig(format!("{label}: missing upgrade {}", id.name()))
                })?;
                check_table(&label, id.name(), table)?;
            }
            for id in AutomationId::ALL {
                let table = tier.automations.get(&id).ok_or_else(|| {
                    EconomyError::InvalidConfig(format!(
                        "{label}: missing automation {}",
                        id.name()
                    ))
                })?;
                check_table(&label, id.name(), table)?;
            }
            for feature in Feature::ALL {
                if !tier.features.contains_key(&feature) {
                    return Err(EconomyError::InvalidConfig(format!(
                        "{label}: missing feature {}",
                        feature.name()
                    )));
                }
            }
        }
        Ok(())
    }
}

fn check_table(label: &str, item: &str, table: &LevelTable) -> Result<()> {
    if table.values.is_empty() {
        return Err(EconomyError::InvalidConfig(format!(
            "{label}: {item} has no levels"
        )));
    }
    if table.values.len() != table.costs.len() {
        return Err(EconomyError::InvalidConfig(format!(
            "{label}: {item} has {} values but {} costs",
            table.values.len(),
            table.costs.len()
        )));
    }
    Ok(())
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            tiers: vec![base_tier(), rollup_tier()],
        }
    }
}

fn base_tier() -> TierCatalog {
    let upgrades = BTreeMap::from([
        (UpgradeId::TxFee, LevelTable::new(&[1, 2, 3, 5, 8, 13], &[0, 15, 45, 120, 300, 750])),
        (UpgradeId::BlockSize, LevelTable::new(&[16, 24, 32, 48, 64], &[0, 50, 150, 400, 1_000])),
        (UpgradeId::BlockDifficulty, LevelTable::new(&[8, 6, 5, 4, 3], &[0, 40, 120, 320, 800])),
        (UpgradeId::BlockReward, LevelTable::new(&[10, 20, 40, 80, 160], &[0, 60, 180, 500, 1_400])),
        (UpgradeId::MevBoost, LevelTable::new(&[0, 5, 10, 20, 40], &[0, 80, 240, 640, 1_600])),
        (UpgradeId::DaSize, LevelTable::new(&[4, 6, 8, 12], &[0, 100, 300, 900])),
        (UpgradeId::DaReward, LevelTable::new(&[2, 4, 8, 16], &[0, 100, 300, 900])),
        (UpgradeId::ProofSize, LevelTable::new(&[4, 6, 8, 12], &[0, 120, 360, 1_000])),
        (UpgradeId::ProofReward, LevelTable::new(&[3, 6, 12, 24], &[0, 120, 360, 1_000])),
    ]);
    let automations = BTreeMap::from([
        (AutomationId::Miner, LevelTable::new(&[1, 2, 4, 8], &[25, 100, 400, 1_600])),
        (AutomationId::Sequencer, LevelTable::new(&[1, 2, 4, 8], &[50, 200, 800, 3_200])),
    ]);
    let features = BTreeMap::from([
        (Feature::Chain, 0),
        (Feature::DataAvailability, 200),
        (Feature::Proving, 500),
    ]);

    TierCatalog {
        name: "L1".into(),
        genesis_reward: 50,
        upgrades,
        automations,
        features,
    }
}

fn rollup_tier() -> TierCatalog {
    let upgrades = BTreeMap::from([
        (UpgradeId::TxFee, LevelTable::new(&[10, 20, 40, 80], &[0, 500, 1_500, 4_500])),
        (UpgradeId::BlockSize, LevelTable::new(&[32, 48, 64, 96], &[0, 800, 2_400, 7_200])),
        (UpgradeId::BlockDifficulty, LevelTable::new(&[12, 10, 8, 6], &[0, 600, 1_800, 5_400])),
        (UpgradeId::BlockReward, LevelTable::new(&[100, 200, 400, 800], &[0, 900, 2_700, 8_100])),
        (UpgradeId::MevBoost, LevelTable::new(&[0, 50, 100, 200], &[0, 1_000, 3_000, 9_000])),
        (UpgradeId::DaSize, LevelTable::new(&[8, 12, 16], &[0, 1_500, 4_500])),
        (UpgradeId::DaReward, LevelTable::new(&[20, 40, 80], &[0, 1_500, 4_500])),
        (UpgradeId::ProofSize, LevelTable::new(&[8, 12, 16], &[0, 2_000, 6_000])),
        (UpgradeId::ProofReward, LevelTable::new(&[30, 60, 120], &[0, 2_000, 6_000])),
    ]);
    let automations = BTreeMap::from([
        (AutomationId::Miner, LevelTable::new(&[2, 4, 8, 16], &[500, 2_000, 8_000, 32_000])),
        (AutomationId::Sequencer, LevelTable::new(&[2, 4, 8, 16], &[1_000, 4_000, 16_000, 64_000])),
    ]);
    let features = BTreeMap::from([
        (Feature::Chain, 5_000),
        (Feature::DataAvailability, 3_000),
        (Feature::Proving, 6_000),
    ]);

    TierCatalog {
        name: "L2".into(),
        genesis_reward: 500,
        upgrades,
        automations,
        features,
    }
}
