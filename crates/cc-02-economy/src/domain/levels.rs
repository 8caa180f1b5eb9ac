//! Upgrade/automation level book.
//!
//! Levels are stored sparsely: an absent entry means the item is still at
//! its [`Item::initial_level`]. Derived game values (stage capacity, rewards,
//! automation rates) are computed from the book on every call and never
//! cached, so a purchase takes effect at the next stage construction.

use super::items::{AutomationId, Feature, Item, Purchase, UpgradeId};
use super::ledger::EconomyLedger;
use crate::config::{EconomyConfig, LevelTable};
use crate::error::{EconomyError, Result};
use parking_lot::RwLock;
use primitive_types::U256;
use shared_types::{StageKind, TierId};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Captured levels for checkpoint/restore.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LevelSnapshot(HashMap<(TierId, Item), i32>);

/// Per-tier, per-item levels backed by the catalog.
#[derive(Debug)]
pub struct UpgradeBook {
    catalog: Arc<EconomyConfig>,
    levels: RwLock<HashMap<(TierId, Item), i32>>,
}

impl UpgradeBook {
    /// Fresh book: every item at its initial level.
    #[must_use]
    pub fn new(catalog: Arc<EconomyConfig>) -> Self {
        Self {
            catalog,
            levels: RwLock::new(HashMap::new()),
        }
    }

    /// The catalog backing this book.
    #[must_use]
    pub fn catalog(&self) -> &EconomyConfig {
        &self.catalog
    }

    /// Current level of an item.
    #[must_use]
    pub fn level(&self, tier: TierId, item: Item) -> i32 {
        self.levels
            .read()
            .get(&(tier, item))
            .copied()
            .unwrap_or_else(|| item.initial_level(tier))
    }

    /// True when a feature is unlocked on a tier.
    #[must_use]
    pub fn is_unlocked(&self, tier: TierId, feature: Feature) -> bool {
        tier.0 < self.catalog.tier_count() as u32
            && self.level(tier, Item::Feature(feature)) >= 0
    }

    /// True when the tier's chain is unlocked.
    #[must_use]
    pub fn tier_unlocked(&self, tier: TierId) -> bool {
        self.is_unlocked(tier, Feature::Chain)
    }

    fn table(&self, tier: TierId, item: Item) -> Result<&LevelTable> {
        let entry = self.catalog.tier(tier)?;
        let table = match item {
            Item::Upgrade(id) => entry.upgrades.get(&id),
            Item::Automation(id) => entry.automations.get(&id),
            Item::Feature(_) => None,
        };
        table.ok_or(EconomyError::UnknownItem { tier, item })
    }

    /// Effect of an upgrade at its current level.
    ///
    /// Unknown tiers and items read as zero.
    #[must_use]
    pub fn value(&self, tier: TierId, upgrade: UpgradeId) -> u64 {
        let item = Item::Upgrade(upgrade);
        self.table(tier, item)
            .ok()
            .and_then(|t| t.value_at(self.level(tier, item)))
            .unwrap_or(0)
    }

    /// Units per second of an automation; zero while locked.
    #[must_use]
    pub fn automation_rate(&self, tier: TierId, automation: AutomationId) -> u32 {
        let item = Item::Automation(automation);
        self.table(tier, item)
            .ok()
            .and_then(|t| t.value_at(self.level(tier, item)))
            .map_or(0, |rate| u32::try_from(rate).unwrap_or(u32::MAX))
    }

    /// Price of the next level, or why there is none.
    pub fn cost_of_next(&self, tier: TierId, item: Item) -> Result<U256> {
        self.next_cost(&self.levels.read(), tier, item)
    }

    /// Buy the next level of an item, paying from `ledger`.
    ///
    /// Affordability check, debit and level bump happen under the book's
    /// write lock; on any error nothing changes.
    pub fn purchase(&self, tier: TierId, item: Item, ledger: &EconomyLedger) -> Result<Purchase> {
        self.check_prerequisites(tier, item)?;

        let mut levels = self.levels.write();
        let cost = self.next_cost(&levels, tier, item)?;
        ledger.debit(cost)?;

        let level = current_level(&levels, tier, item) + 1;
        levels.insert((tier, item), level);
        drop(levels);

        info!(tier = %tier, item = %item, level, %cost, "[cc-02] Purchase completed");
        Ok(Purchase {
            tier,
            item,
            level,
            cost,
        })
    }

    fn check_prerequisites(&self, tier: TierId, item: Item) -> Result<()> {
        self.catalog.tier(tier)?;
        match item {
            Item::Feature(Feature::Chain) => {
                if tier != TierId::BASE && !self.tier_unlocked(TierId(tier.0 - 1)) {
                    return Err(EconomyError::TierLocked(TierId(tier.0 - 1)));
                }
            }
            _ => {
                if !self.tier_unlocked(tier) {
                    return Err(EconomyError::TierLocked(tier));
                }
            }
        }
        Ok(())
    }

    fn next_cost(
        &self,
        levels: &HashMap<(TierId, Item), i32>,
        tier: TierId,
        item: Item,
    ) -> Result<U256> {
        let level = current_level(levels, tier, item);
        let cost = match item {
            Item::Feature(feature) => {
                if level >= 0 {
                    return Err(EconomyError::MaxLevel { tier, item, level });
                }
                self.catalog
                    .tier(tier)?
                    .features
                    .get(&feature)
                    .copied()
                    .ok_or(EconomyError::UnknownItem { tier, item })?
            }
            Item::Upgrade(_) | Item::Automation(_) => {
                let table = self.table(tier, item)?;
                table
                    .cost_to_reach(level + 1)
                    .filter(|_| level < table.max_level())
                    .ok_or(EconomyError::MaxLevel { tier, item, level })?
            }
        };
        Ok(U256::from(cost))
    }

    /// Capture every level.
    #[must_use]
    pub fn snapshot(&self) -> LevelSnapshot {
        LevelSnapshot(self.levels.read().clone())
    }

    /// Replace every level with a snapshot.
    pub fn restore(&self, snapshot: &LevelSnapshot) {
        *self.levels.write() = snapshot.0.clone();
        debug!(entries = snapshot.0.len(), "[cc-02] Levels restored");
    }

    /// Back to initial levels.
    pub fn reset(&self) {
        self.levels.write().clear();
    }

    // =========================================================================
    // DERIVED LOOKUPS
    // =========================================================================

    /// Units a freshly built stage of `kind` holds.
    #[must_use]
    pub fn capacity_for(&self, tier: TierId, kind: StageKind) -> u64 {
        let upgrade = match kind {
            StageKind::Mining => UpgradeId::BlockSize,
            StageKind::Sequencing => UpgradeId::BlockDifficulty,
            StageKind::DataAvailability => UpgradeId::DaSize,
            StageKind::Proving => UpgradeId::ProofSize,
        };
        self.value(tier, upgrade)
    }

    /// Sequencer clicks the next block will need.
    #[must_use]
    pub fn difficulty_for(&self, tier: TierId) -> u64 {
        self.value(tier, UpgradeId::BlockDifficulty)
    }

    /// Fixed part of a stage's payout.
    #[must_use]
    pub fn base_reward_for(&self, tier: TierId, kind: StageKind) -> U256 {
        let value = match kind {
            StageKind::Mining => self.value(tier, UpgradeId::BlockReward),
            StageKind::Sequencing => self.value(tier, UpgradeId::MevBoost),
            StageKind::DataAvailability | StageKind::Proving => 0,
        };
        U256::from(value)
    }

    /// Reward each handed-off block adds to a DA or Proving stage.
    #[must_use]
    pub fn per_block_reward(&self, tier: TierId, kind: StageKind) -> U256 {
        let value = match kind {
            StageKind::DataAvailability => self.value(tier, UpgradeId::DaReward),
            StageKind::Proving => self.value(tier, UpgradeId::ProofReward),
            StageKind::Mining | StageKind::Sequencing => 0,
        };
        U256::from(value)
    }

    /// Fee a manual or automated transaction carries.
    #[must_use]
    pub fn tx_fee(&self, tier: TierId) -> U256 {
        U256::from(self.value(tier, UpgradeId::TxFee))
    }

    /// Fixed reward of the tier's genesis block.
    #[must_use]
    pub fn genesis_reward(&self, tier: TierId) -> U256 {
        self.catalog
            .tier(tier)
            .map_or(U256::zero(), |t| U256::from(t.genesis_reward))
    }
}

fn current_level(levels: &HashMap<(TierId, Item), i32>, tier: TierId, item: Item) -> i32 {
    levels
        .get(&(tier, item))
        .copied()
        .unwrap_or_else(|| item.initial_level(tier))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::LOCKED_LEVEL;

    fn book() -> UpgradeBook {
        UpgradeBook::new(Arc::new(EconomyConfig::default()))
    }

    fn rich(amount: u64) -> EconomyLedger {
        EconomyLedger::with_balance(U256::from(amount))
    }

    #[test]
    fn test_initial_derived_values() {
        let book = book();
        assert_eq!(book.capacity_for(TierId(0), StageKind::Mining), 16);
        assert_eq!(book.difficulty_for(TierId(0)), 8);
        assert_eq!(book.tx_fee(TierId(0)), U256::from(1));
        assert_eq!(book.genesis_reward(TierId(0)), U256::from(50));
        assert_eq!(book.base_reward_for(TierId(0), StageKind::Proving), U256::zero());
        assert_eq!(book.automation_rate(TierId(0), AutomationId::Miner), 0);
        assert!(book.tier_unlocked(TierId(0)));
        assert!(!book.tier_unlocked(TierId(1)));
        assert!(!book.tier_unlocked(TierId(9)));
    }

    #[test]
    fn test_upgrade_purchase_debits_and_bumps() {
        let book = book();
        let ledger = rich(60);
        let item = Item::Upgrade(UpgradeId::BlockSize);

        let purchase = book.purchase(TierId(0), item, &ledger).unwrap();
        assert_eq!(purchase.level, 1);
        assert_eq!(purchase.cost, U256::from(50));
        assert_eq!(ledger.balance(), U256::from(10));
        assert_eq!(book.capacity_for(TierId(0), StageKind::Mining), 24);
    }

    #[test]
    fn test_insufficient_funds_changes_nothing() {
        let book = book();
        let ledger = rich(49);
        let item = Item::Upgrade(UpgradeId::BlockSize);

        assert!(matches!(
            book.purchase(TierId(0), item, &ledger),
            Err(EconomyError::InsufficientFunds { .. })
        ));
        assert_eq!(book.level(TierId(0), item), 0);
        assert_eq!(ledger.balance(), U256::from(49));
    }

    #[test]
    fn test_automation_unlock_sets_rate() {
        let book = book();
        let ledger = rich(1_000);
        let item = Item::Automation(AutomationId::Miner);

        assert_eq!(book.cost_of_next(TierId(0), item).unwrap(), U256::from(25));
        book.purchase(TierId(0), item, &ledger).unwrap();
        assert_eq!(book.automation_rate(TierId(0), AutomationId::Miner), 1);
        book.purchase(TierId(0), item, &ledger).unwrap();
        assert_eq!(book.automation_rate(TierId(0), AutomationId::Miner), 2);
    }

    #[test]
    fn test_max_level() {
        let book = book();
        let ledger = rich(100_000);
        let item = Item::Upgrade(UpgradeId::DaSize);
        for _ in 0..3 {
            book.purchase(TierId(0), item, &ledger).unwrap();
        }
        assert!(matches!(
            book.purchase(TierId(0), item, &ledger),
            Err(EconomyError::MaxLevel { level: 3, .. })
        ));
    }

    #[test]
    fn test_tier_gating() {
        let book = book();
        let ledger = rich(100_000);

        assert_eq!(
            book.purchase(TierId(1), Item::Upgrade(UpgradeId::TxFee), &ledger),
            Err(EconomyError::TierLocked(TierId(1)))
        );

        book.purchase(TierId(1), Item::Feature(Feature::Chain), &ledger)
            .unwrap();
        assert!(book.tier_unlocked(TierId(1)));
        assert_eq!(
            book.purchase(TierId(1), Item::Feature(Feature::Chain), &ledger),
            Err(EconomyError::MaxLevel {
                tier: TierId(1),
                item: Item::Feature(Feature::Chain),
                level: 0,
            })
        );
        assert_eq!(
            book.purchase(TierId(2), Item::Feature(Feature::Chain), &ledger),
            Err(EconomyError::UnknownTier(TierId(2)))
        );
    }

    #[test]
    fn test_snapshot_restore() {
        let book = book();
        let ledger = rich(1_000);
        let checkpoint = book.snapshot();

        book.purchase(TierId(0), Item::Feature(Feature::Proving), &ledger)
            .unwrap();
        assert!(book.is_unlocked(TierId(0), Feature::Proving));

        book.restore(&checkpoint);
        assert!(!book.is_unlocked(TierId(0), Feature::Proving));

        book.purchase(TierId(0), Item::Upgrade(UpgradeId::TxFee), &ledger)
            .unwrap();
        book.reset();
        assert_eq!(book.level(TierId(0), Item::Upgrade(UpgradeId::TxFee)), 0);
    }

    #[test]
    fn test_locked_level_constant() {
        assert_eq!(
            book().level(TierId(0), Item::Automation(AutomationId::Sequencer)),
            LOCKED_LEVEL
        );
    }
}
