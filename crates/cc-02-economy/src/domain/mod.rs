//! Domain layer: balance, purchasable items and the level book.

mod items;
mod ledger;
mod levels;

pub use items::{AutomationId, Feature, Item, Purchase, UpgradeId, LOCKED_LEVEL};
pub use ledger::{credit, debit, EconomyLedger};
pub use levels::{LevelSnapshot, UpgradeBook};
