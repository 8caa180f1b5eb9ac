//! Error types for the economy subsystem

use crate::domain::Item;
use primitive_types::U256;
use shared_types::TierId;
use thiserror::Error;

/// Result type alias for economy operations
pub type Result<T> = std::result::Result<T, EconomyError>;

/// Errors that can occur while reading or mutating the economy
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EconomyError {
    /// Balance does not cover the cost
    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds {
        /// Cost of the operation
        required: U256,
        /// Balance at the time of the check
        available: U256,
    },

    /// The tier (or the tier below it, for a chain unlock) is not unlocked
    #[error("Tier {0} is locked")]
    TierLocked(TierId),

    /// Item is already at its highest level
    #[error("{item} on {tier} is already at max level {level}")]
    MaxLevel {
        /// Tier of the item
        tier: TierId,
        /// Item at max level
        item: Item,
        /// Current level
        level: i32,
    },

    /// The catalog has no entry for this item
    #[error("Unknown item {item} on {tier}")]
    UnknownItem {
        /// Tier looked up
        tier: TierId,
        /// Missing item
        item: Item,
    },

    /// The catalog has no such tier
    #[error("Unknown tier {0}")]
    UnknownTier(TierId),

    /// Catalog failed validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
