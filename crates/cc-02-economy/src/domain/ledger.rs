//! The player's balance.
//!
//! Both transitions are pure functions; [`EconomyLedger`] wraps them with a
//! lock so the pipeline and purchases can share one balance.

use crate::error::{EconomyError, Result};
use parking_lot::RwLock;
use primitive_types::U256;
use tracing::trace;

/// Add `amount`, saturating at `U256::MAX`.
#[must_use]
pub fn credit(balance: U256, amount: U256) -> U256 {
    balance.saturating_add(amount)
}

/// Subtract `cost`, failing when the balance does not cover it.
pub fn debit(balance: U256, cost: U256) -> Result<U256> {
    balance
        .checked_sub(cost)
        .ok_or(EconomyError::InsufficientFunds {
            required: cost,
            available: balance,
        })
}

/// Shared balance owner.
#[derive(Debug, Default)]
pub struct EconomyLedger {
    balance: RwLock<U256>,
}

impl EconomyLedger {
    /// Ledger with a zero balance.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ledger seeded with `balance`.
    #[must_use]
    pub fn with_balance(balance: U256) -> Self {
        Self {
            balance: RwLock::new(balance),
        }
    }

    /// Current balance.
    #[must_use]
    pub fn balance(&self) -> U256 {
        *self.balance.read()
    }

    /// True when `cost` can be paid now.
    #[must_use]
    pub fn can_afford(&self, cost: U256) -> bool {
        *self.balance.read() >= cost
    }

    /// Credit a reward; returns the new balance.
    pub fn credit(&self, amount: U256) -> U256 {
        let mut balance = self.balance.write();
        *balance = credit(*balance, amount);
        trace!(%amount, balance = %*balance, "[cc-02] Credited");
        *balance
    }

    /// Debit a cost; the balance is untouched on failure.
    pub fn debit(&self, cost: U256) -> Result<U256> {
        let mut balance = self.balance.write();
        *balance = debit(*balance, cost)?;
        trace!(%cost, balance = %*balance, "[cc-02] Debited");
        Ok(*balance)
    }

    /// Balance to restore later.
    #[must_use]
    pub fn snapshot(&self) -> U256 {
        self.balance()
    }

    /// Overwrite the balance with a snapshot.
    pub fn restore(&self, snapshot: U256) {
        *self.balance.write() = snapshot;
    }

    /// Back to zero.
    pub fn reset(&self) {
        self.restore(U256::zero());
    }
}
