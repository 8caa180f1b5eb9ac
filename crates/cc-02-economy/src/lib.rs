//! # Chain Clicker - Economy (Subsystem 02)
//!
//! **Bounded Context:** Balance, purchases and tier progression
//!
//! ## Purpose
//!
//! Owns the two pieces of optimistic state every other subsystem reads:
//!
//! - [`EconomyLedger`]: the player's `U256` balance. Credited by stage
//!   completions, debited by purchases.
//! - [`UpgradeBook`]: per-tier item levels (upgrades, automations,
//!   features) plus the lookups derived from them.
//!
//! ```text
//!          ┌──────────────────┐    credit()    ┌──────────────────┐
//!          │ Production       │ ─────────────► │  EconomyLedger   │
//!          │ Pipeline (cc-03) │                └──────────────────┘
//!          └──────────────────┘                         ▲ debit()
//!                   │ capacity_for()                    │
//!                   ▼                          ┌──────────────────┐
//!          ┌──────────────────┐  purchase()    │   UpgradeBook    │
//!          │  EconomyConfig   │ ◄───────────── │  (level book)    │
//!          │  (catalog)       │                └──────────────────┘
//!          └──────────────────┘
//! ```
//!
//! ## Invariants
//!
//! 1. The balance never underflows: a debit either covers its cost or fails
//!    without side effects.
//! 2. A purchase is atomic: affordability, debit and level bump happen
//!    together or not at all.
//! 3. Derived values are read from the book at the moment they are needed.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod config;
pub mod domain;
mod error;

pub use config::{EconomyConfig, LevelTable, TierCatalog};
pub use domain::{
    credit, debit, AutomationId, EconomyLedger, Feature, Item, LevelSnapshot, Purchase,
    UpgradeBook, UpgradeId, LOCKED_LEVEL,
};
pub use error::{EconomyError, Result};

/// Subsystem identifier used in log prefixes.
pub const SUBSYSTEM_ID: u8 = 2;
