//! # Chain Clicker - Bundling Optimizer (Subsystem 01)
//!
//! **Bounded Context:** Ledger call compaction
//!
//! ## Purpose
//!
//! Every tap produces one ledger action. Submitting them one by one wastes
//! ledger work, so before a batch leaves the queue its consecutive
//! homogeneous actions are merged into a single `*_bundled` call.
//!
//! ```text
//!  add_transaction [0, 5]  ─┐
//!  add_transaction [0, 5]   ├──►  add_transaction_bundled [0, 3, 5, 5, 7]
//!  add_transaction [0, 7]  ─┘
//!  mine_block      [0]     ─────► mine_block [0]
//!  buy_upgrade     [0, 2]  ─────► buy_upgrade [0, 2]
//! ```
//!
//! ## Rules
//!
//! 1. A run is a maximal sequence of actions sharing a bundleable entrypoint,
//!    the target contract, and the tier word (first calldata word).
//! 2. Runs of two or more collapse; singletons pass through untouched.
//! 3. Purchases and actions without calldata never bundle.
//! 4. Order of runs is preserved, and `optimize` is idempotent.
//!
//! The optimizer is pure and total: it never fails and never panics.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod domain;

pub use domain::{bundle_savings, optimize, BundleSavings};

/// Subsystem identifier used in log prefixes.
pub const SUBSYSTEM_ID: u8 = 1;
