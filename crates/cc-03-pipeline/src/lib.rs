//! # Chain Clicker - Production Pipeline (Subsystem 03)
//!
//! **Bounded Context:** Optimistic block production
//!
//! ## Purpose
//!
//! Models the economy as a chain of dependent production stages per tier.
//! Taps (manual or automated) feed units into stages; a stage that reaches
//! capacity is built, pays its reward into the economy ledger and emits the
//! ledger action that mirrors it.
//!
//! ## Stages
//!
//! | Stage            | Unit          | Capacity          | Payout                      | Action            |
//! |------------------|---------------|-------------------|-----------------------------|-------------------|
//! | Mining           | transaction   | `BlockSize`       | `BlockReward` + fees        | `add_transaction` per unit |
//! | Sequencing       | click         | block difficulty  | `MevBoost`                  | `mine_block`      |
//! | DataAvailability | sequenced block | `DaSize`        | sum of `DaReward` per block | `store_da`        |
//! | Proving          | sequenced block | `ProofSize`     | sum of `ProofReward` per block | `prove_batch`  |
//!
//! ## Invariants
//!
//! 1. `units <= capacity`, and a stage is built exactly when they are equal.
//! 2. A built stage is frozen until replaced by a stage with a larger id.
//! 3. Each built transition credits one reward and emits at most one
//!    completion action, in the same call.
//! 4. Capacity, difficulty and base reward are frozen at construction.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod domain;
mod error;
mod metrics;
pub mod service;

pub use domain::{AddOutcome, Stage, StageParams, StageUnit, TierState};
pub use error::{PipelineError, Result};
pub use metrics::PipelineMetrics;
pub use service::{PipelineSnapshot, ProductionPipeline, StageCompletion, Unit, UnitOutcome};

/// Subsystem identifier used in log prefixes.
pub const SUBSYSTEM_ID: u8 = 3;
