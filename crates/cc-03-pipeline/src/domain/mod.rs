//! Domain models: stages and per-tier state.

mod stage;
mod tier;

pub use stage::{AddOutcome, Stage, StageParams, StageUnit};
pub use tier::TierState;
