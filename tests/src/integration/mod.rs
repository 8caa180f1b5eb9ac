//! # Integration Tests
//!
//! Every test builds a real session: economy, pipeline, action queue and
//! scheduler, with only the ledger transport replaced. Time-driven tests
//! run on tokio's paused clock.

pub mod automation;
pub mod fixtures;
pub mod flows;
