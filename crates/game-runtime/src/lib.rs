//! # Game Runtime Library
//!
//! Composition root of the Chain Clicker client. The `game-runtime` binary
//! is a demo driving one session against the in-process simulated ledger.
//!
//! ## Modules
//!
//! - `config` - `GameConfig`: JSON file + `CC_*` environment overrides
//! - `telemetry` - global `tracing` subscriber
//! - `adapters/` - `SimulatedLedger` transport and confirmer
//! - `session/` - `GameSession`, checkpointing and the revert handler
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (file, then environment)
//! 2. Install logging
//! 3. Build the session (queue, pipeline, scheduler, hooks)
//! 4. Play; shut down by flushing and waiting for the queue to go idle

#![warn(missing_docs)]
#![warn(clippy::all)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod adapters;
pub mod config;
mod error;
pub mod session;
pub mod telemetry;

pub use adapters::{SimulatedLedger, SimulatedLedgerConfig};
pub use config::{AutomationConfig, ConfigError, GameConfig, TelemetryConfig};
pub use error::{Result, SessionError};
pub use session::{Checkpoint, GameSession, SessionStatus, TierStatus};
