//! # Shared Types Crate
//!
//! This crate contains the ledger action model and the identifiers that flow
//! between the pipeline, the action queue and the event bus.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All cross-crate types are defined here.
//! - **Transport Agnostic**: An [`Action`] names a target, an entrypoint and
//!   its calldata; how it is encoded on the wire is the transport's concern.
//! - **Ports, not Globals**: Producers hand actions to an [`ActionSink`]
//!   instead of reaching into a shared queue.

pub mod entities;
pub mod errors;
pub mod ports;

pub use entities::*;
pub use errors::*;
pub use ports::ActionSink;
