//! # Chain Clicker - Action Queue (Subsystem 04)
//!
//! **Bounded Context:** Reconciliation with the remote ledger
//!
//! ## Purpose
//!
//! The local economy advances optimistically; the ledger confirms seconds
//! later, may reject, and offers no undo. The action queue is the bridge:
//!
//! 1. Buffers every side-effecting action the economy emits.
//! 2. Seals the buffer into a batch at `max_batch_size` (or on flush).
//! 3. Drains batches strictly FIFO, one in flight, bundling each batch
//!    before submission (`cc-01-bundling`).
//! 4. Retries a failed head batch up to `max_retries - 1` times.
//! 5. On terminal failure, discards the whole queue and runs the revert
//!    protocol so local state rolls back to the last confirmed checkpoint.
//!
//! ## Revert Protocol
//!
//! ```text
//! terminal failure
//!   ├─ lock: reverting = true, clear batches + buffer
//!   ├─ publish TerminalFailure { batch_id, last_error }
//!   ├─ revert_counter += 1, publish RevertStarted
//!   ├─ await RevertHandler::revert()   (errors logged, not retried)
//!   └─ reverting = false, publish RevertCompleted
//! ```
//!
//! While `reverting` is set, every enqueue is a no-op.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod config;
pub mod domain;
mod error;
mod metrics;
pub mod ports;
pub mod service;

pub use config::{QueueConfig, DEFAULT_MAX_BATCH_SIZE, DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY_MS};
pub use domain::{classify, ActionBatch, BatchStatus, BatchSummary};
pub use error::{QueueError, Result, SubmissionError, TransportError};
pub use metrics::{QueueMetrics, QueueMetricsSnapshot};
pub use ports::{
    ConfirmationObserver, ConfirmationWaiter, LedgerTransport, RevertHandler, SubmissionResult,
};
pub use service::{ActionQueue, DropReason, EnqueueOutcome, QueuePorts, QueueStatus};

/// Subsystem identifier used in log prefixes.
pub const SUBSYSTEM_ID: u8 = 4;
