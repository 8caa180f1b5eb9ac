//! Hexagonal ports of the action queue.
//!
//! The queue only drives outbound ports; its inbound API is the
//! [`ActionQueue`](crate::ActionQueue) handle itself.

pub mod outbound;

pub use outbound::{
    ConfirmationObserver, ConfirmationWaiter, LedgerTransport, RevertHandler, SubmissionResult,
};
