//! Session error type

use crate::config::ConfigError;
use cc_02_economy::EconomyError;
use cc_03_pipeline::PipelineError;
use cc_04_action_queue::QueueError;
use thiserror::Error;

/// Result type alias for session operations
pub type Result<T> = std::result::Result<T, SessionError>;

/// Errors surfaced to the player-facing layer
#[derive(Debug, Error)]
pub enum SessionError {
    /// Local state is being rolled back; input is blocked
    #[error("Revert in progress; input is blocked")]
    Reverting,

    /// Purchase or balance failure
    #[error(transparent)]
    Economy(#[from] EconomyError),

    /// Pipeline refused the input
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// Queue could not be built
    #[error(transparent)]
    Queue(#[from] QueueError),

    /// Configuration rejected
    #[error(transparent)]
    Config(#[from] ConfigError),
}
