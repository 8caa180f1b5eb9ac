//! Error types for the production pipeline

use shared_types::{StageKind, TierId};
use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors that can occur when feeding the pipeline
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// The tier has not been unlocked yet
    #[error("Tier {0} is locked")]
    TierLocked(TierId),

    /// Stage only receives hand-offs, never taps
    #[error("Stage {0} cannot be tapped")]
    NotTappable(StageKind),
}
