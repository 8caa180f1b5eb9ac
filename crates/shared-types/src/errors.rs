//! # Error Types
//!
//! Parse errors for identifiers that arrive as untrusted strings.

use thiserror::Error;

/// Errors raised while parsing shared identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Transaction hash is not `0x` followed by 1..=64 hex digits.
    #[error("Malformed transaction hash: {0:?}")]
    MalformedTxHash(String),

    /// Unknown entrypoint name.
    #[error("Unknown entrypoint: {0}")]
    UnknownEntrypoint(String),

    /// Tier label is not of the form `L<n>` with n >= 1.
    #[error("Malformed tier label: {0:?}")]
    MalformedTier(String),
}
