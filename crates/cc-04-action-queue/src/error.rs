//! Error types for the action queue

use shared_types::TxHash;
use thiserror::Error;

/// Result type alias for queue construction
pub type Result<T> = std::result::Result<T, QueueError>;

/// Errors raised when building the queue
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    /// Queue settings are unusable
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Failure reported by a ledger transport
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Connection-level failure
    #[error("Network error: {0}")]
    Network(String),

    /// No answer in time
    #[error("Timed out: {0}")]
    Timeout(String),

    /// The ledger refused the call
    #[error("Rejected by ledger: {0}")]
    Rejected(String),
}

/// Why one submission attempt of a batch failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    /// Transport trouble; worth another attempt
    #[error("Transient failure: {0}")]
    Transient(String),

    /// The ledger refused the batch
    #[error("Rejected: {0}")]
    Rejected(String),

    /// The ledger answered with something that is not a transaction hash
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// The transaction was sent but never confirmed
    #[error("Transaction {0} not confirmed")]
    Unconfirmed(TxHash),
}

impl SubmissionError {
    /// True for outright rejections by the ledger.
    pub fn is_rejection(&self) -> bool {
        matches!(self, SubmissionError::Rejected(_))
    }
}

impl From<TransportError> for SubmissionError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Rejected(reason) => SubmissionError::Rejected(reason),
            TransportError::Network(_) | TransportError::Timeout(_) => {
                SubmissionError::Transient(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_mapping() {
        let rejected: SubmissionError = TransportError::Rejected("nonce".into()).into();
        assert!(rejected.is_rejection());

        let timeout: SubmissionError = TransportError::Timeout("30s".into()).into();
        assert_eq!(timeout, SubmissionError::Transient("Timed out: 30s".into()));
        assert!(!timeout.is_rejection());
    }
}
