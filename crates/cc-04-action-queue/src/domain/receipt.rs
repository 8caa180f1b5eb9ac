//! Interpretation of raw ledger answers.

use crate::error::SubmissionError;
use crate::ports::SubmissionResult;
use shared_types::TxHash;

/// Turn a raw submission answer into a transaction hash or a failure.
///
/// An error marker wins over a hash; a missing or malformed hash is a
/// failure even without a marker.
pub fn classify(result: SubmissionResult) -> Result<TxHash, SubmissionError> {
    if let Some(error) = result.error {
        return Err(SubmissionError::Rejected(error));
    }
    let raw = result
        .transaction_hash
        .ok_or_else(|| SubmissionError::Malformed("missing transaction hash".into()))?;
    TxHash::parse(&raw).map_err(|e| SubmissionError::Malformed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_well_formed_hash_accepted() {
        let hash = classify(SubmissionResult::accepted("0xABCdef")).unwrap();
        assert_eq!(hash.as_str(), "0xabcdef");
    }

    #[test]
    fn test_error_marker_wins() {
        let result = SubmissionResult {
            transaction_hash: Some("0x1".into()),
            error: Some("out of gas".into()),
        };
        assert_eq!(
            classify(result),
            Err(SubmissionError::Rejected("out of gas".into()))
        );
    }

    #[test]
    fn test_unrecognized_shapes_fail() {
        assert!(matches!(
            classify(SubmissionResult::default()),
            Err(SubmissionError::Malformed(_))
        ));
        assert!(matches!(
            classify(SubmissionResult::accepted("pending")),
            Err(SubmissionError::Malformed(_))
        ));
    }

    #[test]
    fn test_deserializes_partial_answers() {
        let result: SubmissionResult =
            serde_json::from_str(r#"{"transaction_hash": "0x42"}"#).unwrap();
        assert!(classify(result).is_ok());
    }
}
