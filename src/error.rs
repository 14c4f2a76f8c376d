//! Scan Error Taxonomy
//!
//! Classifies observation-path failures into the categories the scan
//! loop cares about: does this failure indict the endpoint (rotate) or
//! the request itself (don't)?
//!
//! Author: AI-Generated
//! Created: 2026-02-03

use std::time::Duration;
use thiserror::Error;

/// Failures on the observation path (balance query, batched reserve read,
/// chain verification). Strike failures are not `ScanError`s; they live
/// in `ExecutionOutcome`.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Connection, DNS, or HTTP-level failure reaching the endpoint
    #[error("transport failure: {0}")]
    Transport(String),

    /// The call outlived its per-call budget; partial results untrusted
    #[error("call timed out after {0:?}")]
    Timeout(Duration),

    /// The endpoint answered with bytes that do not decode as the
    /// expected envelope
    #[error("malformed response: {0}")]
    BadResponse(String),

    /// Local request construction failed; a different endpoint would
    /// fail the same way
    #[error("request construction failed: {0}")]
    Request(String),

    /// Endpoint serves a different chain than the config declares
    #[error("chain id mismatch: expected {expected}, endpoint reports {actual}")]
    ChainMismatch { expected: u64, actual: u64 },
}

impl ScanError {
    /// True when the failure indicts the current endpoint and the scan
    /// loop should rotate before the next iteration.
    pub fn is_qualifying(&self) -> bool {
        !matches!(self, ScanError::Request(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_failures_qualify() {
        assert!(ScanError::Transport("connection refused".to_string()).is_qualifying());
        assert!(ScanError::Timeout(Duration::from_secs(4)).is_qualifying());
        assert!(ScanError::BadResponse("truncated envelope".to_string()).is_qualifying());
        assert!(ScanError::ChainMismatch {
            expected: 1,
            actual: 8453
        }
        .is_qualifying());
    }

    #[test]
    fn test_request_construction_does_not_qualify() {
        assert!(!ScanError::Request("empty call set".to_string()).is_qualifying());
    }
}
