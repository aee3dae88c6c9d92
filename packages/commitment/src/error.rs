//! Commitment errors

use interchain_host::Height;

/// Errors of the commitment primitives.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[allow(missing_docs, clippy::module_name_repetitions)]
pub enum CommitmentError {
    #[error("commitment prefix must not be empty")]
    EmptyPrefix,

    #[error("commitment proof must not be empty")]
    EmptyProof,

    #[error("time delay not passed: valid at {valid_time}, current time {current_time}")]
    TimeDelayNotPassed { valid_time: u64, current_time: u64 },

    #[error("block delay not passed: valid at {valid_height}, current height {current_height}")]
    BlockDelayNotPassed {
        valid_height: Height,
        current_height: Height,
    },
}
