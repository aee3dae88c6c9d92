//! Error types for the solo machine light client

use interchain_host::error::CodecError;
use thiserror::Error;

/// Main error type for solo machine operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[allow(clippy::module_name_repetitions)]
pub enum SoloMachineError {
    /// Signature did not verify against the current public key
    #[error("signature verification failed")]
    InvalidSignature,

    /// Client is frozen
    #[error("client is frozen")]
    ClientFrozen,

    /// Malformed or stale header
    #[error("invalid header: {reason}")]
    InvalidHeader {
        /// Reason for error
        reason: String,
    },

    /// Malformed misbehaviour evidence
    #[error("invalid misbehaviour: {reason}")]
    InvalidMisbehaviour {
        /// Reason for error
        reason: String,
    },

    /// Proof cannot be used at the requested height
    #[error("invalid proof: {reason}")]
    InvalidProof {
        /// Reason for error
        reason: String,
    },

    /// Malformed public key
    #[error("invalid public key: {reason}")]
    InvalidPublicKey {
        /// Reason for error
        reason: String,
    },

    /// Client state fails validation
    #[error("invalid client state: {reason}")]
    InvalidClientState {
        /// Reason for error
        reason: String,
    },

    /// Consensus state fails validation
    #[error("invalid consensus state: {reason}")]
    InvalidConsensusState {
        /// Reason for error
        reason: String,
    },

    /// Substitute cannot replace the subject
    #[error("invalid substitute: substitute sequence {substitute} must exceed subject sequence {subject}")]
    InvalidSubstitute {
        /// Subject sequence
        subject: u64,
        /// Substitute sequence
        substitute: u64,
    },

    /// Encoding failure
    #[error(transparent)]
    Codec(#[from] CodecError),
}
