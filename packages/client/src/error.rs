//! Defines the [`ClientError`] type.

use interchain_commitment::CommitmentError;
use interchain_host::{
    error::{CodecError, IdentifierError},
    ClientId, Height,
};
use solomachine_light_client::error::SoloMachineError;
use thiserror::Error;

use crate::types::ClientStatus;

/// Errors of the light client contract.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[allow(clippy::module_name_repetitions)]
pub enum ClientError {
    /// No client state stored under this id
    #[error("client {0} not found")]
    ClientNotFound(ClientId),

    /// No consensus state stored at this height
    #[error("consensus state of client {client_id} at height {height} not found")]
    ConsensusStateNotFound {
        /// client
        client_id: ClientId,
        /// requested height
        height: Height,
    },

    /// No processed time or height recorded at this height
    #[error("processed time of client {client_id} at height {height} not found")]
    ProcessedTimeNotFound {
        /// client
        client_id: ClientId,
        /// requested height
        height: Height,
    },

    /// The client cannot be used
    #[error("client {client_id} is not active: {status}")]
    ClientNotActive {
        /// client
        client_id: ClientId,
        /// its status
        status: ClientStatus,
    },

    /// The client is active where it must not be
    #[error("client {0} is active")]
    ClientActive(ClientId),

    /// Client type is not in the allow list
    #[error("client type {0} is not allowed")]
    ClientTypeNotAllowed(String),

    /// Subject and substitute are of different types
    #[error("client type mismatch: subject {subject}, substitute {substitute}")]
    ClientTypeMismatch {
        /// subject type
        subject: String,
        /// substitute type
        substitute: String,
    },

    /// Client state or consensus state rejected at creation
    #[error("invalid initial state: {0}")]
    InvalidInitialState(#[source] SoloMachineError),

    /// Header or misbehaviour failed verification
    #[error("verify client message failed: {0}")]
    VerifyClientMessageFailed(#[source] SoloMachineError),

    /// The message is not a usable misbehaviour
    #[error("misbehaviour not detected")]
    MisbehaviourNotDetected,

    /// The message kind cannot be applied here
    #[error("invalid client message: {0}")]
    InvalidClientMessage(String),

    /// Membership or non-membership proof failed
    #[error("verify membership failed: {0}")]
    VerifyMembershipFailed(#[source] SoloMachineError),

    /// Substitute rejected
    #[error("recover client failed: {0}")]
    RecoverFailed(#[source] SoloMachineError),

    /// Delay period not yet passed
    #[error(transparent)]
    Delay(#[from] CommitmentError),

    /// Invalid identifier
    #[error(transparent)]
    Identifier(#[from] IdentifierError),

    /// Encoding failure
    #[error(transparent)]
    Codec(#[from] CodecError),
}
