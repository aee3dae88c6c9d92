//! Defines the [`ChannelError`] type and its coarse [`ErrorKind`].

use interchain_client::{ClientError, ClientStatus};
use interchain_commitment::CommitmentError;
use interchain_host::{
    error::{CodecError, IdentifierError},
    ChannelId, ConnectionId, PortId, Timeout,
};
use thiserror::Error;

use crate::{
    channel::{Ordering, State},
    connection::ConnectionState,
    upgrade::ErrorReceipt,
};

/// Coarse classification of a rejected message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A channel, connection, client, upgrade or commitment is absent
    NotFound,
    /// The entity is in the wrong lifecycle state
    InvalidState,
    /// A proof or signature did not verify
    VerificationFailed,
    /// The upgrade was aborted and an error receipt recorded
    IncompatibleUpgrade,
    /// The client is frozen
    FrozenClient,
    /// The message itself is malformed or inconsistent
    InvalidArgument,
}

/// An upgrade abort. Unlike every other error it is persisted: the channel
/// is restored and an [`ErrorReceipt`] at `sequence` is written so the
/// counterparty can prove the abort.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("upgrade aborted at sequence {sequence}: {cause}")]
pub struct UpgradeError {
    /// Upgrade sequence the channel is restored to
    pub sequence: u64,
    /// Why the upgrade was aborted
    pub cause: Box<ChannelError>,
}

impl UpgradeError {
    /// Wraps `cause` as an abort at `sequence`.
    #[must_use]
    pub fn new(sequence: u64, cause: ChannelError) -> Self {
        Self {
            sequence,
            cause: Box::new(cause),
        }
    }

    /// The receipt recorded for this abort.
    #[must_use]
    pub fn receipt(&self) -> ErrorReceipt {
        ErrorReceipt {
            sequence: self.sequence,
            message: self.to_string(),
        }
    }
}

/// Errors of the channel handlers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[allow(clippy::module_name_repetitions)]
pub enum ChannelError {
    /// No channel end stored
    #[error("channel {channel_id} on port {port_id} not found")]
    ChannelNotFound {
        /// port
        port_id: PortId,
        /// channel
        channel_id: ChannelId,
    },

    /// No connection end stored
    #[error("connection {0} not found")]
    ConnectionNotFound(ConnectionId),

    /// No upgrade stored for the channel
    #[error("upgrade of channel {channel_id} on port {port_id} not found")]
    UpgradeNotFound {
        /// port
        port_id: PortId,
        /// channel
        channel_id: ChannelId,
    },

    /// No counterparty upgrade stored for the channel
    #[error("counterparty upgrade of channel {channel_id} on port {port_id} not found")]
    CounterpartyUpgradeNotFound {
        /// port
        port_id: PortId,
        /// channel
        channel_id: ChannelId,
    },

    /// No commitment stored for the packet
    #[error("packet commitment for sequence {0} not found")]
    PacketCommitmentNotFound(u64),

    /// The channel cannot take this transition
    #[error("channel {channel_id} is in state {state}")]
    InvalidChannelState {
        /// channel
        channel_id: ChannelId,
        /// its current state
        state: State,
    },

    /// The connection is not open
    #[error("connection {connection_id} is in state {state:?}, expected Open")]
    InvalidConnectionState {
        /// connection
        connection_id: ConnectionId,
        /// its current state
        state: ConnectionState,
    },

    /// The claimed counterparty state cannot take this transition
    #[error("counterparty channel state {0} is not allowed here")]
    InvalidCounterpartyChannelState(State),

    /// The channel is closed
    #[error("channel {0} is closed")]
    ChannelClosed(ChannelId),

    /// Channels run over exactly one connection
    #[error("expected exactly one connection hop, got {0}")]
    InvalidConnectionHops(usize),

    /// The counterparty channel id is unknown
    #[error("counterparty channel id is not set")]
    MissingCounterpartyChannelId,

    /// The connection versions do not support the ordering
    #[error("ordering {0} is not supported by the connection")]
    OrderingNotSupported(Ordering),

    /// The proposed upgrade is unusable
    #[error("invalid upgrade: {reason}")]
    InvalidUpgrade {
        /// Reason for error
        reason: String,
    },

    /// The counterparty's upgrade cannot be combined with ours
    #[error("incompatible counterparty upgrade: {reason}")]
    IncompatibleCounterpartyUpgrade {
        /// Reason for error
        reason: String,
    },

    /// Upgrade sequences disagree
    #[error("invalid upgrade sequence: expected {expected}, got {actual}")]
    InvalidUpgradeSequence {
        /// expected sequence
        expected: u64,
        /// supplied sequence
        actual: u64,
    },

    /// A new error receipt must supersede the stored one
    #[error("error receipt sequence {new} must exceed the existing {existing}")]
    StaleErrorReceipt {
        /// stored receipt sequence
        existing: u64,
        /// rejected receipt sequence
        new: u64,
    },

    /// The upgrade timeout has passed
    #[error("upgrade timed out at {0}")]
    UpgradeTimedOut(Timeout),

    /// The upgrade timeout has not passed yet
    #[error("upgrade timeout {0} has not been reached")]
    UpgradeTimeoutNotReached(Timeout),

    /// A packet needs a height or timestamp timeout
    #[error("packet timeout must set a height or a timestamp")]
    InvalidTimeout,

    /// Packets carry data
    #[error("packet data must not be empty")]
    EmptyPacketData,

    /// The packet's endpoints do not match the channel
    #[error("packet endpoints do not match channel {0}")]
    InvalidPacketEndpoints(ChannelId),

    /// The packet timed out before it could be sent or received
    #[error("packet {sequence} timed out at {timeout}")]
    PacketTimedOut {
        /// packet sequence
        sequence: u64,
        /// its timeout
        timeout: Timeout,
    },

    /// The packet cannot be timed out yet
    #[error("packet {sequence} timeout {timeout} has not been reached")]
    PacketTimeoutNotReached {
        /// packet sequence
        sequence: u64,
        /// its timeout
        timeout: Timeout,
    },

    /// The packet was already received
    #[error("packet {0} was already received")]
    PacketAlreadyReceived(u64),

    /// Ordered channels take packets one by one
    #[error("packet sequence {actual} is out of order, expected {expected}")]
    PacketSequenceOutOfOrder {
        /// next expected sequence
        expected: u64,
        /// supplied sequence
        actual: u64,
    },

    /// The packet was sent after the counterparty started flushing
    #[error("packet {sequence} was sent after the flush boundary {boundary}")]
    PacketBeyondFlushBoundary {
        /// packet sequence
        sequence: u64,
        /// counterparty's last sequence before the upgrade
        boundary: u64,
    },

    /// The packet does not match the stored commitment
    #[error("packet {0} does not match its commitment")]
    PacketCommitmentMismatch(u64),

    /// Acknowledgements carry data
    #[error("acknowledgement must not be empty")]
    EmptyAcknowledgement,

    /// A packet is acknowledged once
    #[error("acknowledgement for packet {0} already written")]
    AcknowledgementExists(u64),

    /// A counterparty proof did not verify
    #[error("{0} proof verification failed")]
    VerificationFailed(&'static str),

    /// The upgrade was aborted
    #[error(transparent)]
    Upgrade(#[from] UpgradeError),

    /// Light client failure
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Invalid prefix or proof bytes
    #[error(transparent)]
    Commitment(#[from] CommitmentError),

    /// Invalid identifier
    #[error(transparent)]
    Identifier(#[from] IdentifierError),

    /// Encoding failure
    #[error(transparent)]
    Codec(#[from] CodecError),
}

impl ChannelError {
    /// The taxonomy bucket of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::ChannelNotFound { .. }
            | Self::ConnectionNotFound(_)
            | Self::UpgradeNotFound { .. }
            | Self::CounterpartyUpgradeNotFound { .. }
            | Self::PacketCommitmentNotFound(_) => ErrorKind::NotFound,
            Self::InvalidChannelState { .. }
            | Self::InvalidConnectionState { .. }
            | Self::InvalidCounterpartyChannelState(_)
            | Self::ChannelClosed(_)
            | Self::StaleErrorReceipt { .. }
            | Self::UpgradeTimedOut(_)
            | Self::UpgradeTimeoutNotReached(_)
            | Self::PacketTimedOut { .. }
            | Self::PacketTimeoutNotReached { .. }
            | Self::PacketBeyondFlushBoundary { .. } => ErrorKind::InvalidState,
            Self::VerificationFailed(_) => ErrorKind::VerificationFailed,
            Self::Upgrade(_) => ErrorKind::IncompatibleUpgrade,
            Self::Client(err) => client_error_kind(err),
            Self::InvalidConnectionHops(_)
            | Self::MissingCounterpartyChannelId
            | Self::OrderingNotSupported(_)
            | Self::InvalidUpgrade { .. }
            | Self::IncompatibleCounterpartyUpgrade { .. }
            | Self::InvalidUpgradeSequence { .. }
            | Self::InvalidTimeout
            | Self::EmptyPacketData
            | Self::InvalidPacketEndpoints(_)
            | Self::PacketAlreadyReceived(_)
            | Self::PacketSequenceOutOfOrder { .. }
            | Self::PacketCommitmentMismatch(_)
            | Self::EmptyAcknowledgement
            | Self::AcknowledgementExists(_)
            | Self::Commitment(_)
            | Self::Identifier(_)
            | Self::Codec(_) => ErrorKind::InvalidArgument,
        }
    }
}

const fn client_error_kind(err: &ClientError) -> ErrorKind {
    match err {
        ClientError::ClientNotActive {
            status: ClientStatus::Frozen,
            ..
        } => ErrorKind::FrozenClient,
        ClientError::ClientNotFound(_)
        | ClientError::ConsensusStateNotFound { .. }
        | ClientError::ProcessedTimeNotFound { .. } => ErrorKind::NotFound,
        ClientError::VerifyMembershipFailed(_) | ClientError::Delay(_) => {
            ErrorKind::VerificationFailed
        }
        _ => ErrorKind::InvalidState,
    }
}
