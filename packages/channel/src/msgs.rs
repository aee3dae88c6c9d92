//! Relayer submitted channel messages.

use interchain_commitment::CommitmentProofBytes;
use interchain_host::{ChannelId, ConnectionId, Height, PortId, Timeout};
use serde::{Deserialize, Serialize};

use crate::{
    channel::{ChannelEnd, Counterparty, Ordering, State},
    packet::Packet,
    upgrade::{ErrorReceipt, Upgrade, UpgradeFields},
};

/// Opens a channel on this end.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct MsgChannelOpenInit {
    pub port_id: PortId,
    pub ordering: Ordering,
    pub connection_hops: Vec<ConnectionId>,
    pub counterparty_port_id: PortId,
    pub version: String,
}

/// Answers a counterparty `ChanOpenInit`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct MsgChannelOpenTry {
    pub port_id: PortId,
    pub ordering: Ordering,
    pub connection_hops: Vec<ConnectionId>,
    pub counterparty: Counterparty,
    pub counterparty_version: String,
    pub proof_init: CommitmentProofBytes,
    pub proof_height: Height,
}

/// Acknowledges a counterparty `ChanOpenTry`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct MsgChannelOpenAck {
    pub port_id: PortId,
    pub channel_id: ChannelId,
    pub counterparty_channel_id: ChannelId,
    pub counterparty_version: String,
    pub proof_try: CommitmentProofBytes,
    pub proof_height: Height,
}

/// Confirms the counterparty end is open.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct MsgChannelOpenConfirm {
    pub port_id: PortId,
    pub channel_id: ChannelId,
    pub proof_ack: CommitmentProofBytes,
    pub proof_height: Height,
}

/// Closes a channel on this end.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct MsgChannelCloseInit {
    pub port_id: PortId,
    pub channel_id: ChannelId,
}

/// Closes this end after the counterparty closed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct MsgChannelCloseConfirm {
    pub port_id: PortId,
    pub channel_id: ChannelId,
    pub proof_init: CommitmentProofBytes,
    pub proof_height: Height,
    pub counterparty_upgrade_sequence: u64,
}

/// Proposes an upgrade. Without a timeout the chain default applies.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct MsgChannelUpgradeInit {
    pub port_id: PortId,
    pub channel_id: ChannelId,
    pub fields: UpgradeFields,
    pub timeout: Option<Timeout>,
}

/// Accepts a counterparty upgrade proposal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct MsgChannelUpgradeTry {
    pub port_id: PortId,
    pub channel_id: ChannelId,
    pub proposed_connection_hops: Vec<ConnectionId>,
    pub counterparty_upgrade: Upgrade,
    pub counterparty_upgrade_sequence: u64,
    pub proof_channel: CommitmentProofBytes,
    pub proof_upgrade: CommitmentProofBytes,
    pub proof_height: Height,
}

/// Acknowledges the counterparty's `ChanUpgradeTry`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct MsgChannelUpgradeAck {
    pub port_id: PortId,
    pub channel_id: ChannelId,
    pub counterparty_upgrade: Upgrade,
    pub counterparty_upgrade_sequence: u64,
    pub proof_channel: CommitmentProofBytes,
    pub proof_upgrade: CommitmentProofBytes,
    pub proof_height: Height,
}

/// Confirms the counterparty is flushing or done flushing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct MsgChannelUpgradeConfirm {
    pub port_id: PortId,
    pub channel_id: ChannelId,
    pub counterparty_channel_state: State,
    pub counterparty_upgrade: Upgrade,
    pub proof_channel: CommitmentProofBytes,
    pub proof_upgrade: CommitmentProofBytes,
    pub proof_height: Height,
}

/// Opens the upgraded channel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct MsgChannelUpgradeOpen {
    pub port_id: PortId,
    pub channel_id: ChannelId,
    pub counterparty_channel_state: State,
    pub proof_channel: CommitmentProofBytes,
    pub proof_height: Height,
}

/// Aborts an upgrade whose timeout passed on the counterparty.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct MsgChannelUpgradeTimeout {
    pub port_id: PortId,
    pub channel_id: ChannelId,
    pub counterparty_channel: ChannelEnd,
    pub proof_channel: CommitmentProofBytes,
    pub proof_height: Height,
}

/// Aborts an upgrade the counterparty already aborted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct MsgChannelUpgradeCancel {
    pub port_id: PortId,
    pub channel_id: ChannelId,
    pub error_receipt: ErrorReceipt,
    pub proof_error_receipt: CommitmentProofBytes,
    pub proof_height: Height,
}

/// Delivers a packet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct MsgRecvPacket {
    pub packet: Packet,
    pub proof_commitment: CommitmentProofBytes,
    pub proof_height: Height,
}

/// Relays the acknowledgement of a delivered packet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct MsgAcknowledgement {
    pub packet: Packet,
    #[serde(with = "interchain_utils::serde::hex_bytes")]
    pub acknowledgement: Vec<u8>,
    pub proof_acked: CommitmentProofBytes,
    pub proof_height: Height,
}

/// Times out an undelivered packet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct MsgTimeout {
    pub packet: Packet,
    pub next_sequence_recv: u64,
    pub proof_unreceived: CommitmentProofBytes,
    pub proof_height: Height,
}

/// Every message [`crate::router::dispatch`] accepts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs, clippy::large_enum_variant)]
pub enum ChannelMsg {
    OpenInit(MsgChannelOpenInit),
    OpenTry(MsgChannelOpenTry),
    OpenAck(MsgChannelOpenAck),
    OpenConfirm(MsgChannelOpenConfirm),
    CloseInit(MsgChannelCloseInit),
    CloseConfirm(MsgChannelCloseConfirm),
    UpgradeInit(MsgChannelUpgradeInit),
    UpgradeTry(MsgChannelUpgradeTry),
    UpgradeAck(MsgChannelUpgradeAck),
    UpgradeConfirm(MsgChannelUpgradeConfirm),
    UpgradeOpen(MsgChannelUpgradeOpen),
    UpgradeTimeout(MsgChannelUpgradeTimeout),
    UpgradeCancel(MsgChannelUpgradeCancel),
    RecvPacket(MsgRecvPacket),
    Acknowledgement(MsgAcknowledgement),
    Timeout(MsgTimeout),
}

impl ChannelMsg {
    /// Message type string used in logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::OpenInit(_) => "channel_open_init",
            Self::OpenTry(_) => "channel_open_try",
            Self::OpenAck(_) => "channel_open_ack",
            Self::OpenConfirm(_) => "channel_open_confirm",
            Self::CloseInit(_) => "channel_close_init",
            Self::CloseConfirm(_) => "channel_close_confirm",
            Self::UpgradeInit(_) => "channel_upgrade_init",
            Self::UpgradeTry(_) => "channel_upgrade_try",
            Self::UpgradeAck(_) => "channel_upgrade_ack",
            Self::UpgradeConfirm(_) => "channel_upgrade_confirm",
            Self::UpgradeOpen(_) => "channel_upgrade_open",
            Self::UpgradeTimeout(_) => "channel_upgrade_timeout",
            Self::UpgradeCancel(_) => "channel_upgrade_cancel",
            Self::RecvPacket(_) => "recv_packet",
            Self::Acknowledgement(_) => "acknowledge_packet",
            Self::Timeout(_) => "timeout_packet",
        }
    }

    /// The local channel an upgrade message acts on. Only these messages
    /// can fail with an upgrade abort.
    #[must_use]
    pub const fn upgrading_channel(&self) -> Option<(&PortId, &ChannelId)> {
        match self {
            Self::UpgradeTry(m) => Some((&m.port_id, &m.channel_id)),
            Self::UpgradeAck(m) => Some((&m.port_id, &m.channel_id)),
            Self::UpgradeConfirm(m) => Some((&m.port_id, &m.channel_id)),
            Self::UpgradeOpen(m) => Some((&m.port_id, &m.channel_id)),
            Self::UpgradeTimeout(m) => Some((&m.port_id, &m.channel_id)),
            Self::UpgradeCancel(m) => Some((&m.port_id, &m.channel_id)),
            _ => None,
        }
    }
}
