//! Typed notifications emitted by the client and channel handlers.

use serde::{Deserialize, Serialize};

use crate::{
    height::Height,
    identifier::{ChannelId, ClientId, ConnectionId, PortId},
};

/// Client lifecycle attributes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct ClientEvent {
    pub client_id: ClientId,
    pub client_type: String,
    pub consensus_heights: Vec<Height>,
}

/// Channel handshake attributes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct ChannelEvent {
    pub port_id: PortId,
    pub channel_id: ChannelId,
    pub counterparty_port_id: PortId,
    pub counterparty_channel_id: Option<ChannelId>,
    pub connection_id: ConnectionId,
    pub version: String,
}

/// Channel upgrade attributes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct UpgradeEvent {
    pub port_id: PortId,
    pub channel_id: ChannelId,
    pub upgrade_sequence: u64,
    pub ordering: String,
    pub connection_hops: Vec<ConnectionId>,
    pub version: String,
}

/// An upgrade abort recorded as an error receipt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct UpgradeErrorEvent {
    pub port_id: PortId,
    pub channel_id: ChannelId,
    pub upgrade_sequence: u64,
    pub message: String,
}

/// Packet attributes. Binary fields are hex encoded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct PacketEvent {
    pub sequence: u64,
    pub source_port: PortId,
    pub source_channel: ChannelId,
    pub destination_port: PortId,
    pub destination_channel: ChannelId,
    pub timeout_height: Height,
    pub timeout_timestamp: u64,
    pub data_hex: String,
    pub ack_hex: Option<String>,
    pub ordering: String,
    pub connection_id: ConnectionId,
}

/// Every event this core emits.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs, clippy::module_name_repetitions)]
pub enum IbcEvent {
    CreateClient(ClientEvent),
    UpdateClient(ClientEvent),
    ClientMisbehaviour(ClientEvent),
    RecoverClient {
        subject_client_id: ClientId,
        substitute_client_id: ClientId,
    },
    OpenInit(ChannelEvent),
    OpenTry(ChannelEvent),
    OpenAck(ChannelEvent),
    OpenConfirm(ChannelEvent),
    CloseInit(ChannelEvent),
    CloseConfirm(ChannelEvent),
    UpgradeInit(UpgradeEvent),
    UpgradeTry(UpgradeEvent),
    UpgradeAck(UpgradeEvent),
    UpgradeConfirm(UpgradeEvent),
    UpgradeOpen(UpgradeEvent),
    UpgradeTimeout(UpgradeEvent),
    UpgradeCancel(UpgradeEvent),
    UpgradeError(UpgradeErrorEvent),
    ChannelFlushComplete(UpgradeEvent),
    SendPacket(PacketEvent),
    RecvPacket(PacketEvent),
    WriteAcknowledgement(PacketEvent),
    AcknowledgePacket(PacketEvent),
    TimeoutPacket(PacketEvent),
}

impl IbcEvent {
    /// The event type string.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::CreateClient(_) => "create_client",
            Self::UpdateClient(_) => "update_client",
            Self::ClientMisbehaviour(_) => "client_misbehaviour",
            Self::RecoverClient { .. } => "recover_client",
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
            Self::UpgradeCancel(_) => "channel_upgrade_cancelled",
            Self::UpgradeError(_) => "channel_upgrade_error",
            Self::ChannelFlushComplete(_) => "channel_flush_complete",
            Self::SendPacket(_) => "send_packet",
            Self::RecvPacket(_) => "recv_packet",
            Self::WriteAcknowledgement(_) => "write_acknowledgement",
            Self::AcknowledgePacket(_) => "acknowledge_packet",
            Self::TimeoutPacket(_) => "timeout_packet",
        }
    }
}

/// Fire-and-forget receiver of events.
pub trait EventSink {
    /// Records an event.
    fn emit(&mut self, event: IbcEvent);
}

impl EventSink for Vec<IbcEvent> {
    fn emit(&mut self, event: IbcEvent) {
        self.push(event);
    }
}
