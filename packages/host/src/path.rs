//! Store paths. The string form of every path is part of the cross-chain
//! compatibility surface, since counterparties prove values at these keys.

use std::fmt;

use crate::{
    height::Height,
    identifier::{ChannelId, ClientId, ConnectionId, PortId},
};

/// Every key this core reads or writes.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum Path {
    ClientState(ClientId),
    ClientConsensusState { client_id: ClientId, height: Height },
    ClientProcessedTime { client_id: ClientId, height: Height },
    ClientProcessedHeight { client_id: ClientId, height: Height },
    Connection(ConnectionId),
    ChannelEnd(PortId, ChannelId),
    ChannelUpgrade(PortId, ChannelId),
    CounterpartyUpgrade(PortId, ChannelId),
    UpgradeErrorReceipt(PortId, ChannelId),
    NextSequenceSend(PortId, ChannelId),
    NextSequenceRecv(PortId, ChannelId),
    NextSequenceAck(PortId, ChannelId),
    RecvStartSequence(PortId, ChannelId),
    PacketCommitment { port_id: PortId, channel_id: ChannelId, sequence: u64 },
    PacketReceipt { port_id: PortId, channel_id: ChannelId, sequence: u64 },
    PacketAcknowledgement { port_id: PortId, channel_id: ChannelId, sequence: u64 },
    NextClientSequence,
    NextConnectionSequence,
    NextChannelSequence,
}

impl Path {
    /// `packetCommitments/ports/{port}/channels/{channel}/sequences/{sequence}`
    #[must_use]
    pub fn packet_commitment(port_id: &PortId, channel_id: &ChannelId, sequence: u64) -> Self {
        Self::PacketCommitment {
            port_id: port_id.clone(),
            channel_id: channel_id.clone(),
            sequence,
        }
    }

    /// `packetReceipts/ports/{port}/channels/{channel}/sequences/{sequence}`
    #[must_use]
    pub fn packet_receipt(port_id: &PortId, channel_id: &ChannelId, sequence: u64) -> Self {
        Self::PacketReceipt {
            port_id: port_id.clone(),
            channel_id: channel_id.clone(),
            sequence,
        }
    }

    /// `packetAcks/ports/{port}/channels/{channel}/sequences/{sequence}`
    #[must_use]
    pub fn packet_acknowledgement(port_id: &PortId, channel_id: &ChannelId, sequence: u64) -> Self {
        Self::PacketAcknowledgement {
            port_id: port_id.clone(),
            channel_id: channel_id.clone(),
            sequence,
        }
    }

    /// Key prefix under which all packet commitments of a channel live.
    #[must_use]
    pub fn packet_commitment_prefix(port_id: &PortId, channel_id: &ChannelId) -> String {
        format!("packetCommitments/ports/{port_id}/channels/{channel_id}/sequences/")
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClientState(client) => write!(f, "clients/{client}/clientState"),
            Self::ClientConsensusState { client_id, height } => {
                write!(f, "clients/{client_id}/consensusStates/{height}")
            }
            Self::ClientProcessedTime { client_id, height } => {
                write!(f, "clients/{client_id}/processedTimes/{height}")
            }
            Self::ClientProcessedHeight { client_id, height } => {
                write!(f, "clients/{client_id}/processedHeights/{height}")
            }
            Self::Connection(connection) => write!(f, "connections/{connection}"),
            Self::ChannelEnd(port, channel) => {
                write!(f, "channelEnds/ports/{port}/channels/{channel}")
            }
            Self::ChannelUpgrade(port, channel) => {
                write!(f, "channelUpgrades/ports/{port}/channels/{channel}")
            }
            Self::CounterpartyUpgrade(port, channel) => {
                write!(f, "channelCounterpartyUpgrades/ports/{port}/channels/{channel}")
            }
            Self::UpgradeErrorReceipt(port, channel) => {
                write!(f, "channelUpgradeErrors/ports/{port}/channels/{channel}")
            }
            Self::NextSequenceSend(port, channel) => {
                write!(f, "nextSequenceSend/ports/{port}/channels/{channel}")
            }
            Self::NextSequenceRecv(port, channel) => {
                write!(f, "nextSequenceRecv/ports/{port}/channels/{channel}")
            }
            Self::NextSequenceAck(port, channel) => {
                write!(f, "nextSequenceAck/ports/{port}/channels/{channel}")
            }
            Self::RecvStartSequence(port, channel) => {
                write!(f, "recvStartSequence/ports/{port}/channels/{channel}")
            }
            Self::PacketCommitment {
                port_id,
                channel_id,
                sequence,
            } => write!(
                f,
                "{}{sequence}",
                Self::packet_commitment_prefix(port_id, channel_id)
            ),
            Self::PacketReceipt {
                port_id,
                channel_id,
                sequence,
            } => write!(
                f,
                "packetReceipts/ports/{port_id}/channels/{channel_id}/sequences/{sequence}"
            ),
            Self::PacketAcknowledgement {
                port_id,
                channel_id,
                sequence,
            } => write!(
                f,
                "packetAcks/ports/{port_id}/channels/{channel_id}/sequences/{sequence}"
            ),
            Self::NextClientSequence => f.write_str("nextClientSequence"),
            Self::NextConnectionSequence => f.write_str("nextConnectionSequence"),
            Self::NextChannelSequence => f.write_str("nextChannelSequence"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn port() -> PortId {
        PortId::new("transfer").unwrap()
    }

    fn channel() -> ChannelId {
        ChannelId::with_sequence(0)
    }

    #[test]
    fn channel_paths() {
        assert_eq!(
            Path::ChannelEnd(port(), channel()).to_string(),
            "channelEnds/ports/transfer/channels/channel-0"
        );
        assert_eq!(
            Path::ChannelUpgrade(port(), channel()).to_string(),
            "channelUpgrades/ports/transfer/channels/channel-0"
        );
        assert_eq!(
            Path::UpgradeErrorReceipt(port(), channel()).to_string(),
            "channelUpgradeErrors/ports/transfer/channels/channel-0"
        );
    }

    #[test]
    fn client_paths() {
        let client_id = ClientId::new("06-solomachine-0").unwrap();
        assert_eq!(
            Path::ClientState(client_id.clone()).to_string(),
            "clients/06-solomachine-0/clientState"
        );
        assert_eq!(
            Path::ClientConsensusState {
                client_id,
                height: Height::new(0, 4)
            }
            .to_string(),
            "clients/06-solomachine-0/consensusStates/0-4"
        );
    }

    #[test]
    fn packet_commitment_is_under_its_prefix() {
        let path = Path::packet_commitment(&port(), &channel(), 12).to_string();
        assert_eq!(
            path,
            "packetCommitments/ports/transfer/channels/channel-0/sequences/12"
        );
        assert!(path.starts_with(&Path::packet_commitment_prefix(&port(), &channel())));
    }

    #[test]
    fn packet_ack_and_receipt_paths() {
        assert_eq!(
            Path::packet_acknowledgement(&port(), &channel(), 1).to_string(),
            "packetAcks/ports/transfer/channels/channel-0/sequences/1"
        );
        assert_eq!(
            Path::packet_receipt(&port(), &channel(), 1).to_string(),
            "packetReceipts/ports/transfer/channels/channel-0/sequences/1"
        );
    }
}
