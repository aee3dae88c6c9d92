//! Packets.

use borsh::{BorshDeserialize, BorshSerialize};
use interchain_commitment::packet::packet_commitment;
use interchain_host::{ChannelId, Height, PortId, Timeout};
use serde::{Deserialize, Serialize};

/// A packet sent over a channel.
#[derive(
    Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct Packet {
    /// Send sequence on the source channel
    pub sequence: u64,
    /// Sending port
    pub source_port: PortId,
    /// Sending channel
    pub source_channel: ChannelId,
    /// Receiving port
    pub destination_port: PortId,
    /// Receiving channel
    pub destination_channel: ChannelId,
    /// Application payload
    #[serde(with = "interchain_utils::serde::hex_bytes")]
    pub data: Vec<u8>,
    /// Receiving chain height after which the packet times out
    pub timeout_height: Height,
    /// Receiving chain time after which the packet times out
    pub timeout_timestamp: u64,
}

impl Packet {
    /// Deadline on the receiving chain.
    #[must_use]
    pub const fn timeout(&self) -> Timeout {
        Timeout::new(self.timeout_height, self.timeout_timestamp)
    }

    /// Commitment stored by the sender.
    #[must_use]
    pub fn commitment(&self) -> [u8; 32] {
        packet_commitment(self.timeout_height, self.timeout_timestamp, &self.data)
    }
}
