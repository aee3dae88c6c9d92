//! Channel ends and their states.

use std::fmt;

use borsh::{BorshDeserialize, BorshSerialize};
use interchain_host::{ChannelId, ConnectionId, PortId};
use serde::{Deserialize, Serialize};

use crate::{error::ChannelError, upgrade::UpgradeFields};

/// Lifecycle of a channel end.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    BorshSerialize,
    BorshDeserialize,
)]
#[borsh(use_discriminant = true)]
#[repr(u8)]
pub enum State {
    /// Default state
    Uninitialized = 0,
    /// Opening started on this end
    Init = 1,
    /// Opening acknowledged by this end
    TryOpen = 2,
    /// Packets may flow
    Open = 3,
    /// Terminal
    Closed = 4,
    /// This end proposed an upgrade
    InitUpgrade = 5,
    /// Both ends agreed on an upgrade; in-flight packets are draining
    FlushUpgrade = 6,
    /// This end has no more in-flight packets
    FlushComplete = 7,
}

impl State {
    /// String form used in events and errors.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Uninitialized => "STATE_UNINITIALIZED_UNSPECIFIED",
            Self::Init => "STATE_INIT",
            Self::TryOpen => "STATE_TRYOPEN",
            Self::Open => "STATE_OPEN",
            Self::Closed => "STATE_CLOSED",
            Self::InitUpgrade => "STATE_INITUPGRADE",
            Self::FlushUpgrade => "STATE_FLUSHING",
            Self::FlushComplete => "STATE_FLUSHCOMPLETE",
        }
    }

    /// An upgrade is in progress on this end.
    #[must_use]
    pub const fn is_upgrading(&self) -> bool {
        matches!(
            self,
            Self::InitUpgrade | Self::FlushUpgrade | Self::FlushComplete
        )
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Packet delivery guarantee of a channel.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    BorshSerialize,
    BorshDeserialize,
)]
#[borsh(use_discriminant = true)]
#[repr(u8)]
pub enum Ordering {
    /// Packets may be delivered in any order
    Unordered = 1,
    /// Packets are delivered in send order
    Ordered = 2,
}

impl Ordering {
    /// Connection feature string for this ordering.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Unordered => crate::connection::ORDER_UNORDERED,
            Self::Ordered => crate::connection::ORDER_ORDERED,
        }
    }
}

impl fmt::Display for Ordering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The other end of a channel. The channel id is unknown until the
/// counterparty has run `ChanOpenTry`.
#[derive(
    Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct Counterparty {
    /// Port on the counterparty
    pub port_id: PortId,
    /// Channel on the counterparty
    pub channel_id: Option<ChannelId>,
}

impl Counterparty {
    /// Creates a counterparty.
    #[must_use]
    pub const fn new(port_id: PortId, channel_id: Option<ChannelId>) -> Self {
        Self {
            port_id,
            channel_id,
        }
    }

    /// The counterparty channel id.
    /// # Errors
    /// Returns [`ChannelError::MissingCounterpartyChannelId`] before the
    /// counterparty end exists.
    pub fn channel_id(&self) -> Result<&ChannelId, ChannelError> {
        self.channel_id
            .as_ref()
            .ok_or(ChannelError::MissingCounterpartyChannelId)
    }
}

/// A channel end as stored at `channelEnds/ports/{port}/channels/{channel}`.
#[derive(
    Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
#[allow(clippy::module_name_repetitions)]
pub struct ChannelEnd {
    /// Lifecycle state
    pub state: State,
    /// Delivery guarantee
    pub ordering: Ordering,
    /// The other end
    pub counterparty: Counterparty,
    /// Connections the channel runs over, always exactly one
    pub connection_hops: Vec<ConnectionId>,
    /// Application version
    pub version: String,
    /// Number of upgrade attempts so far
    pub upgrade_sequence: u64,
}

impl ChannelEnd {
    /// Creates a channel end.
    #[must_use]
    pub const fn new(
        state: State,
        ordering: Ordering,
        counterparty: Counterparty,
        connection_hops: Vec<ConnectionId>,
        version: String,
        upgrade_sequence: u64,
    ) -> Self {
        Self {
            state,
            ordering,
            counterparty,
            connection_hops,
            version,
            upgrade_sequence,
        }
    }

    /// The single connection the channel runs over.
    /// # Errors
    /// Returns [`ChannelError::InvalidConnectionHops`] unless there is
    /// exactly one hop.
    pub fn connection_id(&self) -> Result<&ConnectionId, ChannelError> {
        single_hop(&self.connection_hops)
    }

    /// The fields an upgrade may change.
    #[must_use]
    pub fn fields(&self) -> UpgradeFields {
        UpgradeFields {
            ordering: self.ordering,
            connection_hops: self.connection_hops.clone(),
            version: self.version.clone(),
        }
    }

    /// Adopts upgraded fields.
    pub fn set_fields(&mut self, fields: UpgradeFields) {
        self.ordering = fields.ordering;
        self.connection_hops = fields.connection_hops;
        self.version = fields.version;
    }
}

/// The only element of `hops`.
/// # Errors
/// Returns [`ChannelError::InvalidConnectionHops`] unless there is exactly
/// one hop.
pub fn single_hop(hops: &[ConnectionId]) -> Result<&ConnectionId, ChannelError> {
    match hops {
        [hop] => Ok(hop),
        _ => Err(ChannelError::InvalidConnectionHops(hops.len())),
    }
}

#[cfg(test)]
mod tests {
    use interchain_host::codec;

    use super::*;

    fn channel() -> ChannelEnd {
        ChannelEnd::new(
            State::Open,
            Ordering::Unordered,
            Counterparty::new(PortId::new("transfer").unwrap(), None),
            vec![ConnectionId::with_sequence(0)],
            "ics20-1".into(),
            0,
        )
    }

    #[test]
    fn exactly_one_hop() {
        let mut channel = channel();
        assert_eq!(
            channel.connection_id().unwrap(),
            &ConnectionId::with_sequence(0)
        );
        channel.connection_hops.push(ConnectionId::with_sequence(1));
        assert_eq!(
            channel.connection_id(),
            Err(ChannelError::InvalidConnectionHops(2))
        );
        assert_eq!(single_hop(&[]), Err(ChannelError::InvalidConnectionHops(0)));
    }

    #[test]
    fn upgrade_sequence_is_part_of_the_encoding() {
        let mut bumped = channel();
        bumped.upgrade_sequence = 1;
        assert_ne!(
            codec::encode(&channel()).unwrap(),
            codec::encode(&bumped).unwrap()
        );
    }

    #[test]
    fn set_fields_replaces_only_upgradable_fields() {
        let mut channel = channel();
        let mut fields = channel.fields();
        fields.ordering = Ordering::Ordered;
        fields.version = "ics20-2".into();
        channel.set_fields(fields.clone());
        assert_eq!(channel.fields(), fields);
        assert_eq!(channel.state, State::Open);
        assert!(channel.counterparty.channel_id().is_err());
    }
}
