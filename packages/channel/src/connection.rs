//! Connection ends. The connection handshake runs outside this crate; the
//! host writes connection ends and channels only read them.

use borsh::{BorshDeserialize, BorshSerialize};
use interchain_commitment::{CommitmentPrefix, DelayPeriod};
use interchain_host::{ClientId, ConnectionId};
use interchain_utils::ensure;
use serde::{Deserialize, Serialize};

use crate::{channel::Ordering, error::ChannelError};

/// Identifier of the default connection version.
pub const DEFAULT_VERSION_IDENTIFIER: &str = "1";

/// Feature string allowing ordered channels.
pub const ORDER_ORDERED: &str = "ORDER_ORDERED";

/// Feature string allowing unordered channels.
pub const ORDER_UNORDERED: &str = "ORDER_UNORDERED";

/// Lifecycle of a connection end.
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
#[allow(missing_docs, clippy::module_name_repetitions)]
pub enum ConnectionState {
    Uninitialized = 0,
    Init = 1,
    TryOpen = 2,
    Open = 3,
}

/// A negotiated connection version and the channel features it permits.
#[derive(
    Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct Version {
    /// Version identifier
    pub identifier: String,
    /// Supported features, e.g. channel orderings
    pub features: Vec<String>,
}

impl Default for Version {
    fn default() -> Self {
        Self {
            identifier: DEFAULT_VERSION_IDENTIFIER.to_string(),
            features: vec![ORDER_ORDERED.to_string(), ORDER_UNORDERED.to_string()],
        }
    }
}

impl Version {
    /// Whether `feature` is in the feature set.
    #[must_use]
    pub fn verify_supported_feature(&self, feature: &str) -> bool {
        self.features.iter().any(|f| f == feature)
    }
}

/// The other end of a connection.
#[derive(
    Clone, Debug, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct ConnectionCounterparty {
    /// Client on the counterparty tracking this chain
    pub client_id: ClientId,
    /// Connection id on the counterparty
    pub connection_id: ConnectionId,
    /// Prefix under which the counterparty commits its state
    pub prefix: CommitmentPrefix,
}

/// A connection end as stored at `connections/{id}`.
#[derive(
    Clone, Debug, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
#[allow(clippy::module_name_repetitions)]
pub struct ConnectionEnd {
    /// Lifecycle state
    pub state: ConnectionState,
    /// Client on this chain tracking the counterparty
    pub client_id: ClientId,
    /// The counterparty end
    pub counterparty: ConnectionCounterparty,
    /// Negotiated versions
    pub versions: Vec<Version>,
    /// Time a proof must wait after its height was processed
    pub delay_period_ns: u64,
}

impl ConnectionEnd {
    /// Whether the connection is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state == ConnectionState::Open
    }

    /// Fails unless the connection is open.
    /// # Errors
    /// Returns [`ChannelError::InvalidConnectionState`].
    pub fn ensure_open(&self, connection_id: &ConnectionId) -> Result<(), ChannelError> {
        ensure!(
            self.is_open(),
            ChannelError::InvalidConnectionState {
                connection_id: connection_id.clone(),
                state: self.state,
            }
        );
        Ok(())
    }

    /// Whether a channel of `ordering` may run over this connection.
    #[must_use]
    pub fn supports_ordering(&self, ordering: Ordering) -> bool {
        self.versions
            .iter()
            .any(|v| v.verify_supported_feature(ordering.as_str()))
    }

    /// Delay period applied to proofs verified over this connection.
    #[must_use]
    pub const fn delay_period(&self, max_expected_time_per_block_ns: u64) -> DelayPeriod {
        DelayPeriod::from_time(self.delay_period_ns, max_expected_time_per_block_ns)
    }
}
