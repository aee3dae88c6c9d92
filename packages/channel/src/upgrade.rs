//! Upgrade proposals and error receipts.

use borsh::{BorshDeserialize, BorshSerialize};
use interchain_host::{ConnectionId, Timeout};
use serde::{Deserialize, Serialize};

use crate::channel::Ordering;

/// Channel fields an upgrade renegotiates.
#[derive(
    Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct UpgradeFields {
    /// New ordering
    pub ordering: Ordering,
    /// New connection, exactly one hop
    pub connection_hops: Vec<ConnectionId>,
    /// New application version
    pub version: String,
}

/// An upgrade stored at `channelUpgrades/...` (our proposal) or
/// `channelCounterpartyUpgrades/...` (the counterparty's).
#[derive(
    Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct Upgrade {
    /// Proposed fields
    pub fields: UpgradeFields,
    /// Deadline on the counterparty for completing the upgrade
    pub timeout: Timeout,
    /// Last packet sequence sent before flushing began. Zero until the
    /// upgrade enters the flush phase.
    pub latest_sequence_send: u64,
}

/// Record of an aborted upgrade, stored at `channelUpgradeErrors/...` so the
/// counterparty can prove it.
#[derive(
    Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct ErrorReceipt {
    /// Upgrade sequence the abort happened at
    pub sequence: u64,
    /// Reason
    pub message: String,
}
