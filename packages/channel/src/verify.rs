//! Proofs about counterparty channel state, checked through the light
//! client of the connection.
//!
//! Values are proven exactly as the counterparty stores them: entities in
//! their canonical encoding, packet and acknowledgement commitments as raw
//! hashes. Proof failures surface as [`ChannelError::VerificationFailed`]
//! naming only what was being proven; the client logs the cause.

use interchain_client::{module, ClientError};
use interchain_commitment::{
    packet::acknowledgement_commitment, CommitmentProofBytes, MerklePath,
};
use interchain_host::{codec, ChannelId, Context, Height, KvStore, Path, PortId};

use crate::{
    channel::ChannelEnd,
    connection::ConnectionEnd,
    error::ChannelError,
    upgrade::{ErrorReceipt, Upgrade},
};

fn verification_failed(what: &'static str) -> impl FnOnce(ClientError) -> ChannelError {
    move |err| match err {
        ClientError::VerifyMembershipFailed(_) => ChannelError::VerificationFailed(what),
        other => ChannelError::Client(other),
    }
}

fn verify_value<S: KvStore>(
    ctx: &mut Context<'_, S>,
    connection: &ConnectionEnd,
    height: Height,
    proof: &CommitmentProofBytes,
    path: Path,
    value: Vec<u8>,
    what: &'static str,
) -> Result<(), ChannelError> {
    let delay = connection.delay_period(ctx.params().max_expected_time_per_block_ns);
    let path = MerklePath::new(connection.counterparty.prefix.clone(), path);
    module::verify_membership(
        ctx,
        &connection.client_id,
        height,
        delay,
        proof,
        &path,
        value,
    )
    .map_err(verification_failed(what))
}

fn verify_absence<S: KvStore>(
    ctx: &mut Context<'_, S>,
    connection: &ConnectionEnd,
    height: Height,
    proof: &CommitmentProofBytes,
    path: Path,
    what: &'static str,
) -> Result<(), ChannelError> {
    let delay = connection.delay_period(ctx.params().max_expected_time_per_block_ns);
    let path = MerklePath::new(connection.counterparty.prefix.clone(), path);
    module::verify_non_membership(ctx, &connection.client_id, height, delay, proof, &path)
        .map_err(verification_failed(what))
}

/// Proves the counterparty stored `expected` as its channel end.
/// # Errors
/// Returns [`ChannelError::VerificationFailed`] or the client's error.
pub fn verify_channel_state<S: KvStore>(
    ctx: &mut Context<'_, S>,
    connection: &ConnectionEnd,
    height: Height,
    proof: &CommitmentProofBytes,
    port_id: &PortId,
    channel_id: &ChannelId,
    expected: &ChannelEnd,
) -> Result<(), ChannelError> {
    let path = Path::ChannelEnd(port_id.clone(), channel_id.clone());
    verify_value(ctx, connection, height, proof, path, codec::encode(expected)?, "channel")
}

/// Proves the counterparty stored `upgrade` as its upgrade proposal.
/// # Errors
/// Returns [`ChannelError::VerificationFailed`] or the client's error.
pub fn verify_channel_upgrade<S: KvStore>(
    ctx: &mut Context<'_, S>,
    connection: &ConnectionEnd,
    height: Height,
    proof: &CommitmentProofBytes,
    port_id: &PortId,
    channel_id: &ChannelId,
    upgrade: &Upgrade,
) -> Result<(), ChannelError> {
    let path = Path::ChannelUpgrade(port_id.clone(), channel_id.clone());
    verify_value(ctx, connection, height, proof, path, codec::encode(upgrade)?, "upgrade")
}

/// Proves the counterparty recorded `receipt` as its latest upgrade abort.
/// # Errors
/// Returns [`ChannelError::VerificationFailed`] or the client's error.
pub fn verify_upgrade_error_receipt<S: KvStore>(
    ctx: &mut Context<'_, S>,
    connection: &ConnectionEnd,
    height: Height,
    proof: &CommitmentProofBytes,
    port_id: &PortId,
    channel_id: &ChannelId,
    receipt: &ErrorReceipt,
) -> Result<(), ChannelError> {
    let path = Path::UpgradeErrorReceipt(port_id.clone(), channel_id.clone());
    verify_value(
        ctx,
        connection,
        height,
        proof,
        path,
        codec::encode(receipt)?,
        "error receipt",
    )
}

/// Proves the counterparty committed to a packet.
/// # Errors
/// Returns [`ChannelError::VerificationFailed`] or the client's error.
#[allow(clippy::too_many_arguments)]
pub fn verify_packet_commitment<S: KvStore>(
    ctx: &mut Context<'_, S>,
    connection: &ConnectionEnd,
    height: Height,
    proof: &CommitmentProofBytes,
    port_id: &PortId,
    channel_id: &ChannelId,
    sequence: u64,
    commitment: [u8; 32],
) -> Result<(), ChannelError> {
    let path = Path::packet_commitment(port_id, channel_id, sequence);
    verify_value(
        ctx,
        connection,
        height,
        proof,
        path,
        commitment.to_vec(),
        "packet commitment",
    )
}

/// Proves the counterparty wrote `acknowledgement` for a packet.
/// # Errors
/// Returns [`ChannelError::VerificationFailed`] or the client's error.
#[allow(clippy::too_many_arguments)]
pub fn verify_packet_acknowledgement<S: KvStore>(
    ctx: &mut Context<'_, S>,
    connection: &ConnectionEnd,
    height: Height,
    proof: &CommitmentProofBytes,
    port_id: &PortId,
    channel_id: &ChannelId,
    sequence: u64,
    acknowledgement: &[u8],
) -> Result<(), ChannelError> {
    let path = Path::packet_acknowledgement(port_id, channel_id, sequence);
    verify_value(
        ctx,
        connection,
        height,
        proof,
        path,
        acknowledgement_commitment(acknowledgement).to_vec(),
        "packet acknowledgement",
    )
}

/// Proves the counterparty has no receipt for a packet.
/// # Errors
/// Returns [`ChannelError::VerificationFailed`] or the client's error.
pub fn verify_packet_receipt_absence<S: KvStore>(
    ctx: &mut Context<'_, S>,
    connection: &ConnectionEnd,
    height: Height,
    proof: &CommitmentProofBytes,
    port_id: &PortId,
    channel_id: &ChannelId,
    sequence: u64,
) -> Result<(), ChannelError> {
    let path = Path::packet_receipt(port_id, channel_id, sequence);
    verify_absence(ctx, connection, height, proof, path, "packet receipt absence")
}

/// Proves the counterparty's next receive sequence of an ordered channel.
/// # Errors
/// Returns [`ChannelError::VerificationFailed`] or the client's error.
pub fn verify_next_sequence_recv<S: KvStore>(
    ctx: &mut Context<'_, S>,
    connection: &ConnectionEnd,
    height: Height,
    proof: &CommitmentProofBytes,
    port_id: &PortId,
    channel_id: &ChannelId,
    next_sequence_recv: u64,
) -> Result<(), ChannelError> {
    let path = Path::NextSequenceRecv(port_id.clone(), channel_id.clone());
    verify_value(
        ctx,
        connection,
        height,
        proof,
        path,
        codec::encode(&next_sequence_recv)?,
        "next sequence receive",
    )
}
