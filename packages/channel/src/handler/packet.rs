//! Packet lifecycle: send, receive, acknowledge and time out.
//!
//! The sender keeps a commitment per packet until it is acknowledged or
//! timed out. Settling packets of a flushing channel can complete its flush.

use interchain_client::module;
use interchain_commitment::packet::{acknowledgement_commitment, RECEIPT_VALUE};
use interchain_host::{
    events::{IbcEvent, PacketEvent},
    ChannelId, Context, Height, KvStore, Path, PortId, Timeout,
};
use interchain_utils::ensure;
use tracing::debug;

use super::{chan_close::close_channel, ensure_state, upgrade::check_flush_complete};
use crate::{
    channel::{ChannelEnd, Ordering, State},
    error::ChannelError,
    msgs::{MsgAcknowledgement, MsgRecvPacket, MsgTimeout},
    packet::Packet,
    state, verify,
};

fn packet_event(
    packet: &Packet,
    channel: &ChannelEnd,
    acknowledgement: Option<&[u8]>,
) -> Result<PacketEvent, ChannelError> {
    Ok(PacketEvent {
        sequence: packet.sequence,
        source_port: packet.source_port.clone(),
        source_channel: packet.source_channel.clone(),
        destination_port: packet.destination_port.clone(),
        destination_channel: packet.destination_channel.clone(),
        timeout_height: packet.timeout_height,
        timeout_timestamp: packet.timeout_timestamp,
        data_hex: hex::encode(&packet.data),
        ack_hex: acknowledgement.map(hex::encode),
        ordering: channel.ordering.to_string(),
        connection_id: channel.connection_id()?.clone(),
    })
}

/// `port_id`/`channel_id` is the far end of `channel`.
fn ensure_counterparty(
    local_channel_id: &ChannelId,
    channel: &ChannelEnd,
    port_id: &PortId,
    channel_id: &ChannelId,
) -> Result<(), ChannelError> {
    ensure!(
        channel.counterparty.port_id == *port_id
            && channel.counterparty.channel_id.as_ref() == Some(channel_id),
        ChannelError::InvalidPacketEndpoints(local_channel_id.clone())
    );
    Ok(())
}

/// Reads the sender's commitment and checks it matches `packet`.
fn ensure_committed<S: KvStore>(
    ctx: &Context<'_, S>,
    packet: &Packet,
) -> Result<Path, ChannelError> {
    let path = Path::packet_commitment(
        &packet.source_port,
        &packet.source_channel,
        packet.sequence,
    );
    let stored = ctx
        .read_raw(&path)
        .ok_or(ChannelError::PacketCommitmentNotFound(packet.sequence))?;
    ensure!(
        stored == packet.commitment(),
        ChannelError::PacketCommitmentMismatch(packet.sequence)
    );
    Ok(path)
}

/// Commits to a new packet on an open channel. Returns its sequence.
///
/// Sending stays possible while this end has only proposed an upgrade;
/// once flushing starts no new packets go out.
/// # Errors
/// Fails on a closed or flushing channel, empty data, a timeout without
/// height and time, an inactive client or a timeout already reached on the
/// counterparty as far as the client knows.
pub fn send_packet<S: KvStore>(
    ctx: &mut Context<'_, S>,
    source_port: &PortId,
    source_channel: &ChannelId,
    timeout_height: Height,
    timeout_timestamp: u64,
    data: Vec<u8>,
) -> Result<u64, ChannelError> {
    let channel = state::get_channel(ctx, source_port, source_channel)?;
    ensure_state(source_channel, &channel, &[State::Open, State::InitUpgrade])?;
    let timeout = Timeout::new(timeout_height, timeout_timestamp);
    ensure!(timeout.is_valid(), ChannelError::InvalidTimeout);
    ensure!(!data.is_empty(), ChannelError::EmptyPacketData);

    let connection = state::get_connection(ctx, channel.connection_id()?)?;
    module::ensure_active(ctx, &connection.client_id)?;
    let latest_height = module::latest_height(ctx, &connection.client_id)?;
    let latest_timestamp =
        module::timestamp_at_height(ctx, &connection.client_id, latest_height)?;

    let sequence = state::next_sequence_send(ctx, source_port, source_channel)?;
    ensure!(
        !timeout.has_elapsed(latest_height, latest_timestamp),
        ChannelError::PacketTimedOut { sequence, timeout }
    );

    let packet = Packet {
        sequence,
        source_port: source_port.clone(),
        source_channel: source_channel.clone(),
        destination_port: channel.counterparty.port_id.clone(),
        destination_channel: channel.counterparty.channel_id()?.clone(),
        data,
        timeout_height,
        timeout_timestamp,
    };
    ctx.write_raw(
        &Path::packet_commitment(source_port, source_channel, sequence),
        packet.commitment().to_vec(),
    );
    state::set_sequence(
        ctx,
        &Path::NextSequenceSend(source_port.clone(), source_channel.clone()),
        sequence.saturating_add(1),
    )?;

    debug!(%source_port, %source_channel, sequence, "packet sent");
    ctx.emit(IbcEvent::SendPacket(packet_event(&packet, &channel, None)?));
    Ok(sequence)
}

/// Receives a packet after proving the sender's commitment.
///
/// A flushing channel still takes packets the counterparty sent before its
/// upgrade started, nothing after.
/// # Errors
/// Fails on a wrong state or endpoints, a passed timeout, a failed proof,
/// an out of order sequence or a packet received before.
pub fn recv_packet<S: KvStore>(
    ctx: &mut Context<'_, S>,
    msg: &MsgRecvPacket,
) -> Result<(), ChannelError> {
    let packet = &msg.packet;
    let (port_id, channel_id) = (&packet.destination_port, &packet.destination_channel);
    let channel = state::get_channel(ctx, port_id, channel_id)?;
    match channel.state {
        State::Open | State::InitUpgrade => {}
        State::FlushUpgrade | State::FlushComplete => {
            let boundary =
                state::get_counterparty_upgrade(ctx, port_id, channel_id)?.latest_sequence_send;
            ensure!(
                packet.sequence <= boundary,
                ChannelError::PacketBeyondFlushBoundary {
                    sequence: packet.sequence,
                    boundary,
                }
            );
        }
        other => {
            return Err(ChannelError::InvalidChannelState {
                channel_id: channel_id.clone(),
                state: other,
            })
        }
    }
    ensure_counterparty(channel_id, &channel, &packet.source_port, &packet.source_channel)?;
    let connection = state::get_open_connection(ctx, channel.connection_id()?)?;

    let timeout = packet.timeout();
    ensure!(
        !timeout.has_elapsed(ctx.env().height, ctx.env().timestamp),
        ChannelError::PacketTimedOut {
            sequence: packet.sequence,
            timeout,
        }
    );

    verify::verify_packet_commitment(
        ctx,
        &connection,
        msg.proof_height,
        &msg.proof_commitment,
        &packet.source_port,
        &packet.source_channel,
        packet.sequence,
        packet.commitment(),
    )?;

    match channel.ordering {
        Ordering::Ordered => {
            let next = state::next_sequence_recv(ctx, port_id, channel_id)?;
            ensure!(
                packet.sequence >= next,
                ChannelError::PacketAlreadyReceived(packet.sequence)
            );
            ensure!(
                packet.sequence == next,
                ChannelError::PacketSequenceOutOfOrder {
                    expected: next,
                    actual: packet.sequence,
                }
            );
            state::set_sequence(
                ctx,
                &Path::NextSequenceRecv(port_id.clone(), channel_id.clone()),
                next.saturating_add(1),
            )?;
        }
        Ordering::Unordered => {
            let receipt = Path::packet_receipt(port_id, channel_id, packet.sequence);
            let start = state::recv_start_sequence(ctx, port_id, channel_id)?;
            ensure!(
                packet.sequence >= start && !ctx.contains(&receipt),
                ChannelError::PacketAlreadyReceived(packet.sequence)
            );
            ctx.write_raw(&receipt, RECEIPT_VALUE.to_vec());
        }
    }

    debug!(%port_id, %channel_id, sequence = packet.sequence, "packet received");
    ctx.emit(IbcEvent::RecvPacket(packet_event(packet, &channel, None)?));
    Ok(())
}

/// Records the application's acknowledgement of a received packet.
/// # Errors
/// Fails if the acknowledgement is empty, the channel is closed or one was
/// already written.
pub fn write_acknowledgement<S: KvStore>(
    ctx: &mut Context<'_, S>,
    packet: &Packet,
    acknowledgement: &[u8],
) -> Result<(), ChannelError> {
    ensure!(
        !acknowledgement.is_empty(),
        ChannelError::EmptyAcknowledgement
    );
    let (port_id, channel_id) = (&packet.destination_port, &packet.destination_channel);
    let channel = state::get_channel(ctx, port_id, channel_id)?;
    ensure_state(
        channel_id,
        &channel,
        &[
            State::Open,
            State::InitUpgrade,
            State::FlushUpgrade,
            State::FlushComplete,
        ],
    )?;
    let path = Path::packet_acknowledgement(port_id, channel_id, packet.sequence);
    ensure!(
        !ctx.contains(&path),
        ChannelError::AcknowledgementExists(packet.sequence)
    );
    ctx.write_raw(&path, acknowledgement_commitment(acknowledgement).to_vec());

    debug!(%port_id, %channel_id, sequence = packet.sequence, "acknowledgement written");
    ctx.emit(IbcEvent::WriteAcknowledgement(packet_event(
        packet,
        &channel,
        Some(acknowledgement),
    )?));
    Ok(())
}

/// Settles a sent packet with the counterparty's proven acknowledgement.
/// # Errors
/// Fails on a wrong state or endpoints, an unknown or mismatched packet, a
/// failed proof or an out of order acknowledgement.
pub fn acknowledge_packet<S: KvStore>(
    ctx: &mut Context<'_, S>,
    msg: &MsgAcknowledgement,
) -> Result<(), ChannelError> {
    let packet = &msg.packet;
    let (port_id, channel_id) = (&packet.source_port, &packet.source_channel);
    let channel = state::get_channel(ctx, port_id, channel_id)?;
    ensure_state(
        channel_id,
        &channel,
        &[State::Open, State::InitUpgrade, State::FlushUpgrade],
    )?;
    ensure_counterparty(
        channel_id,
        &channel,
        &packet.destination_port,
        &packet.destination_channel,
    )?;
    let connection = state::get_open_connection(ctx, channel.connection_id()?)?;
    let commitment_path = ensure_committed(ctx, packet)?;

    verify::verify_packet_acknowledgement(
        ctx,
        &connection,
        msg.proof_height,
        &msg.proof_acked,
        &packet.destination_port,
        &packet.destination_channel,
        packet.sequence,
        &msg.acknowledgement,
    )?;

    if channel.ordering == Ordering::Ordered {
        let next = state::next_sequence_ack(ctx, port_id, channel_id)?;
        ensure!(
            packet.sequence == next,
            ChannelError::PacketSequenceOutOfOrder {
                expected: next,
                actual: packet.sequence,
            }
        );
        state::set_sequence(
            ctx,
            &Path::NextSequenceAck(port_id.clone(), channel_id.clone()),
            next.saturating_add(1),
        )?;
    }
    ctx.remove(&commitment_path);

    debug!(%port_id, %channel_id, sequence = packet.sequence, "packet acknowledged");
    ctx.emit(IbcEvent::AcknowledgePacket(packet_event(
        packet,
        &channel,
        Some(&msg.acknowledgement),
    )?));
    check_flush_complete(ctx, port_id, channel_id, channel)
}

/// Settles a sent packet the counterparty never received before its
/// timeout. A timed out packet closes an ordered channel.
/// # Errors
/// Fails on a wrong state or endpoints, an unknown or mismatched packet, a
/// packet the counterparty did receive, a failed proof or a timeout not yet
/// reached at the proof height.
pub fn timeout_packet<S: KvStore>(
    ctx: &mut Context<'_, S>,
    msg: &MsgTimeout,
) -> Result<(), ChannelError> {
    let packet = &msg.packet;
    let (port_id, channel_id) = (&packet.source_port, &packet.source_channel);
    let mut channel = state::get_channel(ctx, port_id, channel_id)?;
    ensure_state(
        channel_id,
        &channel,
        &[State::Open, State::InitUpgrade, State::FlushUpgrade],
    )?;
    ensure_counterparty(
        channel_id,
        &channel,
        &packet.destination_port,
        &packet.destination_channel,
    )?;
    let connection = state::get_open_connection(ctx, channel.connection_id()?)?;
    let commitment_path = ensure_committed(ctx, packet)?;

    match channel.ordering {
        Ordering::Ordered => {
            ensure!(
                msg.next_sequence_recv <= packet.sequence,
                ChannelError::PacketAlreadyReceived(packet.sequence)
            );
            verify::verify_next_sequence_recv(
                ctx,
                &connection,
                msg.proof_height,
                &msg.proof_unreceived,
                &packet.destination_port,
                &packet.destination_channel,
                msg.next_sequence_recv,
            )?;
        }
        Ordering::Unordered => verify::verify_packet_receipt_absence(
            ctx,
            &connection,
            msg.proof_height,
            &msg.proof_unreceived,
            &packet.destination_port,
            &packet.destination_channel,
            packet.sequence,
        )?,
    }

    let timeout = packet.timeout();
    let proof_timestamp =
        module::timestamp_at_height(ctx, &connection.client_id, msg.proof_height)?;
    ensure!(
        timeout.has_elapsed(msg.proof_height, proof_timestamp),
        ChannelError::PacketTimeoutNotReached {
            sequence: packet.sequence,
            timeout,
        }
    );
    ctx.remove(&commitment_path);

    debug!(%port_id, %channel_id, sequence = packet.sequence, "packet timed out");
    ctx.emit(IbcEvent::TimeoutPacket(packet_event(packet, &channel, None)?));
    match channel.ordering {
        Ordering::Ordered => close_channel(ctx, port_id, channel_id, &mut channel),
        Ordering::Unordered => check_flush_complete(ctx, port_id, channel_id, channel),
    }
}
