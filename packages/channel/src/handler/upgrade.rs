//! Channel upgrade handshake.
//!
//! `Open -> InitUpgrade -> FlushUpgrade -> FlushComplete -> Open`, with both
//! ends free to propose at the same time. Failures the counterparty has to
//! learn about are returned as [`UpgradeError`]; [`crate::router::dispatch`]
//! turns them into an abort with [`abort_upgrade`] after discarding the
//! failed message's writes.

use interchain_client::module;
use interchain_commitment::CommitmentProofBytes;
use interchain_host::{
    events::{IbcEvent, UpgradeErrorEvent},
    ChannelId, Context, Height, KvStore, Path, PortId, Timeout,
};
use interchain_utils::ensure;
use tracing::{info, warn};

use super::{ensure_state, upgrade_event};
use crate::{
    channel::{single_hop, ChannelEnd, Counterparty, Ordering, State},
    connection::ConnectionEnd,
    error::{ChannelError, UpgradeError},
    msgs::{
        MsgChannelUpgradeAck, MsgChannelUpgradeCancel, MsgChannelUpgradeConfirm,
        MsgChannelUpgradeInit, MsgChannelUpgradeOpen, MsgChannelUpgradeTimeout,
        MsgChannelUpgradeTry,
    },
    state,
    upgrade::{Upgrade, UpgradeFields},
    verify,
};

const UPGRADING: [State; 3] = [State::InitUpgrade, State::FlushUpgrade, State::FlushComplete];

/// Proofs of the counterparty channel end and its upgrade, both at `height`.
#[derive(Clone, Copy, Debug)]
pub struct UpgradeProofs<'a> {
    /// Proof of the channel end
    pub channel: &'a CommitmentProofBytes,
    /// Proof of the upgrade
    pub upgrade: &'a CommitmentProofBytes,
    /// Counterparty height both proofs are at
    pub height: Height,
}

fn elapsed_here<S: KvStore>(ctx: &Context<'_, S>, timeout: &Timeout) -> bool {
    timeout.has_elapsed(ctx.env().height, ctx.env().timestamp)
}

/// Checks that `proposed` is a real change this chain can run: different
/// from the current fields, one open hop supporting the ordering and a
/// non-empty version.
fn validate_upgrade_fields<S: KvStore>(
    ctx: &Context<'_, S>,
    channel: &ChannelEnd,
    proposed: &UpgradeFields,
) -> Result<(), ChannelError> {
    ensure!(
        *proposed != channel.fields(),
        ChannelError::InvalidUpgrade {
            reason: "proposed fields are identical to the current channel".into(),
        }
    );
    ensure!(
        !proposed.version.trim().is_empty(),
        ChannelError::InvalidUpgrade {
            reason: "version must not be empty".into(),
        }
    );
    let connection = state::get_open_connection(ctx, single_hop(&proposed.connection_hops)?)?;
    ensure!(
        connection.supports_ordering(proposed.ordering),
        ChannelError::OrderingNotSupported(proposed.ordering)
    );
    Ok(())
}

/// The counterparty end as we expect it: pointing at us over the
/// counterparty of our connection, with the pre-upgrade fields.
fn expected_counterparty(
    port_id: &PortId,
    channel_id: &ChannelId,
    channel: &ChannelEnd,
    connection: &ConnectionEnd,
    state: State,
    upgrade_sequence: u64,
) -> ChannelEnd {
    ChannelEnd::new(
        state,
        channel.ordering,
        Counterparty::new(port_id.clone(), Some(channel_id.clone())),
        vec![connection.counterparty.connection_id.clone()],
        channel.version.clone(),
        upgrade_sequence,
    )
}

fn verify_counterparty_upgrade<S: KvStore>(
    ctx: &mut Context<'_, S>,
    connection: &ConnectionEnd,
    counterparty: &Counterparty,
    expected: &ChannelEnd,
    upgrade: &Upgrade,
    proofs: UpgradeProofs<'_>,
) -> Result<(), ChannelError> {
    let channel_id = counterparty.channel_id()?;
    verify::verify_channel_state(
        ctx,
        connection,
        proofs.height,
        proofs.channel,
        &counterparty.port_id,
        channel_id,
        expected,
    )?;
    verify::verify_channel_upgrade(
        ctx,
        connection,
        proofs.height,
        proofs.upgrade,
        &counterparty.port_id,
        channel_id,
        upgrade,
    )
}

/// Checks that our proposal and the counterparty's describe the same
/// channel. Every failure aborts the upgrade at `sequence`.
fn check_compatibility<S: KvStore>(
    ctx: &Context<'_, S>,
    local: &UpgradeFields,
    counterparty: &UpgradeFields,
    sequence: u64,
) -> Result<(), ChannelError> {
    let abort = |cause: ChannelError| ChannelError::from(UpgradeError::new(sequence, cause));
    let incompatible = |reason: String| {
        abort(ChannelError::IncompatibleCounterpartyUpgrade { reason })
    };

    ensure!(
        local.ordering == counterparty.ordering,
        incompatible(format!(
            "ordering {} differs from counterparty ordering {}",
            local.ordering, counterparty.ordering
        ))
    );
    let connection_id = single_hop(&local.connection_hops).map_err(abort)?;
    let counterparty_hop = single_hop(&counterparty.connection_hops).map_err(abort)?;
    let connection = state::get_open_connection(ctx, connection_id).map_err(abort)?;
    ensure!(
        connection.counterparty.connection_id == *counterparty_hop,
        incompatible(format!(
            "connection {connection_id} has counterparty {}, counterparty proposed {counterparty_hop}",
            connection.counterparty.connection_id
        ))
    );
    ensure!(
        connection.supports_ordering(local.ordering),
        abort(ChannelError::OrderingNotSupported(local.ordering))
    );
    Ok(())
}

/// Proposes an upgrade of an open channel.
/// Returns the new upgrade sequence.
/// # Errors
/// Fails without side effects if the channel is not open, the fields are
/// unchanged or unusable, or the timeout sets neither height nor time.
pub fn chan_upgrade_init<S: KvStore>(
    ctx: &mut Context<'_, S>,
    msg: &MsgChannelUpgradeInit,
) -> Result<u64, ChannelError> {
    let (port_id, channel_id) = (&msg.port_id, &msg.channel_id);
    let mut channel = state::get_channel(ctx, port_id, channel_id)?;
    ensure_state(channel_id, &channel, &[State::Open])?;
    validate_upgrade_fields(ctx, &channel, &msg.fields)?;

    let timeout = msg
        .timeout
        .unwrap_or_else(|| ctx.params().upgrade_timeout.resolve(ctx.env()));
    ensure!(
        timeout.is_valid(),
        ChannelError::InvalidUpgrade {
            reason: "upgrade timeout must set a height or a timestamp".into(),
        }
    );

    channel.upgrade_sequence = channel.upgrade_sequence.saturating_add(1);
    channel.state = State::InitUpgrade;
    let upgrade = Upgrade {
        fields: msg.fields.clone(),
        timeout,
        latest_sequence_send: 0,
    };
    state::store_channel(ctx, port_id, channel_id, &channel)?;
    state::store_upgrade(ctx, port_id, channel_id, &upgrade)?;

    info!(
        %port_id,
        %channel_id,
        upgrade_sequence = channel.upgrade_sequence,
        "channel upgrade init"
    );
    ctx.emit(IbcEvent::UpgradeInit(upgrade_event(
        port_id,
        channel_id,
        channel.upgrade_sequence,
        &upgrade.fields,
    )));
    Ok(channel.upgrade_sequence)
}

/// Accepts the counterparty's proposal and starts flushing.
///
/// On an open channel the proposal is validated like a local one; on a
/// channel that proposed itself (crossing hellos) both proposals must be
/// identical. Sequences are reconciled as follows: a higher counterparty
/// sequence is adopted, an equal one proceeds and a lower one aborts with
/// an [`UpgradeError`] one above the larger of the two, so the counterparty
/// can retry past it.
/// # Errors
/// Plain errors leave no trace; [`UpgradeError`]s abort the upgrade.
pub fn chan_upgrade_try<S: KvStore>(
    ctx: &mut Context<'_, S>,
    msg: &MsgChannelUpgradeTry,
) -> Result<Upgrade, ChannelError> {
    let (port_id, channel_id) = (&msg.port_id, &msg.channel_id);
    let mut channel = state::get_channel(ctx, port_id, channel_id)?;
    ensure_state(channel_id, &channel, &[State::Open, State::InitUpgrade])?;
    let connection = state::get_open_connection(ctx, channel.connection_id()?)?;

    let counterparty_upgrade = &msg.counterparty_upgrade;
    ensure!(
        !elapsed_here(ctx, &counterparty_upgrade.timeout),
        ChannelError::InvalidUpgrade {
            reason: format!(
                "counterparty upgrade timeout {} has passed",
                counterparty_upgrade.timeout
            ),
        }
    );

    let proposed = UpgradeFields {
        ordering: counterparty_upgrade.fields.ordering,
        connection_hops: msg.proposed_connection_hops.clone(),
        version: counterparty_upgrade.fields.version.clone(),
    };
    let mut upgrade = if channel.state == State::Open {
        validate_upgrade_fields(ctx, &channel, &proposed)?;
        Upgrade {
            fields: proposed,
            timeout: counterparty_upgrade.timeout,
            latest_sequence_send: 0,
        }
    } else {
        let existing = state::get_upgrade(ctx, port_id, channel_id)?;
        ensure!(
            existing.fields == proposed,
            ChannelError::InvalidUpgrade {
                reason: "proposed fields differ from the upgrade already proposed".into(),
            }
        );
        existing
    };

    let expected = expected_counterparty(
        port_id,
        channel_id,
        &channel,
        &connection,
        State::InitUpgrade,
        msg.counterparty_upgrade_sequence,
    );
    verify_counterparty_upgrade(
        ctx,
        &connection,
        &channel.counterparty,
        &expected,
        counterparty_upgrade,
        UpgradeProofs {
            channel: &msg.proof_channel,
            upgrade: &msg.proof_upgrade,
            height: msg.proof_height,
        },
    )?;

    let candidate = if channel.state == State::Open {
        channel.upgrade_sequence.saturating_add(1)
    } else {
        channel.upgrade_sequence
    };
    let counterparty_sequence = msg.counterparty_upgrade_sequence;
    if counterparty_sequence < candidate {
        let retry_at = channel
            .upgrade_sequence
            .max(counterparty_sequence)
            .saturating_add(1);
        return Err(UpgradeError::new(
            retry_at,
            ChannelError::InvalidUpgradeSequence {
                expected: candidate,
                actual: counterparty_sequence,
            },
        )
        .into());
    }
    let sequence = counterparty_sequence;

    check_compatibility(ctx, &upgrade.fields, &counterparty_upgrade.fields, sequence)?;

    upgrade.latest_sequence_send =
        state::next_sequence_send(ctx, port_id, channel_id)?.saturating_sub(1);
    channel.state = State::FlushUpgrade;
    channel.upgrade_sequence = sequence;
    state::store_channel(ctx, port_id, channel_id, &channel)?;
    state::store_upgrade(ctx, port_id, channel_id, &upgrade)?;
    state::store_counterparty_upgrade(ctx, port_id, channel_id, counterparty_upgrade)?;

    info!(%port_id, %channel_id, upgrade_sequence = sequence, "channel upgrade try");
    ctx.emit(IbcEvent::UpgradeTry(upgrade_event(
        port_id,
        channel_id,
        sequence,
        &upgrade.fields,
    )));
    Ok(upgrade)
}

/// Verifies the counterparty channel end (in `counterparty_state` at
/// `counterparty_sequence`) and its upgrade, then checks that both
/// proposals agree.
/// # Errors
/// A sequence mismatch aborts at the larger sequence; incompatible
/// proposals abort at the local sequence.
pub fn start_flush_upgrade_handshake<S: KvStore>(
    ctx: &mut Context<'_, S>,
    port_id: &PortId,
    channel_id: &ChannelId,
    counterparty_state: State,
    counterparty_sequence: u64,
    counterparty_upgrade: &Upgrade,
    proofs: UpgradeProofs<'_>,
) -> Result<(), ChannelError> {
    let channel = state::get_channel(ctx, port_id, channel_id)?;
    let connection = state::get_open_connection(ctx, channel.connection_id()?)?;

    let expected = expected_counterparty(
        port_id,
        channel_id,
        &channel,
        &connection,
        counterparty_state,
        counterparty_sequence,
    );
    verify_counterparty_upgrade(
        ctx,
        &connection,
        &channel.counterparty,
        &expected,
        counterparty_upgrade,
        proofs,
    )?;

    if counterparty_sequence != channel.upgrade_sequence {
        return Err(UpgradeError::new(
            channel.upgrade_sequence.max(counterparty_sequence),
            ChannelError::InvalidUpgradeSequence {
                expected: channel.upgrade_sequence,
                actual: counterparty_sequence,
            },
        )
        .into());
    }

    let upgrade = state::get_upgrade(ctx, port_id, channel_id)?;
    check_compatibility(
        ctx,
        &upgrade.fields,
        &counterparty_upgrade.fields,
        channel.upgrade_sequence,
    )
}

/// Acknowledges the counterparty's `ChanUpgradeTry`. Returns the new state:
/// `FlushComplete` when nothing is in flight, `FlushUpgrade` otherwise.
/// # Errors
/// Plain errors leave no trace; [`UpgradeError`]s abort the upgrade.
pub fn chan_upgrade_ack<S: KvStore>(
    ctx: &mut Context<'_, S>,
    msg: &MsgChannelUpgradeAck,
) -> Result<State, ChannelError> {
    let (port_id, channel_id) = (&msg.port_id, &msg.channel_id);
    let mut channel = state::get_channel(ctx, port_id, channel_id)?;
    ensure_state(
        channel_id,
        &channel,
        &[State::InitUpgrade, State::FlushUpgrade],
    )?;
    let mut upgrade = state::get_upgrade(ctx, port_id, channel_id)?;

    start_flush_upgrade_handshake(
        ctx,
        port_id,
        channel_id,
        State::FlushUpgrade,
        msg.counterparty_upgrade_sequence,
        &msg.counterparty_upgrade,
        UpgradeProofs {
            channel: &msg.proof_channel,
            upgrade: &msg.proof_upgrade,
            height: msg.proof_height,
        },
    )?;

    let timeout = msg.counterparty_upgrade.timeout;
    if elapsed_here(ctx, &timeout) {
        return Err(UpgradeError::new(
            channel.upgrade_sequence,
            ChannelError::UpgradeTimedOut(timeout),
        )
        .into());
    }

    if channel.state == State::InitUpgrade {
        upgrade.latest_sequence_send =
            state::next_sequence_send(ctx, port_id, channel_id)?.saturating_sub(1);
        state::store_upgrade(ctx, port_id, channel_id, &upgrade)?;
    }
    state::store_counterparty_upgrade(ctx, port_id, channel_id, &msg.counterparty_upgrade)?;

    channel.state =
        if state::has_inflight_packets(ctx, port_id, channel_id, upgrade.latest_sequence_send) {
            State::FlushUpgrade
        } else {
            State::FlushComplete
        };
    state::store_channel(ctx, port_id, channel_id, &channel)?;

    info!(%port_id, %channel_id, state = %channel.state, "channel upgrade ack");
    let event = upgrade_event(port_id, channel_id, channel.upgrade_sequence, &upgrade.fields);
    ctx.emit(IbcEvent::UpgradeAck(event.clone()));
    if channel.state == State::FlushComplete {
        ctx.emit(IbcEvent::ChannelFlushComplete(event));
    }
    Ok(channel.state)
}

/// Confirms the counterparty is flushing or done. When both ends are done
/// the channel opens with the new fields right away. Returns the new state.
/// # Errors
/// Plain errors leave no trace; [`UpgradeError`]s abort the upgrade.
pub fn chan_upgrade_confirm<S: KvStore>(
    ctx: &mut Context<'_, S>,
    msg: &MsgChannelUpgradeConfirm,
) -> Result<State, ChannelError> {
    let (port_id, channel_id) = (&msg.port_id, &msg.channel_id);
    let mut channel = state::get_channel(ctx, port_id, channel_id)?;
    ensure_state(channel_id, &channel, &[State::FlushUpgrade])?;
    let counterparty_state = msg.counterparty_channel_state;
    ensure!(
        matches!(
            counterparty_state,
            State::FlushUpgrade | State::FlushComplete
        ),
        ChannelError::InvalidCounterpartyChannelState(counterparty_state)
    );
    let connection = state::get_open_connection(ctx, channel.connection_id()?)?;

    let expected = expected_counterparty(
        port_id,
        channel_id,
        &channel,
        &connection,
        counterparty_state,
        channel.upgrade_sequence,
    );
    verify_counterparty_upgrade(
        ctx,
        &connection,
        &channel.counterparty,
        &expected,
        &msg.counterparty_upgrade,
        UpgradeProofs {
            channel: &msg.proof_channel,
            upgrade: &msg.proof_upgrade,
            height: msg.proof_height,
        },
    )?;

    let timeout = msg.counterparty_upgrade.timeout;
    if elapsed_here(ctx, &timeout) {
        return Err(UpgradeError::new(
            channel.upgrade_sequence,
            ChannelError::UpgradeTimedOut(timeout),
        )
        .into());
    }

    let upgrade = state::get_upgrade(ctx, port_id, channel_id)?;
    state::store_counterparty_upgrade(ctx, port_id, channel_id, &msg.counterparty_upgrade)?;

    let event = upgrade_event(port_id, channel_id, channel.upgrade_sequence, &upgrade.fields);
    if !state::has_inflight_packets(ctx, port_id, channel_id, upgrade.latest_sequence_send) {
        channel.state = State::FlushComplete;
        state::store_channel(ctx, port_id, channel_id, &channel)?;
        ctx.emit(IbcEvent::ChannelFlushComplete(event.clone()));
    }
    info!(%port_id, %channel_id, state = %channel.state, "channel upgrade confirm");
    ctx.emit(IbcEvent::UpgradeConfirm(event));

    if counterparty_state == State::FlushComplete && channel.state == State::FlushComplete {
        open_upgrade(ctx, port_id, channel_id, channel, upgrade)?;
        return Ok(State::Open);
    }
    Ok(channel.state)
}

/// Opens a flushed channel with the new fields once the counterparty is
/// proven done flushing or already open with the new fields.
/// # Errors
/// Fails if the channel is not done flushing or the proof does not verify.
pub fn chan_upgrade_open<S: KvStore>(
    ctx: &mut Context<'_, S>,
    msg: &MsgChannelUpgradeOpen,
) -> Result<(), ChannelError> {
    let (port_id, channel_id) = (&msg.port_id, &msg.channel_id);
    let channel = state::get_channel(ctx, port_id, channel_id)?;
    ensure_state(channel_id, &channel, &[State::FlushComplete])?;
    let upgrade = state::get_upgrade(ctx, port_id, channel_id)?;
    let connection = state::get_open_connection(ctx, channel.connection_id()?)?;

    let expected = match msg.counterparty_channel_state {
        State::FlushComplete => expected_counterparty(
            port_id,
            channel_id,
            &channel,
            &connection,
            State::FlushComplete,
            channel.upgrade_sequence,
        ),
        State::Open => {
            let new_connection =
                state::get_open_connection(ctx, single_hop(&upgrade.fields.connection_hops)?)?;
            ChannelEnd::new(
                State::Open,
                upgrade.fields.ordering,
                Counterparty::new(port_id.clone(), Some(channel_id.clone())),
                vec![new_connection.counterparty.connection_id],
                upgrade.fields.version.clone(),
                channel.upgrade_sequence,
            )
        }
        other => return Err(ChannelError::InvalidCounterpartyChannelState(other)),
    };
    verify::verify_channel_state(
        ctx,
        &connection,
        msg.proof_height,
        &msg.proof_channel,
        &channel.counterparty.port_id,
        channel.counterparty.channel_id()?,
        &expected,
    )?;

    open_upgrade(ctx, port_id, channel_id, channel, upgrade)
}

fn open_upgrade<S: KvStore>(
    ctx: &mut Context<'_, S>,
    port_id: &PortId,
    channel_id: &ChannelId,
    mut channel: ChannelEnd,
    upgrade: Upgrade,
) -> Result<(), ChannelError> {
    let counterparty_upgrade = state::get_counterparty_upgrade(ctx, port_id, channel_id)?;
    match (channel.ordering, upgrade.fields.ordering) {
        (Ordering::Unordered, Ordering::Ordered) => {
            state::set_sequence(
                ctx,
                &Path::NextSequenceRecv(port_id.clone(), channel_id.clone()),
                counterparty_upgrade.latest_sequence_send.saturating_add(1),
            )?;
            state::set_sequence(
                ctx,
                &Path::NextSequenceAck(port_id.clone(), channel_id.clone()),
                upgrade.latest_sequence_send.saturating_add(1),
            )?;
        }
        (Ordering::Ordered, Ordering::Unordered) => {
            let next_recv = state::next_sequence_recv(ctx, port_id, channel_id)?;
            state::set_sequence(
                ctx,
                &Path::RecvStartSequence(port_id.clone(), channel_id.clone()),
                next_recv,
            )?;
        }
        _ => {}
    }

    channel.set_fields(upgrade.fields);
    channel.state = State::Open;
    state::store_channel(ctx, port_id, channel_id, &channel)?;
    state::delete_upgrade_info(ctx, port_id, channel_id);

    info!(
        %port_id,
        %channel_id,
        upgrade_sequence = channel.upgrade_sequence,
        "channel upgrade open"
    );
    ctx.emit(IbcEvent::UpgradeOpen(upgrade_event(
        port_id,
        channel_id,
        channel.upgrade_sequence,
        &channel.fields(),
    )));
    Ok(())
}

/// Aborts an upgrade whose timeout has passed on the counterparty, as seen
/// at the proof height. The counterparty end must be proven not to have
/// completed this upgrade.
/// # Errors
/// Fails if nothing is being upgraded, the counterparty could still open
/// or the timeout has not passed.
pub fn chan_upgrade_timeout<S: KvStore>(
    ctx: &mut Context<'_, S>,
    msg: &MsgChannelUpgradeTimeout,
) -> Result<(), ChannelError> {
    let (port_id, channel_id) = (&msg.port_id, &msg.channel_id);
    let channel = state::get_channel(ctx, port_id, channel_id)?;
    ensure_state(channel_id, &channel, &UPGRADING)?;
    let upgrade = state::get_upgrade(ctx, port_id, channel_id)?;
    let connection = state::get_open_connection(ctx, channel.connection_id()?)?;

    verify::verify_channel_state(
        ctx,
        &connection,
        msg.proof_height,
        &msg.proof_channel,
        &channel.counterparty.port_id,
        channel.counterparty.channel_id()?,
        &msg.counterparty_channel,
    )?;
    let counterparty = &msg.counterparty_channel;
    match counterparty.state {
        State::Open => ensure!(
            counterparty.upgrade_sequence < channel.upgrade_sequence,
            ChannelError::InvalidUpgrade {
                reason: format!(
                    "counterparty is open at upgrade sequence {}, not behind {}",
                    counterparty.upgrade_sequence, channel.upgrade_sequence
                ),
            }
        ),
        State::InitUpgrade | State::FlushUpgrade => {}
        other => return Err(ChannelError::InvalidCounterpartyChannelState(other)),
    }

    let proof_timestamp =
        module::timestamp_at_height(ctx, &connection.client_id, msg.proof_height)?;
    ensure!(
        upgrade.timeout.has_elapsed(msg.proof_height, proof_timestamp),
        ChannelError::UpgradeTimeoutNotReached(upgrade.timeout)
    );

    let err = UpgradeError::new(
        channel.upgrade_sequence,
        ChannelError::UpgradeTimedOut(upgrade.timeout),
    );
    abort_upgrade(ctx, port_id, channel_id, &err)?;
    ctx.emit(IbcEvent::UpgradeTimeout(upgrade_event(
        port_id,
        channel_id,
        channel.upgrade_sequence,
        &channel.fields(),
    )));
    Ok(())
}

/// Aborts the local upgrade after proving the counterparty aborted at a
/// sequence no lower than ours. The channel adopts the receipt's sequence.
/// # Errors
/// Fails if nothing is being upgraded, the receipt is stale or its proof
/// does not verify.
pub fn chan_upgrade_cancel<S: KvStore>(
    ctx: &mut Context<'_, S>,
    msg: &MsgChannelUpgradeCancel,
) -> Result<(), ChannelError> {
    let (port_id, channel_id) = (&msg.port_id, &msg.channel_id);
    let channel = state::get_channel(ctx, port_id, channel_id)?;
    ensure_state(channel_id, &channel, &UPGRADING)?;
    let receipt = &msg.error_receipt;
    let sequence_ok = if channel.state == State::FlushComplete {
        receipt.sequence == channel.upgrade_sequence
    } else {
        receipt.sequence >= channel.upgrade_sequence
    };
    ensure!(
        sequence_ok,
        ChannelError::InvalidUpgradeSequence {
            expected: channel.upgrade_sequence,
            actual: receipt.sequence,
        }
    );
    state::get_upgrade(ctx, port_id, channel_id)?;
    let connection = state::get_open_connection(ctx, channel.connection_id()?)?;

    verify::verify_upgrade_error_receipt(
        ctx,
        &connection,
        msg.proof_height,
        &msg.proof_error_receipt,
        &channel.counterparty.port_id,
        channel.counterparty.channel_id()?,
        receipt,
    )?;

    let err = UpgradeError::new(
        receipt.sequence,
        ChannelError::InvalidUpgrade {
            reason: "cancelled by the counterparty".into(),
        },
    );
    let restored = restore_channel(ctx, port_id, channel_id, &err)?;

    info!(%port_id, %channel_id, upgrade_sequence = receipt.sequence, "channel upgrade cancelled");
    ctx.emit(IbcEvent::UpgradeCancel(upgrade_event(
        port_id,
        channel_id,
        restored.upgrade_sequence,
        &restored.fields(),
    )));
    Ok(())
}

fn restore_channel<S: KvStore>(
    ctx: &mut Context<'_, S>,
    port_id: &PortId,
    channel_id: &ChannelId,
    err: &UpgradeError,
) -> Result<ChannelEnd, ChannelError> {
    let mut channel = state::get_channel(ctx, port_id, channel_id)?;
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
    channel.state = State::Open;
    channel.upgrade_sequence = err.sequence;
    state::store_channel(ctx, port_id, channel_id, &channel)?;
    state::delete_upgrade_info(ctx, port_id, channel_id);
    state::write_error_receipt(ctx, port_id, channel_id, err)?;
    Ok(channel)
}

/// Restores the channel to `Open` with its current fields at
/// `err.sequence`, drops both upgrade records and writes the error receipt
/// the counterparty will prove to cancel its side.
/// # Errors
/// Fails if the channel cannot be restored or the receipt would not
/// supersede the stored one.
pub fn abort_upgrade<S: KvStore>(
    ctx: &mut Context<'_, S>,
    port_id: &PortId,
    channel_id: &ChannelId,
    err: &UpgradeError,
) -> Result<(), ChannelError> {
    restore_channel(ctx, port_id, channel_id, err)?;

    warn!(
        %port_id,
        %channel_id,
        upgrade_sequence = err.sequence,
        cause = %err.cause,
        "channel upgrade aborted"
    );
    ctx.emit(IbcEvent::UpgradeError(UpgradeErrorEvent {
        port_id: port_id.clone(),
        channel_id: channel_id.clone(),
        upgrade_sequence: err.sequence,
        message: err.to_string(),
    }));
    Ok(())
}

/// Moves a flushing channel to `FlushComplete` once its last pre-upgrade
/// packet is settled, or aborts if the counterparty's timeout has passed.
pub(crate) fn check_flush_complete<S: KvStore>(
    ctx: &mut Context<'_, S>,
    port_id: &PortId,
    channel_id: &ChannelId,
    mut channel: ChannelEnd,
) -> Result<(), ChannelError> {
    if channel.state != State::FlushUpgrade {
        return Ok(());
    }
    let counterparty_upgrade = state::get_counterparty_upgrade(ctx, port_id, channel_id)?;
    if elapsed_here(ctx, &counterparty_upgrade.timeout) {
        let err = UpgradeError::new(
            channel.upgrade_sequence,
            ChannelError::UpgradeTimedOut(counterparty_upgrade.timeout),
        );
        return abort_upgrade(ctx, port_id, channel_id, &err);
    }

    let upgrade = state::get_upgrade(ctx, port_id, channel_id)?;
    if !state::has_inflight_packets(ctx, port_id, channel_id, upgrade.latest_sequence_send) {
        channel.state = State::FlushComplete;
        state::store_channel(ctx, port_id, channel_id, &channel)?;
        ctx.emit(IbcEvent::ChannelFlushComplete(upgrade_event(
            port_id,
            channel_id,
            channel.upgrade_sequence,
            &upgrade.fields,
        )));
    }
    Ok(())
}
