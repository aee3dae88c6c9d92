//! Channel closing. `Closed` is terminal and discards any upgrade in
//! progress.

use interchain_host::{events::IbcEvent, ChannelId, Context, KvStore, PortId};
use interchain_utils::ensure;
use tracing::info;

use super::channel_event;
use crate::{
    channel::{ChannelEnd, Counterparty, State},
    error::ChannelError,
    msgs::{MsgChannelCloseConfirm, MsgChannelCloseInit},
    state, verify,
};

fn ensure_not_closed(channel_id: &ChannelId, channel: &ChannelEnd) -> Result<(), ChannelError> {
    ensure!(
        channel.state != State::Closed,
        ChannelError::ChannelClosed(channel_id.clone())
    );
    Ok(())
}

/// Moves a channel to `Closed` and drops its upgrade records.
/// # Errors
/// Fails if encoding fails.
pub(crate) fn close_channel<S: KvStore>(
    ctx: &mut Context<'_, S>,
    port_id: &PortId,
    channel_id: &ChannelId,
    channel: &mut ChannelEnd,
) -> Result<(), ChannelError> {
    channel.state = State::Closed;
    state::store_channel(ctx, port_id, channel_id, channel)?;
    state::delete_upgrade_info(ctx, port_id, channel_id);
    Ok(())
}

/// Closes this end unilaterally.
/// # Errors
/// Fails if the channel is absent or closed, or its connection is not open.
pub fn chan_close_init<S: KvStore>(
    ctx: &mut Context<'_, S>,
    msg: &MsgChannelCloseInit,
) -> Result<(), ChannelError> {
    let mut channel = state::get_channel(ctx, &msg.port_id, &msg.channel_id)?;
    ensure_not_closed(&msg.channel_id, &channel)?;
    state::get_open_connection(ctx, channel.connection_id()?)?;

    close_channel(ctx, &msg.port_id, &msg.channel_id, &mut channel)?;

    info!(port_id = %msg.port_id, channel_id = %msg.channel_id, "channel close init");
    ctx.emit(IbcEvent::CloseInit(channel_event(
        &msg.port_id,
        &msg.channel_id,
        &channel,
    )?));
    Ok(())
}

/// Closes this end after proving the counterparty end is closed.
/// # Errors
/// Fails if the channel is absent or closed, its connection is not open or
/// the proof does not verify.
pub fn chan_close_confirm<S: KvStore>(
    ctx: &mut Context<'_, S>,
    msg: &MsgChannelCloseConfirm,
) -> Result<(), ChannelError> {
    let mut channel = state::get_channel(ctx, &msg.port_id, &msg.channel_id)?;
    ensure_not_closed(&msg.channel_id, &channel)?;
    let connection = state::get_open_connection(ctx, channel.connection_id()?)?;

    let expected = ChannelEnd::new(
        State::Closed,
        channel.ordering,
        Counterparty::new(msg.port_id.clone(), Some(msg.channel_id.clone())),
        vec![connection.counterparty.connection_id.clone()],
        channel.version.clone(),
        msg.counterparty_upgrade_sequence,
    );
    verify::verify_channel_state(
        ctx,
        &connection,
        msg.proof_height,
        &msg.proof_init,
        &channel.counterparty.port_id,
        channel.counterparty.channel_id()?,
        &expected,
    )?;

    close_channel(ctx, &msg.port_id, &msg.channel_id, &mut channel)?;

    info!(port_id = %msg.port_id, channel_id = %msg.channel_id, "channel close confirm");
    ctx.emit(IbcEvent::CloseConfirm(channel_event(
        &msg.port_id,
        &msg.channel_id,
        &channel,
    )?));
    Ok(())
}
