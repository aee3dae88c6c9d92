//! Entry point for relayer messages.

use interchain_host::{ChannelId, Context, KvStore};
use tracing::debug;

use crate::{
    channel::State,
    error::ChannelError,
    handler::{chan_close, chan_open, packet, upgrade},
    msgs::ChannelMsg,
    upgrade::Upgrade,
};

/// What an executed message produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MsgResponse {
    /// A channel end was created
    ChannelCreated(ChannelId),
    /// An upgrade was proposed at this sequence
    UpgradeSequence(u64),
    /// The counterparty's proposal was accepted as this upgrade
    Upgrade(Upgrade),
    /// The channel is now in this state
    ChannelState(State),
    /// Nothing to report
    Success,
}

fn route<S: KvStore>(
    ctx: &mut Context<'_, S>,
    msg: &ChannelMsg,
) -> Result<MsgResponse, ChannelError> {
    let response = match msg {
        ChannelMsg::OpenInit(m) => MsgResponse::ChannelCreated(chan_open::chan_open_init(ctx, m)?),
        ChannelMsg::OpenTry(m) => MsgResponse::ChannelCreated(chan_open::chan_open_try(ctx, m)?),
        ChannelMsg::OpenAck(m) => {
            chan_open::chan_open_ack(ctx, m)?;
            MsgResponse::Success
        }
        ChannelMsg::OpenConfirm(m) => {
            chan_open::chan_open_confirm(ctx, m)?;
            MsgResponse::Success
        }
        ChannelMsg::CloseInit(m) => {
            chan_close::chan_close_init(ctx, m)?;
            MsgResponse::Success
        }
        ChannelMsg::CloseConfirm(m) => {
            chan_close::chan_close_confirm(ctx, m)?;
            MsgResponse::Success
        }
        ChannelMsg::UpgradeInit(m) => {
            MsgResponse::UpgradeSequence(upgrade::chan_upgrade_init(ctx, m)?)
        }
        ChannelMsg::UpgradeTry(m) => MsgResponse::Upgrade(upgrade::chan_upgrade_try(ctx, m)?),
        ChannelMsg::UpgradeAck(m) => MsgResponse::ChannelState(upgrade::chan_upgrade_ack(ctx, m)?),
        ChannelMsg::UpgradeConfirm(m) => {
            MsgResponse::ChannelState(upgrade::chan_upgrade_confirm(ctx, m)?)
        }
        ChannelMsg::UpgradeOpen(m) => {
            upgrade::chan_upgrade_open(ctx, m)?;
            MsgResponse::Success
        }
        ChannelMsg::UpgradeTimeout(m) => {
            upgrade::chan_upgrade_timeout(ctx, m)?;
            MsgResponse::Success
        }
        ChannelMsg::UpgradeCancel(m) => {
            upgrade::chan_upgrade_cancel(ctx, m)?;
            MsgResponse::Success
        }
        ChannelMsg::RecvPacket(m) => {
            packet::recv_packet(ctx, m)?;
            MsgResponse::Success
        }
        ChannelMsg::Acknowledgement(m) => {
            packet::acknowledge_packet(ctx, m)?;
            MsgResponse::Success
        }
        ChannelMsg::Timeout(m) => {
            packet::timeout_packet(ctx, m)?;
            MsgResponse::Success
        }
    };
    Ok(response)
}

/// Executes one relayer message atomically: its writes and events land in
/// `ctx` only if it succeeds.
///
/// An upgrade message failing with [`ChannelError::Upgrade`] additionally
/// aborts the upgrade in a second atomic step (see
/// [`upgrade::abort_upgrade`]), so the error receipt persists while the
/// failed message leaves no trace. The error is still returned.
/// # Errors
/// Returns the handler's error, or the abort's if that fails too.
#[tracing::instrument(skip_all, fields(msg = msg.name()))]
pub fn dispatch<S: KvStore>(
    ctx: &mut Context<'_, S>,
    msg: &ChannelMsg,
) -> Result<MsgResponse, ChannelError> {
    match ctx.atomically(|tx| route(tx, msg)) {
        Err(ChannelError::Upgrade(err)) => {
            if let Some((port_id, channel_id)) = msg.upgrading_channel() {
                ctx.atomically(|tx| upgrade::abort_upgrade(tx, port_id, channel_id, &err))?;
            }
            Err(ChannelError::Upgrade(err))
        }
        Err(err) => {
            debug!(error = %err, kind = ?err.kind(), "message rejected");
            Err(err)
        }
        ok => ok,
    }
}
