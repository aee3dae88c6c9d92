//! Channel handlers. Each validates, verifies counterparty proofs, writes
//! and emits against the context it is given; atomicity is the caller's
//! concern, see [`crate::router::dispatch`].

pub mod chan_close;
pub mod chan_open;
pub mod packet;
pub mod upgrade;

use interchain_host::{
    events::{ChannelEvent, UpgradeEvent},
    ChannelId, PortId,
};

use crate::{
    channel::{ChannelEnd, State},
    error::ChannelError,
    upgrade::UpgradeFields,
};

fn ensure_state(
    channel_id: &ChannelId,
    channel: &ChannelEnd,
    allowed: &[State],
) -> Result<(), ChannelError> {
    if allowed.contains(&channel.state) {
        Ok(())
    } else {
        Err(ChannelError::InvalidChannelState {
            channel_id: channel_id.clone(),
            state: channel.state,
        })
    }
}

fn channel_event(
    port_id: &PortId,
    channel_id: &ChannelId,
    channel: &ChannelEnd,
) -> Result<ChannelEvent, ChannelError> {
    Ok(ChannelEvent {
        port_id: port_id.clone(),
        channel_id: channel_id.clone(),
        counterparty_port_id: channel.counterparty.port_id.clone(),
        counterparty_channel_id: channel.counterparty.channel_id.clone(),
        connection_id: channel.connection_id()?.clone(),
        version: channel.version.clone(),
    })
}

fn upgrade_event(
    port_id: &PortId,
    channel_id: &ChannelId,
    upgrade_sequence: u64,
    fields: &UpgradeFields,
) -> UpgradeEvent {
    UpgradeEvent {
        port_id: port_id.clone(),
        channel_id: channel_id.clone(),
        upgrade_sequence,
        ordering: fields.ordering.to_string(),
        connection_hops: fields.connection_hops.clone(),
        version: fields.version.clone(),
    }
}
