//! Typed access to the channel store.

use interchain_host::{ChannelId, ConnectionId, Context, KvStore, Path, PortId};
use interchain_utils::ensure;

use crate::{
    channel::ChannelEnd,
    connection::ConnectionEnd,
    error::{ChannelError, UpgradeError},
    upgrade::{ErrorReceipt, Upgrade},
};

/// Loads a channel end.
/// # Errors
/// Returns [`ChannelError::ChannelNotFound`] if absent.
pub fn get_channel<S: KvStore>(
    ctx: &Context<'_, S>,
    port_id: &PortId,
    channel_id: &ChannelId,
) -> Result<ChannelEnd, ChannelError> {
    ctx.read(&Path::ChannelEnd(port_id.clone(), channel_id.clone()))?
        .ok_or_else(|| ChannelError::ChannelNotFound {
            port_id: port_id.clone(),
            channel_id: channel_id.clone(),
        })
}

/// Stores a channel end.
/// # Errors
/// Fails if encoding fails.
pub fn store_channel<S: KvStore>(
    ctx: &mut Context<'_, S>,
    port_id: &PortId,
    channel_id: &ChannelId,
    channel: &ChannelEnd,
) -> Result<(), ChannelError> {
    Ok(ctx.write(&Path::ChannelEnd(port_id.clone(), channel_id.clone()), channel)?)
}

/// Loads a connection end.
/// # Errors
/// Returns [`ChannelError::ConnectionNotFound`] if absent.
pub fn get_connection<S: KvStore>(
    ctx: &Context<'_, S>,
    connection_id: &ConnectionId,
) -> Result<ConnectionEnd, ChannelError> {
    ctx.read(&Path::Connection(connection_id.clone()))?
        .ok_or_else(|| ChannelError::ConnectionNotFound(connection_id.clone()))
}

/// Loads a connection end and checks that it is open.
/// # Errors
/// Returns [`ChannelError::ConnectionNotFound`] or
/// [`ChannelError::InvalidConnectionState`].
pub fn get_open_connection<S: KvStore>(
    ctx: &Context<'_, S>,
    connection_id: &ConnectionId,
) -> Result<ConnectionEnd, ChannelError> {
    let connection = get_connection(ctx, connection_id)?;
    connection.ensure_open(connection_id)?;
    Ok(connection)
}

/// Stores a connection end. Used by the host's connection handshake.
/// # Errors
/// Fails if encoding fails.
pub fn store_connection<S: KvStore>(
    ctx: &mut Context<'_, S>,
    connection_id: &ConnectionId,
    connection: &ConnectionEnd,
) -> Result<(), ChannelError> {
    Ok(ctx.write(&Path::Connection(connection_id.clone()), connection)?)
}

/// Loads the local upgrade proposal.
/// # Errors
/// Returns [`ChannelError::UpgradeNotFound`] if absent.
pub fn get_upgrade<S: KvStore>(
    ctx: &Context<'_, S>,
    port_id: &PortId,
    channel_id: &ChannelId,
) -> Result<Upgrade, ChannelError> {
    ctx.read(&Path::ChannelUpgrade(port_id.clone(), channel_id.clone()))?
        .ok_or_else(|| ChannelError::UpgradeNotFound {
            port_id: port_id.clone(),
            channel_id: channel_id.clone(),
        })
}

/// Stores the local upgrade proposal.
/// # Errors
/// Fails if encoding fails.
pub fn store_upgrade<S: KvStore>(
    ctx: &mut Context<'_, S>,
    port_id: &PortId,
    channel_id: &ChannelId,
    upgrade: &Upgrade,
) -> Result<(), ChannelError> {
    Ok(ctx.write(
        &Path::ChannelUpgrade(port_id.clone(), channel_id.clone()),
        upgrade,
    )?)
}

/// Loads the counterparty's upgrade proposal.
/// # Errors
/// Returns [`ChannelError::CounterpartyUpgradeNotFound`] if absent.
pub fn get_counterparty_upgrade<S: KvStore>(
    ctx: &Context<'_, S>,
    port_id: &PortId,
    channel_id: &ChannelId,
) -> Result<Upgrade, ChannelError> {
    ctx.read(&Path::CounterpartyUpgrade(port_id.clone(), channel_id.clone()))?
        .ok_or_else(|| ChannelError::CounterpartyUpgradeNotFound {
            port_id: port_id.clone(),
            channel_id: channel_id.clone(),
        })
}

/// Stores the counterparty's upgrade proposal.
/// # Errors
/// Fails if encoding fails.
pub fn store_counterparty_upgrade<S: KvStore>(
    ctx: &mut Context<'_, S>,
    port_id: &PortId,
    channel_id: &ChannelId,
    upgrade: &Upgrade,
) -> Result<(), ChannelError> {
    Ok(ctx.write(
        &Path::CounterpartyUpgrade(port_id.clone(), channel_id.clone()),
        upgrade,
    )?)
}

/// Removes both upgrade proposals of a channel.
pub fn delete_upgrade_info<S: KvStore>(
    ctx: &mut Context<'_, S>,
    port_id: &PortId,
    channel_id: &ChannelId,
) {
    ctx.remove(&Path::ChannelUpgrade(port_id.clone(), channel_id.clone()));
    ctx.remove(&Path::CounterpartyUpgrade(port_id.clone(), channel_id.clone()));
}

/// The latest error receipt written for the channel.
/// # Errors
/// Fails if the stored receipt does not decode.
pub fn get_error_receipt<S: KvStore>(
    ctx: &Context<'_, S>,
    port_id: &PortId,
    channel_id: &ChannelId,
) -> Result<Option<ErrorReceipt>, ChannelError> {
    Ok(ctx.read(&Path::UpgradeErrorReceipt(port_id.clone(), channel_id.clone()))?)
}

/// Records the receipt of `err`. Receipt sequences strictly increase.
/// # Errors
/// Returns [`ChannelError::StaleErrorReceipt`] if a receipt at the same or a
/// later sequence exists.
pub fn write_error_receipt<S: KvStore>(
    ctx: &mut Context<'_, S>,
    port_id: &PortId,
    channel_id: &ChannelId,
    err: &UpgradeError,
) -> Result<(), ChannelError> {
    if let Some(existing) = get_error_receipt(ctx, port_id, channel_id)? {
        ensure!(
            existing.sequence < err.sequence,
            ChannelError::StaleErrorReceipt {
                existing: existing.sequence,
                new: err.sequence,
            }
        );
    }
    Ok(ctx.write(
        &Path::UpgradeErrorReceipt(port_id.clone(), channel_id.clone()),
        &err.receipt(),
    )?)
}

fn read_sequence<S: KvStore>(ctx: &Context<'_, S>, path: &Path) -> Result<u64, ChannelError> {
    Ok(ctx.read(path)?.unwrap_or(1))
}

/// Next sequence to send on the channel.
/// # Errors
/// Fails if the stored counter does not decode.
pub fn next_sequence_send<S: KvStore>(
    ctx: &Context<'_, S>,
    port_id: &PortId,
    channel_id: &ChannelId,
) -> Result<u64, ChannelError> {
    read_sequence(ctx, &Path::NextSequenceSend(port_id.clone(), channel_id.clone()))
}

/// Next sequence expected by an ordered channel.
/// # Errors
/// Fails if the stored counter does not decode.
pub fn next_sequence_recv<S: KvStore>(
    ctx: &Context<'_, S>,
    port_id: &PortId,
    channel_id: &ChannelId,
) -> Result<u64, ChannelError> {
    read_sequence(ctx, &Path::NextSequenceRecv(port_id.clone(), channel_id.clone()))
}

/// Next sequence an ordered channel expects to be acknowledged.
/// # Errors
/// Fails if the stored counter does not decode.
pub fn next_sequence_ack<S: KvStore>(
    ctx: &Context<'_, S>,
    port_id: &PortId,
    channel_id: &ChannelId,
) -> Result<u64, ChannelError> {
    read_sequence(ctx, &Path::NextSequenceAck(port_id.clone(), channel_id.clone()))
}

/// Sets one of the three sequence counters.
/// # Errors
/// Fails if encoding fails.
pub fn set_sequence<S: KvStore>(
    ctx: &mut Context<'_, S>,
    path: &Path,
    sequence: u64,
) -> Result<(), ChannelError> {
    Ok(ctx.write(path, &sequence)?)
}

/// Starts all three counters of a new channel at 1.
/// # Errors
/// Fails if encoding fails.
pub fn init_sequences<S: KvStore>(
    ctx: &mut Context<'_, S>,
    port_id: &PortId,
    channel_id: &ChannelId,
) -> Result<(), ChannelError> {
    for path in [
        Path::NextSequenceSend(port_id.clone(), channel_id.clone()),
        Path::NextSequenceRecv(port_id.clone(), channel_id.clone()),
        Path::NextSequenceAck(port_id.clone(), channel_id.clone()),
    ] {
        set_sequence(ctx, &path, 1)?;
    }
    Ok(())
}

/// First sequence an unordered channel accepts. Set when an ordered channel
/// is upgraded to unordered; everything below was delivered in order.
/// # Errors
/// Fails if the stored value does not decode.
pub fn recv_start_sequence<S: KvStore>(
    ctx: &Context<'_, S>,
    port_id: &PortId,
    channel_id: &ChannelId,
) -> Result<u64, ChannelError> {
    Ok(ctx
        .read(&Path::RecvStartSequence(port_id.clone(), channel_id.clone()))?
        .unwrap_or_default())
}

/// Whether any packet with sequence at most `up_to` is still committed.
#[must_use]
pub fn has_inflight_packets<S: KvStore>(
    ctx: &Context<'_, S>,
    port_id: &PortId,
    channel_id: &ChannelId,
    up_to: u64,
) -> bool {
    let prefix = Path::packet_commitment_prefix(port_id, channel_id);
    ctx.store()
        .keys_with_prefix(&prefix)
        .iter()
        .filter_map(|key| key.strip_prefix(&prefix)?.parse::<u64>().ok())
        .any(|sequence| sequence <= up_to)
}

#[cfg(test)]
mod tests {
    use interchain_host::{config::IbcParams, Height, HostEnv, MemStore};

    use super::*;

    fn ids() -> (PortId, ChannelId) {
        (PortId::new("transfer").unwrap(), ChannelId::with_sequence(0))
    }

    #[test]
    fn error_receipts_strictly_increase() {
        let mut store = MemStore::new();
        let env = HostEnv::new("chain", Height::new(0, 1), 1);
        let params = IbcParams::default();
        let mut ctx = Context::new(&mut store, &env, &params);
        let (port, chan) = ids();
        let abort = |sequence| UpgradeError::new(sequence, ChannelError::InvalidTimeout);

        write_error_receipt(&mut ctx, &port, &chan, &abort(2)).unwrap();
        assert_eq!(
            write_error_receipt(&mut ctx, &port, &chan, &abort(2)),
            Err(ChannelError::StaleErrorReceipt {
                existing: 2,
                new: 2
            })
        );
        write_error_receipt(&mut ctx, &port, &chan, &abort(3)).unwrap();
        assert_eq!(
            get_error_receipt(&ctx, &port, &chan).unwrap().unwrap().sequence,
            3
        );
    }

    #[test]
    fn inflight_packets_respect_the_boundary() {
        let mut store = MemStore::new();
        let env = HostEnv::new("chain", Height::new(0, 1), 1);
        let params = IbcParams::default();
        let mut ctx = Context::new(&mut store, &env, &params);
        let (port, chan) = ids();
        let other = ChannelId::with_sequence(1);

        ctx.write_raw(&Path::packet_commitment(&port, &chan, 10), vec![1]);
        ctx.write_raw(&Path::packet_commitment(&port, &other, 2), vec![1]);

        assert!(!has_inflight_packets(&ctx, &port, &chan, 9));
        assert!(has_inflight_packets(&ctx, &port, &chan, 10));
        assert!(!has_inflight_packets(&ctx, &port, &ChannelId::with_sequence(2), 100));
    }

    #[test]
    fn counters_default_to_one() {
        let mut store = MemStore::new();
        let env = HostEnv::new("chain", Height::new(0, 1), 1);
        let params = IbcParams::default();
        let ctx = Context::new(&mut store, &env, &params);
        let (port, chan) = ids();
        assert_eq!(next_sequence_send(&ctx, &port, &chan).unwrap(), 1);
        assert_eq!(recv_start_sequence(&ctx, &port, &chan).unwrap(), 0);
    }
}
