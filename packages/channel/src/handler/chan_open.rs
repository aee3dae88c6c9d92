//! Channel open handshake: `Init -> TryOpen -> Open` on each end.

use interchain_client::module;
use interchain_host::{events::IbcEvent, ChannelId, ConnectionId, Context, KvStore, Path};
use interchain_utils::ensure;
use tracing::info;

use super::{channel_event, ensure_state};
use crate::{
    channel::{single_hop, ChannelEnd, Counterparty, Ordering, State},
    connection::ConnectionEnd,
    error::ChannelError,
    msgs::{MsgChannelOpenAck, MsgChannelOpenConfirm, MsgChannelOpenInit, MsgChannelOpenTry},
    state, verify,
};

fn open_connection_for<S: KvStore>(
    ctx: &Context<'_, S>,
    hops: &[ConnectionId],
    ordering: Ordering,
) -> Result<ConnectionEnd, ChannelError> {
    let connection_id = single_hop(hops)?;
    let connection = state::get_open_connection(ctx, connection_id)?;
    ensure!(
        connection.supports_ordering(ordering),
        ChannelError::OrderingNotSupported(ordering)
    );
    Ok(connection)
}

fn next_channel_id<S: KvStore>(ctx: &mut Context<'_, S>) -> Result<ChannelId, ChannelError> {
    let sequence = ctx.bump_counter(&Path::NextChannelSequence)?;
    Ok(ChannelId::with_sequence(sequence))
}

/// Creates a channel end in `Init`.
/// # Errors
/// Fails unless the single connection hop is open, supports the ordering
/// and its client is active.
pub fn chan_open_init<S: KvStore>(
    ctx: &mut Context<'_, S>,
    msg: &MsgChannelOpenInit,
) -> Result<ChannelId, ChannelError> {
    let connection = open_connection_for(ctx, &msg.connection_hops, msg.ordering)?;
    module::ensure_active(ctx, &connection.client_id)?;

    let channel_id = next_channel_id(ctx)?;
    let channel = ChannelEnd::new(
        State::Init,
        msg.ordering,
        Counterparty::new(msg.counterparty_port_id.clone(), None),
        msg.connection_hops.clone(),
        msg.version.clone(),
        0,
    );
    state::store_channel(ctx, &msg.port_id, &channel_id, &channel)?;
    state::init_sequences(ctx, &msg.port_id, &channel_id)?;

    info!(port_id = %msg.port_id, %channel_id, "channel open init");
    ctx.emit(IbcEvent::OpenInit(channel_event(
        &msg.port_id,
        &channel_id,
        &channel,
    )?));
    Ok(channel_id)
}

/// Creates a channel end in `TryOpen` after proving the counterparty end is
/// in `Init`. The version is the counterparty's.
/// # Errors
/// Fails on connection problems, a missing counterparty channel id or a
/// proof that does not verify.
pub fn chan_open_try<S: KvStore>(
    ctx: &mut Context<'_, S>,
    msg: &MsgChannelOpenTry,
) -> Result<ChannelId, ChannelError> {
    let connection = open_connection_for(ctx, &msg.connection_hops, msg.ordering)?;
    let counterparty_channel_id = msg.counterparty.channel_id()?;

    let expected = ChannelEnd::new(
        State::Init,
        msg.ordering,
        Counterparty::new(msg.port_id.clone(), None),
        vec![connection.counterparty.connection_id.clone()],
        msg.counterparty_version.clone(),
        0,
    );
    verify::verify_channel_state(
        ctx,
        &connection,
        msg.proof_height,
        &msg.proof_init,
        &msg.counterparty.port_id,
        counterparty_channel_id,
        &expected,
    )?;

    let channel_id = next_channel_id(ctx)?;
    let channel = ChannelEnd::new(
        State::TryOpen,
        msg.ordering,
        msg.counterparty.clone(),
        msg.connection_hops.clone(),
        msg.counterparty_version.clone(),
        0,
    );
    state::store_channel(ctx, &msg.port_id, &channel_id, &channel)?;
    state::init_sequences(ctx, &msg.port_id, &channel_id)?;

    info!(port_id = %msg.port_id, %channel_id, "channel open try");
    ctx.emit(IbcEvent::OpenTry(channel_event(
        &msg.port_id,
        &channel_id,
        &channel,
    )?));
    Ok(channel_id)
}

/// Opens an `Init` end after proving the counterparty end is in `TryOpen`.
/// # Errors
/// Fails on a wrong state, connection problems or a failed proof.
pub fn chan_open_ack<S: KvStore>(
    ctx: &mut Context<'_, S>,
    msg: &MsgChannelOpenAck,
) -> Result<(), ChannelError> {
    let mut channel = state::get_channel(ctx, &msg.port_id, &msg.channel_id)?;
    ensure_state(&msg.channel_id, &channel, &[State::Init])?;
    let connection = open_connection_for(ctx, &channel.connection_hops, channel.ordering)?;

    let expected = ChannelEnd::new(
        State::TryOpen,
        channel.ordering,
        Counterparty::new(msg.port_id.clone(), Some(msg.channel_id.clone())),
        vec![connection.counterparty.connection_id.clone()],
        msg.counterparty_version.clone(),
        0,
    );
    verify::verify_channel_state(
        ctx,
        &connection,
        msg.proof_height,
        &msg.proof_try,
        &channel.counterparty.port_id,
        &msg.counterparty_channel_id,
        &expected,
    )?;

    channel.state = State::Open;
    channel.counterparty.channel_id = Some(msg.counterparty_channel_id.clone());
    channel.version.clone_from(&msg.counterparty_version);
    state::store_channel(ctx, &msg.port_id, &msg.channel_id, &channel)?;

    info!(port_id = %msg.port_id, channel_id = %msg.channel_id, "channel open ack");
    ctx.emit(IbcEvent::OpenAck(channel_event(
        &msg.port_id,
        &msg.channel_id,
        &channel,
    )?));
    Ok(())
}

/// Opens a `TryOpen` end after proving the counterparty end is open.
/// # Errors
/// Fails on a wrong state, connection problems or a failed proof.
pub fn chan_open_confirm<S: KvStore>(
    ctx: &mut Context<'_, S>,
    msg: &MsgChannelOpenConfirm,
) -> Result<(), ChannelError> {
    let mut channel = state::get_channel(ctx, &msg.port_id, &msg.channel_id)?;
    ensure_state(&msg.channel_id, &channel, &[State::TryOpen])?;
    let connection = open_connection_for(ctx, &channel.connection_hops, channel.ordering)?;

    let expected = ChannelEnd::new(
        State::Open,
        channel.ordering,
        Counterparty::new(msg.port_id.clone(), Some(msg.channel_id.clone())),
        vec![connection.counterparty.connection_id.clone()],
        channel.version.clone(),
        0,
    );
    verify::verify_channel_state(
        ctx,
        &connection,
        msg.proof_height,
        &msg.proof_ack,
        &channel.counterparty.port_id,
        channel.counterparty.channel_id()?,
        &expected,
    )?;

    channel.state = State::Open;
    state::store_channel(ctx, &msg.port_id, &msg.channel_id, &channel)?;

    info!(port_id = %msg.port_id, channel_id = %msg.channel_id, "channel open confirm");
    ctx.emit(IbcEvent::OpenConfirm(channel_event(
        &msg.port_id,
        &msg.channel_id,
        &channel,
    )?));
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use interchain_commitment::CommitmentPrefix;
    use interchain_host::{config::IbcParams, ClientId, Height, HostEnv, MemStore, PortId};
    use rstest::rstest;

    use super::*;
    use crate::connection::{ConnectionCounterparty, ConnectionState, Version, ORDER_UNORDERED};

    pub fn connection(state: ConnectionState, versions: Vec<Version>) -> ConnectionEnd {
        ConnectionEnd {
            state,
            client_id: ClientId::new("06-solomachine-0").unwrap(),
            counterparty: ConnectionCounterparty {
                client_id: ClientId::new("06-solomachine-0").unwrap(),
                connection_id: ConnectionId::with_sequence(0),
                prefix: CommitmentPrefix::new("ibc").unwrap(),
            },
            versions,
            delay_period_ns: 0,
        }
    }

    fn init_msg(hops: Vec<ConnectionId>, ordering: Ordering) -> MsgChannelOpenInit {
        MsgChannelOpenInit {
            port_id: PortId::new("transfer").unwrap(),
            ordering,
            connection_hops: hops,
            counterparty_port_id: PortId::new("transfer").unwrap(),
            version: "ics20-1".into(),
        }
    }

    #[rstest]
    #[case::no_hops(vec![], ConnectionState::Open, Ordering::Unordered, ChannelError::InvalidConnectionHops(0))]
    #[case::two_hops(
        vec![ConnectionId::with_sequence(0), ConnectionId::with_sequence(1)],
        ConnectionState::Open,
        Ordering::Unordered,
        ChannelError::InvalidConnectionHops(2)
    )]
    #[case::unknown_connection(
        vec![ConnectionId::with_sequence(7)],
        ConnectionState::Open,
        Ordering::Unordered,
        ChannelError::ConnectionNotFound(ConnectionId::with_sequence(7))
    )]
    #[case::connection_not_open(
        vec![ConnectionId::with_sequence(0)],
        ConnectionState::TryOpen,
        Ordering::Unordered,
        ChannelError::InvalidConnectionState {
            connection_id: ConnectionId::with_sequence(0),
            state: ConnectionState::TryOpen,
        }
    )]
    #[case::ordering_not_supported(
        vec![ConnectionId::with_sequence(0)],
        ConnectionState::Open,
        Ordering::Ordered,
        ChannelError::OrderingNotSupported(Ordering::Ordered)
    )]
    fn open_init_rejects_bad_connections(
        #[case] hops: Vec<ConnectionId>,
        #[case] connection_state: ConnectionState,
        #[case] ordering: Ordering,
        #[case] expected: ChannelError,
    ) {
        let mut store = MemStore::new();
        let env = HostEnv::new("chain", Height::new(0, 1), 1);
        let params = IbcParams::default();
        let mut ctx = Context::new(&mut store, &env, &params);
        let versions = vec![Version {
            identifier: "1".into(),
            features: vec![ORDER_UNORDERED.into()],
        }];
        state::store_connection(
            &mut ctx,
            &ConnectionId::with_sequence(0),
            &connection(connection_state, versions),
        )
        .unwrap();

        assert_eq!(chan_open_init(&mut ctx, &init_msg(hops, ordering)), Err(expected));
        assert!(!ctx.contains(&Path::NextChannelSequence));
        assert!(ctx.events().is_empty());
    }

    #[test]
    fn open_init_requires_an_active_client() {
        let mut store = MemStore::new();
        let env = HostEnv::new("chain", Height::new(0, 1), 1);
        let params = IbcParams::default();
        let mut ctx = Context::new(&mut store, &env, &params);
        state::store_connection(
            &mut ctx,
            &ConnectionId::with_sequence(0),
            &connection(ConnectionState::Open, vec![Version::default()]),
        )
        .unwrap();

        let err = chan_open_init(
            &mut ctx,
            &init_msg(vec![ConnectionId::with_sequence(0)], Ordering::Unordered),
        )
        .unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::InvalidState);
    }
}
