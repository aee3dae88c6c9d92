//! Two chains, each tracking the other with a solo machine client, and a
//! relayer that signs one chain's state for the other's client.
//!
//! Both chains open their channels over `connection-0`, so a channel has the
//! same identifier on both ends.

#![allow(dead_code)]

use interchain_channel::{
    channel::{ChannelEnd, Counterparty, Ordering},
    connection::{ConnectionCounterparty, ConnectionEnd, ConnectionState, Version},
    dispatch,
    handler::packet::{send_packet, write_acknowledgement},
    msgs::{
        ChannelMsg, MsgAcknowledgement, MsgChannelOpenAck, MsgChannelOpenConfirm,
        MsgChannelOpenInit, MsgChannelOpenTry, MsgChannelUpgradeAck, MsgChannelUpgradeCancel,
        MsgChannelUpgradeConfirm, MsgChannelUpgradeInit, MsgChannelUpgradeOpen,
        MsgChannelUpgradeTimeout, MsgChannelUpgradeTry, MsgRecvPacket, MsgTimeout,
    },
    packet::Packet,
    state,
    upgrade::{ErrorReceipt, Upgrade, UpgradeFields},
    ChannelError, MsgResponse,
};
use interchain_client::{handler::create_client, module, AnyClientState, AnyConsensusState};
use interchain_commitment::{CommitmentPrefix, CommitmentProofBytes, MerklePath};
use interchain_host::{
    config::IbcParams, events::IbcEvent, logging, ChannelId, ClientId, ConnectionId, Context,
    Height, HostEnv, KvStore, MemStore, Path, PortId, Timeout,
};
use solomachine_light_client::test_utils::TestSoloMachine;

pub const VERSION: &str = "ics20-1";
pub const PREFIX: &str = "ibc";

pub fn port() -> PortId {
    PortId::new("transfer").unwrap()
}

pub fn connection_id(n: u64) -> ConnectionId {
    ConnectionId::with_sequence(n)
}

pub struct Chain {
    pub store: MemStore,
    pub env: HostEnv,
    pub params: IbcParams,
    /// Signs this chain's state for the other chain's client
    pub signer: TestSoloMachine,
    /// Client of the other chain
    pub client_id: ClientId,
    /// Events of the last delivered message
    pub events: Vec<IbcEvent>,
}

impl Chain {
    fn new(chain_id: &str, signer: TestSoloMachine, counterparty: &TestSoloMachine) -> Self {
        let mut chain = Self {
            store: MemStore::new(),
            env: HostEnv::new(chain_id, Height::new(0, 100), 1_000),
            params: IbcParams::default(),
            signer,
            client_id: ClientId::new("06-solomachine-0").unwrap(),
            events: Vec::new(),
        };
        chain.client_id = create_client(
            &mut chain.ctx(),
            &AnyClientState::SoloMachine(counterparty.client_state()),
            &AnyConsensusState::SoloMachine(counterparty.consensus_state()),
        )
        .unwrap();
        chain
    }

    pub fn ctx(&mut self) -> Context<'_, MemStore> {
        Context::new(&mut self.store, &self.env, &self.params)
    }

    /// Runs `msg` through [`dispatch`], keeping its events.
    pub fn deliver(&mut self, msg: ChannelMsg) -> Result<MsgResponse, ChannelError> {
        let mut ctx = Context::new(&mut self.store, &self.env, &self.params);
        let result = dispatch(&mut ctx, &msg);
        self.events.clear();
        ctx.drain_events(&mut self.events);
        result
    }

    pub fn channel(&mut self, channel_id: &ChannelId) -> ChannelEnd {
        state::get_channel(&self.ctx(), &port(), channel_id).unwrap()
    }

    pub fn upgrade(&mut self, channel_id: &ChannelId) -> Option<Upgrade> {
        state::get_upgrade(&self.ctx(), &port(), channel_id).ok()
    }

    pub fn counterparty_upgrade(&mut self, channel_id: &ChannelId) -> Option<Upgrade> {
        state::get_counterparty_upgrade(&self.ctx(), &port(), channel_id).ok()
    }

    pub fn error_receipt(&mut self, channel_id: &ChannelId) -> Option<ErrorReceipt> {
        state::get_error_receipt(&self.ctx(), &port(), channel_id).unwrap()
    }

    pub fn has(&self, path: &Path) -> bool {
        self.store.has(&path.to_string())
    }

    fn seed_connection(&mut self, n: u64, counterparty_client_id: &ClientId) {
        let connection = ConnectionEnd {
            state: ConnectionState::Open,
            client_id: self.client_id.clone(),
            counterparty: ConnectionCounterparty {
                client_id: counterparty_client_id.clone(),
                connection_id: connection_id(n),
                prefix: CommitmentPrefix::new(PREFIX).unwrap(),
            },
            versions: vec![Version::default()],
            delay_period_ns: 0,
        };
        state::store_connection(&mut self.ctx(), &connection_id(n), &connection).unwrap();
    }
}

/// Two chains with clients of each other and open `connection-0` and
/// `connection-1` between them.
pub fn setup() -> (Chain, Chain) {
    logging::init_test_subscriber();
    let signer_a = TestSoloMachine::new("chain-a");
    let signer_b = TestSoloMachine::new_ed25519("chain-b");
    let mut a = Chain::new("chain-a", signer_a.clone(), &signer_b);
    let mut b = Chain::new("chain-b", signer_b, &signer_a);
    for n in 0..2 {
        let (client_a, client_b) = (a.client_id.clone(), b.client_id.clone());
        a.seed_connection(n, &client_b);
        b.seed_connection(n, &client_a);
    }
    (a, b)
}

/// Signs the values `store` holds at `paths` for `verifier`'s client, one
/// sequence per proof in the order the handler checks them. Missing values
/// are proven absent. Returns the height of the first proof.
pub fn prove_from(
    signer: &mut TestSoloMachine,
    store: &MemStore,
    verifier: &mut Chain,
    paths: &[Path],
) -> (Height, Vec<CommitmentProofBytes>) {
    let client_id = verifier.client_id.clone();
    signer.sequence = module::latest_height(&verifier.ctx(), &client_id)
        .unwrap()
        .revision_height;

    let mut first = None;
    let proofs = paths
        .iter()
        .map(|path| {
            let merkle = MerklePath::new(CommitmentPrefix::new(PREFIX).unwrap(), path.clone());
            let (height, proof) = match store.get(&path.to_string()) {
                Some(value) => signer.prove(&merkle, &value),
                None => signer.prove_absence(&merkle),
            };
            first.get_or_insert(height);
            CommitmentProofBytes::try_from(proof).unwrap()
        })
        .collect();
    (first.unwrap(), proofs)
}

/// [`prove_from`] against the current state of `source`.
pub fn prove(
    source: &mut Chain,
    verifier: &mut Chain,
    paths: &[Path],
) -> (Height, Vec<CommitmentProofBytes>) {
    prove_from(&mut source.signer, &source.store, verifier, paths)
}

fn created(response: MsgResponse) -> ChannelId {
    match response {
        MsgResponse::ChannelCreated(channel_id) => channel_id,
        other => panic!("expected a new channel, got {other:?}"),
    }
}

/// Full open handshake initiated by `a`.
pub fn open_channel(a: &mut Chain, b: &mut Chain, ordering: Ordering) -> ChannelId {
    let channel_a = created(
        a.deliver(ChannelMsg::OpenInit(MsgChannelOpenInit {
            port_id: port(),
            ordering,
            connection_hops: vec![connection_id(0)],
            counterparty_port_id: port(),
            version: VERSION.into(),
        }))
        .unwrap(),
    );

    let (proof_height, proofs) = prove(a, b, &[Path::ChannelEnd(port(), channel_a.clone())]);
    let channel_b = created(
        b.deliver(ChannelMsg::OpenTry(MsgChannelOpenTry {
            port_id: port(),
            ordering,
            connection_hops: vec![connection_id(0)],
            counterparty: Counterparty::new(port(), Some(channel_a.clone())),
            counterparty_version: VERSION.into(),
            proof_init: proofs[0].clone(),
            proof_height,
        }))
        .unwrap(),
    );
    assert_eq!(channel_a, channel_b);

    let (proof_height, proofs) = prove(b, a, &[Path::ChannelEnd(port(), channel_b.clone())]);
    a.deliver(ChannelMsg::OpenAck(MsgChannelOpenAck {
        port_id: port(),
        channel_id: channel_a.clone(),
        counterparty_channel_id: channel_b.clone(),
        counterparty_version: VERSION.into(),
        proof_try: proofs[0].clone(),
        proof_height,
    }))
    .unwrap();

    let (proof_height, proofs) = prove(a, b, &[Path::ChannelEnd(port(), channel_a.clone())]);
    b.deliver(ChannelMsg::OpenConfirm(MsgChannelOpenConfirm {
        port_id: port(),
        channel_id: channel_b,
        proof_ack: proofs[0].clone(),
        proof_height,
    }))
    .unwrap();

    channel_a
}

/// Current fields of `channel_id` with `version` replaced.
pub fn new_version(chain: &mut Chain, channel_id: &ChannelId, version: &str) -> UpgradeFields {
    UpgradeFields {
        version: version.into(),
        ..chain.channel(channel_id).fields()
    }
}

pub fn upgrade_init(
    chain: &mut Chain,
    channel_id: &ChannelId,
    fields: UpgradeFields,
    timeout: Option<Timeout>,
) -> Result<MsgResponse, ChannelError> {
    chain.deliver(ChannelMsg::UpgradeInit(MsgChannelUpgradeInit {
        port_id: port(),
        channel_id: channel_id.clone(),
        fields,
        timeout,
    }))
}

/// `ChanUpgradeTry` on `dst` with proofs of `store`, a snapshot of `src`.
pub fn upgrade_try_from(
    src: &mut Chain,
    store: &MemStore,
    dst: &mut Chain,
    channel_id: &ChannelId,
) -> Result<MsgResponse, ChannelError> {
    let mut snapshot = Chain {
        store: store.clone(),
        env: src.env.clone(),
        params: src.params.clone(),
        signer: src.signer.clone(),
        client_id: src.client_id.clone(),
        events: Vec::new(),
    };
    let channel = snapshot.channel(channel_id);
    let counterparty_upgrade = snapshot.upgrade(channel_id).unwrap();
    let (proof_height, proofs) = prove_from(
        &mut src.signer,
        store,
        dst,
        &[
            Path::ChannelEnd(port(), channel_id.clone()),
            Path::ChannelUpgrade(port(), channel_id.clone()),
        ],
    );
    dst.deliver(ChannelMsg::UpgradeTry(MsgChannelUpgradeTry {
        port_id: port(),
        channel_id: channel_id.clone(),
        proposed_connection_hops: counterparty_upgrade.fields.connection_hops.clone(),
        counterparty_upgrade,
        counterparty_upgrade_sequence: channel.upgrade_sequence,
        proof_channel: proofs[0].clone(),
        proof_upgrade: proofs[1].clone(),
        proof_height,
    }))
}

/// `ChanUpgradeTry` on `dst` for the current proposal of `src`.
pub fn upgrade_try(
    src: &mut Chain,
    dst: &mut Chain,
    channel_id: &ChannelId,
) -> Result<MsgResponse, ChannelError> {
    let store = src.store.clone();
    upgrade_try_from(src, &store, dst, channel_id)
}

fn channel_and_upgrade(
    src: &mut Chain,
    dst: &mut Chain,
    channel_id: &ChannelId,
) -> (ChannelEnd, Upgrade, Height, Vec<CommitmentProofBytes>) {
    let channel = src.channel(channel_id);
    let upgrade = src.upgrade(channel_id).unwrap();
    let (proof_height, proofs) = prove(
        src,
        dst,
        &[
            Path::ChannelEnd(port(), channel_id.clone()),
            Path::ChannelUpgrade(port(), channel_id.clone()),
        ],
    );
    (channel, upgrade, proof_height, proofs)
}

pub fn upgrade_ack(
    src: &mut Chain,
    dst: &mut Chain,
    channel_id: &ChannelId,
) -> Result<MsgResponse, ChannelError> {
    let (channel, upgrade, proof_height, proofs) = channel_and_upgrade(src, dst, channel_id);
    dst.deliver(ChannelMsg::UpgradeAck(MsgChannelUpgradeAck {
        port_id: port(),
        channel_id: channel_id.clone(),
        counterparty_upgrade: upgrade,
        counterparty_upgrade_sequence: channel.upgrade_sequence,
        proof_channel: proofs[0].clone(),
        proof_upgrade: proofs[1].clone(),
        proof_height,
    }))
}

pub fn upgrade_confirm(
    src: &mut Chain,
    dst: &mut Chain,
    channel_id: &ChannelId,
) -> Result<MsgResponse, ChannelError> {
    let (channel, upgrade, proof_height, proofs) = channel_and_upgrade(src, dst, channel_id);
    dst.deliver(ChannelMsg::UpgradeConfirm(MsgChannelUpgradeConfirm {
        port_id: port(),
        channel_id: channel_id.clone(),
        counterparty_channel_state: channel.state,
        counterparty_upgrade: upgrade,
        proof_channel: proofs[0].clone(),
        proof_upgrade: proofs[1].clone(),
        proof_height,
    }))
}

pub fn upgrade_open(
    src: &mut Chain,
    dst: &mut Chain,
    channel_id: &ChannelId,
) -> Result<MsgResponse, ChannelError> {
    let channel = src.channel(channel_id);
    let (proof_height, proofs) = prove(src, dst, &[Path::ChannelEnd(port(), channel_id.clone())]);
    dst.deliver(ChannelMsg::UpgradeOpen(MsgChannelUpgradeOpen {
        port_id: port(),
        channel_id: channel_id.clone(),
        counterparty_channel_state: channel.state,
        proof_channel: proofs[0].clone(),
        proof_height,
    }))
}

pub fn upgrade_timeout(
    src: &mut Chain,
    dst: &mut Chain,
    channel_id: &ChannelId,
) -> Result<MsgResponse, ChannelError> {
    let channel = src.channel(channel_id);
    let (proof_height, proofs) = prove(src, dst, &[Path::ChannelEnd(port(), channel_id.clone())]);
    dst.deliver(ChannelMsg::UpgradeTimeout(MsgChannelUpgradeTimeout {
        port_id: port(),
        channel_id: channel_id.clone(),
        counterparty_channel: channel,
        proof_channel: proofs[0].clone(),
        proof_height,
    }))
}

pub fn upgrade_cancel(
    src: &mut Chain,
    dst: &mut Chain,
    channel_id: &ChannelId,
) -> Result<MsgResponse, ChannelError> {
    let error_receipt = src.error_receipt(channel_id).unwrap();
    let (proof_height, proofs) = prove(
        src,
        dst,
        &[Path::UpgradeErrorReceipt(port(), channel_id.clone())],
    );
    dst.deliver(ChannelMsg::UpgradeCancel(MsgChannelUpgradeCancel {
        port_id: port(),
        channel_id: channel_id.clone(),
        error_receipt,
        proof_error_receipt: proofs[0].clone(),
        proof_height,
    }))
}

/// Sends `data` from `chain`, timing out at `timeout_timestamp` on the
/// receiver.
pub fn send(
    chain: &mut Chain,
    channel_id: &ChannelId,
    data: &[u8],
    timeout_timestamp: u64,
) -> Result<Packet, ChannelError> {
    let channel = chain.channel(channel_id);
    let sequence = send_packet(
        &mut chain.ctx(),
        &port(),
        channel_id,
        Height::zero(),
        timeout_timestamp,
        data.to_vec(),
    )?;
    Ok(Packet {
        sequence,
        source_port: port(),
        source_channel: channel_id.clone(),
        destination_port: channel.counterparty.port_id.clone(),
        destination_channel: channel.counterparty.channel_id.unwrap(),
        data: data.to_vec(),
        timeout_height: Height::zero(),
        timeout_timestamp,
    })
}

pub fn recv(
    src: &mut Chain,
    dst: &mut Chain,
    packet: &Packet,
) -> Result<MsgResponse, ChannelError> {
    let (proof_height, proofs) = prove(
        src,
        dst,
        &[Path::packet_commitment(
            &packet.source_port,
            &packet.source_channel,
            packet.sequence,
        )],
    );
    dst.deliver(ChannelMsg::RecvPacket(MsgRecvPacket {
        packet: packet.clone(),
        proof_commitment: proofs[0].clone(),
        proof_height,
    }))
}

pub fn write_ack(chain: &mut Chain, packet: &Packet, ack: &[u8]) -> Result<(), ChannelError> {
    write_acknowledgement(&mut chain.ctx(), packet, ack)
}

/// Relays the acknowledgement `dst` wrote for `packet` back to `src`.
pub fn acknowledge(
    dst: &mut Chain,
    src: &mut Chain,
    packet: &Packet,
    ack: &[u8],
) -> Result<MsgResponse, ChannelError> {
    let (proof_height, proofs) = prove(
        dst,
        src,
        &[Path::packet_acknowledgement(
            &packet.destination_port,
            &packet.destination_channel,
            packet.sequence,
        )],
    );
    src.deliver(ChannelMsg::Acknowledgement(MsgAcknowledgement {
        packet: packet.clone(),
        acknowledgement: ack.to_vec(),
        proof_acked: proofs[0].clone(),
        proof_height,
    }))
}

/// Times `packet` out on `src` with proof that `dst` never received it.
pub fn timeout(
    dst: &mut Chain,
    src: &mut Chain,
    packet: &Packet,
) -> Result<MsgResponse, ChannelError> {
    let ordering = src.channel(&packet.source_channel).ordering;
    let (path, next_sequence_recv) = match ordering {
        Ordering::Ordered => (
            Path::NextSequenceRecv(
                packet.destination_port.clone(),
                packet.destination_channel.clone(),
            ),
            state::next_sequence_recv(
                &dst.ctx(),
                &packet.destination_port,
                &packet.destination_channel,
            )
            .unwrap(),
        ),
        Ordering::Unordered => (
            Path::packet_receipt(
                &packet.destination_port,
                &packet.destination_channel,
                packet.sequence,
            ),
            0,
        ),
    };
    let (proof_height, proofs) = prove(dst, src, &[path]);
    src.deliver(ChannelMsg::Timeout(MsgTimeout {
        packet: packet.clone(),
        next_sequence_recv,
        proof_unreceived: proofs[0].clone(),
        proof_height,
    }))
}

/// Overwrites the upgrade sequence of a channel end.
pub fn set_upgrade_sequence(chain: &mut Chain, channel_id: &ChannelId, sequence: u64) {
    let mut channel = chain.channel(channel_id);
    channel.upgrade_sequence = sequence;
    state::store_channel(&mut chain.ctx(), &port(), channel_id, &channel).unwrap();
}
