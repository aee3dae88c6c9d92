//! Client message handlers: create, update, misbehaviour and recovery.

use interchain_host::{
    events::{ClientEvent, IbcEvent},
    ClientId, Context, Height, KvStore, Path,
};
use solomachine_light_client::misbehaviour::Misbehaviour;
use tracing::{info, warn};

use crate::{
    error::ClientError,
    module,
    state::get_client_state,
    types::{AnyClientState, AnyConsensusState, ClientMessage, ClientStatus},
};

/// Creates a client with a fresh `{client_type}-{n}` identifier.
/// # Errors
/// Returns an error if the client type is not allowed or the initial states
/// are rejected.
pub fn create_client<S: KvStore>(
    ctx: &mut Context<'_, S>,
    client_state: &AnyClientState,
    consensus_state: &AnyConsensusState,
) -> Result<ClientId, ClientError> {
    let client_type = client_state.client_type();
    if !ctx.params().is_client_allowed(client_type.as_str()) {
        return Err(ClientError::ClientTypeNotAllowed(client_type.to_string()));
    }

    let sequence = ctx.bump_counter(&Path::NextClientSequence)?;
    let client_id = ClientId::with_sequence(client_type.as_str(), sequence)?;
    module::initialize(ctx, &client_id, client_state, consensus_state)?;

    let height = client_state.latest_height();
    info!(%client_id, %height, "client created");
    ctx.emit(IbcEvent::CreateClient(client_event(
        &client_id,
        client_state,
        vec![height],
    )));
    Ok(client_id)
}

/// Verifies `message` and applies it. Valid misbehaviour freezes the client;
/// a header advances it.
/// # Errors
/// Returns an error if the client is not active or `message` fails
/// verification.
pub fn update_client<S: KvStore>(
    ctx: &mut Context<'_, S>,
    client_id: &ClientId,
    message: &ClientMessage,
) -> Result<(), ClientError> {
    module::ensure_active(ctx, client_id)?;
    module::verify_client_message(ctx, client_id, message)?;

    if module::check_for_misbehaviour(ctx, client_id, message)? {
        freeze(ctx, client_id)?;
        return Ok(());
    }

    let heights = module::update_state(ctx, client_id, message)?;
    let client_state = get_client_state(ctx, client_id)?;
    info!(%client_id, height = %client_state.latest_height(), "client updated");
    ctx.emit(IbcEvent::UpdateClient(client_event(
        client_id,
        &client_state,
        heights,
    )));
    Ok(())
}

/// Freezes the client if `misbehaviour` proves equivocation.
/// # Errors
/// Returns an error if the client is not active or the evidence does not
/// verify.
pub fn submit_misbehaviour<S: KvStore>(
    ctx: &mut Context<'_, S>,
    client_id: &ClientId,
    misbehaviour: Misbehaviour,
) -> Result<(), ClientError> {
    let message = ClientMessage::Misbehaviour(misbehaviour);
    module::ensure_active(ctx, client_id)?;
    module::verify_client_message(ctx, client_id, &message)?;
    if !module::check_for_misbehaviour(ctx, client_id, &message)? {
        return Err(ClientError::MisbehaviourNotDetected);
    }
    freeze(ctx, client_id)
}

/// Restores a frozen or expired `subject` from an active `substitute` of the
/// same type.
/// # Errors
/// Returns an error if the subject is active, the substitute is not, or the
/// variant rejects the substitute.
pub fn recover_client<S: KvStore>(
    ctx: &mut Context<'_, S>,
    subject_id: &ClientId,
    substitute_id: &ClientId,
) -> Result<(), ClientError> {
    match module::status(ctx, subject_id) {
        ClientStatus::Active => return Err(ClientError::ClientActive(subject_id.clone())),
        ClientStatus::Unknown => return Err(ClientError::ClientNotFound(subject_id.clone())),
        ClientStatus::Frozen | ClientStatus::Expired | ClientStatus::Unauthorized => {}
    }
    module::ensure_active(ctx, substitute_id)?;
    module::recover_client(ctx, subject_id, substitute_id)?;

    info!(%subject_id, %substitute_id, "client recovered");
    ctx.emit(IbcEvent::RecoverClient {
        subject_client_id: subject_id.clone(),
        substitute_client_id: substitute_id.clone(),
    });
    Ok(())
}

fn freeze<S: KvStore>(ctx: &mut Context<'_, S>, client_id: &ClientId) -> Result<(), ClientError> {
    module::update_state_on_misbehaviour(ctx, client_id)?;
    let client_state = get_client_state(ctx, client_id)?;
    warn!(%client_id, "misbehaviour detected, client frozen");
    ctx.emit(IbcEvent::ClientMisbehaviour(client_event(
        client_id,
        &client_state,
        Vec::new(),
    )));
    Ok(())
}

fn client_event(
    client_id: &ClientId,
    client_state: &AnyClientState,
    consensus_heights: Vec<Height>,
) -> ClientEvent {
    ClientEvent {
        client_id: client_id.clone(),
        client_type: client_state.client_type().to_string(),
        consensus_heights,
    }
}

#[cfg(test)]
mod tests {
    use interchain_commitment::{CommitmentPrefix, CommitmentProofBytes, DelayPeriod, MerklePath};
    use interchain_host::{config::IbcParams, ChannelId, HostEnv, MemStore, PortId};
    use rstest::rstest;
    use solomachine_light_client::test_utils::{TestSoloMachine, ED25519_KEY};

    use super::*;
    use crate::state::{get_consensus_state, get_processed};

    fn env() -> HostEnv {
        HostEnv::new("chain-a", Height::new(0, 100), 1_000)
    }

    fn states(sm: &TestSoloMachine) -> (AnyClientState, AnyConsensusState) {
        (
            AnyClientState::SoloMachine(sm.client_state()),
            AnyConsensusState::SoloMachine(sm.consensus_state()),
        )
    }

    fn receipt_path() -> MerklePath {
        MerklePath::new(
            CommitmentPrefix::new(b"ibc".to_vec()).unwrap(),
            Path::packet_receipt(
                &PortId::new("transfer").unwrap(),
                &ChannelId::with_sequence(0),
                1,
            ),
        )
    }

    #[test]
    fn create_assigns_sequential_ids() {
        let (mut store, env, params) = (MemStore::new(), env(), IbcParams::default());
        let mut ctx = Context::new(&mut store, &env, &params);
        let (cs, cons) = states(&TestSoloMachine::new("testing"));

        let first = create_client(&mut ctx, &cs, &cons).unwrap();
        let second = create_client(&mut ctx, &cs, &cons).unwrap();
        assert_eq!(first.as_str(), "06-solomachine-0");
        assert_eq!(second.as_str(), "06-solomachine-1");
        assert_eq!(module::status(&ctx, &first), ClientStatus::Active);
        assert_eq!(
            get_consensus_state(&ctx, &first, cs.latest_height()).unwrap(),
            cons
        );
        assert_eq!(ctx.events().len(), 2);
    }

    #[test]
    fn create_rejects_disallowed_type() {
        let (mut store, env) = (MemStore::new(), env());
        let params = IbcParams {
            allowed_clients: vec!["07-tendermint".into()],
            ..IbcParams::default()
        };
        let mut ctx = Context::new(&mut store, &env, &params);
        let (cs, cons) = states(&TestSoloMachine::new("testing"));
        assert_eq!(
            create_client(&mut ctx, &cs, &cons),
            Err(ClientError::ClientTypeNotAllowed("06-solomachine".into()))
        );
    }

    #[test]
    fn create_rejects_mismatched_consensus() {
        let (mut store, env, params) = (MemStore::new(), env(), IbcParams::default());
        let mut ctx = Context::new(&mut store, &env, &params);
        let (cs, _) = states(&TestSoloMachine::new("testing"));
        let (_, other) = states(&TestSoloMachine::new_ed25519("testing"));
        assert!(matches!(
            create_client(&mut ctx, &cs, &other),
            Err(ClientError::InvalidInitialState(_))
        ));
    }

    #[test]
    fn header_update_rotates_key() {
        let (mut store, env, params) = (MemStore::new(), env(), IbcParams::default());
        let mut ctx = Context::new(&mut store, &env, &params);
        let mut sm = TestSoloMachine::new("testing");
        let (cs, cons) = states(&sm);
        let client_id = create_client(&mut ctx, &cs, &cons).unwrap();

        let header = sm.create_header(ED25519_KEY.clone(), "next");
        update_client(&mut ctx, &client_id, &ClientMessage::Header(header.clone())).unwrap();

        let updated = get_client_state(&ctx, &client_id).unwrap();
        assert_eq!(updated, AnyClientState::SoloMachine(sm.client_state()));
        assert!(matches!(ctx.events().last(), Some(IbcEvent::UpdateClient(_))));

        // replay is rejected
        assert!(matches!(
            update_client(&mut ctx, &client_id, &ClientMessage::Header(header)),
            Err(ClientError::VerifyClientMessageFailed(_))
        ));
    }

    #[test]
    fn misbehaviour_freezes_and_blocks_updates() {
        let (mut store, env, params) = (MemStore::new(), env(), IbcParams::default());
        let mut ctx = Context::new(&mut store, &env, &params);
        let mut sm = TestSoloMachine::new("testing");
        let (cs, cons) = states(&sm);
        let client_id = create_client(&mut ctx, &cs, &cons).unwrap();

        submit_misbehaviour(&mut ctx, &client_id, sm.create_misbehaviour(b"a", b"b")).unwrap();
        assert_eq!(module::status(&ctx, &client_id), ClientStatus::Frozen);

        let header = sm.create_header(ED25519_KEY.clone(), "next");
        assert_eq!(
            update_client(&mut ctx, &client_id, &ClientMessage::Header(header)),
            Err(ClientError::ClientNotActive {
                client_id: client_id.clone(),
                status: ClientStatus::Frozen,
            })
        );
    }

    #[test]
    fn misbehaviour_through_update_freezes() {
        let (mut store, env, params) = (MemStore::new(), env(), IbcParams::default());
        let mut ctx = Context::new(&mut store, &env, &params);
        let sm = TestSoloMachine::new("testing");
        let (cs, cons) = states(&sm);
        let client_id = create_client(&mut ctx, &cs, &cons).unwrap();

        let message = ClientMessage::Misbehaviour(sm.create_misbehaviour(b"a", b"b"));
        update_client(&mut ctx, &client_id, &message).unwrap();
        assert_eq!(module::status(&ctx, &client_id), ClientStatus::Frozen);
        assert!(matches!(
            ctx.events().last(),
            Some(IbcEvent::ClientMisbehaviour(_))
        ));
    }

    #[test]
    fn identical_evidence_is_not_misbehaviour() {
        let (mut store, env, params) = (MemStore::new(), env(), IbcParams::default());
        let mut ctx = Context::new(&mut store, &env, &params);
        let sm = TestSoloMachine::new("testing");
        let (cs, cons) = states(&sm);
        let client_id = create_client(&mut ctx, &cs, &cons).unwrap();

        let mut misbehaviour = sm.create_misbehaviour(b"a", b"b");
        misbehaviour.signature_two = misbehaviour.signature_one.clone();
        assert!(submit_misbehaviour(&mut ctx, &client_id, misbehaviour).is_err());
        assert_eq!(module::status(&ctx, &client_id), ClientStatus::Active);
    }

    #[test]
    fn membership_advances_client_and_records_processed_time() {
        let (mut store, env, params) = (MemStore::new(), env(), IbcParams::default());
        let mut ctx = Context::new(&mut store, &env, &params);
        let mut sm = TestSoloMachine::new("testing");
        let (cs, cons) = states(&sm);
        let client_id = create_client(&mut ctx, &cs, &cons).unwrap();

        let path = receipt_path();
        let (height, proof) = sm.prove(&path, &[1]);
        let proof = CommitmentProofBytes::try_from(proof).unwrap();
        module::verify_membership(
            &mut ctx,
            &client_id,
            height,
            DelayPeriod::none(),
            &proof,
            &path,
            vec![1],
        )
        .unwrap();

        let latest = module::latest_height(&ctx, &client_id).unwrap();
        assert_eq!(latest, height.increment());
        assert_eq!(
            get_processed(&ctx, &client_id, latest).unwrap(),
            (env.timestamp, env.height)
        );
    }

    #[test]
    fn non_membership_on_an_unchanged_client_is_deterministic() {
        let (mut store, env, params) = (MemStore::new(), env(), IbcParams::default());
        let mut ctx = Context::new(&mut store, &env, &params);
        let mut sm = TestSoloMachine::new("testing");
        let (cs, cons) = states(&sm);
        let client_id = create_client(&mut ctx, &cs, &cons).unwrap();

        let path = receipt_path();
        let (height, proof) = sm.prove_absence(&path);
        let proof = CommitmentProofBytes::try_from(proof).unwrap();

        // each branch is discarded so the stored client is the same for both runs
        let mut run = || {
            ctx.atomically(|tx| {
                let res = module::verify_non_membership(
                    tx,
                    &client_id,
                    height,
                    DelayPeriod::none(),
                    &proof,
                    &path,
                );
                Err::<(), _>((res, get_client_state(tx, &client_id)))
            })
            .unwrap_err()
        };
        let first = run();
        let second = run();

        assert_eq!(first.0, Ok(()));
        assert_eq!(first, second);
        assert_eq!(first.1, Ok(AnyClientState::SoloMachine(sm.client_state())));
        assert_eq!(get_client_state(&ctx, &client_id).unwrap(), cs);
    }

    #[rstest]
    #[case::time_not_passed(DelayPeriod { time_ns: 1, blocks: 0 }, false)]
    #[case::blocks_not_passed(DelayPeriod { time_ns: 0, blocks: 1 }, false)]
    #[case::no_delay(DelayPeriod::none(), true)]
    fn membership_enforces_delay(#[case] delay: DelayPeriod, #[case] ok: bool) {
        let (mut store, env, params) = (MemStore::new(), env(), IbcParams::default());
        let mut ctx = Context::new(&mut store, &env, &params);
        let mut sm = TestSoloMachine::new("testing");
        let (cs, cons) = states(&sm);
        let client_id = create_client(&mut ctx, &cs, &cons).unwrap();

        let path = receipt_path();
        let (height, proof) = sm.prove(&path, &[1]);
        let proof = CommitmentProofBytes::try_from(proof).unwrap();
        let res =
            module::verify_membership(&mut ctx, &client_id, height, delay, &proof, &path, vec![1]);
        assert_eq!(res.is_ok(), ok);
        if !ok {
            assert!(matches!(res, Err(ClientError::Delay(_))));
        }
    }

    #[test]
    fn unauthorized_when_type_leaves_allow_list() {
        let mut store = MemStore::new();
        let env = env();
        let client_id = {
            let params = IbcParams::default();
            let mut ctx = Context::new(&mut store, &env, &params);
            let (cs, cons) = states(&TestSoloMachine::new("testing"));
            create_client(&mut ctx, &cs, &cons).unwrap()
        };
        let params = IbcParams {
            allowed_clients: vec!["07-tendermint".into()],
            ..IbcParams::default()
        };
        let ctx = Context::new(&mut store, &env, &params);
        assert_eq!(module::status(&ctx, &client_id), ClientStatus::Unauthorized);
        assert_eq!(
            module::status(&ctx, &ClientId::new("06-solomachine-9").unwrap()),
            ClientStatus::Unknown
        );
    }

    #[test]
    fn recover_frozen_client() {
        let (mut store, env, params) = (MemStore::new(), env(), IbcParams::default());
        let mut ctx = Context::new(&mut store, &env, &params);
        let sm = TestSoloMachine::new("testing");
        let (cs, cons) = states(&sm);
        let subject = create_client(&mut ctx, &cs, &cons).unwrap();

        let mut substitute_sm = TestSoloMachine::new_ed25519("substitute");
        substitute_sm.sequence = 10;
        let (sub_cs, sub_cons) = states(&substitute_sm);
        let substitute = create_client(&mut ctx, &sub_cs, &sub_cons).unwrap();

        // active subject cannot be recovered
        assert_eq!(
            recover_client(&mut ctx, &subject, &substitute),
            Err(ClientError::ClientActive(subject.clone()))
        );

        submit_misbehaviour(&mut ctx, &subject, sm.create_misbehaviour(b"a", b"b")).unwrap();
        recover_client(&mut ctx, &subject, &substitute).unwrap();

        assert_eq!(module::status(&ctx, &subject), ClientStatus::Active);
        assert_eq!(
            module::latest_height(&ctx, &subject).unwrap(),
            Height::new(0, 10)
        );
        assert!(matches!(
            ctx.events().last(),
            Some(IbcEvent::RecoverClient { .. })
        ));
    }

    #[test]
    fn recover_requires_substitute_ahead() {
        let (mut store, env, params) = (MemStore::new(), env(), IbcParams::default());
        let mut ctx = Context::new(&mut store, &env, &params);
        let mut sm = TestSoloMachine::new("testing");
        sm.sequence = 5;
        let (cs, cons) = states(&sm);
        let subject = create_client(&mut ctx, &cs, &cons).unwrap();
        let (sub_cs, sub_cons) = states(&TestSoloMachine::new_ed25519("substitute"));
        let substitute = create_client(&mut ctx, &sub_cs, &sub_cons).unwrap();

        submit_misbehaviour(&mut ctx, &subject, sm.create_misbehaviour(b"a", b"b")).unwrap();
        assert!(matches!(
            recover_client(&mut ctx, &subject, &substitute),
            Err(ClientError::RecoverFailed(_))
        ));
    }
}
