//! Light client module operations. Each loads the stored client state and
//! routes to its variant.

use interchain_commitment::{CommitmentProofBytes, DelayPeriod, MerklePath};
use interchain_host::{ClientId, Context, Height, KvStore};
use solomachine_light_client::{
    client_state::ClientState as SoloMachineClientState, error::SoloMachineError, membership,
    recover, update, verify,
};
use tracing::debug;

use crate::{
    error::ClientError,
    state::{
        get_client_state, get_processed, store_client_state, store_consensus_state,
        store_processed,
    },
    types::{AnyClientState, AnyConsensusState, ClientMessage, ClientStatus},
};

/// Validates and stores the initial states of a new client.
/// # Errors
/// Returns [`ClientError::InvalidInitialState`] if either state is rejected.
pub fn initialize<S: KvStore>(
    ctx: &mut Context<'_, S>,
    client_id: &ClientId,
    client_state: &AnyClientState,
    consensus_state: &AnyConsensusState,
) -> Result<(), ClientError> {
    match (client_state, consensus_state) {
        (AnyClientState::SoloMachine(cs), AnyConsensusState::SoloMachine(cons)) => {
            cs.validate().map_err(ClientError::InvalidInitialState)?;
            if cs.consensus_state != *cons {
                return Err(ClientError::InvalidInitialState(
                    SoloMachineError::InvalidConsensusState {
                        reason: "does not match the client state".into(),
                    },
                ));
            }
        }
    }

    let height = client_state.latest_height();
    store_client_state(ctx, client_id, client_state)?;
    store_consensus_state(ctx, client_id, height, consensus_state)?;
    store_processed(ctx, client_id, height)
}

/// Status of the client. Missing clients are `Unknown`; clients whose
/// type left the allow list are `Unauthorized`.
#[must_use]
pub fn status<S: KvStore>(ctx: &Context<'_, S>, client_id: &ClientId) -> ClientStatus {
    let Ok(client_state) = get_client_state(ctx, client_id) else {
        return ClientStatus::Unknown;
    };
    if !ctx
        .params()
        .is_client_allowed(client_state.client_type().as_str())
    {
        return ClientStatus::Unauthorized;
    }
    client_state.status()
}

/// Fails unless the client is active.
/// # Errors
/// Returns [`ClientError::ClientNotActive`] with the actual status.
pub fn ensure_active<S: KvStore>(
    ctx: &Context<'_, S>,
    client_id: &ClientId,
) -> Result<(), ClientError> {
    match status(ctx, client_id) {
        ClientStatus::Active => Ok(()),
        status => Err(ClientError::ClientNotActive {
            client_id: client_id.clone(),
            status,
        }),
    }
}

/// Latest height of the client.
/// # Errors
/// Returns an error if the client does not exist.
pub fn latest_height<S: KvStore>(
    ctx: &Context<'_, S>,
    client_id: &ClientId,
) -> Result<Height, ClientError> {
    Ok(get_client_state(ctx, client_id)?.latest_height())
}

/// Counterparty time at `height`. A solo machine only knows its current
/// consensus timestamp.
/// # Errors
/// Returns an error if the client does not exist.
pub fn timestamp_at_height<S: KvStore>(
    ctx: &Context<'_, S>,
    client_id: &ClientId,
    _height: Height,
) -> Result<u64, ClientError> {
    match get_client_state(ctx, client_id)? {
        AnyClientState::SoloMachine(cs) => Ok(cs.consensus_state.timestamp),
    }
}

/// Verifies a header or misbehaviour against the stored client.
/// # Errors
/// Returns [`ClientError::VerifyClientMessageFailed`].
pub fn verify_client_message<S: KvStore>(
    ctx: &Context<'_, S>,
    client_id: &ClientId,
    message: &ClientMessage,
) -> Result<(), ClientError> {
    let AnyClientState::SoloMachine(cs) = get_client_state(ctx, client_id)?;
    match message {
        ClientMessage::Header(header) => verify::verify_header(&cs, header),
        ClientMessage::Misbehaviour(misbehaviour) => {
            verify::verify_misbehaviour(&cs, misbehaviour)
        }
    }
    .map_err(ClientError::VerifyClientMessageFailed)
}

/// Whether `message` proves misbehaviour. Headers never do.
/// # Errors
/// Returns an error if the client does not exist.
pub fn check_for_misbehaviour<S: KvStore>(
    ctx: &Context<'_, S>,
    client_id: &ClientId,
    message: &ClientMessage,
) -> Result<bool, ClientError> {
    let AnyClientState::SoloMachine(cs) = get_client_state(ctx, client_id)?;
    Ok(match message {
        ClientMessage::Header(_) => false,
        ClientMessage::Misbehaviour(misbehaviour) => {
            verify::check_for_misbehaviour(&cs, misbehaviour)
        }
    })
}

/// Applies a verified header.
/// Returns the heights of the consensus states written.
/// # Errors
/// Returns an error if `message` is not a header or storage fails.
pub fn update_state<S: KvStore>(
    ctx: &mut Context<'_, S>,
    client_id: &ClientId,
    message: &ClientMessage,
) -> Result<Vec<Height>, ClientError> {
    let AnyClientState::SoloMachine(cs) = get_client_state(ctx, client_id)?;
    let ClientMessage::Header(header) = message else {
        return Err(ClientError::InvalidClientMessage(
            "only headers update the client state".into(),
        ));
    };

    let (new_client_state, height) = update::update_state(cs, header);
    let consensus_state = AnyConsensusState::SoloMachine(new_client_state.consensus_state.clone());
    store_client_state(ctx, client_id, &AnyClientState::SoloMachine(new_client_state))?;
    store_consensus_state(ctx, client_id, height, &consensus_state)?;
    store_processed(ctx, client_id, height)?;
    Ok(vec![height])
}

/// Freezes the client.
/// # Errors
/// Returns an error if the client does not exist.
pub fn update_state_on_misbehaviour<S: KvStore>(
    ctx: &mut Context<'_, S>,
    client_id: &ClientId,
) -> Result<(), ClientError> {
    let AnyClientState::SoloMachine(cs) = get_client_state(ctx, client_id)?;
    let frozen = update::update_state_on_misbehaviour(cs);
    store_client_state(ctx, client_id, &AnyClientState::SoloMachine(frozen))
}

/// Verifies that the counterparty stored `value` at `path`.
/// # Errors
/// Returns an error if the client is not active, the delay period has not
/// passed since `height` was processed, or the proof does not verify.
pub fn verify_membership<S: KvStore>(
    ctx: &mut Context<'_, S>,
    client_id: &ClientId,
    height: Height,
    delay: DelayPeriod,
    proof: &CommitmentProofBytes,
    path: &MerklePath,
    value: Vec<u8>,
) -> Result<(), ClientError> {
    let cs = prepare_verification(ctx, client_id, height, delay)?;
    let AnyClientState::SoloMachine(cs) = cs;
    let next = membership::verify_membership(&cs, height, proof.as_bytes(), path, value)
        .map_err(|e| {
            debug!(%client_id, %path, error = %e, "membership proof rejected");
            ClientError::VerifyMembershipFailed(e)
        })?;
    persist_verified(ctx, client_id, next)
}

/// Verifies that the counterparty stored nothing at `path`.
/// # Errors
/// Same conditions as [`verify_membership`].
pub fn verify_non_membership<S: KvStore>(
    ctx: &mut Context<'_, S>,
    client_id: &ClientId,
    height: Height,
    delay: DelayPeriod,
    proof: &CommitmentProofBytes,
    path: &MerklePath,
) -> Result<(), ClientError> {
    let cs = prepare_verification(ctx, client_id, height, delay)?;
    let AnyClientState::SoloMachine(cs) = cs;
    let next = membership::verify_non_membership(&cs, height, proof.as_bytes(), path)
        .map_err(|e| {
            debug!(%client_id, %path, error = %e, "non-membership proof rejected");
            ClientError::VerifyMembershipFailed(e)
        })?;
    persist_verified(ctx, client_id, next)
}

fn prepare_verification<S: KvStore>(
    ctx: &Context<'_, S>,
    client_id: &ClientId,
    height: Height,
    delay: DelayPeriod,
) -> Result<AnyClientState, ClientError> {
    ensure_active(ctx, client_id)?;
    if !delay.is_none() {
        let (processed_time, processed_height) = get_processed(ctx, client_id, height)?;
        delay.verify_passed(
            processed_time,
            processed_height,
            ctx.env().timestamp,
            ctx.env().height,
        )?;
    }
    get_client_state(ctx, client_id)
}

// A solo machine signature is single use: the advanced state must be stored.
fn persist_verified<S: KvStore>(
    ctx: &mut Context<'_, S>,
    client_id: &ClientId,
    next: SoloMachineClientState,
) -> Result<(), ClientError> {
    let height = next.latest_height();
    store_client_state(ctx, client_id, &AnyClientState::SoloMachine(next))?;
    store_processed(ctx, client_id, height)
}

/// Replaces the subject's state with the substitute's, per the variant rule.
/// # Errors
/// Returns an error if either client is missing, the types differ or the
/// variant rejects the substitute.
pub fn recover_client<S: KvStore>(
    ctx: &mut Context<'_, S>,
    subject_id: &ClientId,
    substitute_id: &ClientId,
) -> Result<(), ClientError> {
    let subject = get_client_state(ctx, subject_id)?;
    let substitute = get_client_state(ctx, substitute_id)?;
    if subject.client_type() != substitute.client_type() {
        return Err(ClientError::ClientTypeMismatch {
            subject: subject.client_type().to_string(),
            substitute: substitute.client_type().to_string(),
        });
    }

    match (subject, substitute) {
        (AnyClientState::SoloMachine(subject), AnyClientState::SoloMachine(substitute)) => {
            let recovered = recover::check_substitute_and_update_state(&subject, &substitute)
                .map_err(ClientError::RecoverFailed)?;
            let height = recovered.latest_height();
            let consensus = AnyConsensusState::SoloMachine(recovered.consensus_state.clone());
            store_client_state(ctx, subject_id, &AnyClientState::SoloMachine(recovered))?;
            store_consensus_state(ctx, subject_id, height, &consensus)?;
            store_processed(ctx, subject_id, height)
        }
    }
}
