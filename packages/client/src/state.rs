//! Client state storage

use interchain_host::{ClientId, Context, Height, KvStore, Path};

use crate::{
    error::ClientError,
    types::{AnyClientState, AnyConsensusState},
};

/// Get the client state
/// # Errors
/// Returns an error if the client state is not found or cannot be decoded
pub fn get_client_state<S: KvStore>(
    ctx: &Context<'_, S>,
    client_id: &ClientId,
) -> Result<AnyClientState, ClientError> {
    ctx.read(&Path::ClientState(client_id.clone()))?
        .ok_or_else(|| ClientError::ClientNotFound(client_id.clone()))
}

/// Store the client state
/// # Errors
/// Returns an error if the client state cannot be encoded
#[allow(clippy::module_name_repetitions)]
pub fn store_client_state<S: KvStore>(
    ctx: &mut Context<'_, S>,
    client_id: &ClientId,
    client_state: &AnyClientState,
) -> Result<(), ClientError> {
    ctx.write(&Path::ClientState(client_id.clone()), client_state)?;
    Ok(())
}

/// Get the consensus state at a given height
/// # Errors
/// Returns an error if the consensus state is not found or cannot be decoded
pub fn get_consensus_state<S: KvStore>(
    ctx: &Context<'_, S>,
    client_id: &ClientId,
    height: Height,
) -> Result<AnyConsensusState, ClientError> {
    let path = Path::ClientConsensusState {
        client_id: client_id.clone(),
        height,
    };
    ctx.read(&path)?
        .ok_or_else(|| ClientError::ConsensusStateNotFound {
            client_id: client_id.clone(),
            height,
        })
}

/// Store the consensus state at a given height
/// # Errors
/// Returns an error if the consensus state cannot be encoded
pub fn store_consensus_state<S: KvStore>(
    ctx: &mut Context<'_, S>,
    client_id: &ClientId,
    height: Height,
    consensus_state: &AnyConsensusState,
) -> Result<(), ClientError> {
    let path = Path::ClientConsensusState {
        client_id: client_id.clone(),
        height,
    };
    ctx.write(&path, consensus_state)?;
    Ok(())
}

/// Records the host time and height at which the client reached `height`.
/// Delay periods are measured from these records.
/// # Errors
/// Returns an error if encoding fails
pub fn store_processed<S: KvStore>(
    ctx: &mut Context<'_, S>,
    client_id: &ClientId,
    height: Height,
) -> Result<(), ClientError> {
    let (host_time, host_height) = (ctx.env().timestamp, ctx.env().height);
    ctx.write(
        &Path::ClientProcessedTime {
            client_id: client_id.clone(),
            height,
        },
        &host_time,
    )?;
    ctx.write(
        &Path::ClientProcessedHeight {
            client_id: client_id.clone(),
            height,
        },
        &host_height,
    )?;
    Ok(())
}

/// Host time and height at which the client reached `height`.
/// # Errors
/// Returns an error if nothing was recorded at `height`
pub fn get_processed<S: KvStore>(
    ctx: &Context<'_, S>,
    client_id: &ClientId,
    height: Height,
) -> Result<(u64, Height), ClientError> {
    let not_found = || ClientError::ProcessedTimeNotFound {
        client_id: client_id.clone(),
        height,
    };
    let time: u64 = ctx
        .read(&Path::ClientProcessedTime {
            client_id: client_id.clone(),
            height,
        })?
        .ok_or_else(not_found)?;
    let processed_height: Height = ctx
        .read(&Path::ClientProcessedHeight {
            client_id: client_id.clone(),
            height,
        })?
        .ok_or_else(not_found)?;
    Ok((time, processed_height))
}
