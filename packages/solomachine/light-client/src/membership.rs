//! Solo machine (non-)membership verification. Each successful proof
//! consumes one sequence, so the caller must persist the returned state.

use interchain_commitment::MerklePath;
use interchain_host::Height;

use crate::{
    client_state::ClientState,
    error::SoloMachineError,
    proof::{DataType, SignBytes, TimestampedSignatureData},
};

/// Verifies that the solo machine signed `value` at `path`.
/// Returns the client state with the sequence consumed.
///
/// # Errors
/// Returns an error if:
/// - The client is frozen
/// - The proof height is not usable, see [`check_proof_height`]
/// - The proof is malformed or predates the consensus timestamp
/// - The signature does not verify
pub fn verify_membership(
    client_state: &ClientState,
    height: Height,
    proof: &[u8],
    path: &MerklePath,
    value: Vec<u8>,
) -> Result<ClientState, SoloMachineError> {
    let data_type = DataType::for_path(&path.path);
    verify_signature(client_state, height, proof, path, data_type, value)
}

/// Verifies that the solo machine signed the absence of a value at `path`.
/// Returns the client state with the sequence consumed.
///
/// # Errors
/// Same conditions as [`verify_membership`].
pub fn verify_non_membership(
    client_state: &ClientState,
    height: Height,
    proof: &[u8],
    path: &MerklePath,
) -> Result<ClientState, SoloMachineError> {
    let data_type = DataType::absence_for_path(&path.path);
    verify_signature(client_state, height, proof, path, data_type, Vec::new())
}

/// A proof height must be at revision 0 and not ahead of the sequence.
/// # Errors
/// Returns [`SoloMachineError::InvalidProof`].
pub fn check_proof_height(
    client_state: &ClientState,
    height: Height,
) -> Result<(), SoloMachineError> {
    if height.revision_number != 0 {
        return Err(SoloMachineError::InvalidProof {
            reason: format!("revision number must be 0, got {}", height.revision_number),
        });
    }
    if height.revision_height > client_state.sequence {
        return Err(SoloMachineError::InvalidProof {
            reason: format!(
                "proof height {height} is ahead of client sequence {}",
                client_state.sequence
            ),
        });
    }
    Ok(())
}

fn verify_signature(
    client_state: &ClientState,
    height: Height,
    proof: &[u8],
    path: &MerklePath,
    data_type: DataType,
    data: Vec<u8>,
) -> Result<ClientState, SoloMachineError> {
    if client_state.is_frozen {
        return Err(SoloMachineError::ClientFrozen);
    }
    check_proof_height(client_state, height)?;

    let proof = TimestampedSignatureData::from_proof(proof)?;
    let consensus = &client_state.consensus_state;
    if proof.timestamp < consensus.timestamp {
        return Err(SoloMachineError::InvalidProof {
            reason: format!(
                "signature timestamp {} is older than consensus timestamp {}",
                proof.timestamp, consensus.timestamp
            ),
        });
    }

    let sign_bytes = SignBytes {
        sequence: client_state.sequence,
        timestamp: proof.timestamp,
        diversifier: consensus.diversifier.clone(),
        data_type,
        path: path.to_bytes(),
        data,
    }
    .to_bytes()?;
    consensus
        .public_key
        .verify(&sign_bytes, &proof.signature_data)?;

    let mut next = client_state.clone();
    next.sequence = next.sequence.saturating_add(1);
    next.consensus_state.timestamp = proof.timestamp;
    Ok(next)
}
