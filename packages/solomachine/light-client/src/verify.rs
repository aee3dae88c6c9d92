//! Solo machine header and misbehaviour verification

use crate::{
    client_state::ClientState, error::SoloMachineError, header::Header,
    misbehaviour::Misbehaviour,
};

/// Verifies a key rotation header against the current client state.
///
/// # Errors
/// Returns an error if:
/// - The client is frozen
/// - The header is malformed, see [`Header::validate_basic`]
/// - The header sequence is not the client sequence
/// - The header timestamp is older than the consensus timestamp
/// - The signature is not by the current key
pub fn verify_header(client_state: &ClientState, header: &Header) -> Result<(), SoloMachineError> {
    if client_state.is_frozen {
        return Err(SoloMachineError::ClientFrozen);
    }

    header.validate_basic()?;

    let consensus = &client_state.consensus_state;
    if header.sequence != client_state.sequence {
        return Err(SoloMachineError::InvalidHeader {
            reason: format!(
                "header sequence {} does not match client sequence {}",
                header.sequence, client_state.sequence
            ),
        });
    }
    if header.timestamp < consensus.timestamp {
        return Err(SoloMachineError::InvalidHeader {
            reason: format!(
                "header timestamp {} is older than consensus timestamp {}",
                header.timestamp, consensus.timestamp
            ),
        });
    }

    let sign_bytes = header.sign_bytes(&consensus.diversifier)?;
    consensus.public_key.verify(&sign_bytes, &header.signature)
}

/// Verifies that both signatures of `misbehaviour` are by the current key at
/// the same sequence over different data.
///
/// # Errors
/// Returns an error if:
/// - The client is frozen
/// - The evidence is malformed or not conflicting, see [`Misbehaviour::validate_basic`]
/// - A signature predates the consensus timestamp
/// - A signature does not verify
pub fn verify_misbehaviour(
    client_state: &ClientState,
    misbehaviour: &Misbehaviour,
) -> Result<(), SoloMachineError> {
    if client_state.is_frozen {
        return Err(SoloMachineError::ClientFrozen);
    }

    misbehaviour.validate_basic()?;

    let consensus = &client_state.consensus_state;
    for signature in [&misbehaviour.signature_one, &misbehaviour.signature_two] {
        if signature.timestamp < consensus.timestamp {
            return Err(SoloMachineError::InvalidMisbehaviour {
                reason: "signature predates the consensus timestamp".into(),
            });
        }
        let sign_bytes = signature.sign_bytes(misbehaviour.sequence, &consensus.diversifier)?;
        consensus
            .public_key
            .verify(&sign_bytes, &signature.signature)?;
    }

    Ok(())
}

/// Whether `misbehaviour` proves the solo machine equivocated.
#[must_use]
pub fn check_for_misbehaviour(client_state: &ClientState, misbehaviour: &Misbehaviour) -> bool {
    verify_misbehaviour(client_state, misbehaviour).is_ok()
}
