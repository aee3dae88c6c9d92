//! Replacing a frozen solo machine client with a substitute

use crate::{client_state::ClientState, error::SoloMachineError};

/// Checks that `substitute` may replace `subject` and returns the recovered
/// subject: it takes over the substitute's sequence and consensus state and
/// is unfrozen.
///
/// # Errors
/// Returns [`SoloMachineError::InvalidSubstitute`] unless the substitute is
/// strictly ahead of the subject.
pub fn check_substitute_and_update_state(
    subject: &ClientState,
    substitute: &ClientState,
) -> Result<ClientState, SoloMachineError> {
    if substitute.sequence <= subject.sequence {
        return Err(SoloMachineError::InvalidSubstitute {
            subject: subject.sequence,
            substitute: substitute.sequence,
        });
    }

    Ok(ClientState {
        sequence: substitute.sequence,
        is_frozen: false,
        consensus_state: substitute.consensus_state.clone(),
    })
}
