//! Solo machine state transitions

use interchain_host::Height;

use crate::{client_state::ClientState, consensus_state::ConsensusState, header::Header};

/// Applies a verified header: the sequence advances and the new key and
/// diversifier take over.
/// Returns the new client state and its height.
#[must_use]
pub fn update_state(current_client_state: ClientState, header: &Header) -> (ClientState, Height) {
    let new_client_state = ClientState {
        sequence: current_client_state.sequence.saturating_add(1),
        consensus_state: ConsensusState {
            public_key: header.new_public_key.clone(),
            diversifier: header.new_diversifier.clone(),
            timestamp: header.timestamp,
        },
        ..current_client_state
    };
    let height = new_client_state.latest_height();
    (new_client_state, height)
}

/// Freezes the client after verified misbehaviour.
#[must_use]
pub fn update_state_on_misbehaviour(current_client_state: ClientState) -> ClientState {
    ClientState {
        is_frozen: true,
        ..current_client_state
    }
}
