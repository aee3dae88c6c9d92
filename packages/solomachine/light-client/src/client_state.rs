//! Solo machine client state

use borsh::{BorshDeserialize, BorshSerialize};
use interchain_host::Height;
use interchain_utils::ensure;
use serde::{Deserialize, Serialize};

use crate::{consensus_state::ConsensusState, error::SoloMachineError};

/// Client state of a solo machine. The sequence doubles as the height:
/// every accepted signature consumes one.
#[derive(
    Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct ClientState {
    /// Sequence the next signature must be made at
    pub sequence: u64,
    /// Set once misbehaviour is proven
    pub is_frozen: bool,
    /// Current key and diversifier
    pub consensus_state: ConsensusState,
}

/// Whether a solo machine client may be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Usable
    Active,
    /// Misbehaviour was submitted
    Frozen,
}

impl ClientState {
    /// New, unfrozen client at `sequence`.
    #[must_use]
    pub const fn new(sequence: u64, consensus_state: ConsensusState) -> Self {
        Self {
            sequence,
            is_frozen: false,
            consensus_state,
        }
    }

    /// `Height(0, sequence)`.
    #[must_use]
    pub const fn latest_height(&self) -> Height {
        Height::new(0, self.sequence)
    }

    /// Frozen or active. A solo machine never expires.
    #[must_use]
    pub const fn status(&self) -> Status {
        if self.is_frozen {
            Status::Frozen
        } else {
            Status::Active
        }
    }

    /// Validates the state supplied at client creation.
    /// # Errors
    /// Returns [`SoloMachineError::InvalidClientState`] or the consensus
    /// state's validation error.
    pub fn validate(&self) -> Result<(), SoloMachineError> {
        ensure!(
            self.sequence != 0,
            SoloMachineError::InvalidClientState {
                reason: "sequence cannot be zero".into(),
            }
        );
        self.consensus_state.validate()
    }
}
