//! Client variant enums. Each is borsh-tagged by variant so stored states
//! decode to the right client type.

use std::fmt;

use borsh::{BorshDeserialize, BorshSerialize};
use interchain_host::Height;
use serde::{Deserialize, Serialize};
use solomachine_light_client::{
    client_state::{ClientState as SoloMachineClientState, Status as SoloMachineStatus},
    consensus_state::ConsensusState as SoloMachineConsensusState,
    error::SoloMachineError,
    header::Header as SoloMachineHeader,
    misbehaviour::Misbehaviour as SoloMachineMisbehaviour,
};

/// Supported client types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClientType {
    /// `06-solomachine`
    SoloMachine,
}

impl ClientType {
    /// Type tag used in client identifiers and the allow list.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SoloMachine => solomachine_light_client::CLIENT_TYPE,
        }
    }
}

impl fmt::Display for ClientType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a client may be used for verification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClientStatus {
    /// Usable
    Active,
    /// Misbehaviour was submitted
    Frozen,
    /// Trusting period elapsed
    Expired,
    /// No such client
    Unknown,
    /// Client type removed from the allow list
    Unauthorized,
}

impl fmt::Display for ClientStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Active => "Active",
            Self::Frozen => "Frozen",
            Self::Expired => "Expired",
            Self::Unknown => "Unknown",
            Self::Unauthorized => "Unauthorized",
        };
        f.write_str(s)
    }
}

/// Stored client state of any supported type.
#[derive(
    Clone, Debug, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub enum AnyClientState {
    /// Solo machine
    SoloMachine(SoloMachineClientState),
}

impl AnyClientState {
    /// Type of the client.
    #[must_use]
    pub const fn client_type(&self) -> ClientType {
        match self {
            Self::SoloMachine(_) => ClientType::SoloMachine,
        }
    }

    /// Latest height the client has reached.
    #[must_use]
    pub const fn latest_height(&self) -> Height {
        match self {
            Self::SoloMachine(cs) => cs.latest_height(),
        }
    }

    /// Status as seen by the variant.
    #[must_use]
    pub const fn status(&self) -> ClientStatus {
        match self {
            Self::SoloMachine(cs) => match cs.status() {
                SoloMachineStatus::Active => ClientStatus::Active,
                SoloMachineStatus::Frozen => ClientStatus::Frozen,
            },
        }
    }

    /// # Errors
    /// Returns the variant's validation error.
    pub fn validate(&self) -> Result<(), SoloMachineError> {
        match self {
            Self::SoloMachine(cs) => cs.validate(),
        }
    }
}

/// Stored consensus state of any supported type.
#[derive(
    Clone, Debug, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub enum AnyConsensusState {
    /// Solo machine
    SoloMachine(SoloMachineConsensusState),
}

impl AnyConsensusState {
    /// Type of the client this state belongs to.
    #[must_use]
    pub const fn client_type(&self) -> ClientType {
        match self {
            Self::SoloMachine(_) => ClientType::SoloMachine,
        }
    }

    /// Timestamp of the state.
    #[must_use]
    pub const fn timestamp(&self) -> u64 {
        match self {
            Self::SoloMachine(cs) => cs.timestamp,
        }
    }
}

/// A message submitted to update a client.
#[derive(
    Clone, Debug, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub enum ClientMessage {
    /// Advances the client
    Header(SoloMachineHeader),
    /// Freezes the client
    Misbehaviour(SoloMachineMisbehaviour),
}

impl ClientMessage {
    /// Type of the client the message is for.
    #[must_use]
    pub const fn client_type(&self) -> ClientType {
        match self {
            Self::Header(_) | Self::Misbehaviour(_) => ClientType::SoloMachine,
        }
    }
}
