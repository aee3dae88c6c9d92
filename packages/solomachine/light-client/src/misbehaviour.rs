//! Evidence of a solo machine signing two different messages at one sequence

use borsh::{BorshDeserialize, BorshSerialize};
use interchain_utils::ensure;
use serde::{Deserialize, Serialize};

use crate::{
    error::SoloMachineError,
    proof::{DataType, SignBytes},
};

/// One signed message.
#[derive(
    Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct SignatureAndData {
    /// Signature over the reconstructed sign bytes
    pub signature: Vec<u8>,
    /// Path the data was claimed at
    pub path: Vec<u8>,
    /// Claimed data
    pub data: Vec<u8>,
    /// Kind of data
    pub data_type: DataType,
    /// Signer's claimed time
    pub timestamp: u64,
}

impl SignatureAndData {
    /// Stateless checks.
    /// # Errors
    /// Returns [`SoloMachineError::InvalidMisbehaviour`].
    pub fn validate_basic(&self) -> Result<(), SoloMachineError> {
        let invalid = |reason: &str| SoloMachineError::InvalidMisbehaviour {
            reason: reason.into(),
        };
        ensure!(!self.signature.is_empty(), invalid("signature cannot be empty"));
        ensure!(!self.data.is_empty(), invalid("data cannot be empty"));
        ensure!(
            self.data_type != DataType::Unspecified,
            invalid("data type cannot be unspecified")
        );
        ensure!(self.timestamp != 0, invalid("timestamp cannot be zero"));
        Ok(())
    }

    /// Sign bytes this signature claims to cover.
    /// # Errors
    /// Fails only if encoding fails.
    pub fn sign_bytes(
        &self,
        sequence: u64,
        diversifier: &str,
    ) -> Result<Vec<u8>, SoloMachineError> {
        SignBytes {
            sequence,
            timestamp: self.timestamp,
            diversifier: diversifier.to_string(),
            data_type: self.data_type,
            path: self.path.clone(),
            data: self.data.clone(),
        }
        .to_bytes()
    }
}

/// Two conflicting signatures at the same sequence.
#[derive(
    Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct Misbehaviour {
    /// Sequence both signatures were made at
    pub sequence: u64,
    /// First signature
    pub signature_one: SignatureAndData,
    /// Second signature
    pub signature_two: SignatureAndData,
}

impl Misbehaviour {
    /// Stateless checks: a non-zero sequence, two well-formed signatures that
    /// differ in both signature and data.
    /// # Errors
    /// Returns [`SoloMachineError::InvalidMisbehaviour`].
    pub fn validate_basic(&self) -> Result<(), SoloMachineError> {
        let invalid = |reason: &str| SoloMachineError::InvalidMisbehaviour {
            reason: reason.into(),
        };
        ensure!(self.sequence != 0, invalid("sequence cannot be zero"));
        self.signature_one.validate_basic()?;
        self.signature_two.validate_basic()?;
        ensure!(
            self.signature_one.signature != self.signature_two.signature,
            invalid("signatures are identical")
        );
        ensure!(
            self.signature_one.data != self.signature_two.data,
            invalid("signed data is identical")
        );
        Ok(())
    }
}
