//! Solo machine consensus state

use borsh::{BorshDeserialize, BorshSerialize};
use interchain_utils::ensure;
use serde::{Deserialize, Serialize};

use crate::{crypto::PublicKey, error::SoloMachineError};

/// The key currently authorised to sign for the solo machine.
#[derive(
    Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct ConsensusState {
    /// Current signing key
    pub public_key: PublicKey,
    /// Scopes signatures to one deployment
    pub diversifier: String,
    /// Last accepted signature time
    pub timestamp: u64,
}

impl ConsensusState {
    /// # Errors
    /// Returns [`SoloMachineError::InvalidConsensusState`] or
    /// [`SoloMachineError::InvalidPublicKey`].
    pub fn validate(&self) -> Result<(), SoloMachineError> {
        ensure!(
            self.timestamp != 0,
            SoloMachineError::InvalidConsensusState {
                reason: "timestamp cannot be zero".into(),
            }
        );
        ensure!(
            !is_blank(&self.diversifier),
            SoloMachineError::InvalidConsensusState {
                reason: "diversifier cannot be blank".into(),
            }
        );
        self.public_key.validate()
    }
}

/// A diversifier may be empty but never only whitespace.
pub(crate) fn is_blank(diversifier: &str) -> bool {
    !diversifier.is_empty() && diversifier.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::test_utils::SECP256K1_KEYS;

    fn consensus(diversifier: &str, timestamp: u64) -> ConsensusState {
        ConsensusState {
            public_key: SECP256K1_KEYS[0].public_key(),
            diversifier: diversifier.into(),
            timestamp,
        }
    }

    #[rstest]
    #[case::named("testing", 10, true)]
    #[case::empty_diversifier("", 10, true)]
    #[case::blank_diversifier("  ", 10, false)]
    #[case::zero_timestamp("testing", 0, false)]
    fn validate(#[case] diversifier: &str, #[case] timestamp: u64, #[case] ok: bool) {
        assert_eq!(consensus(diversifier, timestamp).validate().is_ok(), ok);
    }

    #[test]
    fn invalid_key_is_rejected() {
        let mut cs = consensus("testing", 10);
        cs.public_key = PublicKey::Secp256k1(vec![0xff; 33]);
        assert!(matches!(
            cs.validate(),
            Err(SoloMachineError::InvalidPublicKey { .. })
        ));
    }
}
