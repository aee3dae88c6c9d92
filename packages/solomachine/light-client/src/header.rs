//! Solo machine header: a signed key rotation

use borsh::{BorshDeserialize, BorshSerialize};
use interchain_host::codec;
use interchain_utils::ensure;
use serde::{Deserialize, Serialize};

use crate::{
    consensus_state::is_blank,
    crypto::PublicKey,
    error::SoloMachineError,
    proof::{DataType, HeaderData, SignBytes, HEADER_SIGN_PATH},
};

/// Rotates the signing key, signed by the outgoing key.
#[derive(
    Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct Header {
    /// Must equal the client's current sequence
    pub sequence: u64,
    /// Signer's claimed time
    pub timestamp: u64,
    /// Signature by the current key
    pub signature: Vec<u8>,
    /// Key taking over
    pub new_public_key: PublicKey,
    /// Diversifier taking over
    pub new_diversifier: String,
}

fn invalid(reason: &str) -> SoloMachineError {
    SoloMachineError::InvalidHeader {
        reason: reason.into(),
    }
}

impl Header {
    /// Stateless checks.
    /// # Errors
    /// Returns [`SoloMachineError::InvalidHeader`] or
    /// [`SoloMachineError::InvalidPublicKey`].
    pub fn validate_basic(&self) -> Result<(), SoloMachineError> {
        ensure!(self.sequence != 0, invalid("sequence cannot be zero"));
        ensure!(self.timestamp != 0, invalid("timestamp cannot be zero"));
        ensure!(!self.signature.is_empty(), invalid("signature cannot be empty"));
        ensure!(
            !is_blank(&self.new_diversifier),
            invalid("diversifier cannot be blank")
        );
        self.new_public_key.validate()
    }

    /// Bytes the current key signs, scoped by the current `diversifier`.
    /// # Errors
    /// Fails only if encoding fails.
    pub fn sign_bytes(&self, diversifier: &str) -> Result<Vec<u8>, SoloMachineError> {
        let data = codec::encode(&HeaderData {
            new_public_key: self.new_public_key.clone(),
            new_diversifier: self.new_diversifier.clone(),
        })?;
        SignBytes {
            sequence: self.sequence,
            timestamp: self.timestamp,
            diversifier: diversifier.to_string(),
            data_type: DataType::Header,
            path: HEADER_SIGN_PATH.to_vec(),
            data,
        }
        .to_bytes()
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::test_utils::{TestSoloMachine, ED25519_KEY};

    #[rstest]
    #[case::zero_sequence(|h: &mut Header| h.sequence = 0)]
    #[case::zero_timestamp(|h: &mut Header| h.timestamp = 0)]
    #[case::empty_signature(|h: &mut Header| h.signature.clear())]
    #[case::blank_diversifier(|h: &mut Header| h.new_diversifier = " ".into())]
    #[case::bad_key(|h: &mut Header| h.new_public_key = PublicKey::Secp256k1(vec![0xff; 33]))]
    fn validate_basic_rejects(#[case] tamper: fn(&mut Header)) {
        let mut header = TestSoloMachine::new("testing").create_header(ED25519_KEY.clone(), "next");
        assert!(header.validate_basic().is_ok());
        tamper(&mut header);
        assert!(header.validate_basic().is_err());
    }

    #[test]
    fn sign_bytes_bind_diversifier() {
        let header = TestSoloMachine::new("testing").create_header(ED25519_KEY.clone(), "next");
        assert_ne!(
            header.sign_bytes("testing").unwrap(),
            header.sign_bytes("other").unwrap()
        );
    }
}
