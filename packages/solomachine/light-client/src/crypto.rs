//! Public keys and signature verification.
//!
//! Secp256k1 signatures are 64 byte `r || s` over SHA-256 of the message and
//! must be low-S. Ed25519 signatures are checked with strict verification.
//! A multisig signature is a borsh encoded [`MultiSignature`].

use std::{collections::BTreeSet, fmt};

use borsh::{BorshDeserialize, BorshSerialize};
use ed25519_dalek::{Signature as Ed25519Signature, VerifyingKey as Ed25519VerifyingKey};
use interchain_host::codec;
use interchain_utils::ensure;
use k256::ecdsa::{
    signature::Verifier, Signature as EcdsaSignature, VerifyingKey as EcdsaVerifyingKey,
};
use serde::{Deserialize, Serialize};

use crate::error::SoloMachineError;

/// Key (or key set) a solo machine signs with.
#[derive(
    Clone, Debug, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub enum PublicKey {
    /// SEC1 compressed secp256k1 point
    Secp256k1(Vec<u8>),
    /// Ed25519 point
    Ed25519([u8; 32]),
    /// `threshold`-of-`public_keys`
    Multisig {
        /// Number of member signatures required
        threshold: u32,
        /// Members, each a single key
        public_keys: Vec<PublicKey>,
    },
}

/// Signature of a [`PublicKey::Multisig`].
#[derive(
    Clone, Debug, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct MultiSignature {
    /// `signers[i]` is set when member `i` signed
    pub signers: Vec<bool>,
    /// Signatures of the set members, in member order
    pub signatures: Vec<Vec<u8>>,
}

fn invalid_key(reason: impl Into<String>) -> SoloMachineError {
    SoloMachineError::InvalidPublicKey {
        reason: reason.into(),
    }
}

impl PublicKey {
    /// Checks that the key material parses and a multisig is well formed.
    /// # Errors
    /// Returns [`SoloMachineError::InvalidPublicKey`].
    pub fn validate(&self) -> Result<(), SoloMachineError> {
        match self {
            Self::Secp256k1(bytes) => {
                ensure!(bytes.len() == 33, invalid_key("secp256k1 key must be compressed"));
                EcdsaVerifyingKey::from_sec1_bytes(bytes)
                    .map(|_| ())
                    .map_err(|_| invalid_key("not a secp256k1 point"))
            }
            Self::Ed25519(bytes) => Ed25519VerifyingKey::from_bytes(bytes)
                .map(|_| ())
                .map_err(|_| invalid_key("not an ed25519 point")),
            Self::Multisig {
                threshold,
                public_keys,
            } => {
                ensure!(!public_keys.is_empty(), invalid_key("multisig without members"));
                let threshold = usize::try_from(*threshold)
                    .map_err(|_| invalid_key("threshold out of range"))?;
                ensure!(
                    threshold >= 1 && threshold <= public_keys.len(),
                    invalid_key("threshold must be between 1 and the member count")
                );
                let mut seen = BTreeSet::new();
                for member in public_keys {
                    ensure!(
                        !matches!(member, Self::Multisig { .. }),
                        invalid_key("nested multisig")
                    );
                    member.validate()?;
                    ensure!(
                        seen.insert(codec::encode(member)?),
                        invalid_key("duplicate multisig member")
                    );
                }
                Ok(())
            }
        }
    }

    /// Verifies `signature` over `message`.
    /// # Errors
    /// Returns [`SoloMachineError::InvalidSignature`] on any failure.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> Result<(), SoloMachineError> {
        match self {
            Self::Secp256k1(bytes) => {
                let key = EcdsaVerifyingKey::from_sec1_bytes(bytes)
                    .map_err(|_| SoloMachineError::InvalidSignature)?;
                let signature = EcdsaSignature::from_slice(signature)
                    .map_err(|_| SoloMachineError::InvalidSignature)?;
                key.verify(message, &signature)
                    .map_err(|_| SoloMachineError::InvalidSignature)
            }
            Self::Ed25519(bytes) => {
                let key = Ed25519VerifyingKey::from_bytes(bytes)
                    .map_err(|_| SoloMachineError::InvalidSignature)?;
                let signature = Ed25519Signature::from_slice(signature)
                    .map_err(|_| SoloMachineError::InvalidSignature)?;
                key.verify_strict(message, &signature)
                    .map_err(|_| SoloMachineError::InvalidSignature)
            }
            Self::Multisig {
                threshold,
                public_keys,
            } => {
                let multi: MultiSignature = codec::decode(signature)
                    .map_err(|_| SoloMachineError::InvalidSignature)?;
                ensure!(
                    multi.signers.len() == public_keys.len(),
                    SoloMachineError::InvalidSignature
                );
                let signed = multi.signers.iter().filter(|s| **s).count();
                ensure!(
                    signed == multi.signatures.len()
                        && u32::try_from(signed).is_ok_and(|n| n >= (*threshold).max(1)),
                    SoloMachineError::InvalidSignature
                );
                let members = public_keys
                    .iter()
                    .zip(&multi.signers)
                    .filter_map(|(key, signed)| signed.then_some(key));
                for (key, signature) in members.zip(&multi.signatures) {
                    key.verify(message, signature)?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Secp256k1(bytes) => write!(f, "secp256k1:{}", hex::encode(bytes)),
            Self::Ed25519(bytes) => write!(f, "ed25519:{}", hex::encode(bytes)),
            Self::Multisig {
                threshold,
                public_keys,
            } => write!(f, "multisig:{threshold}-of-{}", public_keys.len()),
        }
    }
}
