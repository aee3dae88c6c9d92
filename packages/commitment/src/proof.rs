//! Opaque proof bytes.

use serde::{Deserialize, Serialize};

use crate::error::CommitmentError;

/// Proof bytes handed through to the light client untouched.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct CommitmentProofBytes(Vec<u8>);

impl CommitmentProofBytes {
    /// The proof bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl TryFrom<Vec<u8>> for CommitmentProofBytes {
    type Error = CommitmentError;

    fn try_from(bytes: Vec<u8>) -> Result<Self, Self::Error> {
        if bytes.is_empty() {
            return Err(CommitmentError::EmptyProof);
        }
        Ok(Self(bytes))
    }
}

impl From<CommitmentProofBytes> for Vec<u8> {
    fn from(proof: CommitmentProofBytes) -> Self {
        proof.0
    }
}

impl AsRef<[u8]> for CommitmentProofBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
