//! The byte strings a solo machine signs, and the proof format it submits.

use borsh::{BorshDeserialize, BorshSerialize};
use interchain_host::{codec, Path};
use serde::{Deserialize, Serialize};

use crate::{crypto::PublicKey, error::SoloMachineError};

/// Path placed in header sign bytes.
pub const HEADER_SIGN_PATH: &[u8] = b"solomachine:header";

/// Tags the kind of data covered by a signature, so a signature over one
/// kind can never be replayed as another.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    BorshSerialize,
    BorshDeserialize,
)]
#[borsh(use_discriminant = true)]
#[repr(u8)]
#[allow(missing_docs)]
pub enum DataType {
    Unspecified = 0,
    Header = 1,
    ClientState = 2,
    ConsensusState = 3,
    Connection = 4,
    Channel = 5,
    ChannelUpgrade = 6,
    UpgradeErrorReceipt = 7,
    PacketCommitment = 8,
    PacketAcknowledgement = 9,
    PacketReceipt = 10,
    PacketReceiptAbsence = 11,
    NextSequenceRecv = 12,
    Absence = 13,
    Other = 14,
}

impl DataType {
    /// Data type of a membership claim at `path`.
    #[must_use]
    pub const fn for_path(path: &Path) -> Self {
        match path {
            Path::ClientState(_) => Self::ClientState,
            Path::ClientConsensusState { .. } => Self::ConsensusState,
            Path::Connection(_) => Self::Connection,
            Path::ChannelEnd(..) => Self::Channel,
            Path::ChannelUpgrade(..) | Path::CounterpartyUpgrade(..) => Self::ChannelUpgrade,
            Path::UpgradeErrorReceipt(..) => Self::UpgradeErrorReceipt,
            Path::PacketCommitment { .. } => Self::PacketCommitment,
            Path::PacketAcknowledgement { .. } => Self::PacketAcknowledgement,
            Path::PacketReceipt { .. } => Self::PacketReceipt,
            Path::NextSequenceRecv(..) => Self::NextSequenceRecv,
            _ => Self::Other,
        }
    }

    /// Data type of a non-membership claim at `path`.
    #[must_use]
    pub const fn absence_for_path(path: &Path) -> Self {
        match path {
            Path::PacketReceipt { .. } => Self::PacketReceiptAbsence,
            _ => Self::Absence,
        }
    }
}

/// The exact byte string covered by every solo machine signature.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct SignBytes {
    /// Sequence the signature is valid for
    pub sequence: u64,
    /// Signer's claimed time
    pub timestamp: u64,
    /// Deployment scope
    pub diversifier: String,
    /// Kind of `data`
    pub data_type: DataType,
    /// Where `data` lives
    pub path: Vec<u8>,
    /// Signed payload
    pub data: Vec<u8>,
}

impl SignBytes {
    /// Canonical encoding.
    /// # Errors
    /// Fails only if encoding fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SoloMachineError> {
        Ok(codec::encode(self)?)
    }
}

/// Payload of a header signature: the key and diversifier taking over.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct HeaderData {
    /// Key authorised from the next sequence on
    pub new_public_key: PublicKey,
    /// Diversifier in force from the next sequence on
    pub new_diversifier: String,
}

/// Membership proof: a signature plus the time it claims.
#[derive(
    Clone, Debug, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct TimestampedSignatureData {
    /// Signature over the sign bytes
    pub signature_data: Vec<u8>,
    /// Timestamp included in the sign bytes
    pub timestamp: u64,
}

impl TimestampedSignatureData {
    /// Decodes proof bytes.
    /// # Errors
    /// Returns [`SoloMachineError::InvalidProof`] for malformed input.
    pub fn from_proof(proof: &[u8]) -> Result<Self, SoloMachineError> {
        let decoded: Self = codec::decode(proof).map_err(|e| SoloMachineError::InvalidProof {
            reason: e.to_string(),
        })?;
        if decoded.signature_data.is_empty() {
            return Err(SoloMachineError::InvalidProof {
                reason: "empty signature".into(),
            });
        }
        if decoded.timestamp == 0 {
            return Err(SoloMachineError::InvalidProof {
                reason: "timestamp cannot be zero".into(),
            });
        }
        Ok(decoded)
    }

    /// Encodes as proof bytes.
    /// # Errors
    /// Fails only if encoding fails.
    pub fn to_proof(&self) -> Result<Vec<u8>, SoloMachineError> {
        Ok(codec::encode(self)?)
    }
}

#[cfg(test)]
mod tests {
    use interchain_host::{ChannelId, PortId};

    use super::*;

    #[test]
    fn data_type_follows_path_kind() {
        let port = PortId::new("transfer").unwrap();
        let channel = ChannelId::with_sequence(0);
        assert_eq!(
            DataType::for_path(&Path::ChannelEnd(port.clone(), channel.clone())),
            DataType::Channel
        );
        assert_eq!(
            DataType::for_path(&Path::packet_receipt(&port, &channel, 1)),
            DataType::PacketReceipt
        );
        assert_eq!(
            DataType::absence_for_path(&Path::packet_receipt(&port, &channel, 1)),
            DataType::PacketReceiptAbsence
        );
        assert_eq!(
            DataType::absence_for_path(&Path::NextSequenceRecv(port, channel)),
            DataType::Absence
        );
    }

    #[test]
    fn sign_bytes_differ_by_data_type() {
        let base = SignBytes {
            sequence: 1,
            timestamp: 10,
            diversifier: "testing".into(),
            data_type: DataType::Channel,
            path: b"ibc/x".to_vec(),
            data: vec![1],
        };
        let other = SignBytes {
            data_type: DataType::Connection,
            ..base.clone()
        };
        assert_ne!(base.to_bytes().unwrap(), other.to_bytes().unwrap());
    }

    #[test]
    fn proof_rejects_empty_signature_and_zero_time() {
        let empty = TimestampedSignatureData {
            signature_data: Vec::new(),
            timestamp: 5,
        };
        assert!(TimestampedSignatureData::from_proof(&empty.to_proof().unwrap()).is_err());

        let zero_time = TimestampedSignatureData {
            signature_data: vec![1],
            timestamp: 0,
        };
        assert!(TimestampedSignatureData::from_proof(&zero_time.to_proof().unwrap()).is_err());
        assert!(TimestampedSignatureData::from_proof(&[0xff]).is_err());
    }
}
