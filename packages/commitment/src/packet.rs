//! Packet, acknowledgement and receipt commitments.

use interchain_host::Height;
use sha2::{Digest, Sha256};

/// Value stored at a packet receipt path.
pub const RECEIPT_VALUE: [u8; 1] = [1];

/// SHA-256 of `data`.
#[must_use]
pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// Commitment to a sent packet:
/// `sha256(timeout_timestamp || timeout_revision_number || timeout_revision_height || sha256(data))`,
/// integers big endian.
#[must_use]
pub fn packet_commitment(timeout_height: Height, timeout_timestamp: u64, data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(timeout_timestamp.to_be_bytes());
    hasher.update(timeout_height.revision_number.to_be_bytes());
    hasher.update(timeout_height.revision_height.to_be_bytes());
    hasher.update(sha256(data));
    hasher.finalize().into()
}

/// Commitment to a written acknowledgement.
#[must_use]
pub fn acknowledgement_commitment(ack: &[u8]) -> [u8; 32] {
    sha256(ack)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commitment_matches_manual_preimage() {
        let data = b"hello";
        let mut preimage = Vec::new();
        preimage.extend_from_slice(&1_000u64.to_be_bytes());
        preimage.extend_from_slice(&0u64.to_be_bytes());
        preimage.extend_from_slice(&10u64.to_be_bytes());
        preimage.extend_from_slice(&sha256(data));

        assert_eq!(
            packet_commitment(Height::new(0, 10), 1_000, data),
            sha256(&preimage)
        );
    }

    #[test]
    fn commitment_binds_every_field() {
        let base = packet_commitment(Height::new(0, 10), 1_000, b"data");
        assert_ne!(base, packet_commitment(Height::new(1, 10), 1_000, b"data"));
        assert_ne!(base, packet_commitment(Height::new(0, 11), 1_000, b"data"));
        assert_ne!(base, packet_commitment(Height::new(0, 10), 1_001, b"data"));
        assert_ne!(base, packet_commitment(Height::new(0, 10), 1_000, b"date"));
    }

    #[test]
    fn ack_commitment_is_plain_sha256() {
        assert_eq!(
            hex::encode(acknowledgement_commitment(b"")),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
