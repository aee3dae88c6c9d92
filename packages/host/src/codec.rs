//! Deterministic binary codec for persisted entities and proof blobs.

use borsh::{BorshDeserialize, BorshSerialize};

use crate::error::CodecError;

/// Upper bound on any value decoded by this crate.
pub const MAX_ENCODED_SIZE: usize = 64 * 1024;

/// Encodes `value` with borsh.
/// # Errors
/// Returns [`CodecError::Encode`] if the value cannot be serialized.
pub fn encode<T: BorshSerialize>(value: &T) -> Result<Vec<u8>, CodecError> {
    borsh::to_vec(value).map_err(|e| CodecError::Encode {
        type_name: std::any::type_name::<T>(),
        reason: e.to_string(),
    })
}

/// Decodes a borsh value, rejecting oversized input and trailing bytes.
/// # Errors
/// Returns [`CodecError::TooLarge`] or [`CodecError::Decode`].
pub fn decode<T: BorshDeserialize>(bytes: &[u8]) -> Result<T, CodecError> {
    if bytes.len() > MAX_ENCODED_SIZE {
        return Err(CodecError::TooLarge {
            size: bytes.len(),
            max: MAX_ENCODED_SIZE,
        });
    }
    T::try_from_slice(bytes).map_err(|e| CodecError::Decode {
        type_name: std::any::type_name::<T>(),
        reason: e.to_string(),
    })
}
