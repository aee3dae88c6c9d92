//! Host level errors

/// Errors raised by the binary codec.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[allow(missing_docs, clippy::module_name_repetitions)]
pub enum CodecError {
    #[error("failed to encode {type_name}: {reason}")]
    Encode { type_name: &'static str, reason: String },

    #[error("failed to decode {type_name}: {reason}")]
    Decode { type_name: &'static str, reason: String },

    #[error("encoded value of {size} bytes exceeds the {max} byte limit")]
    TooLarge { size: usize, max: usize },
}

/// Identifier validation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[allow(clippy::module_name_repetitions)]
pub enum IdentifierError {
    /// Length outside the allowed range for this kind of identifier
    #[error("identifier {id:?} has length {len}, must be between {min} and {max}")]
    InvalidLength {
        /// offending identifier
        id: String,
        /// actual length
        len: usize,
        /// minimum length
        min: usize,
        /// maximum length
        max: usize,
    },
    /// Character outside `[a-zA-Z0-9._+-#[]<>]`
    #[error("identifier {id:?} contains invalid character {ch:?}")]
    InvalidCharacter {
        /// offending identifier
        id: String,
        /// first invalid character
        ch: char,
    },
}

/// Configuration errors detected after parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// `max_expected_time_per_block_ns` must be positive
    #[error("max expected time per block must be positive")]
    ZeroBlockTime,
    /// The default upgrade timeout has neither a height nor a timestamp offset
    #[error("default upgrade timeout must set a height or timestamp offset")]
    EmptyUpgradeTimeout,
    /// Empty allow list entry
    #[error("allowed client types must not contain empty entries")]
    EmptyAllowedClient,
}
