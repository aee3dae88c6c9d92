//! Serde adapters used by the JSON facing types.

/// (De)serialize an integer as a decimal string, so nanosecond values survive
/// JSON consumers that parse numbers as doubles.
pub mod number_as_string {
    use std::{fmt::Display, str::FromStr};

    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    /// # Errors
    /// Propagates serializer failures.
    pub fn serialize<T: Display, S: Serializer>(
        value: &T,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    /// # Errors
    /// Fails when the input is not a string or does not parse as `T`.
    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
    where
        T: FromStr,
        T::Err: Display,
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.trim()
            .parse()
            .map_err(|e| D::Error::custom(format!("invalid number {raw:?}: {e}")))
    }
}

/// (De)serialize bytes as a lowercase hex string.
pub mod hex_bytes {
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    /// # Errors
    /// Propagates serializer failures.
    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    /// # Errors
    /// Fails when the input is not a hex string.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        hex::decode(raw.trim_start_matches("0x")).map_err(D::Error::custom)
    }
}
