//! Validated identifiers for clients, connections, channels and ports.

use std::{fmt, str::FromStr};

use borsh::{
    io::{Error as IoError, ErrorKind, Read, Write},
    BorshDeserialize, BorshSerialize,
};
use serde::{Deserialize, Serialize};

use crate::error::IdentifierError;

const fn is_valid_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '+' | '-' | '#' | '[' | ']' | '<' | '>')
}

fn validate(id: &str, min: usize, max: usize) -> Result<(), IdentifierError> {
    let len = id.len();
    if len < min || len > max {
        return Err(IdentifierError::InvalidLength {
            id: id.to_string(),
            len,
            min,
            max,
        });
    }
    if let Some(ch) = id.chars().find(|c| !is_valid_char(*c)) {
        return Err(IdentifierError::InvalidCharacter {
            id: id.to_string(),
            ch,
        });
    }
    Ok(())
}

macro_rules! identifier {
    ($(#[$meta:meta])* $name:ident, $min:expr, $max:expr) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Minimum length in bytes.
            pub const MIN_LEN: usize = $min;
            /// Maximum length in bytes.
            pub const MAX_LEN: usize = $max;

            /// Validates and wraps an identifier.
            /// # Errors
            /// Fails on a length outside the allowed range or an invalid character.
            pub fn new(id: impl Into<String>) -> Result<Self, IdentifierError> {
                let id = id.into();
                validate(&id, $min, $max)?;
                Ok(Self(id))
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl FromStr for $name {
            type Err = IdentifierError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdentifierError;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                Self::new(s)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl BorshSerialize for $name {
            fn serialize<W: Write>(&self, writer: &mut W) -> Result<(), IoError> {
                BorshSerialize::serialize(&self.0, writer)
            }
        }

        impl BorshDeserialize for $name {
            fn deserialize_reader<R: Read>(reader: &mut R) -> Result<Self, IoError> {
                let raw = String::deserialize_reader(reader)?;
                Self::new(raw).map_err(|e| IoError::new(ErrorKind::InvalidData, e))
            }
        }
    };
}

identifier!(
    /// Identifier of a light client, `{client_type}-{n}`.
    ClientId, 9, 64
);
identifier!(
    /// Identifier of a connection end, `connection-{n}`.
    ConnectionId, 10, 64
);
identifier!(
    /// Identifier of a channel end, `channel-{n}`.
    ChannelId, 8, 64
);
identifier!(
    /// Identifier of the port an application is bound to.
    PortId, 2, 128
);

impl ClientId {
    /// Builds the `n`-th identifier for a client type.
    /// # Errors
    /// Fails if the client type makes the identifier invalid.
    pub fn with_sequence(client_type: &str, n: u64) -> Result<Self, IdentifierError> {
        Self::new(format!("{client_type}-{n}"))
    }
}

impl ConnectionId {
    /// Builds `connection-{n}`.
    #[must_use]
    pub fn with_sequence(n: u64) -> Self {
        Self(format!("connection-{n}"))
    }
}

impl ChannelId {
    /// Builds `channel-{n}`.
    #[must_use]
    pub fn with_sequence(n: u64) -> Self {
        Self(format!("channel-{n}"))
    }
}
