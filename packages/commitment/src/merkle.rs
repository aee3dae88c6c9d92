//! Commitment prefixes and prefixed paths.

use std::fmt;

use borsh::{BorshDeserialize, BorshSerialize};
use interchain_host::Path;
use interchain_utils::ensure;
use serde::{Deserialize, Serialize};

use crate::error::CommitmentError;

/// The store prefix under which a chain commits its interchain state.
#[derive(
    Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
#[allow(clippy::module_name_repetitions)]
pub struct CommitmentPrefix(Vec<u8>);

impl CommitmentPrefix {
    /// Wraps non-empty prefix bytes.
    /// # Errors
    /// Returns [`CommitmentError::EmptyPrefix`] for an empty prefix.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self, CommitmentError> {
        let bytes = bytes.into();
        ensure!(!bytes.is_empty(), CommitmentError::EmptyPrefix);
        Ok(Self(bytes))
    }

    /// Raw prefix bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Whether the prefix is empty. Only reachable through decoding.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for CommitmentPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

/// A store path qualified by the prefix of the chain that committed it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MerklePath {
    /// Prefix of the proving chain
    pub prefix: CommitmentPrefix,
    /// Path within that prefix
    pub path: Path,
}

impl MerklePath {
    /// Qualifies `path` with `prefix`.
    #[must_use]
    pub const fn new(prefix: CommitmentPrefix, path: Path) -> Self {
        Self { prefix, path }
    }

    /// The individual keys, outermost first.
    #[must_use]
    pub fn key_path(&self) -> Vec<Vec<u8>> {
        vec![self.prefix.as_bytes().to_vec(), self.path.to_string().into_bytes()]
    }

    /// Canonical byte rendering, `{prefix}/{path}`.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let path = self.path.to_string();
        let mut bytes = Vec::with_capacity(self.prefix.as_bytes().len() + 1 + path.len());
        bytes.extend_from_slice(self.prefix.as_bytes());
        bytes.push(b'/');
        bytes.extend_from_slice(path.as_bytes());
        bytes
    }
}

impl fmt::Display for MerklePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.prefix, self.path)
    }
}
