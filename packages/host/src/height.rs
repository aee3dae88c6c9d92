//! Heights and timeouts.

use std::fmt;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

/// A block height qualified by the chain revision. Ordered by revision first.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    BorshSerialize,
    BorshDeserialize,
)]
pub struct Height {
    /// Revision (chain upgrade epoch)
    pub revision_number: u64,
    /// Height within the revision
    pub revision_height: u64,
}

impl Height {
    /// Creates a new height.
    #[must_use]
    pub const fn new(revision_number: u64, revision_height: u64) -> Self {
        Self {
            revision_number,
            revision_height,
        }
    }

    /// The unset height.
    #[must_use]
    pub const fn zero() -> Self {
        Self::new(0, 0)
    }

    /// Whether this is the unset height.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.revision_number == 0 && self.revision_height == 0
    }

    /// The next height in the same revision.
    #[must_use]
    pub const fn increment(self) -> Self {
        Self::new(self.revision_number, self.revision_height.saturating_add(1))
    }
}

impl fmt::Display for Height {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.revision_number, self.revision_height)
    }
}

/// A deadline expressed as a height on the counterparty chain and/or a
/// timestamp in nanoseconds. Zero components are unset.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    BorshSerialize,
    BorshDeserialize,
)]
pub struct Timeout {
    /// Height after which the deadline has passed
    pub height: Height,
    /// Unix time in nanoseconds after which the deadline has passed
    pub timestamp: u64,
}

impl Timeout {
    /// Creates a timeout.
    #[must_use]
    pub const fn new(height: Height, timestamp: u64) -> Self {
        Self { height, timestamp }
    }

    /// At least one of height or timestamp is set.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        !self.height.is_zero() || self.timestamp != 0
    }

    /// Whether the deadline has passed at the given height and time.
    #[must_use]
    pub fn has_elapsed(&self, height: Height, timestamp: u64) -> bool {
        let height_elapsed = !self.height.is_zero() && height >= self.height;
        let time_elapsed = self.timestamp != 0 && timestamp >= self.timestamp;
        height_elapsed || time_elapsed
    }
}

impl fmt::Display for Timeout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "height {} timestamp {}", self.height, self.timestamp)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn orders_by_revision_first() {
        assert!(Height::new(1, 0) > Height::new(0, 1_000));
        assert!(Height::new(0, 2) > Height::new(0, 1));
    }

    #[rstest]
    #[case::height_reached(Timeout::new(Height::new(0, 10), 0), Height::new(0, 10), 0, true)]
    #[case::height_not_reached(Timeout::new(Height::new(0, 10), 0), Height::new(0, 9), u64::MAX, false)]
    #[case::timestamp_reached(Timeout::new(Height::zero(), 500), Height::new(0, 1), 500, true)]
    #[case::timestamp_not_reached(Timeout::new(Height::zero(), 500), Height::new(9, 9), 499, false)]
    #[case::either_component(Timeout::new(Height::new(0, 100), 500), Height::new(0, 1), 600, true)]
    fn timeout_elapsed(
        #[case] timeout: Timeout,
        #[case] height: Height,
        #[case] timestamp: u64,
        #[case] expected: bool,
    ) {
        assert_eq!(timeout.has_elapsed(height, timestamp), expected);
    }

    #[test]
    fn empty_timeout_is_invalid_and_never_elapses() {
        let timeout = Timeout::default();
        assert!(!timeout.is_valid());
        assert!(!timeout.has_elapsed(Height::new(u64::MAX, u64::MAX), u64::MAX));
    }

    #[test]
    fn displays_as_revision_dash_height() {
        assert_eq!(Height::new(2, 15).to_string(), "2-15");
    }
}
