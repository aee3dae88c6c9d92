//! Delay periods that must elapse between a counterparty state becoming
//! known and a proof against it being accepted.

use borsh::{BorshDeserialize, BorshSerialize};
use interchain_host::Height;
use serde::{Deserialize, Serialize};

use crate::error::CommitmentError;

/// Time and block components of a delay period.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    BorshSerialize,
    BorshDeserialize,
)]
pub struct DelayPeriod {
    /// Nanoseconds
    pub time_ns: u64,
    /// Blocks
    pub blocks: u64,
}

impl DelayPeriod {
    /// No delay.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            time_ns: 0,
            blocks: 0,
        }
    }

    /// A time delay and its block equivalent, rounded up.
    #[must_use]
    pub const fn from_time(time_ns: u64, max_expected_time_per_block_ns: u64) -> Self {
        let blocks = if max_expected_time_per_block_ns == 0 {
            0
        } else {
            time_ns.div_ceil(max_expected_time_per_block_ns)
        };
        Self { time_ns, blocks }
    }

    /// Whether this is a zero delay.
    #[must_use]
    pub const fn is_none(&self) -> bool {
        self.time_ns == 0 && self.blocks == 0
    }

    /// Checks that the delay has passed since the consensus state was
    /// processed at `processed_time` / `processed_height`.
    /// # Errors
    /// Returns the first component that has not yet passed.
    pub fn verify_passed(
        &self,
        processed_time: u64,
        processed_height: Height,
        current_time: u64,
        current_height: Height,
    ) -> Result<(), CommitmentError> {
        let valid_time = processed_time.saturating_add(self.time_ns);
        if current_time < valid_time {
            return Err(CommitmentError::TimeDelayNotPassed {
                valid_time,
                current_time,
            });
        }
        let valid_height = Height::new(
            processed_height.revision_number,
            processed_height.revision_height.saturating_add(self.blocks),
        );
        if current_height < valid_height {
            return Err(CommitmentError::BlockDelayNotPassed {
                valid_height,
                current_height,
            });
        }
        Ok(())
    }
}
