#![doc = "Solo machine light client for IBC"]
#![deny(
    clippy::nursery,
    clippy::pedantic,
    warnings,
    missing_docs,
    unused_crate_dependencies
)]
#![cfg_attr(test, allow(clippy::borrow_interior_mutable_const))]

pub mod client_state;
pub mod consensus_state;
pub mod crypto;
pub mod error;
pub mod header;
pub mod membership;
pub mod misbehaviour;
pub mod proof;
pub mod recover;
pub mod update;
pub mod verify;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

/// Client type tag of the solo machine.
pub const CLIENT_TYPE: &str = "06-solomachine";
