//! Commitment and proof primitives.
//!
//! Proofs are opaque to this crate. It only fixes how paths are prefixed and
//! rendered, how delay periods are checked and how packets are committed to;
//! the proof algebra belongs to the light client variant.
#![deny(
    clippy::nursery,
    clippy::pedantic,
    warnings,
    missing_docs,
    unused_crate_dependencies
)]

pub mod delay;
pub mod error;
pub mod merkle;
pub mod packet;
pub mod proof;

pub use delay::DelayPeriod;
pub use error::CommitmentError;
pub use merkle::{CommitmentPrefix, MerklePath};
pub use proof::CommitmentProofBytes;
