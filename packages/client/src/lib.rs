//! The light client contract.
//!
//! Client and consensus states are stored per client id under the ICS-24
//! paths. Every operation loads the stored [`types::AnyClientState`] and
//! routes to the variant that implements it.
#![deny(
    clippy::nursery,
    clippy::pedantic,
    warnings,
    missing_docs,
    unused_crate_dependencies
)]

pub mod error;
pub mod handler;
pub mod module;
pub mod state;
pub mod types;

pub use error::ClientError;
pub use types::{AnyClientState, AnyConsensusState, ClientMessage, ClientStatus, ClientType};
