//! Channels over light client verified connections.
//!
//! Covers the open and close handshakes, the upgrade handshake (including
//! crossing hellos, error receipts, timeouts and cancellation) and the packet
//! lifecycle. Every proof is checked through the light client contract of
//! the connection's client; the channel logic never looks inside proof bytes.
//!
//! Relayer messages enter through [`router::dispatch`], which executes each
//! message atomically and persists upgrade aborts. Applications call
//! [`handler::packet::send_packet`] and
//! [`handler::packet::write_acknowledgement`] directly.
#![deny(
    clippy::nursery,
    clippy::pedantic,
    warnings,
    missing_docs,
    unused_crate_dependencies
)]

pub mod channel;
pub mod connection;
pub mod error;
pub mod handler;
pub mod msgs;
pub mod packet;
pub mod router;
pub mod state;
pub mod upgrade;
pub mod verify;

pub use channel::{ChannelEnd, Counterparty, Ordering, State};
pub use error::{ChannelError, ErrorKind, UpgradeError};
pub use router::{dispatch, MsgResponse};

#[cfg(test)]
use solomachine_light_client as _;
