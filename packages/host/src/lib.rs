//! Host side primitives shared by the client and channel crates.
//!
//! Everything that touches chain state goes through an explicit [`context::Context`]
//! handle that wraps a [`store::KvStore`], the current [`context::HostEnv`] and the
//! chain [`config::IbcParams`].
#![deny(
    clippy::nursery,
    clippy::pedantic,
    warnings,
    missing_docs,
    unused_crate_dependencies
)]

pub mod codec;
pub mod config;
pub mod context;
pub mod error;
pub mod events;
pub mod height;
pub mod identifier;
pub mod logging;
pub mod path;
pub mod store;

pub use context::{Context, HostEnv};
pub use height::{Height, Timeout};
pub use identifier::{ChannelId, ClientId, ConnectionId, PortId};
pub use path::Path;
pub use store::{CacheStore, KvStore, MemStore};
