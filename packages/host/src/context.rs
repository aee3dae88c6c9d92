//! The execution context threaded through every handler.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::{
    codec,
    config::IbcParams,
    error::CodecError,
    events::{EventSink, IbcEvent},
    height::Height,
    path::Path,
    store::{CacheStore, KvStore},
};

/// Facts about the executing chain at the current block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostEnv {
    /// Chain identifier
    pub chain_id: String,
    /// Current block height
    pub height: Height,
    /// Current block time, unix nanoseconds
    pub timestamp: u64,
}

impl HostEnv {
    /// Creates a new environment.
    pub fn new(chain_id: impl Into<String>, height: Height, timestamp: u64) -> Self {
        Self {
            chain_id: chain_id.into(),
            height,
            timestamp,
        }
    }
}

/// Store handle, block environment, parameters and buffered events of one
/// message execution.
pub struct Context<'a, S: KvStore> {
    store: &'a mut S,
    env: &'a HostEnv,
    params: &'a IbcParams,
    events: Vec<IbcEvent>,
}

impl<'a, S: KvStore> Context<'a, S> {
    /// Wraps a store for the given block.
    pub fn new(store: &'a mut S, env: &'a HostEnv, params: &'a IbcParams) -> Self {
        Self {
            store,
            env,
            params,
            events: Vec::new(),
        }
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        self.store
    }

    /// The underlying store, mutably.
    pub fn store_mut(&mut self) -> &mut S {
        self.store
    }

    /// The current block.
    #[must_use]
    pub const fn env(&self) -> &HostEnv {
        self.env
    }

    /// Chain parameters.
    #[must_use]
    pub const fn params(&self) -> &IbcParams {
        self.params
    }

    /// Buffers an event.
    pub fn emit(&mut self, event: IbcEvent) {
        tracing::debug!(event = event.name(), "emitting event");
        self.events.push(event);
    }

    /// Events buffered so far.
    #[must_use]
    pub fn events(&self) -> &[IbcEvent] {
        &self.events
    }

    /// Hands every buffered event to `sink`.
    pub fn drain_events(&mut self, sink: &mut impl EventSink) {
        for event in self.events.drain(..) {
            sink.emit(event);
        }
    }

    /// Runs `f` against a write buffer. Writes and events reach this context
    /// only if `f` succeeds.
    /// # Errors
    /// Returns whatever `f` returns.
    pub fn atomically<T, E>(
        &mut self,
        f: impl FnOnce(&mut Context<'_, CacheStore<'_, S>>) -> Result<T, E>,
    ) -> Result<T, E> {
        let mut cache = CacheStore::new(&mut *self.store);
        let mut branch = Context {
            store: &mut cache,
            env: self.env,
            params: self.params,
            events: Vec::new(),
        };
        let result = f(&mut branch);
        let events = branch.events;
        let value = result?;
        cache.commit();
        self.events.extend(events);
        Ok(value)
    }

    /// Reads and decodes the value at `path`.
    /// # Errors
    /// Fails if a stored value does not decode as `T`.
    pub fn read<T: BorshDeserialize>(&self, path: &Path) -> Result<Option<T>, CodecError> {
        self.store
            .get(&path.to_string())
            .map(|bytes| codec::decode(&bytes))
            .transpose()
    }

    /// Encodes and writes `value` at `path`.
    /// # Errors
    /// Fails if the value cannot be encoded.
    pub fn write<T: BorshSerialize>(&mut self, path: &Path, value: &T) -> Result<(), CodecError> {
        let bytes = codec::encode(value)?;
        self.store.set(&path.to_string(), bytes);
        Ok(())
    }

    /// Raw bytes at `path`.
    #[must_use]
    pub fn read_raw(&self, path: &Path) -> Option<Vec<u8>> {
        self.store.get(&path.to_string())
    }

    /// Writes raw bytes at `path`.
    pub fn write_raw(&mut self, path: &Path, value: Vec<u8>) {
        self.store.set(&path.to_string(), value);
    }

    /// Deletes `path`.
    pub fn remove(&mut self, path: &Path) {
        self.store.delete(&path.to_string());
    }

    /// Whether anything is stored at `path`.
    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.store.has(&path.to_string())
    }

    /// Returns the counter at `path` (zero when unset) and stores its successor.
    /// # Errors
    /// Fails if the stored counter does not decode.
    pub fn bump_counter(&mut self, path: &Path) -> Result<u64, CodecError> {
        let current: u64 = self.read(path)?.unwrap_or_default();
        self.write(path, &current.saturating_add(1))?;
        Ok(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{events::ClientEvent, identifier::ClientId, store::MemStore};

    fn event() -> IbcEvent {
        IbcEvent::CreateClient(ClientEvent {
            client_id: ClientId::new("06-solomachine-0").unwrap(),
            client_type: "06-solomachine".into(),
            consensus_heights: vec![Height::new(0, 1)],
        })
    }

    #[test]
    fn failed_branch_leaves_no_trace() {
        let mut store = MemStore::new();
        let env = HostEnv::new("chain", Height::new(0, 1), 1);
        let params = IbcParams::default();
        let mut ctx = Context::new(&mut store, &env, &params);

        let res: Result<(), &str> = ctx.atomically(|tx| {
            tx.write(&Path::NextChannelSequence, &5u64).unwrap();
            tx.emit(event());
            Err("rejected")
        });

        assert_eq!(res, Err("rejected"));
        assert!(ctx.events().is_empty());
        assert!(!ctx.contains(&Path::NextChannelSequence));
    }

    #[test]
    fn successful_branch_commits_writes_and_events() {
        let mut store = MemStore::new();
        let env = HostEnv::new("chain", Height::new(0, 1), 1);
        let params = IbcParams::default();
        let mut ctx = Context::new(&mut store, &env, &params);

        let seq = ctx
            .atomically(|tx| {
                tx.emit(event());
                tx.bump_counter(&Path::NextChannelSequence)
            })
            .unwrap();

        assert_eq!(seq, 0);
        assert_eq!(
            ctx.read::<u64>(&Path::NextChannelSequence).unwrap(),
            Some(1)
        );
        let mut sink = Vec::new();
        ctx.drain_events(&mut sink);
        assert_eq!(sink, vec![event()]);
        assert!(ctx.events().is_empty());
    }
}
