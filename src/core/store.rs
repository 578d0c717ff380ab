use std::collections::{HashMap, HashSet};
use std::mem::take;
use thiserror::Error;
use tracing::debug;

/// Upper bound on the ops a pipeline pre-allocates room for.
const PIPELINE_PREALLOC: usize = 1024;

#[derive(Debug, Error, PartialEq)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("invalid store url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    Set { key: String, value: String },
    SetAdd { key: String, member: String },
}

/// Key-value backend contract. Reads take `&mut self` since a connection
/// handle is stateful.
pub trait Store {
    fn get(&mut self, key: &str) -> Result<Option<String>, StoreError>;

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;

    fn set_add(&mut self, key: &str, member: &str) -> Result<(), StoreError>;

    fn set_members(&mut self, key: &str) -> Result<HashSet<String>, StoreError>;

    fn flush_all(&mut self) -> Result<(), StoreError>;

    /// Applies a batch of writes in a single round trip.
    fn execute(&mut self, ops: Vec<WriteOp>) -> Result<(), StoreError>;
}

/// Client-side write buffer. Nothing queued here is visible to reads until
/// [`Pipeline::sync`] has returned.
pub struct Pipeline {
    ops: Vec<WriteOp>,
    flush_every: usize,
    syncs: u64,
}

impl Pipeline {
    pub fn new(flush_every: usize) -> Self {
        let flush_every = flush_every.max(1);
        Self {
            ops: Vec::with_capacity(flush_every.min(PIPELINE_PREALLOC)),
            flush_every,
            syncs: 0,
        }
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.ops.push(WriteOp::Set {
            key: key.into(),
            value: value.into(),
        });
        self
    }

    pub fn set_add(&mut self, key: impl Into<String>, member: impl Into<String>) -> &mut Self {
        self.ops.push(WriteOp::SetAdd {
            key: key.into(),
            member: member.into(),
        });
        self
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn syncs(&self) -> u64 {
        self.syncs
    }

    pub fn sync<S: Store + ?Sized>(&mut self, store: &mut S) -> Result<usize, StoreError> {
        if self.is_empty() {
            return Ok(0);
        }
        let ops = take(&mut self.ops);
        let sent = ops.len();
        store.execute(ops)?;
        self.syncs += 1;
        debug!(ops = sent, syncs = self.syncs, "pipeline synced");
        Ok(sent)
    }

    pub fn sync_if_due<S: Store + ?Sized>(&mut self, store: &mut S) -> Result<bool, StoreError> {
        if self.len() < self.flush_every {
            return Ok(false);
        }
        self.sync(store)?;
        Ok(true)
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    strings: HashMap<String, String>,
    sets: HashMap<String, HashSet<String>>,
    round_trips: u64,
    down: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn round_trips(&self) -> u64 {
        self.round_trips
    }

    #[cfg(test)]
    pub fn disconnect(&mut self) {
        self.down = true;
    }

    fn round_trip(&mut self) -> Result<(), StoreError> {
        if self.down {
            return Err(StoreError::Unavailable("connection closed".to_string()));
        }
        self.round_trips += 1;
        Ok(())
    }

    fn apply(&mut self, op: WriteOp) {
        match op {
            WriteOp::Set { key, value } => {
                self.strings.insert(key, value);
            }
            WriteOp::SetAdd { key, member } => {
                self.sets.entry(key).or_default().insert(member);
            }
        }
    }
}

impl Store for MemoryStore {
    fn get(&mut self, key: &str) -> Result<Option<String>, StoreError> {
        self.round_trip()?;
        Ok(self.strings.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.round_trip()?;
        self.strings.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn set_add(&mut self, key: &str, member: &str) -> Result<(), StoreError> {
        self.round_trip()?;
        self.sets
            .entry(key.to_string())
            .or_default()
            .insert(member.to_string());
        Ok(())
    }

    fn set_members(&mut self, key: &str) -> Result<HashSet<String>, StoreError> {
        self.round_trip()?;
        Ok(self.sets.get(key).cloned().unwrap_or_default())
    }

    fn flush_all(&mut self) -> Result<(), StoreError> {
        self.round_trip()?;
        self.strings.clear();
        self.sets.clear();
        Ok(())
    }

    fn execute(&mut self, ops: Vec<WriteOp>) -> Result<(), StoreError> {
        self.round_trip()?;
        for op in ops {
            self.apply(op);
        }
        Ok(())
    }
}
