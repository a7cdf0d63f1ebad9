//! In-memory key-value store.
//!
//! Fast, thread-safe storage suitable for development, testing,
//! and single-process deployments.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{debug, instrument};

use tally_core::error::{Result, TallyError};
use tally_core::traits::KeyValueStore;

/// Stored value: either a scalar string or a list.
#[derive(Clone, Debug)]
enum Value {
    Scalar(String),
    List(Vec<String>),
}

#[derive(Clone, Debug)]
struct Slot {
    value: Value,
    expires_at: Option<Instant>,
}

impl Slot {
    fn persistent(value: Value) -> Self {
        Self {
            value,
            expires_at: None,
        }
    }

    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }
}

/// In-memory key-value store.
///
/// Implements the full [`KeyValueStore`] contract, expiry included, on top of
/// a sharded concurrent map. Each operation holds the shard lock of its key
/// for its whole read-modify-write, which makes `incr` and `rpush` atomic.
///
/// Expired keys are dropped lazily when touched, or in bulk by
/// [`MemoryStore::purge_expired`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, Slot>,
}

impl MemoryStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store with preallocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: DashMap::with_capacity(capacity),
        }
    }

    /// Returns the number of keys, expired ones included until purged.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the store holds no keys.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes all expired keys. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, slot| !slot.is_expired());
        before.saturating_sub(self.entries.len())
    }

    /// Remaining time-to-live of `key`.
    ///
    /// `None` when the key is missing, expired, or has no expiry.
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        let slot = self.entries.get(key)?;
        let at = slot.expires_at?;
        at.checked_duration_since(Instant::now())
    }

    /// Live slot for `key`, creating it with `init` when missing or expired.
    fn live_slot(
        &self,
        key: &str,
        init: impl FnOnce() -> Value,
    ) -> dashmap::mapref::one::RefMut<'_, String, Slot> {
        match self.entries.entry(key.to_owned()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().is_expired() {
                    occupied.insert(Slot::persistent(init()));
                }
                occupied.into_ref()
            }
            Entry::Vacant(vacant) => vacant.insert(Slot::persistent(init())),
        }
    }

    /// Clone of the live value at `key`, dropping it if it has expired.
    fn read(&self, key: &str) -> Option<Value> {
        match self.entries.get(key) {
            None => return None,
            Some(slot) if !slot.is_expired() => return Some(slot.value.clone()),
            Some(_) => {}
        }
        self.entries.remove_if(key, |_, slot| slot.is_expired());
        None
    }
}

/// Resolves a Redis-style inclusive range against a list of `len` items.
fn resolve_range(len: usize, start: isize, stop: isize) -> Option<(usize, usize)> {
    let len = isize::try_from(len).ok()?;
    let start = if start < 0 { (len + start).max(0) } else { start };
    let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };
    if start > stop || start >= len {
        return None;
    }
    Some((start as usize, stop as usize))
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    #[instrument(skip(self))]
    async fn incr(&self, key: &str) -> Result<i64> {
        let mut slot = self.live_slot(key, || Value::Scalar("0".into()));
        match &mut slot.value {
            Value::Scalar(raw) => {
                let current: i64 = raw
                    .parse()
                    .map_err(|_| TallyError::wrong_type(key, "value is not an integer"))?;
                let next = current
                    .checked_add(1)
                    .ok_or_else(|| TallyError::wrong_type(key, "increment would overflow"))?;
                *raw = next.to_string();
                Ok(next)
            }
            Value::List(_) => Err(TallyError::wrong_type(key, "cannot increment a list")),
        }
    }

    #[instrument(skip(self, value))]
    async fn rpush(&self, key: &str, value: &str) -> Result<usize> {
        let mut slot = self.live_slot(key, || Value::List(Vec::new()));
        match &mut slot.value {
            Value::List(items) => {
                items.push(value.to_owned());
                Ok(items.len())
            }
            Value::Scalar(_) => Err(TallyError::wrong_type(key, "cannot push to a scalar")),
        }
    }

    async fn lrange(&self, key: &str, start: isize, stop: isize) -> Result<Vec<String>> {
        match self.read(key) {
            None => Ok(Vec::new()),
            Some(Value::List(items)) => Ok(resolve_range(items.len(), start, stop)
                .map(|(from, to)| items[from..=to].to_vec())
                .unwrap_or_default()),
            Some(Value::Scalar(_)) => Err(TallyError::wrong_type(key, "not a list")),
        }
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        match self.read(key) {
            None => Ok(None),
            Some(Value::Scalar(raw)) => Ok(Some(raw)),
            Some(Value::List(_)) => Err(TallyError::wrong_type(key, "not a scalar")),
        }
    }

    #[instrument(skip(self, value))]
    async fn setex(&self, key: &str, ttl: Duration, value: &str) -> Result<()> {
        if ttl.is_zero() {
            return Err(TallyError::StoreError(format!(
                "invalid expire time for '{}'",
                key
            )));
        }
        let slot = Slot {
            value: Value::Scalar(value.to_owned()),
            expires_at: Some(Instant::now() + ttl),
        };
        self.entries.insert(key.to_owned(), slot);
        Ok(())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .insert(key.to_owned(), Slot::persistent(Value::Scalar(value.to_owned())));
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.read(key).is_some())
    }

    async fn flush(&self) -> Result<()> {
        let removed = self.entries.len();
        self.entries.clear();
        debug!(removed, "Flushed memory store");
        Ok(())
    }
}
