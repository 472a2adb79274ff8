//! Resolution index
//!
//! Maps each [`ResolutionKey`] to the id of the entity created under it, and
//! hands out one lock per key so that lookup-then-create is atomic within the
//! process.

use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use weft_model::ResolutionKey;

/// `ResolutionKey → entity id` map with per-key locks
#[derive(Debug, Default)]
pub struct ResolutionIndex {
    ids: DashMap<ResolutionKey, String>,
    locks: DashMap<ResolutionKey, Arc<Mutex<()>>>,
}

impl ResolutionIndex {
    /// Create empty index
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock guarding lookup and creation under `key`
    ///
    /// Callers hold the returned mutex across the whole get-or-create.
    #[must_use]
    pub fn lock(&self, key: &ResolutionKey) -> Arc<Mutex<()>> {
        Arc::clone(self.locks.entry(key.clone()).or_default().value())
    }

    /// Run `f` while holding the lock of `key`
    ///
    /// The lock is dropped from the map afterwards unless another caller
    /// is waiting on it.
    pub fn with_lock<T>(&self, key: &ResolutionKey, f: impl FnOnce() -> T) -> T {
        let lock = self.lock(key);
        let out = {
            let _guard = lock.lock();
            f()
        };
        self.locks
            .remove_if(key, |_, held| Arc::ptr_eq(held, &lock) && Arc::strong_count(held) == 2);
        out
    }

    /// Id indexed under `key`
    #[inline]
    #[must_use]
    pub fn get(&self, key: &ResolutionKey) -> Option<String> {
        self.ids.get(key).map(|entry| entry.value().clone())
    }

    /// Index `id` under `key`, replacing any previous id
    pub fn insert(&self, key: ResolutionKey, id: impl Into<String>) {
        self.ids.insert(key, id.into());
    }

    /// Index `id` under `key` unless the key is taken
    ///
    /// Returns `true` when inserted.
    pub fn insert_if_absent(&self, key: ResolutionKey, id: impl Into<String>) -> bool {
        let mut inserted = false;
        self.ids.entry(key).or_insert_with(|| {
            inserted = true;
            id.into()
        });
        inserted
    }

    /// Forget every key pointing at `id`
    pub fn remove_id(&self, id: &str) {
        self.ids.retain(|_, indexed| indexed != id);
        self.prune_locks();
    }

    /// Forget everything
    pub fn clear(&self) {
        self.ids.clear();
        self.prune_locks();
    }

    /// Drop the locks nobody holds
    ///
    /// A lock still cloned by a caller stays, so that caller keeps excluding
    /// later ones.
    pub fn prune_locks(&self) {
        self.locks.retain(|_, lock| Arc::strong_count(lock) > 1);
    }

    /// Number of live per-key locks
    #[inline]
    #[must_use]
    pub fn lock_count(&self) -> usize {
        self.locks.len()
    }

    /// Number of indexed keys
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether nothing is indexed
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
