//! One persisted collection: in-memory records mirrored to a single
//! key-value blob.
//!
//! Every mutation bumps a revision. Writes go through a per-collection
//! async lock and snapshot the collection while holding it, so whichever
//! write lands last carries the newest revision and the blob never moves
//! backwards. A write whose revision is already persisted is skipped.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, error, warn};

use crate::error::StorageError;
use crate::schedule::{DiaryEntry, Event};
use crate::storage::KeyValueStore;

pub(crate) trait Record: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    const KIND: &'static str;

    fn id(&self) -> &str;

    /// Whether `self` replaces `other` when local records are merged over
    /// a freshly loaded snapshot.
    fn supersedes(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Record for Event {
    const KIND: &'static str = "event";

    fn id(&self) -> &str {
        &self.id
    }
}

impl Record for DiaryEntry {
    const KIND: &'static str = "diary entry";

    fn id(&self) -> &str {
        &self.id
    }

    fn supersedes(&self, other: &Self) -> bool {
        self.id == other.id || self.date == other.date
    }
}

struct Tracked<T> {
    items: Vec<T>,
    revision: u64,
    loaded: bool,
}

pub(crate) struct Collection<T> {
    key: &'static str,
    state: RwLock<Tracked<T>>,
    /// Highest revision known to match the blob. Held for the whole
    /// snapshot-and-write so writes are single-flight.
    persisted: tokio::sync::Mutex<u64>,
}

impl<T: Record> Collection<T> {
    pub(crate) fn new(key: &'static str) -> Self {
        Self {
            key,
            state: RwLock::new(Tracked {
                items: Vec::new(),
                revision: 0,
                loaded: false,
            }),
            persisted: tokio::sync::Mutex::new(0),
        }
    }

    pub(crate) fn key(&self) -> &'static str {
        self.key
    }

    fn state(&self) -> RwLockReadGuard<'_, Tracked<T>> {
        self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn state_mut(&self) -> RwLockWriteGuard<'_, Tracked<T>> {
        self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub(crate) fn read<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        f(&self.state().items)
    }

    pub(crate) fn snapshot(&self) -> Vec<T> {
        self.read(|items| items.to_vec())
    }

    /// Apply `f` to the records. The revision is bumped only when `f`
    /// reports a change.
    pub(crate) fn mutate(&self, f: impl FnOnce(&mut Vec<T>) -> bool) -> bool {
        let mut state = self.state_mut();
        let changed = f(&mut state.items);
        if changed {
            state.revision += 1;
        }
        changed
    }

    /// Write the current snapshot unless it is already persisted.
    /// Returns whether a write happened.
    pub(crate) async fn persist(&self, storage: &dyn KeyValueStore) -> Result<bool, StorageError> {
        let mut persisted = self.persisted.lock().await;
        self.persist_locked(storage, &mut persisted).await
    }

    async fn persist_locked(
        &self,
        storage: &dyn KeyValueStore,
        persisted: &mut u64,
    ) -> Result<bool, StorageError> {
        let (revision, blob) = {
            let state = self.state();
            if !state.loaded || state.revision <= *persisted {
                return Ok(false);
            }
            let blob = serde_json::to_string(&state.items).map_err(|e| {
                StorageError::Serialization {
                    key: self.key.to_string(),
                    message: e.to_string(),
                }
            })?;
            (state.revision, blob)
        };

        storage.set(self.key, &blob).await?;
        *persisted = revision;
        debug!(key = self.key, revision, "collection persisted");
        Ok(true)
    }

    /// Replace the records with the persisted snapshot.
    ///
    /// Unwritten local revisions are flushed first. If that flush fails, or
    /// the records change while the blob is being read, memory is kept as
    /// is and stays dirty so the next write carries it. Records added
    /// before the first load are kept on top of the loaded snapshot. `seed`
    /// is used only when no blob exists. Read and parse failures reset the
    /// collection to empty.
    ///
    /// Returns whether the collection now holds `seed`.
    pub(crate) async fn load(&self, storage: &dyn KeyValueStore, seed: Vec<T>) -> bool {
        let mut persisted = self.persisted.lock().await;

        if let Err(e) = self.persist_locked(storage, &mut persisted).await {
            warn!(key = self.key, error = %e, "could not flush pending changes before reload");
        }

        let (items, mut in_sync, seeded) = match storage.get(self.key).await {
            Ok(Some(blob)) => match serde_json::from_str::<Vec<T>>(&blob) {
                Ok(items) => (items, true, false),
                Err(e) => {
                    error!(key = self.key, error = %e, "failed to parse persisted {}s", T::KIND);
                    (Vec::new(), true, false)
                }
            },
            Ok(None) => (seed, false, true),
            Err(e) => {
                error!(key = self.key, error = %e, "failed to load {}s", T::KIND);
                (Vec::new(), true, false)
            }
        };

        let mut state = self.state_mut();
        if state.loaded && state.revision > *persisted {
            warn!(
                key = self.key,
                revision = state.revision,
                "unsaved {}s kept, reload skipped",
                T::KIND
            );
            return false;
        }

        let mut items = items;
        if !state.loaded && !state.items.is_empty() {
            let early = std::mem::take(&mut state.items);
            items.retain(|loaded| !early.iter().any(|record| record.supersedes(loaded)));
            items.extend(early);
            in_sync = false;
        }

        state.items = items;
        state.revision += 1;
        state.loaded = true;
        if in_sync {
            *persisted = state.revision;
        }
        debug!(key = self.key, count = state.items.len(), "collection loaded");
        seeded
    }

    /// Re-read the blob and check that `id` is gone from it.
    pub(crate) async fn verify_absent(&self, storage: &dyn KeyValueStore, id: &str) -> bool {
        let blob = match storage.get(self.key).await {
            Ok(Some(blob)) => blob,
            Ok(None) => return true,
            Err(e) => {
                warn!(key = self.key, error = %e, "could not re-read collection for verification");
                return false;
            }
        };

        match serde_json::from_str::<Vec<T>>(&blob) {
            Ok(items) if items.iter().any(|record| record.id() == id) => {
                warn!(key = self.key, id, "deleted {} is still persisted", T::KIND);
                false
            }
            Ok(_) => true,
            Err(e) => {
                warn!(key = self.key, error = %e, "persisted collection unreadable after delete");
                false
            }
        }
    }
}
