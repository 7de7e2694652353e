//! In-memory profile store.
//!
//! Uses `arc-swap` so readers never block: every write builds a new map and
//! swaps it in atomically.

use std::{collections::BTreeMap, sync::Arc};

use arc_swap::ArcSwap;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use super::{ProfileStore, StoreError};

/// Shared, lock-free map of profile records keyed by id.
#[derive(Clone, Debug)]
pub struct MemoryProfileStore {
    inner: Arc<ArcSwap<BTreeMap<Uuid, Value>>>,
}

impl MemoryProfileStore {
    /// Create a new, empty [`MemoryProfileStore`].
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ArcSwap::new(Arc::new(BTreeMap::new()))),
        }
    }
}

impl Default for MemoryProfileStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ProfileStore for MemoryProfileStore {
    fn insert(&self, id: Uuid, record: Value) -> Result<(), StoreError> {
        let mut duplicate = false;
        self.inner.rcu(|current| {
            duplicate = current.contains_key(&id);
            if duplicate {
                return Arc::clone(current);
            }
            let mut next = BTreeMap::clone(current);
            next.insert(id, record.clone());
            Arc::new(next)
        });

        if duplicate {
            return Err(StoreError::Duplicate(id));
        }
        debug!(%id, "profile stored");
        Ok(())
    }

    fn get(&self, id: Uuid) -> Result<Option<Value>, StoreError> {
        Ok(self.inner.load().get(&id).cloned())
    }

    fn list(&self) -> Result<Vec<(Uuid, Value)>, StoreError> {
        Ok(self
            .inner
            .load()
            .iter()
            .map(|(id, record)| (*id, record.clone()))
            .collect())
    }

    fn count(&self) -> Result<usize, StoreError> {
        Ok(self.inner.load().len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn initially_empty() {
        let store = MemoryProfileStore::new();
        assert_eq!(store.count().unwrap(), 0);
        assert!(store.list().unwrap().is_empty());
        assert!(store.get(Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn insert_and_get() {
        let store = MemoryProfileStore::new();
        let id = Uuid::new_v4();
        store.insert(id, json!({"email": "AAAA"})).unwrap();
        assert_eq!(store.get(id).unwrap(), Some(json!({"email": "AAAA"})));
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn duplicate_id_is_rejected() {
        let store = MemoryProfileStore::new();
        let id = Uuid::new_v4();
        store.insert(id, json!({"v": 1})).unwrap();
        assert!(matches!(
            store.insert(id, json!({"v": 2})),
            Err(StoreError::Duplicate(dup)) if dup == id
        ));
        assert_eq!(store.get(id).unwrap(), Some(json!({"v": 1})));
    }

    #[test]
    fn list_is_ordered_by_id() {
        let store = MemoryProfileStore::new();
        for v in 0..5 {
            store.insert(Uuid::new_v4(), json!({ "v": v })).unwrap();
        }
        let ids: Vec<_> = store.list().unwrap().into_iter().map(|(id, _)| id).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn clones_share_state() {
        let store = MemoryProfileStore::new();
        let handle = store.clone();
        handle.insert(Uuid::new_v4(), json!({})).unwrap();
        assert_eq!(store.count().unwrap(), 1);
    }
}
