use crate::collection::Document;
use crate::errors::{ErrorKind, MongoliteError, MongoliteResult};
use crate::store::{
    EntryIterator, EntryIteratorProvider, Store, StoreMap, StoreMapProvider, StoreProvider,
};
use crossbeam_skiplist::SkipMap;
use dashmap::DashMap;
use std::ops::Bound::{Excluded, Unbounded};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Volatile storage backend keeping all documents in process memory.
///
/// The default store when a database is built without loading one. Maps are
/// backed by lock-free skip lists, so scans run concurrently with writes and
/// observe a stable key order. `commit` is a no-op; nothing survives the
/// process.
pub struct InMemoryStore {
    inner: Arc<InMemoryStoreInner>,
}

struct InMemoryStoreInner {
    maps: DashMap<String, StoreMap>,
    closed: AtomicBool,
}

impl InMemoryStore {
    /// Creates a fresh in-memory store wrapped in a [Store] handle.
    pub fn create() -> Store {
        Store::new(InMemoryStore {
            inner: Arc::new(InMemoryStoreInner {
                maps: DashMap::new(),
                closed: AtomicBool::new(false),
            }),
        })
    }

    fn check_opened(&self) -> MongoliteResult<()> {
        if self.inner.closed.load(Ordering::Relaxed) {
            log::error!("Operation on closed in-memory store");
            return Err(MongoliteError::new(
                "Store is closed",
                ErrorKind::StoreAlreadyClosed,
            ));
        }
        Ok(())
    }
}

impl StoreProvider for InMemoryStore {
    fn open_or_create(&self) -> MongoliteResult<()> {
        self.check_opened()
    }

    fn is_closed(&self) -> MongoliteResult<bool> {
        Ok(self.inner.closed.load(Ordering::Relaxed))
    }

    fn map_names(&self) -> MongoliteResult<Vec<String>> {
        self.check_opened()?;
        Ok(self
            .inner
            .maps
            .iter()
            .map(|entry| entry.key().clone())
            .collect())
    }

    fn has_map(&self, name: &str) -> MongoliteResult<bool> {
        self.check_opened()?;
        Ok(self.inner.maps.contains_key(name))
    }

    fn open_map(&self, name: &str) -> MongoliteResult<StoreMap> {
        self.check_opened()?;
        let map = self
            .inner
            .maps
            .entry(name.to_string())
            .or_insert_with(|| StoreMap::new(InMemoryMap::new(name)))
            .clone();
        Ok(map)
    }

    fn remove_map(&self, name: &str) -> MongoliteResult<()> {
        self.check_opened()?;
        if let Some((_, map)) = self.inner.maps.remove(name) {
            map.clear()?;
            map.close()?;
        }
        Ok(())
    }

    fn commit(&self) -> MongoliteResult<()> {
        self.check_opened()
    }

    fn close(&self) -> MongoliteResult<()> {
        if self.inner.closed.swap(true, Ordering::Relaxed) {
            return Ok(());
        }
        for entry in self.inner.maps.iter() {
            entry.value().close()?;
        }
        Ok(())
    }
}

/// One in-memory document map, backed by a concurrent skip list.
pub(crate) struct InMemoryMap {
    inner: Arc<InMemoryMapInner>,
}

struct InMemoryMapInner {
    name: String,
    data: SkipMap<String, Document>,
    closed: AtomicBool,
}

impl InMemoryMap {
    pub(crate) fn new(name: &str) -> Self {
        InMemoryMap {
            inner: Arc::new(InMemoryMapInner {
                name: name.to_string(),
                data: SkipMap::new(),
                closed: AtomicBool::new(false),
            }),
        }
    }

    fn check_opened(&self) -> MongoliteResult<()> {
        if self.inner.closed.load(Ordering::Relaxed) {
            log::error!("Operation on closed map '{}'", self.inner.name);
            return Err(MongoliteError::new(
                &format!("Map '{}' is closed", self.inner.name),
                ErrorKind::StoreAlreadyClosed,
            ));
        }
        Ok(())
    }
}

impl StoreMapProvider for InMemoryMap {
    fn name(&self) -> MongoliteResult<String> {
        Ok(self.inner.name.clone())
    }

    fn get(&self, key: &str) -> MongoliteResult<Option<Document>> {
        self.check_opened()?;
        Ok(self.inner.data.get(key).map(|entry| entry.value().clone()))
    }

    fn put(&self, key: &str, value: Document) -> MongoliteResult<()> {
        self.check_opened()?;
        self.inner.data.insert(key.to_string(), value);
        Ok(())
    }

    fn put_if_absent(&self, key: &str, value: Document) -> MongoliteResult<Option<Document>> {
        self.check_opened()?;
        if let Some(existing) = self.inner.data.get(key) {
            return Ok(Some(existing.value().clone()));
        }
        self.inner.data.insert(key.to_string(), value);
        Ok(None)
    }

    fn remove(&self, key: &str) -> MongoliteResult<Option<Document>> {
        self.check_opened()?;
        Ok(self
            .inner
            .data
            .remove(key)
            .map(|entry| entry.value().clone()))
    }

    fn contains_key(&self, key: &str) -> MongoliteResult<bool> {
        self.check_opened()?;
        Ok(self.inner.data.contains_key(key))
    }

    fn size(&self) -> MongoliteResult<u64> {
        self.check_opened()?;
        Ok(self.inner.data.len() as u64)
    }

    fn is_empty(&self) -> MongoliteResult<bool> {
        self.check_opened()?;
        Ok(self.inner.data.is_empty())
    }

    fn clear(&self) -> MongoliteResult<()> {
        self.check_opened()?;
        self.inner.data.clear();
        Ok(())
    }

    fn entries(&self) -> MongoliteResult<EntryIterator> {
        self.check_opened()?;
        Ok(EntryIterator::new(InMemoryEntryProvider {
            map: self.inner.clone(),
            cursor: None,
        }))
    }

    fn is_closed(&self) -> MongoliteResult<bool> {
        Ok(self.inner.closed.load(Ordering::Relaxed))
    }

    fn close(&self) -> MongoliteResult<()> {
        self.inner.closed.store(true, Ordering::Relaxed);
        Ok(())
    }
}

/// Cursor-style entry provider: remembers the last visited key and resumes
/// strictly after it, so a scan visits each key at most once under
/// concurrent inserts.
struct InMemoryEntryProvider {
    map: Arc<InMemoryMapInner>,
    cursor: Option<String>,
}

impl EntryIteratorProvider for InMemoryEntryProvider {
    fn next_entry(&mut self) -> Option<MongoliteResult<(String, Document)>> {
        let entry = match &self.cursor {
            None => self.map.data.front(),
            Some(last) => self
                .map
                .data
                .range((Excluded(last.clone()), Unbounded))
                .next(),
        }?;
        let key = entry.key().clone();
        let value = entry.value().clone();
        self.cursor = Some(key.clone());
        Some(Ok((key, value)))
    }
}
