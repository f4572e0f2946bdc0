use crate::codec::{decode_document, decode_key, encode_document, to_store_error};
use fjall::Partition;
use mongolite::collection::Document;
use mongolite::errors::{ErrorKind, MongoliteError, MongoliteResult};
use mongolite::store::{EntryIterator, EntryIteratorProvider, StoreMapProvider};
use std::ops::Bound::{Excluded, Unbounded};
use std::ops::RangeFull;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// One document map backed by a Fjall partition.
///
/// Keys are document ids stored as UTF-8 bytes, so the partition's
/// lexicographic byte order matches string order and scans come back in id
/// order. Values are bincode-encoded documents.
///
/// Uses PIMPL pattern with `Arc<FjallMapInner>`; clones share the partition
/// handle and the closed flag.
#[derive(Clone)]
pub struct FjallMap {
    inner: Arc<FjallMapInner>,
}

impl FjallMap {
    pub(crate) fn new(name: String, partition: Partition) -> FjallMap {
        FjallMap {
            inner: Arc::new(FjallMapInner {
                name,
                partition,
                closed: AtomicBool::new(false),
            }),
        }
    }
}

struct FjallMapInner {
    name: String,
    partition: Partition,
    closed: AtomicBool,
}

impl FjallMapInner {
    fn check_opened(&self) -> MongoliteResult<()> {
        if self.closed.load(Ordering::Relaxed) {
            log::error!("Map '{}' is closed", self.name);
            return Err(MongoliteError::new(
                &format!("Map '{}' is closed", self.name),
                ErrorKind::StoreAlreadyClosed,
            ));
        }
        Ok(())
    }
}

impl StoreMapProvider for FjallMap {
    fn name(&self) -> MongoliteResult<String> {
        Ok(self.inner.name.clone())
    }

    fn get(&self, key: &str) -> MongoliteResult<Option<Document>> {
        self.inner.check_opened()?;
        match self.inner.partition.get(key.as_bytes()) {
            Ok(Some(bytes)) => {
                let document = decode_document(&bytes).map_err(|err| {
                    log::error!("Failed to decode document '{}': {}", key, err);
                    MongoliteError::from(err)
                })?;
                Ok(Some(document))
            }
            Ok(None) => Ok(None),
            Err(err) => {
                log::error!("Failed to read key '{}' from partition: {}", key, err);
                Err(to_store_error(err))
            }
        }
    }

    fn put(&self, key: &str, value: Document) -> MongoliteResult<()> {
        self.inner.check_opened()?;
        let bytes = encode_document(&value)?;
        if let Err(err) = self.inner.partition.insert(key.as_bytes(), bytes) {
            log::error!("Failed to write key '{}' to partition: {}", key, err);
            return Err(to_store_error(err));
        }
        Ok(())
    }

    fn put_if_absent(&self, key: &str, value: Document) -> MongoliteResult<Option<Document>> {
        self.inner.check_opened()?;
        // Not atomic at the partition level; callers serialize writes per
        // collection, so a get-then-insert cannot race here.
        let existing = self.get(key)?;
        if existing.is_none() {
            self.put(key, value)?;
        }
        Ok(existing)
    }

    fn remove(&self, key: &str) -> MongoliteResult<Option<Document>> {
        self.inner.check_opened()?;
        let existing = self.get(key)?;
        if let Err(err) = self.inner.partition.remove(key.as_bytes()) {
            log::error!("Failed to remove key '{}' from partition: {}", key, err);
            return Err(to_store_error(err));
        }
        Ok(existing)
    }

    fn contains_key(&self, key: &str) -> MongoliteResult<bool> {
        self.inner.check_opened()?;
        self.inner
            .partition
            .contains_key(key.as_bytes())
            .map_err(to_store_error)
    }

    fn size(&self) -> MongoliteResult<u64> {
        self.inner.check_opened()?;
        match self.inner.partition.len() {
            Ok(len) => Ok(len as u64),
            Err(err) => {
                log::error!("Failed to get partition size: {}", err);
                Err(to_store_error(err))
            }
        }
    }

    fn is_empty(&self) -> MongoliteResult<bool> {
        self.inner.check_opened()?;
        self.inner.partition.is_empty().map_err(to_store_error)
    }

    fn clear(&self) -> MongoliteResult<()> {
        self.inner.check_opened()?;
        for result in self.inner.partition.range::<Vec<u8>, RangeFull>(..) {
            match result {
                Ok((key, _)) => {
                    if let Err(err) = self.inner.partition.remove(&*key) {
                        log::error!("Failed to remove entry while clearing map: {}", err);
                        return Err(to_store_error(err));
                    }
                }
                Err(err) => {
                    log::error!("Failed to scan partition while clearing map: {}", err);
                    return Err(to_store_error(err));
                }
            }
        }
        Ok(())
    }

    fn entries(&self) -> MongoliteResult<EntryIterator> {
        self.inner.check_opened()?;
        Ok(EntryIterator::new(FjallEntryProvider {
            partition: self.inner.partition.clone(),
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
struct FjallEntryProvider {
    partition: Partition,
    cursor: Option<Vec<u8>>,
}

impl EntryIteratorProvider for FjallEntryProvider {
    fn next_entry(&mut self) -> Option<MongoliteResult<(String, Document)>> {
        let item = match &self.cursor {
            None => self.partition.range::<Vec<u8>, RangeFull>(..).next(),
            Some(last) => self
                .partition
                .range((Excluded(last.clone()), Unbounded))
                .next(),
        }?;
        match item {
            Ok((key, value)) => {
                self.cursor = Some(key.to_vec());
                let id = match decode_key(&key) {
                    Ok(id) => id,
                    Err(err) => return Some(Err(err.into())),
                };
                match decode_document(&value) {
                    Ok(document) => Some(Ok((id, document))),
                    Err(err) => {
                        log::error!("Failed to decode entry '{}': {}", id, err);
                        Some(Err(err.into()))
                    }
                }
            }
            Err(err) => Some(Err(to_store_error(err))),
        }
    }
}
