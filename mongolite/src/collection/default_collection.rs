use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use super::operations::CollectionOperations;
use super::{CollectionProvider, Document, DocumentCursor, FindOptions, UpdateOptions, WriteResult};
use crate::common::Value;
use crate::errors::{ErrorKind, MongoliteError, MongoliteResult};
use crate::filter::Filter;
use crate::store::{Store, StoreMap};

/// A reader/writer lock shared by every handle to the same collection.
pub(crate) type LockHandle = Arc<RwLock<()>>;

pub(crate) struct DefaultCollection {
    collection_name: String,
    store_map: StoreMap,
    store: Store,
    operations: CollectionOperations,
    dropped: AtomicBool,
    lock_handle: LockHandle,
}

impl DefaultCollection {
    pub fn new(
        collection_name: &str,
        store_map: StoreMap,
        store: Store,
        lock_handle: LockHandle,
    ) -> Self {
        let operations =
            CollectionOperations::new(collection_name, store_map.clone(), store.clone());
        Self {
            collection_name: collection_name.to_string(),
            store_map,
            store,
            operations,
            dropped: AtomicBool::new(false),
            lock_handle,
        }
    }

    fn ensure_opened(&self) -> MongoliteResult<()> {
        if self.dropped.load(Ordering::Relaxed) {
            log::error!(
                "Collection '{}' is dropped and cannot be accessed",
                self.collection_name
            );
            return Err(MongoliteError::new(
                &format!(
                    "Collection '{}' is dropped and cannot be accessed",
                    self.collection_name
                ),
                ErrorKind::InvalidOperation,
            ));
        }

        if self.store.is_closed()? {
            log::error!(
                "Store is closed; cannot access collection '{}'",
                self.collection_name
            );
            return Err(MongoliteError::new(
                "Store is closed. Reopen the database to continue operations",
                ErrorKind::InvalidOperation,
            ));
        }

        if self.store_map.is_closed()? {
            log::error!(
                "Backing map for collection '{}' is closed",
                self.collection_name
            );
            return Err(MongoliteError::new(
                &format!(
                    "Collection '{}' underlying map is closed and cannot be accessed",
                    self.collection_name
                ),
                ErrorKind::InvalidOperation,
            ));
        }

        Ok(())
    }
}

impl CollectionProvider for DefaultCollection {
    fn insert(&self, document: Document) -> MongoliteResult<WriteResult> {
        let _guard = self.lock_handle.write();
        self.ensure_opened()?;
        self.operations.insert(document)
    }

    fn insert_many(&self, documents: Vec<Document>) -> MongoliteResult<WriteResult> {
        let _guard = self.lock_handle.write();
        self.ensure_opened()?;
        self.operations.insert_batch(documents)
    }

    fn find(&self, filter: Filter) -> MongoliteResult<DocumentCursor> {
        let _guard = self.lock_handle.read();
        self.ensure_opened()?;
        self.operations.find(filter, &FindOptions::new())
    }

    fn find_with_options(
        &self,
        filter: Filter,
        find_options: &FindOptions,
    ) -> MongoliteResult<DocumentCursor> {
        let _guard = self.lock_handle.read();
        self.ensure_opened()?;
        self.operations.find(filter, find_options)
    }

    fn find_one(&self, filter: Filter) -> MongoliteResult<Option<Document>> {
        let _guard = self.lock_handle.read();
        self.ensure_opened()?;
        self.operations.find_one(filter)
    }

    fn update_with_options(
        &self,
        filter: Filter,
        update: &Document,
        update_options: &UpdateOptions,
    ) -> MongoliteResult<WriteResult> {
        let _guard = self.lock_handle.write();
        self.ensure_opened()?;
        self.operations.update(filter, update, update_options)
    }

    fn replace_one(
        &self,
        filter: Filter,
        replacement: &Document,
        insert_if_absent: bool,
    ) -> MongoliteResult<WriteResult> {
        let _guard = self.lock_handle.write();
        self.ensure_opened()?;
        self.operations
            .replace_one(filter, replacement, insert_if_absent)
    }

    fn remove(&self, filter: Filter, just_once: bool) -> MongoliteResult<WriteResult> {
        let _guard = self.lock_handle.write();
        self.ensure_opened()?;
        self.operations.remove(filter, just_once)
    }

    fn distinct(&self, field: &str, filter: Filter) -> MongoliteResult<Vec<Value>> {
        let _guard = self.lock_handle.read();
        self.ensure_opened()?;
        self.operations.distinct(field, filter)
    }

    fn count(&self, filter: Filter) -> MongoliteResult<u64> {
        let _guard = self.lock_handle.read();
        self.ensure_opened()?;
        self.operations.count(filter)
    }

    fn size(&self) -> MongoliteResult<u64> {
        let _guard = self.lock_handle.read();
        self.ensure_opened()?;
        self.operations.size()
    }

    fn name(&self) -> String {
        self.collection_name.clone()
    }

    fn clear(&self) -> MongoliteResult<()> {
        let _guard = self.lock_handle.write();
        self.ensure_opened()?;
        self.operations.clear()
    }

    fn drop_collection(&self) -> MongoliteResult<()> {
        let _guard = self.lock_handle.write();
        self.ensure_opened()?;
        self.operations.dispose()?;
        self.dropped.store(true, Ordering::Relaxed);
        Ok(())
    }

    fn is_dropped(&self) -> MongoliteResult<bool> {
        let _guard = self.lock_handle.read();
        Ok(self.dropped.load(Ordering::Relaxed))
    }

    fn is_open(&self) -> MongoliteResult<bool> {
        let _guard = self.lock_handle.read();
        Ok(!self.store.is_closed()?
            && !self.dropped.load(Ordering::Relaxed)
            && !self.store_map.is_closed()?)
    }

    fn close(&self) -> MongoliteResult<()> {
        let _guard = self.lock_handle.write();
        if self.dropped.load(Ordering::Relaxed) {
            return Ok(());
        }
        self.operations.close()
    }
}
