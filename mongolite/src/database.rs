use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::collection::{Collection, DefaultCollection, LockHandle};
use crate::common::constants::RESERVED_NAME_PREFIX;
use crate::database_builder::DatabaseBuilder;
use crate::errors::{ErrorKind, MongoliteError, MongoliteResult};
use crate::store::Store;

/// The main database instance.
///
/// `Database` is the entry point for all operations. It hands out
/// [Collection] handles by name, tracks them in a registry so every caller
/// shares the same underlying state, and owns the backing [Store].
///
/// `Database` uses the PIMPL pattern internally: clones share the same
/// `Arc<DatabaseInner>`, so it is cheap to clone and safe to share across
/// threads. The store is committed and closed when the last clone is
/// dropped, or earlier via an explicit `close()`.
///
/// # Examples
///
/// ```rust,ignore
/// use mongolite::{doc, Database};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let db = Database::builder().open_or_create()?;
///
/// let users = db.collection("users")?;
/// users.insert(doc! { name: "Alice" })?;
///
/// db.close()?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Database {
    inner: Arc<DatabaseInner>,
}

impl Database {
    /// Creates a new [DatabaseBuilder] for configuring and opening a
    /// database.
    pub fn builder() -> DatabaseBuilder {
        DatabaseBuilder::new()
    }

    pub(crate) fn new(store: Store) -> Self {
        Database {
            inner: Arc::new(DatabaseInner {
                store,
                collections: DashMap::new(),
                lock_registry: DashMap::new(),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Gets a collection by name, creating it if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Fails if the database is closed or the name is invalid (empty,
    /// contains `$` or a nul byte, or uses the reserved prefix).
    pub fn collection(&self, name: &str) -> MongoliteResult<Collection> {
        self.inner.collection(name)
    }

    /// Checks whether a collection with the given name exists.
    pub fn has_collection(&self, name: &str) -> MongoliteResult<bool> {
        self.inner.check_opened()?;
        self.inner.store.has_map(name)
    }

    /// Lists all collection names known to the store.
    pub fn list_collection_names(&self) -> MongoliteResult<Vec<String>> {
        self.inner.check_opened()?;
        self.inner.store.map_names()
    }

    /// Drops a collection, removing all documents in it.
    ///
    /// # Errors
    ///
    /// Fails with `CollectionNotFound` if no such collection exists.
    pub fn drop_collection(&self, name: &str) -> MongoliteResult<()> {
        self.inner.drop_collection(name)
    }

    /// Commits any pending changes to persistent storage.
    pub fn commit(&self) -> MongoliteResult<()> {
        self.inner.check_opened()?;
        self.inner.store.commit()
    }

    /// Checks whether the database has been closed.
    pub fn is_closed(&self) -> MongoliteResult<bool> {
        Ok(self.inner.closed.load(Ordering::Relaxed) || self.inner.store.is_closed()?)
    }

    /// Closes the database, committing pending changes and releasing all
    /// collection handles. After this call the instance is unusable.
    pub fn close(&self) -> MongoliteResult<()> {
        self.inner.close()
    }
}

struct DatabaseInner {
    store: Store,
    collections: DashMap<String, Collection>,
    lock_registry: DashMap<String, LockHandle>,
    closed: AtomicBool,
}

impl DatabaseInner {
    fn collection(&self, name: &str) -> MongoliteResult<Collection> {
        validate_collection_name(name)?;
        self.check_opened()?;

        if let Some(existing) = self.collections.get(name) {
            if !existing.is_dropped()? {
                return Ok(existing.clone());
            }
            drop(existing);
            self.collections.remove(name);
        }

        let store_map = self.store.open_map(name)?;
        let lock_handle = self
            .lock_registry
            .entry(name.to_string())
            .or_default()
            .clone();
        let collection = Collection::new(DefaultCollection::new(
            name,
            store_map,
            self.store.clone(),
            lock_handle,
        ));
        self.collections
            .insert(name.to_string(), collection.clone());
        Ok(collection)
    }

    fn drop_collection(&self, name: &str) -> MongoliteResult<()> {
        self.check_opened()?;
        if !self.store.has_map(name)? {
            log::error!("Collection '{}' does not exist", name);
            return Err(MongoliteError::new(
                &format!("Collection '{}' does not exist", name),
                ErrorKind::CollectionNotFound,
            ));
        }
        let collection = self.collection(name)?;
        collection.drop_collection()?;
        self.collections.remove(name);
        Ok(())
    }

    fn check_opened(&self) -> MongoliteResult<()> {
        if self.closed.load(Ordering::Relaxed) || self.store.is_closed()? {
            log::error!("Database is closed");
            return Err(MongoliteError::new(
                "Database is closed",
                ErrorKind::StoreAlreadyClosed,
            ));
        }
        Ok(())
    }

    fn close(&self) -> MongoliteResult<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        // release collection handles even if a close fails along the way
        let mut first_error = None;
        for entry in self.collections.iter() {
            if let Err(err) = entry.value().close() {
                first_error.get_or_insert(err);
            }
        }
        self.collections.clear();
        self.lock_registry.clear();

        if let Err(err) = self.store.commit() {
            first_error.get_or_insert(err);
        }
        if let Err(err) = self.store.close() {
            first_error.get_or_insert(err);
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

// Commits and closes the store when the last Database clone is dropped.
// Implementing Drop on Database itself would close the store as soon as
// any single clone goes away.
impl Drop for DatabaseInner {
    fn drop(&mut self) {
        if !self.closed.load(Ordering::Relaxed) {
            let _ = self.store.commit();
            let _ = self.store.close();
        }
    }
}

fn validate_collection_name(name: &str) -> MongoliteResult<()> {
    if name.is_empty() {
        log::error!("Collection name cannot be empty");
        return Err(MongoliteError::new(
            "Collection name cannot be empty",
            ErrorKind::ValidationError,
        ));
    }

    if name.contains('$') || name.contains('\0') {
        log::error!("Collection name '{}' contains an invalid character", name);
        return Err(MongoliteError::new(
            &format!("Collection name '{}' contains an invalid character", name),
            ErrorKind::ValidationError,
        ));
    }

    if name.starts_with(RESERVED_NAME_PREFIX) {
        log::error!("Collection name '{}' is reserved", name);
        return Err(MongoliteError::new(
            &format!("Collection name '{}' is reserved", name),
            ErrorKind::ValidationError,
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;
    use crate::filter::all;

    // Setup only one time throughout the project.
    // It will take effect during test, project wide
    #[ctor::ctor]
    fn init() {
        colog::init();
    }

    fn set_up() -> Database {
        Database::builder()
            .open_or_create()
            .expect("Failed to open database")
    }

    #[test]
    fn test_collection_lazy_create() {
        let db = set_up();
        assert!(!db.has_collection("users").unwrap());
        let users = db.collection("users").unwrap();
        assert_eq!(users.name(), "users");
        assert!(db.has_collection("users").unwrap());
    }

    #[test]
    fn test_collection_handles_share_state() {
        let db = set_up();
        let first = db.collection("users").unwrap();
        let second = db.collection("users").unwrap();
        first.insert(doc! { name: "Alice" }).unwrap();
        assert_eq!(second.size().unwrap(), 1);
    }

    #[test]
    fn test_invalid_collection_names() {
        let db = set_up();
        for name in ["", "bad$name", "bad\0name", "$mongolite_internal"] {
            let err = db.collection(name).err().unwrap();
            assert_eq!(err.kind(), &ErrorKind::ValidationError, "name: {:?}", name);
        }
    }

    #[test]
    fn test_list_collection_names() {
        let db = set_up();
        db.collection("users").unwrap();
        db.collection("orders").unwrap();
        let names = db.list_collection_names().unwrap();
        assert!(names.contains(&"users".to_string()));
        assert!(names.contains(&"orders".to_string()));
    }

    #[test]
    fn test_drop_collection() {
        let db = set_up();
        let users = db.collection("users").unwrap();
        users.insert(doc! { name: "Alice" }).unwrap();

        db.drop_collection("users").unwrap();
        assert!(!db.has_collection("users").unwrap());

        // the old handle is dead, a fresh one starts empty
        assert!(users.find(all()).is_err());
        let users = db.collection("users").unwrap();
        assert_eq!(users.size().unwrap(), 0);
    }

    #[test]
    fn test_drop_missing_collection() {
        let db = set_up();
        let err = db.drop_collection("ghost").unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::CollectionNotFound);
    }

    #[test]
    fn test_close_releases_everything() {
        let db = set_up();
        db.collection("users").unwrap();
        assert!(!db.is_closed().unwrap());

        db.close().unwrap();
        assert!(db.is_closed().unwrap());
        let err = db.collection("users").err().unwrap();
        assert_eq!(err.kind(), &ErrorKind::StoreAlreadyClosed);
    }

    #[test]
    fn test_close_is_idempotent() {
        let db = set_up();
        db.close().unwrap();
        assert!(db.close().is_ok());
    }

    #[test]
    fn test_commit() {
        let db = set_up();
        db.collection("users").unwrap();
        assert!(db.commit().is_ok());
    }
}
