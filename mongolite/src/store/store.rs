use crate::errors::MongoliteResult;
use crate::store::StoreMap;
use std::ops::Deref;
use std::sync::Arc;

/// Contract between the database and a storage backend.
///
/// # Purpose
///
/// `StoreProvider` is the only boundary to the persistence engine: it hands
/// out named [StoreMap]s (one per collection), tracks which maps exist, and
/// owns durability (`commit`) and the storage handle's lifetime (`close`).
///
/// # Characteristics
///
/// - **Scoped acquisition**: `open_or_create` acquires the storage resource;
///   `close` releases it, including on error paths
/// - **Atomicity**: individual map operations are atomic per document; the
///   store offers no cross-document transaction
/// - **Thread-safe**: providers are shared across collections of one database
pub trait StoreProvider: Send + Sync {
    /// Opens the underlying storage resource, creating it if absent.
    fn open_or_create(&self) -> MongoliteResult<()>;

    /// Returns true once the store has been closed.
    fn is_closed(&self) -> MongoliteResult<bool>;

    /// Returns the names of all maps known to this store.
    fn map_names(&self) -> MongoliteResult<Vec<String>>;

    /// Returns true if a map with the given name exists.
    fn has_map(&self, name: &str) -> MongoliteResult<bool>;

    /// Opens the named map, creating it if absent.
    fn open_map(&self, name: &str) -> MongoliteResult<StoreMap>;

    /// Removes the named map and all its entries.
    fn remove_map(&self, name: &str) -> MongoliteResult<()>;

    /// Flushes pending writes to durable storage.
    fn commit(&self) -> MongoliteResult<()>;

    /// Commits and releases the storage resource.
    fn close(&self) -> MongoliteResult<()>;
}

/// A cheap-to-clone handle over a [StoreProvider].
#[derive(Clone)]
pub struct Store {
    inner: Arc<dyn StoreProvider>,
}

impl Store {
    /// Creates a new store handle from a provider implementation.
    pub fn new<T: StoreProvider + 'static>(inner: T) -> Self {
        Store {
            inner: Arc::new(inner),
        }
    }
}

impl Deref for Store {
    type Target = Arc<dyn StoreProvider>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
