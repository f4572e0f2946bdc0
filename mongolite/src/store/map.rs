use crate::collection::Document;
use crate::errors::MongoliteResult;
use std::ops::Deref;
use std::sync::Arc;

/// Contract for a single named document map inside a store.
///
/// Keys are document ids; values are whole documents. Every operation is an
/// atomic single-document read or write against durable storage.
pub trait StoreMapProvider: Send + Sync {
    /// Returns the name of this map.
    fn name(&self) -> MongoliteResult<String>;

    /// Returns the document stored under the given id, if any.
    fn get(&self, key: &str) -> MongoliteResult<Option<Document>>;

    /// Atomically upserts the document under the given id.
    fn put(&self, key: &str, value: Document) -> MongoliteResult<()>;

    /// Inserts only if the id is vacant; returns the existing document
    /// otherwise, leaving it untouched.
    fn put_if_absent(&self, key: &str, value: Document) -> MongoliteResult<Option<Document>>;

    /// Removes and returns the document under the given id, if any.
    fn remove(&self, key: &str) -> MongoliteResult<Option<Document>>;

    /// Returns true if a document is stored under the given id.
    fn contains_key(&self, key: &str) -> MongoliteResult<bool>;

    /// Returns the number of stored documents.
    fn size(&self) -> MongoliteResult<u64>;

    /// Returns true if no document is stored.
    fn is_empty(&self) -> MongoliteResult<bool>;

    /// Removes every stored document.
    fn clear(&self) -> MongoliteResult<()>;

    /// Returns an iterator over all `(id, document)` entries, in stable key
    /// order where the backend provides one.
    fn entries(&self) -> MongoliteResult<EntryIterator>;

    /// Returns true once this map has been closed.
    fn is_closed(&self) -> MongoliteResult<bool>;

    /// Closes this map.
    fn close(&self) -> MongoliteResult<()>;
}

/// A cheap-to-clone handle over a [StoreMapProvider].
#[derive(Clone)]
pub struct StoreMap {
    inner: Arc<dyn StoreMapProvider>,
}

impl StoreMap {
    /// Creates a new map handle from a provider implementation.
    pub fn new<T: StoreMapProvider + 'static>(inner: T) -> Self {
        StoreMap {
            inner: Arc::new(inner),
        }
    }
}

impl Deref for StoreMap {
    type Target = Arc<dyn StoreMapProvider>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

/// Trait for implementing entry iteration over `(id, Document)` pairs.
///
/// Implementations are cursor-style: they retain their position between calls
/// so a scan observes each entry at most once even while the underlying map
/// accepts concurrent writes.
pub trait EntryIteratorProvider: Send {
    /// Get the next entry
    fn next_entry(&mut self) -> Option<MongoliteResult<(String, Document)>>;
}

/// A facade over any [EntryIteratorProvider] exposing the standard `Iterator`
/// interface. A mid-scan storage failure surfaces as an `Err` item; callers
/// abort the scan at the first error.
pub struct EntryIterator {
    provider: Box<dyn EntryIteratorProvider>,
}

impl EntryIterator {
    /// Creates a new entry iterator wrapping the given provider.
    pub fn new<T: EntryIteratorProvider + 'static>(provider: T) -> Self {
        EntryIterator {
            provider: Box::new(provider),
        }
    }
}

impl Iterator for EntryIterator {
    type Item = MongoliteResult<(String, Document)>;

    fn next(&mut self) -> Option<Self::Item> {
        self.provider.next_entry()
    }
}
