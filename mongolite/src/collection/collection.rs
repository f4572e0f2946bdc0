use std::ops::Deref;
use std::sync::Arc;

use super::{Document, DocumentCursor, FindOptions, UpdateOptions, WriteResult};
use crate::common::Value;
use crate::errors::MongoliteResult;
use crate::filter::Filter;

/// Trait defining the interface for a document collection.
///
/// A collection is a named container of documents, each uniquely identified
/// by its `_id` field. Implementations handle filtering, update application,
/// and persistence through the backing store.
pub trait CollectionProvider: Send + Sync {
    /// Inserts a single document.
    ///
    /// If the document has no `_id` field, a unique [ObjectId](super::ObjectId)
    /// is generated for it. Inserting a duplicate `_id` fails with
    /// `UniqueConstraintViolation`.
    fn insert(&self, document: Document) -> MongoliteResult<WriteResult>;

    /// Inserts multiple documents, stopping at the first failure.
    fn insert_many(&self, documents: Vec<Document>) -> MongoliteResult<WriteResult>;

    /// Finds documents matching a filter.
    ///
    /// Returns a [DocumentCursor] for iterating over results.
    fn find(&self, filter: Filter) -> MongoliteResult<DocumentCursor>;

    /// Finds documents matching a filter with sort, pagination, and
    /// projection options.
    fn find_with_options(
        &self,
        filter: Filter,
        find_options: &FindOptions,
    ) -> MongoliteResult<DocumentCursor>;

    /// Returns the first document matching a filter, if any.
    fn find_one(&self, filter: Filter) -> MongoliteResult<Option<Document>>;

    /// Updates every document matching a filter with the given update
    /// expression document. Returns the ids of the documents modified.
    ///
    /// Use `update_with_options()` to restrict the scope or to upsert.
    fn update(&self, filter: Filter, update: &Document) -> MongoliteResult<WriteResult> {
        self.update_with_options(filter, update, &UpdateOptions::default())
    }

    /// Updates documents matching a filter, honoring the scope and upsert
    /// flags in `update_options`.
    fn update_with_options(
        &self,
        filter: Filter,
        update: &Document,
        update_options: &UpdateOptions,
    ) -> MongoliteResult<WriteResult>;

    /// Updates at most one document matching a filter.
    fn update_one(&self, filter: Filter, update: &Document) -> MongoliteResult<WriteResult> {
        self.update_with_options(filter, update, &UpdateOptions::new(false, true))
    }

    /// Replaces the first document matching a filter with a whole new
    /// document.
    ///
    /// The replacement must not contain operator keys, and its `_id` (if
    /// present) must match the matched document's. With `insert_if_absent`
    /// the replacement is inserted when nothing matches.
    fn replace_one(
        &self,
        filter: Filter,
        replacement: &Document,
        insert_if_absent: bool,
    ) -> MongoliteResult<WriteResult>;

    /// Removes documents matching a filter.
    ///
    /// With `just_once`, only the first match is removed.
    fn remove(&self, filter: Filter, just_once: bool) -> MongoliteResult<WriteResult>;

    /// Returns the distinct values of a field across documents matching a
    /// filter, in first-seen order. Array values contribute each element.
    fn distinct(&self, field: &str, filter: Filter) -> MongoliteResult<Vec<Value>>;

    /// Counts documents matching a filter.
    fn count(&self, filter: Filter) -> MongoliteResult<u64>;

    /// Returns the total number of documents.
    fn size(&self) -> MongoliteResult<u64>;

    /// Returns the name of this collection.
    fn name(&self) -> String;

    /// Removes every document, keeping the collection itself.
    fn clear(&self) -> MongoliteResult<()>;

    /// Drops this collection and its backing map. Further operations on
    /// this handle fail with `InvalidOperation`.
    fn drop_collection(&self) -> MongoliteResult<()>;

    /// Returns true once this collection has been dropped.
    fn is_dropped(&self) -> MongoliteResult<bool>;

    /// Returns true while this collection and its store are usable.
    fn is_open(&self) -> MongoliteResult<bool>;

    /// Closes this collection handle without dropping its data.
    fn close(&self) -> MongoliteResult<()>;
}

/// A document collection in a Mongolite database.
///
/// `Collection` provides access to document operations on a named
/// collection. Documents are uniquely identified by their `_id` field and
/// queried with Mongo-style filters.
///
/// # Examples
///
/// ```rust,ignore
/// use mongolite::{doc, Database};
/// use mongolite::filter::field;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let db = Database::builder().open_or_create()?;
/// let users = db.collection("users")?;
///
/// users.insert(doc! { name: "Alice", age: 30 })?;
///
/// let mut cursor = users.find(field("age").eq(30))?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Collection {
    inner: Arc<dyn CollectionProvider>,
}

impl Collection {
    /// Creates a new `Collection` from a provider implementation.
    pub fn new<T: CollectionProvider + 'static>(inner: T) -> Self {
        Collection {
            inner: Arc::new(inner),
        }
    }
}

impl Deref for Collection {
    type Target = Arc<dyn CollectionProvider>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
