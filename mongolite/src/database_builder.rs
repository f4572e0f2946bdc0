use crate::database::Database;
use crate::errors::MongoliteResult;
use crate::store::{InMemoryStore, Store};

/// Builder for configuring and opening a [Database].
///
/// By default the database is backed by the built-in in-memory store. A
/// persistent backend is plugged in through [DatabaseBuilder::load_store].
///
/// # Examples
///
/// ```rust,ignore
/// use mongolite::Database;
///
/// // volatile, in-memory database
/// let db = Database::builder().open_or_create()?;
///
/// // durable database backed by an external store adapter
/// let store = FjallStore::create(FjallConfig::new("/var/data/app.db"))?;
/// let db = Database::builder().load_store(store).open_or_create()?;
/// ```
#[derive(Default)]
pub struct DatabaseBuilder {
    store: Option<Store>,
}

impl DatabaseBuilder {
    pub fn new() -> Self {
        DatabaseBuilder::default()
    }

    /// Sets the storage backend for the database.
    pub fn load_store(mut self, store: Store) -> Self {
        self.store = Some(store);
        self
    }

    /// Opens the database, creating backing storage on first use.
    pub fn open_or_create(self) -> MongoliteResult<Database> {
        let store = match self.store {
            Some(store) => store,
            None => {
                log::debug!("No store configured, using in-memory store");
                InMemoryStore::create()
            }
        };
        store.open_or_create()?;
        Ok(Database::new(store))
    }
}
