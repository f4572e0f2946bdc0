use crate::codec::{decode_key, to_store_error};
use crate::config::FjallConfig;
use crate::map::FjallMap;
use dashmap::DashMap;
use fjall::{Keyspace, PersistMode};
use mongolite::common::constants::COLLECTION_CATALOG;
use mongolite::errors::{ErrorKind, MongoliteError, MongoliteResult};
use mongolite::store::{Store, StoreMap, StoreMapProvider, StoreProvider};
use std::fmt::Write as _;
use std::ops::RangeFull;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Persistent store backed by the Fjall LSM engine.
///
/// One `fjall::Keyspace` holds every map of the database, each map in its own
/// partition. A catalog partition records which map names exist, so
/// `map_names` reports original names even though partition names are escaped
/// to Fjall's restricted character set.
///
/// Uses PIMPL pattern with `Arc<FjallStoreInner>`; the keyspace is opened
/// lazily by `open_or_create` and shared by every map handle.
///
/// Usage:
///
/// ```rust,ignore
/// let config = FjallConfig::new();
/// config.set_db_path("/tmp/my-db");
/// let db = Database::builder()
///     .load_store(FjallStore::create(config))
///     .open_or_create()?;
/// ```
#[derive(Clone)]
pub struct FjallStore {
    inner: Arc<FjallStoreInner>,
}

impl FjallStore {
    /// Creates a Fjall-backed store wrapped in a [Store] handle.
    ///
    /// The keyspace is not touched until `open_or_create` runs.
    pub fn create(config: FjallConfig) -> Store {
        Store::new(FjallStore {
            inner: Arc::new(FjallStoreInner {
                keyspace: OnceLock::new(),
                closed: AtomicBool::new(false),
                config,
                map_registry: DashMap::new(),
            }),
        })
    }

    /// Escapes a map name into a valid Fjall partition name.
    ///
    /// Fjall partition names only allow `a-zA-Z0-9_-.#$`. Any other byte is
    /// written as `#` followed by two hex digits, and a literal `#` is
    /// escaped the same way so the encoding stays reversible.
    pub(crate) fn encode_name(name: &str) -> String {
        fn is_safe(byte: u8) -> bool {
            byte.is_ascii_alphanumeric() || matches!(byte, b'_' | b'-' | b'.' | b'$')
        }

        if name.bytes().all(is_safe) {
            return name.to_string();
        }

        let mut encoded = String::with_capacity(name.len() + 4);
        for byte in name.bytes() {
            if is_safe(byte) {
                encoded.push(byte as char);
            } else {
                // Infallible for String, ignore the fmt result.
                let _ = write!(encoded, "#{:02x}", byte);
            }
        }
        encoded
    }
}

struct FjallStoreInner {
    keyspace: OnceLock<Keyspace>,
    closed: AtomicBool,
    config: FjallConfig,
    map_registry: DashMap<String, FjallMap>,
}

impl FjallStoreInner {
    fn check_opened(&self) -> MongoliteResult<()> {
        if self.closed.load(Ordering::Relaxed) {
            log::error!("Operation on closed Fjall store");
            return Err(MongoliteError::new(
                "Store is closed",
                ErrorKind::StoreAlreadyClosed,
            ));
        }
        Ok(())
    }

    fn keyspace(&self) -> MongoliteResult<&Keyspace> {
        self.keyspace.get().ok_or_else(|| {
            log::error!("Keyspace is not initialized");
            MongoliteError::new(
                "Keyspace is not initialized",
                ErrorKind::StoreNotInitialized,
            )
        })
    }

    fn catalog(&self, keyspace: &Keyspace) -> MongoliteResult<fjall::Partition> {
        keyspace
            .open_partition(COLLECTION_CATALOG, self.config.partition_config())
            .map_err(to_store_error)
    }

    fn is_partition_deleted_error(err_msg: &str) -> bool {
        err_msg.contains("not found")
            || err_msg.contains("deleted")
            || err_msg.contains("PartitionDeleted")
    }
}

impl StoreProvider for FjallStore {
    fn open_or_create(&self) -> MongoliteResult<()> {
        self.inner.check_opened()?;
        let config = self.inner.config.keyspace_config();
        match Keyspace::open(config) {
            Ok(keyspace) => {
                self.inner.keyspace.get_or_init(|| keyspace);
                Ok(())
            }
            Err(err) => {
                log::error!("Failed to open or create keyspace: {}", err);
                Err(to_store_error(err))
            }
        }
    }

    fn is_closed(&self) -> MongoliteResult<bool> {
        Ok(self.inner.closed.load(Ordering::Relaxed))
    }

    fn map_names(&self) -> MongoliteResult<Vec<String>> {
        self.inner.check_opened()?;
        let Some(keyspace) = self.inner.keyspace.get() else {
            return Ok(Vec::new());
        };
        let catalog = self.inner.catalog(keyspace)?;
        let mut names = Vec::new();
        for result in catalog.range::<Vec<u8>, RangeFull>(..) {
            match result {
                Ok((key, _)) => names.push(decode_key(&key)?),
                Err(err) => {
                    log::error!("Failed to scan map catalog: {}", err);
                    return Err(to_store_error(err));
                }
            }
        }
        Ok(names)
    }

    fn has_map(&self, name: &str) -> MongoliteResult<bool> {
        self.inner.check_opened()?;
        if let Some(keyspace) = self.inner.keyspace.get() {
            Ok(keyspace.partition_exists(&FjallStore::encode_name(name)))
        } else {
            Ok(false)
        }
    }

    fn open_map(&self, name: &str) -> MongoliteResult<StoreMap> {
        self.inner.check_opened()?;

        let mut stale = false;
        if let Some(map) = self.inner.map_registry.get(name) {
            if map.is_closed()? {
                // can't remove the entry while holding the shard guard
                stale = true;
            } else {
                return Ok(StoreMap::new(map.clone()));
            }
        }
        if stale {
            self.inner.map_registry.remove(name);
        }

        let keyspace = self.inner.keyspace()?;
        let encoded = FjallStore::encode_name(name);
        match keyspace.open_partition(&encoded, self.inner.config.partition_config()) {
            Ok(partition) => {
                if name != COLLECTION_CATALOG {
                    let catalog = self.inner.catalog(keyspace)?;
                    catalog
                        .insert(name.as_bytes(), "")
                        .map_err(to_store_error)?;
                }
                let map = FjallMap::new(name.to_string(), partition);
                self.inner
                    .map_registry
                    .insert(name.to_string(), map.clone());
                Ok(StoreMap::new(map))
            }
            Err(err) => {
                if FjallStoreInner::is_partition_deleted_error(&err.to_string()) {
                    self.inner.map_registry.remove(name);
                }
                log::error!("Failed to open partition '{}': {}", encoded, err);
                Err(to_store_error(err))
            }
        }
    }

    fn remove_map(&self, name: &str) -> MongoliteResult<()> {
        self.inner.check_opened()?;

        // drop any cached handle first so its partition reference is released
        if let Some((_, map)) = self.inner.map_registry.remove(name) {
            map.close()?;
        }

        let Some(keyspace) = self.inner.keyspace.get() else {
            return Ok(());
        };

        let encoded = FjallStore::encode_name(name);
        if keyspace.partition_exists(&encoded) {
            match keyspace.open_partition(&encoded, self.inner.config.partition_config()) {
                Ok(partition) => {
                    if let Err(err) = keyspace.delete_partition(partition) {
                        log::error!("Failed to delete partition '{}': {}", encoded, err);
                        return Err(to_store_error(err));
                    }
                }
                Err(err) => {
                    // a concurrent delete is fine, anything else is not
                    if !FjallStoreInner::is_partition_deleted_error(&err.to_string()) {
                        log::error!("Failed to open partition '{}' for removal: {}", encoded, err);
                        return Err(to_store_error(err));
                    }
                }
            }
        }

        let catalog = self.inner.catalog(keyspace)?;
        catalog.remove(name.as_bytes()).map_err(to_store_error)?;
        Ok(())
    }

    fn commit(&self) -> MongoliteResult<()> {
        self.inner.check_opened()?;
        if let Some(keyspace) = self.inner.keyspace.get() {
            if let Err(err) = keyspace.persist(PersistMode::SyncAll) {
                log::error!("Failed to persist keyspace: {}", err);
                return Err(to_store_error(err));
            }
        }
        Ok(())
    }

    fn close(&self) -> MongoliteResult<()> {
        if self.inner.closed.swap(true, Ordering::Relaxed) {
            return Ok(());
        }
        for entry in self.inner.map_registry.iter() {
            entry.value().close()?;
        }
        self.inner.map_registry.clear();
        if let Some(keyspace) = self.inner.keyspace.get() {
            if let Err(err) = keyspace.persist(PersistMode::SyncAll) {
                log::error!("Failed to persist keyspace on close: {}", err);
                return Err(to_store_error(err));
            }
        }
        Ok(())
    }
}

impl Drop for FjallStoreInner {
    fn drop(&mut self) {
        // last handle gone without close(), flush whatever is buffered
        if !self.closed.load(Ordering::Relaxed) {
            if let Some(keyspace) = self.keyspace.get() {
                if let Err(err) = keyspace.persist(PersistMode::SyncAll) {
                    log::error!("Failed to persist keyspace during drop: {}", err);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::TestDir;
    use mongolite::doc;

    fn set_up(dir: &TestDir) -> Store {
        let config = FjallConfig::new();
        config.set_db_path(&dir.path());
        let store = FjallStore::create(config);
        store.open_or_create().unwrap();
        store
    }

    #[test]
    fn test_encode_name_passthrough_for_safe_names() {
        assert_eq!(FjallStore::encode_name("users"), "users");
        assert_eq!(FjallStore::encode_name("users-2.bak_$"), "users-2.bak_$");
        assert_eq!(FjallStore::encode_name(COLLECTION_CATALOG), COLLECTION_CATALOG);
    }

    #[test]
    fn test_encode_name_escapes_unsafe_bytes() {
        assert_eq!(FjallStore::encode_name("a|b"), "a#7cb");
        assert_eq!(FjallStore::encode_name("a b"), "a#20b");
        // the escape character itself is escaped
        assert_eq!(FjallStore::encode_name("a#b"), "a#23b");
        // distinct names never collide after encoding
        assert_ne!(
            FjallStore::encode_name("a#7cb"),
            FjallStore::encode_name("a|b")
        );
    }

    #[test]
    fn test_store_lifecycle() {
        let dir = TestDir::new();
        let store = set_up(&dir);

        assert!(!store.is_closed().unwrap());
        assert!(!store.has_map("users").unwrap());
        assert!(store.map_names().unwrap().is_empty());

        let map = store.open_map("users").unwrap();
        map.put("1", doc! { n: "a" }).unwrap();
        assert!(store.has_map("users").unwrap());
        assert_eq!(store.map_names().unwrap(), vec!["users"]);

        // reopening returns the cached handle over the same partition
        let again = store.open_map("users").unwrap();
        assert_eq!(again.size().unwrap(), 1);

        store.remove_map("users").unwrap();
        assert!(!store.has_map("users").unwrap());
        assert!(store.map_names().unwrap().is_empty());

        store.close().unwrap();
        assert!(store.is_closed().unwrap());
        let err = store.open_map("users").err().unwrap();
        assert_eq!(err.kind(), &ErrorKind::StoreAlreadyClosed);
    }

    #[test]
    fn test_open_map_before_open_or_create_fails() {
        let dir = TestDir::new();
        let config = FjallConfig::new();
        config.set_db_path(&dir.path());
        let store = FjallStore::create(config);

        let err = store.open_map("users").err().unwrap();
        assert_eq!(err.kind(), &ErrorKind::StoreNotInitialized);
        assert!(!store.has_map("users").unwrap());
        store.close().unwrap();
    }

    #[test]
    fn test_closed_cached_map_is_reopened() {
        let dir = TestDir::new();
        let store = set_up(&dir);

        let map = store.open_map("users").unwrap();
        map.put("1", doc! { n: "a" }).unwrap();
        map.close().unwrap();

        let reopened = store.open_map("users").unwrap();
        assert!(!reopened.is_closed().unwrap());
        assert_eq!(reopened.get("1").unwrap(), Some(doc! { n: "a" }));
        store.close().unwrap();
    }

    #[test]
    fn test_map_with_unsafe_name_round_trips() {
        let dir = TestDir::new();
        let store = set_up(&dir);

        let name = "per user|stats";
        let map = store.open_map(name).unwrap();
        map.put("1", doc! { v: 1 }).unwrap();
        assert!(store.has_map(name).unwrap());
        assert_eq!(store.map_names().unwrap(), vec![name]);
        assert_eq!(map.name().unwrap(), name);

        store.remove_map(name).unwrap();
        assert!(!store.has_map(name).unwrap());
        store.close().unwrap();
    }

    #[test]
    fn test_remove_missing_map_is_noop() {
        let dir = TestDir::new();
        let store = set_up(&dir);
        store.remove_map("absent").unwrap();
        store.close().unwrap();
    }

    #[test]
    fn test_commit_and_close_idempotent() {
        let dir = TestDir::new();
        let store = set_up(&dir);

        let map = store.open_map("users").unwrap();
        map.put("1", doc! { n: "a" }).unwrap();
        store.commit().unwrap();

        store.close().unwrap();
        store.close().unwrap();
        let err = store.commit().unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::StoreAlreadyClosed);
    }
}
