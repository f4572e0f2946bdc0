use fjall::{CompressionType, Config, PartitionCreateOptions};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU16, AtomicU64, Ordering};
use std::sync::Arc;

/// Configuration for the Fjall storage backend.
///
/// Uses PIMPL pattern with `Arc<FjallConfigInner>` so a config handle can be
/// cloned into the store and every map cheaply. Settings are read at keyspace
/// open time; changing them afterwards has no effect on an open store.
///
/// Defaults are modest and suit an embedded database:
/// - Block cache: 32 MB
/// - Write buffer: 64 MB
/// - Compression: LZ4
/// - Background fsync: disabled (durability comes from explicit `commit`)
///
/// Usage: create via [FjallConfig::new], point it at a directory with
/// [set_db_path](FjallConfig::set_db_path), then hand it to
/// `FjallStore::create`.
#[derive(Clone, Default)]
pub struct FjallConfig {
    inner: Arc<FjallConfigInner>,
}

impl FjallConfig {
    /// Creates a new configuration with default values.
    #[inline]
    pub fn new() -> FjallConfig {
        FjallConfig {
            inner: Arc::new(FjallConfigInner::new()),
        }
    }

    /// Returns the database directory path.
    #[inline]
    pub fn db_path(&self) -> String {
        self.inner.db_path.read().clone()
    }

    /// Sets the database directory path.
    #[inline]
    pub fn set_db_path(&self, db_path: &str) {
        *self.inner.db_path.write() = db_path.to_string();
    }

    /// Returns whether journal persistence is left to explicit commits.
    #[inline]
    pub fn manual_journal_persist(&self) -> bool {
        self.inner.manual_journal_persist.load(Ordering::Relaxed)
    }

    /// Sets manual journal persistence.
    #[inline]
    pub fn set_manual_journal_persist(&self, v: bool) {
        self.inner.manual_journal_persist.store(v, Ordering::Relaxed);
    }

    /// Returns the background fsync interval in milliseconds, 0 meaning off.
    #[inline]
    pub fn fsync_frequency(&self) -> u16 {
        self.inner.fsync_frequency.load(Ordering::Relaxed)
    }

    /// Sets the background fsync interval in milliseconds. 0 disables it.
    #[inline]
    pub fn set_fsync_frequency(&self, ms: u16) {
        self.inner.fsync_frequency.store(ms, Ordering::Relaxed);
    }

    /// Returns the block cache capacity in bytes.
    #[inline]
    pub fn cache_size(&self) -> u64 {
        self.inner.cache_size.load(Ordering::Relaxed)
    }

    /// Sets the block cache capacity in bytes.
    #[inline]
    pub fn set_cache_size(&self, bytes: u64) {
        self.inner.cache_size.store(bytes, Ordering::Relaxed);
    }

    /// Returns the maximum total write buffer size in bytes.
    #[inline]
    pub fn max_write_buffer_size(&self) -> u64 {
        self.inner.max_write_buffer_size.load(Ordering::Relaxed)
    }

    /// Sets the maximum total write buffer size in bytes.
    #[inline]
    pub fn set_max_write_buffer_size(&self, bytes: u64) {
        self.inner.max_write_buffer_size.store(bytes, Ordering::Relaxed);
    }

    /// Builds a Fjall keyspace configuration from this config.
    #[inline]
    pub(crate) fn keyspace_config(&self) -> Config {
        let mut config = Config::new(self.db_path());
        config = config
            .manual_journal_persist(self.manual_journal_persist())
            .cache_size(self.cache_size())
            .max_write_buffer_size(self.max_write_buffer_size());

        if self.fsync_frequency() > 0 {
            config = config.fsync_ms(Some(self.fsync_frequency()));
        }
        config
    }

    /// Builds partition creation options from this config.
    #[inline]
    pub(crate) fn partition_config(&self) -> PartitionCreateOptions {
        PartitionCreateOptions::default().compression(CompressionType::Lz4)
    }
}

struct FjallConfigInner {
    db_path: RwLock<String>,
    manual_journal_persist: AtomicBool,
    fsync_frequency: AtomicU16,
    cache_size: AtomicU64,
    max_write_buffer_size: AtomicU64,
}

impl FjallConfigInner {
    const DEFAULT_CACHE_MB: u64 = 32;
    const DEFAULT_WRITE_BUFFER_MB: u64 = 64;

    fn new() -> FjallConfigInner {
        FjallConfigInner {
            db_path: RwLock::new(String::new()),
            manual_journal_persist: AtomicBool::new(false),
            fsync_frequency: AtomicU16::new(0),
            cache_size: AtomicU64::new(Self::DEFAULT_CACHE_MB * 1_024 * 1_024),
            max_write_buffer_size: AtomicU64::new(Self::DEFAULT_WRITE_BUFFER_MB * 1_024 * 1_024),
        }
    }
}

impl Default for FjallConfigInner {
    fn default() -> Self {
        FjallConfigInner::new()
    }
}
