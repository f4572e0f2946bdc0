//! Persistent storage adapter for mongolite backed by the
//! [Fjall](https://github.com/fjall-rs/fjall) LSM engine.
//!
//! Every store map lives in its own keyspace partition, keyed by document id
//! and holding bincode-encoded documents. `commit` flushes the journal with
//! `PersistMode::SyncAll`, so committed data survives process crashes.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use mongolite::Database;
//! use mongolite_fjall_adapter::{FjallConfig, FjallStore};
//!
//! let config = FjallConfig::new();
//! config.set_db_path("/tmp/my-db");
//!
//! let db = Database::builder()
//!     .load_store(FjallStore::create(config))
//!     .open_or_create()?;
//! ```

mod codec;
mod config;
mod map;
mod store;

pub use codec::{FjallCodecError, FjallCodecResult};
pub use config::FjallConfig;
pub use map::FjallMap;
pub use store::FjallStore;
