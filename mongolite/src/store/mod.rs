//! Storage backend abstractions and the built-in in-memory store.

mod map;
mod memory;
#[allow(clippy::module_inception)]
mod store;

pub use map::{EntryIterator, EntryIteratorProvider, StoreMap, StoreMapProvider};
pub use memory::InMemoryStore;
pub use store::{Store, StoreProvider};
