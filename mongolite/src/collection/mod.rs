//! Collections and documents for schemaless data storage.
//!
//! # Documents
//!
//! A [Document] is a key-value map where keys are strings and values are
//! [Value](crate::common::Value) objects. Nested fields are read with dotted
//! paths; filters and update expressions carry such paths as plain keys.
//!
//! ```rust,ignore
//! use mongolite::doc;
//!
//! let doc = doc! { name: "Alice", address: { city: "New York" } };
//! assert!(doc.get("address.city").is_some());
//! ```
//!
//! # Collections
//!
//! A [Collection] manages documents with the same logical type:
//!
//! ```rust,ignore
//! use mongolite::{doc, filter::field};
//!
//! let users = db.collection("users")?;
//! users.insert(doc! { name: "Alice", age: 30 })?;
//! let results = users.find(field("age").eq(30))?;
//! ```
//!
//! # Document IDs
//!
//! Each document has a unique `_id` field holding a non-empty string. If no
//! `_id` is supplied at insertion, a random hex [ObjectId] is generated.
//! Once assigned, `_id` is immutable.

#[allow(clippy::module_inception)]
mod collection;
mod default_collection;
mod document;
mod document_cursor;
mod find_options;
mod object_id;
pub(crate) mod operations;
mod update_options;
mod write_result;

pub(crate) use default_collection::{DefaultCollection, LockHandle};

pub use collection::{Collection, CollectionProvider};
pub use document::{normalize, Document};
pub use document_cursor::DocumentCursor;
pub use find_options::{limit_to, order_by, skip_by, FindOptions, SortOrder};
pub use object_id::ObjectId;
pub use update_options::{insert_if_absent, just_once, UpdateOptions};
pub use write_result::WriteResult;
