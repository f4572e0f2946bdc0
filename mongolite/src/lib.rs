//! # Mongolite - Embedded Document Store
//!
//! Mongolite is a lightweight embedded document database written in Rust.
//! It stores schemaless JSON-like documents in named collections and
//! queries them with Mongo-style filter and update expressions.
//!
//! ## Key Features
//!
//! - **Embedded**: No separate server process required
//! - **Schemaless**: Documents are dynamically typed and arbitrarily nested
//! - **Mongo-style Querying**: `$eq`, `$gt`, `$in`, `$regex`, `$elemMatch`,
//!   `$and`/`$or`/`$not` and friends, plus a fluent filter API
//! - **Rich Updates**: `$set`, `$unset`, `$inc`, `$push`, `$pull`, `$rename`,
//!   upserts with `$setOnInsert`
//! - **Multiple Storage Backends**: built-in in-memory store and pluggable
//!   store providers (see the `mongolite-fjall-adapter` crate)
//! - **Clean API**: PIMPL pattern provides a stable, encapsulated interface
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use mongolite::{doc, Database};
//! use mongolite::filter::field;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Create or open a database
//! let db = Database::builder().open_or_create()?;
//!
//! // Get or create a collection
//! let users = db.collection("users")?;
//!
//! // Insert documents
//! users.insert(doc! { name: "Alice", age: 25 })?;
//! users.insert(doc! { name: "Bob", age: 30 })?;
//!
//! // Find documents using filters
//! let mut cursor = users.find(field("age").gt(26))?;
//! for document in &mut cursor {
//!     println!("{}", document?);
//! }
//!
//! // Update documents
//! users.update(field("name").eq("Alice"), &doc! { "$set": { age: 26 } })?;
//!
//! // Close the database
//! db.close()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Design Pattern
//!
//! Mongolite uses the **PIMPL (Pointer To IMPLementation)** design pattern:
//! public handles like [Database], [Collection], and [Store](store::Store)
//! are cheap-to-clone wrappers over `Arc<dyn Provider>` trait objects. All
//! clones share the same underlying state, and custom providers can be
//! plugged in at the store boundary.
//!
//! ## Module Organization
//!
//! - [`collection`] - Document collections, documents, and cursors
//! - [`common`] - The dynamic [Value](common::Value) type and shared utilities
//! - [`errors`] - Error types and result definitions
//! - [`filter`] - Query filters, the filter parser, and the fluent filter API
//! - [`store`] - Storage provider traits and the in-memory store
//! - [`update`] - Update expression parsing and application

pub mod collection;
pub mod common;
pub mod errors;
pub mod filter;
pub mod store;
pub mod update;

mod database;
mod database_builder;

pub use collection::{Collection, Document, DocumentCursor, FindOptions, ObjectId, SortOrder, UpdateOptions, WriteResult};
pub use common::Value;
pub use database::Database;
pub use database_builder::DatabaseBuilder;
