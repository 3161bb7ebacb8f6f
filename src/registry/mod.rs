//! Registry Layer - SQLite-backed alias table
//!
//! System of record is a single SQLite file with:
//! - entries(id, alias, path)
//! - PRAGMA user_version holding the schema version stamp

pub mod entry;
pub mod schema;
pub mod store;

pub use entry::{Entry, canonical_path};
pub use schema::SCHEMA_VERSION;
pub use store::Registry;
