//! # watchgit - a registry of tracked git repositories
//!
//! Maps short, user-chosen aliases to canonical repository paths.
//!
//! watchgit provides:
//! - A SQLite-backed registry with a stamped schema version
//! - Parameterized insert/remove of entries
//! - A per-column row visitor for listing and alias resolution
//! - Store-location configuration and terminal output helpers for the CLI

pub mod config;
pub mod registry;
pub mod ui;

use std::path::PathBuf;

// Re-exports for convenient access
pub use registry::{Entry, Registry, SCHEMA_VERSION};

/// Result type alias for watchgit operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for registry operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The backing file could not be opened or probed.
    #[error("Store unavailable at {}: {source}", .path.display())]
    StoreUnavailable {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// First-time creation failed; nothing was left at the store path.
    #[error("Failed to create store at {}: {source}", .path.display())]
    CreateFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// The store carries a version stamp other than [`SCHEMA_VERSION`].
    #[error(
        "Corrupt database or old schema (found version {found}, expected {expected}). DB: {}",
        .path.display()
    )]
    SchemaMismatch {
        path: PathBuf,
        found: u32,
        expected: u32,
    },

    /// The version stamp is missing, malformed or not a single value.
    #[error("Unreadable schema version ({reason}). DB: {}", .path.display())]
    VersionUnreadable { path: PathBuf, reason: String },

    /// A supplied path could not be canonicalized.
    #[error("Cannot resolve path {}: {source}", .path.display())]
    PathResolution {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Alias or path uniqueness was broken on insert.
    #[error("'{alias}' -> {path} conflicts with an existing entry: {detail}")]
    ConstraintViolation {
        alias: String,
        path: String,
        detail: String,
    },

    /// Any other `SQLite` failure, including lock contention.
    #[error("Storage error: {0}")]
    Store(#[from] rusqlite::Error),

    /// Raised by a row handler to abort iteration.
    #[error("Handler error: {0}")]
    Handler(String),
}

impl Error {
    /// Process exit code for this error kind. Every kind gets its own code.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::StoreUnavailable { .. } => 2,
            Error::CreateFailed { .. } => 3,
            Error::SchemaMismatch { .. } => 4,
            Error::VersionUnreadable { .. } => 5,
            Error::PathResolution { .. } => 6,
            Error::ConstraintViolation { .. } => 7,
            Error::Store(_) => 8,
            Error::Handler(_) => 9,
        }
    }
}
