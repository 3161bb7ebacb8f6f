//! SQLite store handle and registry operations

use std::io;
use std::path::{Path, PathBuf};

use rusqlite::{Connection, ErrorCode, OpenFlags, Params, params};

use super::entry::{Entry, canonical_path};
use super::schema::{self, ALIAS_COLUMN, PATH_COLUMN, SCHEMA_VERSION};
use crate::{Error, Result};

/// Live handle on the registry database.
///
/// Owns the connection; it is released by [`Registry::close`] or on drop,
/// whichever comes first. The handle is not `Sync`, so sharing it between
/// threads needs external locking.
pub struct Registry {
    conn: Connection,
    path: PathBuf,
}

impl Registry {
    /// Open the store at `path`, creating and stamping it if absent.
    ///
    /// An existing store is opened read-write and refused unless its
    /// version stamp equals [`SCHEMA_VERSION`].
    pub fn open(path: &Path) -> Result<Self> {
        let conn = match std::fs::metadata(path) {
            Ok(_) => Self::open_existing(path)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => match schema::create_and_stamp(path)? {
                Some(conn) => conn,
                None => Self::open_existing(path)?,
            },
            Err(e) => {
                return Err(Error::StoreUnavailable {
                    path: path.to_path_buf(),
                    source: Box::new(e),
                });
            }
        };

        tracing::debug!(path = %path.display(), "store opened");
        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }

    /// Open an in-memory store (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::initialize(&conn)?;
        Ok(Self {
            conn,
            path: PathBuf::from(":memory:"),
        })
    }

    fn open_existing(path: &Path) -> Result<Connection> {
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(path, flags).map_err(|e| Error::StoreUnavailable {
            path: path.to_path_buf(),
            source: Box::new(e),
        })?;

        let found = schema::check_version(&conn, path)?;
        if found != SCHEMA_VERSION {
            tracing::warn!(
                path = %path.display(),
                found,
                expected = SCHEMA_VERSION,
                "refusing store with foreign schema version"
            );
            let _ = conn.close();
            return Err(Error::SchemaMismatch {
                path: path.to_path_buf(),
                found,
                expected: SCHEMA_VERSION,
            });
        }

        Ok(conn)
    }

    /// Release the connection.
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| Error::Store(e))
    }

    /// Location of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Re-read the version stamp of the open store
    pub fn schema_version(&self) -> Result<u32> {
        schema::check_version(&self.conn, &self.path)
    }

    // ========== Registry Operations ==========

    /// Track `raw_path` under `alias`.
    ///
    /// The path is canonicalized first, so it must exist. Both alias and
    /// canonical path must be unused.
    pub fn insert(&self, alias: &str, raw_path: impl AsRef<Path>) -> Result<()> {
        let path = canonical_path(raw_path.as_ref())?;
        tracing::debug!(alias, path = %path, "inserting entry");

        match self.conn.execute(
            "INSERT INTO entries (alias, path) VALUES (?1, ?2)",
            params![alias, path],
        ) {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, detail))
                if err.code == ErrorCode::ConstraintViolation =>
            {
                Err(Error::ConstraintViolation {
                    alias: alias.to_string(),
                    path,
                    detail: detail.unwrap_or_else(|| err.to_string()),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Stop tracking `alias`. Removing an unknown alias is not an error.
    pub fn remove(&self, alias: &str) -> Result<()> {
        let removed = self
            .conn
            .execute("DELETE FROM entries WHERE alias = ?1", [alias])?;
        tracing::debug!(alias, removed, "removed entry");
        Ok(())
    }

    // ========== Row Iteration ==========

    /// Visit every entry in alias order.
    ///
    /// `handler` receives `(column, value)` for the alias column and then the
    /// path column of each row. The first handler error ends the iteration
    /// and is returned.
    pub fn for_each<F>(&self, handler: F) -> Result<()>
    where
        F: FnMut(&str, &str) -> Result<()>,
    {
        self.visit(
            "SELECT alias, path FROM entries ORDER BY alias ASC",
            [],
            handler,
        )
    }

    /// Visit the path stored for `alias`.
    ///
    /// Zero invocations means the alias is not tracked.
    pub fn for_alias<F>(&self, alias: &str, handler: F) -> Result<()>
    where
        F: FnMut(&str, &str) -> Result<()>,
    {
        self.visit("SELECT path FROM entries WHERE alias = ?1", [alias], handler)
    }

    fn visit<P, F>(&self, sql: &str, params: P, mut handler: F) -> Result<()>
    where
        P: Params,
        F: FnMut(&str, &str) -> Result<()>,
    {
        let mut stmt = self.conn.prepare(sql)?;
        let columns: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(str::to_owned)
            .collect();

        let mut rows = stmt.query(params)?;
        while let Some(row) = rows.next()? {
            for (idx, column) in columns.iter().enumerate() {
                let value: String = row.get(idx)?;
                if let Err(e) = handler(column.as_str(), &value) {
                    tracing::debug!(column = %column, error = %e, "row handler failed, stopping");
                    return Err(e);
                }
            }
        }

        Ok(())
    }

    /// Collect all entries in alias order
    pub fn entries(&self) -> Result<Vec<Entry>> {
        let mut entries = Vec::new();
        let mut alias: Option<String> = None;

        self.for_each(|column, value| {
            match column {
                ALIAS_COLUMN => alias = Some(value.to_string()),
                PATH_COLUMN => {
                    let alias = alias
                        .take()
                        .ok_or_else(|| Error::Handler("path column without alias".to_string()))?;
                    entries.push(Entry {
                        alias,
                        path: value.to_string(),
                    });
                }
                other => return Err(Error::Handler(format!("unexpected column '{other}'"))),
            }
            Ok(())
        })?;

        Ok(entries)
    }
}
