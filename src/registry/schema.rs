//! Database schema definitions and version stamping

use std::path::Path;

use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};

use crate::{Error, Result};

/// The only schema version this build understands
pub const SCHEMA_VERSION: u32 = 1;

/// Metadata slot holding the version stamp
pub const VERSION_KEY: &str = "user_version";

pub const ALIAS_COLUMN: &str = "alias";
pub const PATH_COLUMN: &str = "path";

/// SQL to create the entries table
pub const CREATE_ENTRIES_TABLE: &str = r#"
CREATE TABLE entries (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    alias TEXT NOT NULL UNIQUE,
    path TEXT NOT NULL UNIQUE
)
"#;

/// All schema creation statements
pub fn all_schema_statements() -> Vec<&'static str> {
    vec![CREATE_ENTRIES_TABLE]
}

/// Write the schema and version stamp onto an empty connection.
pub fn initialize(conn: &Connection) -> rusqlite::Result<()> {
    write_schema(conn, &all_schema_statements())
}

/// Create a new store at `path`, write the schema and stamp it.
///
/// The store is built in a temporary file next to `path` and only linked
/// into place once schema and stamp are committed, so no other process
/// ever sees a half-created store. Returns `Ok(None)` when another process
/// published a store at `path` first; the caller opens that one instead.
/// On failure nothing is left behind and an existing file is never touched.
pub fn create_and_stamp(path: &Path) -> Result<Option<Connection>> {
    create_with(path, &all_schema_statements())
}

fn create_with(path: &Path, statements: &[&str]) -> Result<Option<Connection>> {
    let unavailable = |e: std::io::Error| Error::StoreUnavailable {
        path: path.to_path_buf(),
        source: Box::new(e),
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let staging = tempfile::Builder::new()
        .prefix(".watchgit-")
        .suffix(".db.tmp")
        .tempfile_in(dir)
        .map_err(unavailable)?;

    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX;
    let built = Connection::open_with_flags(staging.path(), flags).and_then(|conn| {
        write_schema(&conn, statements)?;
        conn.close().map_err(|(_, e)| e)
    });
    if let Err(source) = built {
        // Dropping `staging` removes the temporary file.
        return Err(Error::CreateFailed {
            path: path.to_path_buf(),
            source,
        });
    }

    match staging.persist_noclobber(path) {
        Ok(_) => {}
        Err(e) if e.error.kind() == std::io::ErrorKind::AlreadyExists => {
            tracing::debug!(path = %path.display(), "store created concurrently, using it");
            return Ok(None);
        }
        Err(e) => return Err(unavailable(e.error)),
    }

    let conn = Connection::open_with_flags(path, flags).map_err(|e| Error::StoreUnavailable {
        path: path.to_path_buf(),
        source: Box::new(e),
    })?;

    tracing::info!(path = %path.display(), version = SCHEMA_VERSION, "created new store");
    Ok(Some(conn))
}

/// Tables and stamp commit together or not at all.
fn write_schema(conn: &Connection, statements: &[&str]) -> rusqlite::Result<()> {
    let tx = conn.unchecked_transaction()?;
    for stmt in statements {
        tx.execute(stmt, [])?;
    }
    tx.pragma_update(None, VERSION_KEY, SCHEMA_VERSION)?;
    tx.commit()
}

/// Read the version stamp of an open store.
///
/// The read must produce exactly one row with exactly one column named
/// [`VERSION_KEY`]; anything else is [`Error::VersionUnreadable`]. Whether
/// the version is acceptable is up to the caller.
pub fn check_version(conn: &Connection, path: &Path) -> Result<u32> {
    read_version(conn).map_err(|reason| Error::VersionUnreadable {
        path: path.to_path_buf(),
        reason,
    })
}

fn read_version(conn: &Connection) -> std::result::Result<u32, String> {
    let mut stmt = conn
        .prepare("PRAGMA user_version")
        .map_err(|e| e.to_string())?;

    if stmt.column_count() != 1 {
        return Err(format!("expected 1 column, got {}", stmt.column_count()));
    }
    let name = stmt.column_name(0).map_err(|e| e.to_string())?;
    if name != VERSION_KEY {
        return Err(format!("unexpected metadata key '{name}'"));
    }

    let mut rows = stmt.query([]).map_err(|e| e.to_string())?;
    let version = match rows.next().map_err(|e| e.to_string())? {
        Some(row) => version_from_value(row.get_ref(0).map_err(|e| e.to_string())?)?,
        None => return Err("no version row".to_string()),
    };
    if rows.next().map_err(|e| e.to_string())?.is_some() {
        return Err("more than one version row".to_string());
    }

    Ok(version)
}

fn version_from_value(value: ValueRef<'_>) -> std::result::Result<u32, String> {
    match value {
        ValueRef::Integer(v) => u32::try_from(v).map_err(|_| format!("{v} is out of range")),
        ValueRef::Text(bytes) => {
            let text = std::str::from_utf8(bytes).map_err(|e| e.to_string())?;
            parse_version(text)
        }
        other => Err(format!("unexpected {} value", other.data_type())),
    }
}

/// Strict full-string parse of a version number.
///
/// Only ASCII digits are accepted: no sign, no whitespace, no suffix.
pub fn parse_version(text: &str) -> std::result::Result<u32, String> {
    if text.is_empty() {
        return Err("empty version".to_string());
    }
    if !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("'{text}' is not a number"));
    }
    text.parse::<u32>()
        .map_err(|e| format!("'{text}' is not a valid version: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn staging_leftovers(dir: &Path) -> usize {
        std::fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".db.tmp"))
            .count()
    }

    #[test]
    fn test_create_and_stamp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.db");

        let conn = create_and_stamp(&path).unwrap().unwrap();
        assert!(path.exists());
        assert_eq!(check_version(&conn, &path).unwrap(), SCHEMA_VERSION);
        assert_eq!(staging_leftovers(dir.path()), 0);

        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'entries'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 1);
    }

    #[test]
    fn test_failed_create_leaves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.db");

        let err = create_with(&path, &[CREATE_ENTRIES_TABLE, "CREATE TABLE broken ("]).unwrap_err();
        assert!(matches!(err, Error::CreateFailed { .. }));
        assert!(!path.exists());
        assert_eq!(staging_leftovers(dir.path()), 0);

        // A later attempt starts clean.
        assert!(create_and_stamp(&path).unwrap().is_some());
    }

    #[test]
    fn test_create_over_existing_store_keeps_it() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.db");

        let conn = create_and_stamp(&path).unwrap().unwrap();
        conn.execute(
            "INSERT INTO entries (alias, path) VALUES ('keep', '/srv/keep')",
            [],
        )
        .unwrap();
        conn.close().unwrap();
        let before = std::fs::read(&path).unwrap();

        assert!(create_and_stamp(&path).unwrap().is_none());
        let err = create_with(&path, &["CREATE TABLE broken ("]).unwrap_err();
        assert!(matches!(err, Error::CreateFailed { .. }));

        assert_eq!(std::fs::read(&path).unwrap(), before);
        let conn = Connection::open(&path).unwrap();
        let kept: String = conn
            .query_row("SELECT path FROM entries WHERE alias = 'keep'", [], |row| row.get(0))
            .unwrap();
        assert_eq!(kept, "/srv/keep");
        assert_eq!(staging_leftovers(dir.path()), 0);
    }

    #[test]
    fn test_schema_and_stamp_commit_together() {
        let conn = Connection::open_in_memory().unwrap();

        let err = write_schema(&conn, &[CREATE_ENTRIES_TABLE, "CREATE TABLE broken ("]);
        assert!(err.is_err());

        let tables: i64 = conn
            .query_row("SELECT COUNT(*) FROM sqlite_master WHERE name = 'entries'", [], |row| row.get(0))
            .unwrap();
        assert_eq!(tables, 0);
        assert_eq!(check_version(&conn, Path::new(":memory:")).unwrap(), 0);

        initialize(&conn).unwrap();
        assert_eq!(check_version(&conn, Path::new(":memory:")).unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn test_check_version_reports_stamp() {
        let conn = Connection::open_in_memory().unwrap();
        conn.pragma_update(None, VERSION_KEY, 7).unwrap();
        assert_eq!(check_version(&conn, Path::new(":memory:")).unwrap(), 7);
    }

    #[test]
    fn test_check_version_on_garbage_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("not-a-db");
        std::fs::write(&path, vec![b'x'; 4096]).unwrap();

        let conn = Connection::open_with_flags(&path, OpenFlags::SQLITE_OPEN_READ_WRITE).unwrap();
        let err = check_version(&conn, &path).unwrap_err();
        assert!(matches!(err, Error::VersionUnreadable { .. }));
    }

    #[test]
    fn test_parse_version_is_strict() {
        assert_eq!(parse_version("1"), Ok(1));
        assert_eq!(parse_version("042"), Ok(42));

        for bad in ["", "1x", " 1", "1 ", "-1", "+1", "0x1", "99999999999"] {
            assert!(parse_version(bad).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn test_version_from_text_value() {
        assert_eq!(version_from_value(ValueRef::Text(b"3")), Ok(3));
        assert!(version_from_value(ValueRef::Text(b"3abc")).is_err());
        assert!(version_from_value(ValueRef::Null).is_err());
        assert!(version_from_value(ValueRef::Integer(-1)).is_err());
    }
}
