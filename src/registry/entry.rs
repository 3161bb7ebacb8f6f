//! Registry entries and path canonicalization

use std::io;
use std::path::Path;

use serde::Serialize;

use crate::{Error, Result};

/// A tracked repository as stored in the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    pub alias: String,
    pub path: String,
}

/// Resolve `raw` to its absolute, symlink-free form as stored text.
pub fn canonical_path(raw: &Path) -> Result<String> {
    let resolved = std::fs::canonicalize(raw).map_err(|source| Error::PathResolution {
        path: raw.to_path_buf(),
        source,
    })?;

    resolved
        .into_os_string()
        .into_string()
        .map_err(|_| Error::PathResolution {
            path: raw.to_path_buf(),
            source: io::Error::new(io::ErrorKind::InvalidData, "path is not valid UTF-8"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_path_strips_relative_segments() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("repo")).unwrap();

        let messy = dir.path().join("repo").join("..").join("repo").join(".");
        let canonical = canonical_path(&messy).unwrap();

        let expected = std::fs::canonicalize(dir.path().join("repo")).unwrap();
        assert_eq!(canonical, expected.to_str().unwrap());
        assert!(!canonical.contains(".."));
    }

    #[test]
    fn test_canonical_path_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = canonical_path(&dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, Error::PathResolution { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_canonical_path_follows_symlinks() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("target");
        std::fs::create_dir(&target).unwrap();
        let link = dir.path().join("link");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        assert_eq!(canonical_path(&link).unwrap(), canonical_path(&target).unwrap());
    }
}
