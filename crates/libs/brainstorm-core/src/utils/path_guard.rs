//! Containment checks for file-reference resource paths.
//!
//! A `source_path` is only acceptable when its canonical form lies inside
//! the user's home directory. Containment is decided component-wise on the
//! canonical paths, never by string prefix: a string check would accept
//! `/home/user_evil/x` as being "under" `/home/user`.

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// A validated file reference.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Canonical absolute path.
    pub path: PathBuf,
    pub size_bytes: u64,
}

/// Validate `raw` against the user's home directory and `max_bytes`.
pub fn resolve_source_path(raw: &str, max_bytes: usize) -> Result<SourceFile> {
    let home = dirs::home_dir()
        .ok_or_else(|| Error::Io(std::io::Error::other("no home directory available")))?;
    resolve_source_path_within(raw, &home, max_bytes)
}

/// Validate `raw` against an explicit containment root.
///
/// Split out from [`resolve_source_path`] so tests can supply a temp home.
pub fn resolve_source_path_within(raw: &str, root: &Path, max_bytes: usize) -> Result<SourceFile> {
    let canonical = Path::new(raw).canonicalize()?;
    let canonical_root = root.canonicalize()?;

    // Component-wise containment on canonical paths; symlinks are already
    // resolved, so `..` segments and links cannot escape.
    if canonical.strip_prefix(&canonical_root).is_err() {
        return Err(Error::PathEscape {
            provided: raw.to_string(),
        });
    }

    let meta = std::fs::metadata(&canonical)?;
    if !meta.is_file() {
        return Err(Error::Io(std::io::Error::other(format!(
            "source_path is not a regular file: {raw}"
        ))));
    }

    let size_bytes = meta.len();
    if size_bytes as usize > max_bytes {
        return Err(Error::PayloadTooLarge {
            actual: size_bytes as usize,
            limit: max_bytes,
        });
    }

    // Readability check up front; the payload is read again on access.
    drop(std::fs::File::open(&canonical)?);

    Ok(SourceFile {
        path: canonical,
        size_bytes,
    })
}
