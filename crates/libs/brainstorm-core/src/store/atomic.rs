//! Atomic filesystem write primitives.
//!
//! Every mutating write follows the same protocol: create a sibling temp
//! file, write and fsync it, rename it over the target, then fsync the
//! containing directory. A crash at any point leaves either the old file or
//! the new file, never a torn mix. Readers skip temp files.

use crate::error::{Error, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

/// Infix marking in-flight temp files; directory listings must skip these.
const TEMP_INFIX: &str = ".tmp.";

/// True for directory entries that are not payload: lock files, owner
/// metadata, and in-flight temp files.
pub fn is_internal_entry(name: &str) -> bool {
    name.starts_with('.') || name.contains(TEMP_INFIX)
}

fn temp_sibling(path: &Path) -> std::path::PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "file".to_string());
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    parent.join(format!("{name}{TEMP_INFIX}{:08x}", rand::random::<u32>()))
}

#[cfg(unix)]
fn fsync_dir(dir: &Path) -> std::io::Result<()> {
    File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn fsync_dir(_dir: &Path) -> std::io::Result<()> {
    // Directory handles cannot be fsynced portably off unix; rename
    // durability is best-effort there.
    Ok(())
}

/// Write raw bytes atomically: temp file, fsync, rename, directory fsync.
pub fn write_bytes_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| Error::Io(std::io::Error::other("path has no parent")))?;
    std::fs::create_dir_all(parent)?;

    let tmp = temp_sibling(path);
    let mut file = File::create(&tmp)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    drop(file);

    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(e.into());
    }
    fsync_dir(parent)?;
    Ok(())
}

/// Serialize `value` as pretty JSON and write it atomically.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut bytes = serde_json::to_vec_pretty(value)?;
    bytes.push(b'\n');
    write_bytes_atomic(path, &bytes)
}

/// Exclusive creation: fails with [`Error::AlreadyExists`] when the target
/// is already present. The `O_CREAT | O_EXCL` open serializes concurrent
/// creators at the kernel level.
pub fn create_json_exclusive<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| Error::Io(std::io::Error::other("path has no parent")))?;
    std::fs::create_dir_all(parent)?;

    let mut bytes = serde_json::to_vec_pretty(value)?;
    bytes.push(b'\n');

    let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
            return Err(Error::AlreadyExists(
                path.file_stem()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default(),
            ));
        }
        Err(e) => return Err(e.into()),
    };
    file.write_all(&bytes)?;
    file.sync_all()?;
    drop(file);
    fsync_dir(parent)?;
    Ok(())
}

/// Read and deserialize a JSON file.
///
/// I/O errors (including not-found) surface as [`Error::Io`]; callers map
/// not-found to their entity-specific variant.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = std::fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Read a JSON file, returning `None` when it does not exist.
pub fn read_json_opt<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Append one line to a log file with `O_APPEND`, flushing and fsyncing.
///
/// Single-line appends below PIPE_BUF are not interleaved between
/// processes, which is all the audit log needs.
pub fn append_line(path: &Path, line: &str) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| Error::Io(std::io::Error::other("path has no parent")))?;
    std::fs::create_dir_all(parent)?;

    let mut file = OpenOptions::new().append(true).create(true).open(path)?;
    file.write_all(line.as_bytes())?;
    file.write_all(b"\n")?;
    file.flush()?;
    file.sync_all()?;
    Ok(())
}

/// List the non-internal entry names of a directory, sorted.
///
/// Returns an empty list when the directory does not exist. Subdirectories
/// (e.g. an inbox `archive/`) are excluded.
pub fn list_entries(dir: &Path) -> Result<Vec<String>> {
    let read = match std::fs::read_dir(dir) {
        Ok(r) => r,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut names = Vec::new();
    for entry in read {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        if is_internal_entry(&name) {
            continue;
        }
        if entry.file_type()?.is_dir() {
            continue;
        }
        names.push(name);
    }
    names.sort();
    Ok(names)
}

/// List the non-internal subdirectory names of a directory, sorted.
pub fn list_subdirs(dir: &Path) -> Result<Vec<String>> {
    let read = match std::fs::read_dir(dir) {
        Ok(r) => r,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut names = Vec::new();
    for entry in read {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        if is_internal_entry(&name) {
            continue;
        }
        if entry.file_type()?.is_dir() {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}
