//! Durable writes for the store document.
//!
//! The document is written to a temp file in the same directory, synced,
//! renamed over the old file, and then the directory entry is synced. A
//! crash at any point leaves either the old or the new document on disk.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use crate::Error;
use paintbot_common::models::StoreDocument;

pub fn fsync_file(file: &File) -> io::Result<()> {
    file.sync_all()
}

/// Syncs a directory so a rename inside it survives power loss.
#[cfg(unix)]
pub fn fsync_dir(dir_path: &Path) -> io::Result<()> {
    let dir = OpenOptions::new().read(true).open(dir_path)?;
    dir.sync_all()
}

#[cfg(not(unix))]
pub fn fsync_dir(_dir_path: &Path) -> io::Result<()> {
    Ok(())
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

/// Replace-then-rename write of `bytes` to `path`.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let dir = parent_dir(path);
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.flush()?;
    fsync_file(tmp.as_file())?;
    tmp.persist(path).map_err(|e| e.error)?;
    fsync_dir(dir)
}

pub fn save_document(path: &Path, doc: &StoreDocument) -> Result<(), Error> {
    let bytes = serde_json::to_vec_pretty(doc)?;
    write_atomic(path, &bytes)?;
    Ok(())
}

/// Reads and parses the document. Both failures are configuration errors.
pub fn load_document(path: &Path) -> Result<StoreDocument, Error> {
    let raw = std::fs::read(path)
        .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
    serde_json::from_slice(&raw)
        .map_err(|e| Error::Config(format!("cannot parse {}: {}", path.display(), e)))
}
