//! File writing
//!
//! Generated files are written in one of two ways: new migration files are
//! created exclusively and never overwrite anything, and the registry is
//! staged in a temporary file beside its target and renamed over it.

use crate::{MigforgeError, Result};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Write `content` to a new file, failing if `path` already exists
pub fn write_new(path: &Path, content: &str) -> Result<()> {
    ensure_parent(path)?;

    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::AlreadyExists => MigforgeError::AlreadyExists(path.to_path_buf()),
            _ => MigforgeError::io(path, e),
        })?;

    file.write_all(content.as_bytes())
        .and_then(|_| file.sync_all())
        .map_err(|e| MigforgeError::io(path, e))?;

    log::info!("Wrote {}", path.display());
    Ok(())
}

/// Replace `path` with `content` atomically
pub fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let parent = ensure_parent(path)?;

    let mut staged = NamedTempFile::new_in(parent).map_err(|e| MigforgeError::io(parent, e))?;
    staged
        .write_all(content.as_bytes())
        .and_then(|_| staged.as_file().sync_all())
        .map_err(|e| MigforgeError::io(staged.path(), e))?;

    // The temp file is removed on drop if persisting fails
    staged
        .persist(path)
        .map_err(|e| MigforgeError::io(path, e.error))?;

    log::info!("Wrote {}", path.display());
    Ok(())
}

fn ensure_parent(path: &Path) -> Result<&Path> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    if !parent.exists() {
        fs::create_dir_all(parent).map_err(|e| MigforgeError::io(parent, e))?;
    }
    Ok(parent)
}
