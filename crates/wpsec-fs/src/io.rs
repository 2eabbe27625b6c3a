//! Atomic I/O operations
//!
//! Every write that replaces a file in a live tree goes through a temporary
//! sibling followed by a rename, so an interrupted repair leaves either the old
//! or the new content in place and never a truncated file.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::{Error, Result};

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Temp file path in the same directory as `target` (ensures same filesystem).
fn temp_sibling(target: &Path) -> PathBuf {
    let temp_name = format!(
        ".{}.{}.{}.tmp",
        target
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default(),
        std::process::id(),
        TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
    );
    target.with_file_name(temp_name)
}

fn ensure_parent(target: &Path) -> Result<()> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    Ok(())
}

/// Fill `temp_path` through `fill`, flush it to disk, then rename it over
/// `target`. The temp file is removed if any step fails.
fn replace_with<F>(target: &Path, fill: F) -> Result<u64>
where
    F: FnOnce(&mut File, &Path) -> Result<u64>,
{
    ensure_parent(target)?;
    let temp_path = temp_sibling(target);

    let outcome = (|| {
        let mut temp_file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp_path)
            .map_err(|e| Error::io(&temp_path, e))?;

        let written = fill(&mut temp_file, &temp_path)?;

        temp_file
            .sync_all()
            .map_err(|e| Error::io(&temp_path, e))?;

        drop(temp_file);

        fs::rename(&temp_path, target).map_err(|e| Error::io(target, e))?;
        Ok(written)
    })();

    if outcome.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    outcome
}

/// Copy `source` over `dest` atomically, carrying over the source's
/// permission bits.
///
/// Returns the number of bytes copied.
pub fn copy_atomic(source: &Path, dest: &Path) -> Result<u64> {
    let mut reader = File::open(source).map_err(|e| Error::io(source, e))?;
    let permissions = reader
        .metadata()
        .map_err(|e| Error::io(source, e))?
        .permissions();

    let copied = replace_with(dest, |file, temp_path| {
        let copied = std::io::copy(&mut reader, file).map_err(|e| Error::io(source, e))?;
        file.set_permissions(permissions)
            .map_err(|e| Error::io(temp_path, e))?;
        Ok(copied)
    })?;

    tracing::debug!(from = %source.display(), to = %dest.display(), bytes = copied, "copied");
    Ok(copied)
}

/// Read text content from a file.
pub fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| Error::io(path, e))
}
