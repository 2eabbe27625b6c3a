//! SHA-256 checksum utilities
//!
//! Provides a single canonical checksum format (`sha256:<hex>`) used to compare
//! live files against their baseline counterparts.

use sha2::{Digest, Sha256};
use std::fs::File;
use std::path::Path;

/// Prefix for all checksums produced by this module
const PREFIX: &str = "sha256:";

/// Compute the SHA-256 checksum of a file's contents.
///
/// The file is streamed through the hasher rather than read into memory, so
/// large media files left in a tree do not balloon the process.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or read.
pub fn compute_file_checksum(path: &Path) -> std::io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut file, &mut hasher)?;
    Ok(format!("{}{:x}", PREFIX, hasher.finalize()))
}

/// Whether two files have byte-identical content.
pub fn files_match(a: &Path, b: &Path) -> std::io::Result<bool> {
    Ok(compute_file_checksum(a)? == compute_file_checksum(b)?)
}
