//! Filesystem layer for wp-secure
//!
//! Provides normalized relative paths, content checksums, atomic copy-into-place
//! and the lazy tree walker shared by the integrity and permission engines.

pub mod checksum;
pub mod config;
pub mod error;
pub mod io;
pub mod path;
pub mod walk;

pub use checksum::{compute_file_checksum, files_match};
pub use config::ConfigStore;
pub use error::{Error, Result};
pub use path::NormalizedPath;
pub use walk::{PathEntry, SkipList, TreeWalker, walk};
