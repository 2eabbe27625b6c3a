//! Error types for wpsec-core

use std::path::PathBuf;

use crate::report::DriftStatus;

/// Result type for wpsec-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort an integrity check or permission sweep.
///
/// Failures confined to a single path (a file that cannot be copied or
/// chmod-ed) are not errors; they are recorded as
/// [`PathIssue`](crate::report::PathIssue)s on the report.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A directory inside a tree could not be listed
    #[error("Couldn't open {path}: {source}")]
    UnreadableDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The live installation root does not exist or is not a directory
    #[error("Live tree not found at {path}")]
    LiveRootNotFound { path: PathBuf },

    /// The baseline tree does not exist or is not a directory
    #[error("Baseline tree not found at {path}")]
    BaselineNotFound { path: PathBuf },

    /// A scoped subdirectory escapes the tree root
    #[error("Invalid directory scope: {scope}")]
    InvalidScope { scope: String },

    /// Requested policy profile is unknown or malformed
    #[error("Invalid permission profile '{name}': {reason}")]
    InvalidPolicyProfile { name: String, reason: String },

    /// Policy document could not be parsed
    #[error("Failed to parse permission policy: {message}")]
    PolicyParse { message: String },

    /// Permission value is not a valid octal mode
    #[error("Invalid permission mode '{value}': {reason}")]
    InvalidMode { value: String, reason: String },

    /// `updated` recorded for a path never seen as changed or missing
    #[error("Cannot mark {path} as {status:?}: it was never changed or missing")]
    InvalidTransition { path: String, status: DriftStatus },

    /// WordPress version could not be read from the live tree
    #[error("Could not detect WordPress version from {path}")]
    ReleaseNotDetected { path: PathBuf },

    /// A scan worker thread panicked
    #[error("Scan worker panicked")]
    WorkerPanicked,

    /// Filesystem error from wpsec-fs
    #[error(transparent)]
    Fs(#[from] wpsec_fs::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Translate a walker failure into the fatal directory error.
    pub(crate) fn from_walk(err: wpsec_fs::Error) -> Self {
        match err {
            wpsec_fs::Error::Unreadable { path, source } => Self::UnreadableDirectory { path, source },
            other => Self::Fs(other),
        }
    }
}
