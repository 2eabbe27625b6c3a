//! Normalized path handling for cross-platform compatibility

use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

/// A path normalized to use forward slashes internally.
///
/// Relative paths inside a tree (the keys of a report, the subject of policy
/// patterns) are stored in this form so that the same relative path compares
/// equal whichever tree root it was derived from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedPath {
    /// Internal representation always uses forward slashes
    inner: String,
}

impl NormalizedPath {
    /// Create a new NormalizedPath from any path-like input.
    ///
    /// Converts backslashes to forward slashes and drops `.` components and
    /// repeated separators. A leading `/` is kept.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let raw = path.as_ref().to_string_lossy().replace('\\', "/");
        let absolute = raw.starts_with('/');
        let parts: Vec<&str> = raw
            .split('/')
            .filter(|part| !part.is_empty() && *part != ".")
            .collect();
        let mut inner = parts.join("/");
        if absolute {
            inner.insert(0, '/');
        }
        Self { inner }
    }

    /// The path of `path` relative to `root`, or `None` if it lies outside.
    pub fn relative(root: &Path, path: &Path) -> Option<Self> {
        let stripped = path.strip_prefix(root).ok()?;
        let parts: Vec<String> = stripped
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();
        Some(Self {
            inner: parts.join("/"),
        })
    }

    /// Get the internal normalized string representation.
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Whether this is the empty path (a tree root relative to itself).
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Resolve this relative path beneath `root`.
    pub fn under(&self, root: &Path) -> PathBuf {
        self.inner
            .split('/')
            .filter(|part| !part.is_empty())
            .fold(root.to_path_buf(), |acc, part| acc.join(part))
    }

    /// Get the parent directory.
    pub fn parent(&self) -> Option<Self> {
        let trimmed = self.inner.trim_end_matches('/');
        match trimmed.rfind('/') {
            Some(idx) if idx > 0 => Some(Self {
                inner: trimmed[..idx].to_string(),
            }),
            Some(0) => Some(Self {
                inner: "/".to_string(),
            }),
            _ => None,
        }
    }

    /// Component-wise prefix test: `a/b` is within `a` but not within `a/bc`.
    ///
    /// The empty path contains every path.
    pub fn is_within(&self, ancestor: &NormalizedPath) -> bool {
        if ancestor.inner.is_empty() {
            return true;
        }
        match self.inner.strip_prefix(&ancestor.inner) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }
}

impl AsRef<Path> for NormalizedPath {
    fn as_ref(&self) -> &Path {
        Path::new(&self.inner)
    }
}

impl std::fmt::Display for NormalizedPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl From<&str> for NormalizedPath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for NormalizedPath {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<PathBuf> for NormalizedPath {
    fn from(p: PathBuf) -> Self {
        Self::new(p)
    }
}

impl From<&Path> for NormalizedPath {
    fn from(p: &Path) -> Self {
        Self::new(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_strips_root() {
        let rel = NormalizedPath::relative(
            Path::new("/srv/site"),
            Path::new("/srv/site/wp-includes/version.php"),
        )
        .unwrap();
        assert_eq!(rel.as_str(), "wp-includes/version.php");
    }

    #[test]
    fn relative_outside_root_is_none() {
        assert!(NormalizedPath::relative(Path::new("/srv/site"), Path::new("/tmp/x")).is_none());
    }

    #[test]
    fn under_reattaches_to_other_root() {
        let rel = NormalizedPath::new("wp-admin/index.php");
        assert_eq!(
            rel.under(Path::new("/tmp/base")),
            PathBuf::from("/tmp/base/wp-admin/index.php")
        );
    }

    #[test]
    fn is_within_respects_component_boundaries() {
        let uploads = NormalizedPath::new("wp-content/uploads");
        assert!(NormalizedPath::new("wp-content/uploads").is_within(&uploads));
        assert!(NormalizedPath::new("wp-content/uploads/2024/a.png").is_within(&uploads));
        assert!(!NormalizedPath::new("wp-content/uploads-old/a.png").is_within(&uploads));
        assert!(!NormalizedPath::new("wp-content").is_within(&uploads));
    }

    #[test]
    fn new_collapses_separators() {
        assert_eq!(NormalizedPath::new("a//b/./c/").as_str(), "a/b/c");
        assert_eq!(NormalizedPath::new("a\\b").as_str(), "a/b");
        assert_eq!(NormalizedPath::new("/a/b").as_str(), "/a/b");
    }
}
