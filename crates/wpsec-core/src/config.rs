//! Immutable per-run configuration shared by both engines

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use wpsec_fs::{NormalizedPath, SkipList};

use crate::{Error, Result};

/// Files that are never read, reported or overwritten by default.
pub const DEFAULT_SKIP: &[&str] = &["wp-config.php"];

/// User-content subtree exempt from drift checks by default.
pub const DEFAULT_CONTENT_DIR: &str = "wp-content/uploads";

/// Subtrees of the live tree whose content is expected to diverge from any
/// baseline and therefore never carries a drift status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentBoundary {
    dirs: Vec<NormalizedPath>,
}

impl Default for ContentBoundary {
    fn default() -> Self {
        Self::new([DEFAULT_CONTENT_DIR])
    }
}

impl ContentBoundary {
    pub fn new<I, S>(dirs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            dirs: dirs
                .into_iter()
                .map(|d| NormalizedPath::new(d.as_ref().trim_matches('/')))
                .filter(|d| !d.is_empty())
                .collect(),
        }
    }

    /// A boundary that exempts nothing.
    pub fn none() -> Self {
        Self { dirs: Vec::new() }
    }

    /// Whether `relative` is a boundary directory or lies beneath one.
    pub fn contains(&self, relative: &NormalizedPath) -> bool {
        self.dirs.iter().any(|dir| relative.is_within(dir))
    }

    pub fn dirs(&self) -> &[NormalizedPath] {
        &self.dirs
    }
}

/// Everything an engine needs to know about one run.
///
/// Built once by the caller and passed by reference; engines hold no other
/// state between calls.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    live_root: PathBuf,
    skip: SkipList,
    boundary: ContentBoundary,
    scope: Option<NormalizedPath>,
    verbose: bool,
    dry_run: bool,
    workers: usize,
}

impl ScanConfig {
    /// Configuration for `live_root` with default skip list and boundary.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LiveRootNotFound`] if the root is not an existing
    /// directory.
    pub fn new(live_root: impl AsRef<Path>) -> Result<Self> {
        let live_root = canonical_dir(live_root.as_ref()).ok_or_else(|| Error::LiveRootNotFound {
            path: live_root.as_ref().to_path_buf(),
        })?;

        Ok(Self {
            live_root,
            skip: SkipList::new(DEFAULT_SKIP.iter().copied()),
            boundary: ContentBoundary::default(),
            scope: None,
            verbose: false,
            dry_run: false,
            workers: 1,
        })
    }

    pub fn with_skip(mut self, skip: SkipList) -> Self {
        self.skip = skip;
        self
    }

    pub fn with_boundary(mut self, boundary: ContentBoundary) -> Self {
        self.boundary = boundary;
        self
    }

    /// Restrict walks to one subdirectory of the root.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidScope`] for absolute paths or `..` components.
    pub fn with_scope(mut self, scope: &str) -> Result<Self> {
        let normalized = NormalizedPath::new(scope.trim_end_matches('/'));
        if normalized.as_str().starts_with('/')
            || normalized.as_str().split('/').any(|part| part == "..")
        {
            return Err(Error::InvalidScope {
                scope: scope.to_string(),
            });
        }
        self.scope = (!normalized.is_empty()).then_some(normalized);
        Ok(self)
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Worker threads for subtree dispatch; zero is treated as one.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn live_root(&self) -> &Path {
        &self.live_root
    }

    pub fn skip(&self) -> &SkipList {
        &self.skip
    }

    pub fn boundary(&self) -> &ContentBoundary {
        &self.boundary
    }

    pub fn scope(&self) -> Option<&NormalizedPath> {
        self.scope.as_ref()
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Where a walk of `root` starts once the scope is applied.
    pub fn start_in(&self, root: &Path) -> PathBuf {
        match &self.scope {
            Some(scope) => scope.under(root),
            None => root.to_path_buf(),
        }
    }
}

/// Canonical form of `path` if it is an existing directory.
pub(crate) fn canonical_dir(path: &Path) -> Option<PathBuf> {
    dunce::canonicalize(path).ok().filter(|p| p.is_dir())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn defaults_skip_config_and_exempt_uploads() {
        let dir = tempfile::tempdir().unwrap();
        let config = ScanConfig::new(dir.path()).unwrap();

        assert!(config.skip().contains("wp-config.php".as_ref()));
        assert!(config.boundary().contains(&NormalizedPath::new("wp-content/uploads/2024/a.jpg")));
        assert!(!config.boundary().contains(&NormalizedPath::new("wp-content/plugins/x/core.php")));
        assert_eq!(config.workers(), 1);
    }

    #[test]
    fn missing_root_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            ScanConfig::new(dir.path().join("absent")),
            Err(Error::LiveRootNotFound { .. })
        ));
    }

    #[rstest]
    #[case("../etc")]
    #[case("/etc")]
    #[case("wp-content/../../x")]
    fn escaping_scopes_are_rejected(#[case] scope: &str) {
        let dir = tempfile::tempdir().unwrap();
        let result = ScanConfig::new(dir.path()).unwrap().with_scope(scope);
        assert!(matches!(result, Err(Error::InvalidScope { .. })));
    }

    #[test]
    fn scope_moves_the_walk_start() {
        let dir = tempfile::tempdir().unwrap();
        let config = ScanConfig::new(dir.path())
            .unwrap()
            .with_scope("wp-content/plugins/")
            .unwrap();

        assert_eq!(
            config.start_in(Path::new("/tmp/base")),
            PathBuf::from("/tmp/base/wp-content/plugins")
        );
    }

    #[test]
    fn boundary_ignores_empty_entries() {
        let boundary = ContentBoundary::new(["", "/"]);
        assert!(boundary.dirs().is_empty());
        assert!(!boundary.contains(&NormalizedPath::new("anything")));
    }
}
