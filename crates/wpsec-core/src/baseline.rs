//! Locating trusted baseline trees
//!
//! Fetching and unpacking release archives happens outside this crate. A
//! [`BaselineProvider`] only has to hand back a local directory holding the
//! pristine tree for a given [`Release`].

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::canonical_dir;
use crate::{Error, Result};

/// Locale used when none is configured.
pub const DEFAULT_LOCALE: &str = "en_US";

/// Environment variable consulted for the release locale.
pub const LOCALE_ENV: &str = "WP_CLI_LOCALE";

/// File in a WordPress tree that declares its version.
pub const VERSION_FILE: &str = "wp-includes/version.php";

static VERSION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\$wp_version\s*=\s*['"]([^'"]+)['"]"#).expect("version pattern is valid")
});

/// A WordPress release identified by version and locale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    pub version: String,
    pub locale: String,
}

impl Release {
    pub fn new(version: impl Into<String>, locale: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            locale: locale.into(),
        }
    }

    /// Detect the release installed at `live_root`.
    ///
    /// The version comes from `wp-includes/version.php`; the locale from
    /// `WP_CLI_LOCALE`, falling back to `en_US`.
    pub fn detect(live_root: &Path) -> Result<Self> {
        Ok(Self::new(detect_version(live_root)?, locale_from_env()))
    }
}

/// Read `$wp_version` from the live tree.
pub fn detect_version(live_root: &Path) -> Result<String> {
    let path = live_root.join(VERSION_FILE);
    let source = wpsec_fs::io::read_text(&path)?;
    parse_version(&source).ok_or(Error::ReleaseNotDetected { path })
}

fn parse_version(source: &str) -> Option<String> {
    VERSION_PATTERN
        .captures(source)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Locale from `WP_CLI_LOCALE`, or `en_US`.
pub fn locale_from_env() -> String {
    std::env::var(LOCALE_ENV)
        .ok()
        .filter(|l| !l.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_LOCALE.to_string())
}

/// Supplies the local directory of a trusted reference tree.
pub trait BaselineProvider {
    /// Return the baseline directory for `release`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BaselineNotFound`] if no tree is available.
    fn provide(&self, release: &Release) -> Result<PathBuf>;
}

/// A baseline that is always the same directory, whatever the release.
#[derive(Debug, Clone)]
pub struct DirectoryBaseline {
    path: PathBuf,
}

impl DirectoryBaseline {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl BaselineProvider for DirectoryBaseline {
    fn provide(&self, _release: &Release) -> Result<PathBuf> {
        canonical_dir(&self.path).ok_or_else(|| Error::BaselineNotFound {
            path: self.path.clone(),
        })
    }
}

/// Pre-extracted releases laid out as `<root>/<version>/<locale>/wordpress`.
///
/// The trailing `wordpress` directory is what release archives unpack to;
/// `<root>/<version>/<locale>` is accepted when it is absent.
#[derive(Debug, Clone)]
pub struct ReleaseCache {
    root: PathBuf,
}

impl ReleaseCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn release_dir(&self, release: &Release) -> PathBuf {
        self.root.join(&release.version).join(&release.locale)
    }
}

impl BaselineProvider for ReleaseCache {
    fn provide(&self, release: &Release) -> Result<PathBuf> {
        let dir = self.release_dir(release);
        canonical_dir(&dir.join("wordpress"))
            .or_else(|| canonical_dir(&dir))
            .ok_or(Error::BaselineNotFound { path: dir })
    }
}
