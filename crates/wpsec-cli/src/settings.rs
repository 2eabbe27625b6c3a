//! Per-installation settings file
//!
//! `wp-secure.toml` in the installation root (or the file named by
//! `--config`) supplies defaults for flags that are not given on the command
//! line. Any supported [`ConfigStore`] format works with `--config`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;
use wpsec_core::{ContentBoundary, DEFAULT_SKIP, SkipList};
use wpsec_fs::ConfigStore;

use crate::error::Result;

/// Settings file looked up in the installation root.
pub const SETTINGS_FILE: &str = "wp-secure.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Names ignored at any depth; replaces the built-in list
    pub skip: Option<Vec<String>>,
    /// User-content subtrees exempt from drift checks
    pub content_dirs: Option<Vec<String>>,
    pub workers: Option<usize>,
    /// Permission policy document
    pub policy: Option<PathBuf>,
    pub profile: Option<String>,
    /// Pristine release directory
    pub baseline: Option<PathBuf>,
    /// Release cache root
    pub cache: Option<PathBuf>,
}

impl Settings {
    /// Load `explicit`, or `wp-secure.toml` under `live_root` if present.
    ///
    /// Relative paths inside the file are resolved against its directory.
    pub fn load(live_root: &Path, explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let default = live_root.join(SETTINGS_FILE);
                if !default.is_file() {
                    return Ok(Self::default());
                }
                default
            }
        };

        debug!(path = %path.display(), "Loading settings");
        let settings: Settings = ConfigStore::new().load(&path)?;
        let base = path.parent().unwrap_or(Path::new("."));
        Ok(settings.resolved_against(base))
    }

    fn resolved_against(mut self, base: &Path) -> Self {
        for path in [&mut self.policy, &mut self.baseline, &mut self.cache]
            .into_iter()
            .flatten()
        {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
        self
    }

    /// Flags win over the file; the file wins over the built-in list.
    ///
    /// The built-in list also covers the settings file itself.
    pub fn skip_list(&self, flags: &[String]) -> SkipList {
        if !flags.is_empty() {
            return SkipList::new(flags.iter().cloned());
        }
        match &self.skip {
            Some(names) => SkipList::new(names.iter().cloned()),
            None => SkipList::new(DEFAULT_SKIP.iter().copied().chain([SETTINGS_FILE])),
        }
    }

    pub fn boundary(&self, flags: &[String]) -> ContentBoundary {
        if !flags.is_empty() {
            return ContentBoundary::new(flags);
        }
        match &self.content_dirs {
            Some(dirs) => ContentBoundary::new(dirs),
            None => ContentBoundary::default(),
        }
    }

    pub fn workers(&self, flag: Option<usize>) -> usize {
        flag.or(self.workers).unwrap_or(1)
    }
}
