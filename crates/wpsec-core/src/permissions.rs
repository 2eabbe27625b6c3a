//! Permission sweep driven by a policy profile

use std::path::Path;

use parking_lot::Mutex;
use tracing::{debug, info, warn};
use wpsec_fs::{PathEntry, SkipList};

use crate::config::ScanConfig;
use crate::dispatch::{Visit, visit_tree};
use crate::mode::FileMode;
use crate::policy::{PathPolicy, PolicyProfile};
use crate::report::{IssueKind, PermissionChange, Report};
use crate::Result;

/// Applies a [`PolicyProfile`] to every entry of the live tree.
pub struct PermissionEngine<'a> {
    config: &'a ScanConfig,
}

impl<'a> PermissionEngine<'a> {
    pub fn new(config: &'a ScanConfig) -> Self {
        Self { config }
    }

    /// Resolve and apply the target mode of every entry under the scope.
    ///
    /// Symlinks are left alone so a link can never redirect a chmod outside
    /// the tree. Per-path failures are recorded and the sweep continues; only
    /// an unreadable directory aborts it.
    pub fn apply(&self, profile: &PolicyProfile) -> Result<Report> {
        let live_root = self.config.live_root();
        let start = self.config.start_in(live_root);
        let report = Mutex::new(Report::new());
        let (verbose, dry_run) = (self.config.verbose(), self.config.dry_run());

        info!(
            live = %live_root.display(),
            profile = profile.name(),
            dry_run,
            "Starting permission sweep"
        );

        visit_tree(live_root, &start, self.config.skip(), self.config.workers(), |entry: &PathEntry| {
            if is_symlink(&entry.path) {
                debug!(path = %entry.relative, "Skipping symlink");
                return Visit::Continue;
            }

            let (mode, rule) = PathPolicy::resolve_with_rule(entry.relative.as_str(), entry.is_dir, profile);
            let previous = current_mode(&entry.path);

            if !dry_run
                && let Err(e) = set_mode(&entry.path, mode)
            {
                warn!(path = %entry.relative, error = %e, "Could not change permissions");
                report.lock().record_issue(
                    entry.relative.clone(),
                    IssueKind::PermissionChangeFailure,
                    e.to_string(),
                );
                return Visit::Continue;
            }

            debug!(
                rule = rule.map(|r| r.pattern()),
                "Chmod {} -> {}",
                mode,
                entry.path.display()
            );
            if verbose {
                report.lock().record_permission(PermissionChange {
                    path: entry.relative.clone(),
                    mode,
                    previous,
                    applied: !dry_run,
                });
            }
            Visit::Continue
        })?;

        Ok(report.into_inner())
    }
}

/// Apply `profile` across `live_root` with default boundary and one worker.
pub fn apply(live_root: &Path, skip: &SkipList, profile: &PolicyProfile, verbose: bool) -> Result<Report> {
    let config = ScanConfig::new(live_root)?
        .with_skip(skip.clone())
        .with_verbose(verbose);
    PermissionEngine::new(&config).apply(profile)
}

fn is_symlink(path: &Path) -> bool {
    path.symlink_metadata()
        .map(|m| m.file_type().is_symlink())
        .unwrap_or(false)
}

#[cfg(unix)]
fn current_mode(path: &Path) -> Option<FileMode> {
    use std::os::unix::fs::PermissionsExt;

    let bits = path.metadata().ok()?.permissions().mode() & 0o7777;
    FileMode::from_bits(bits).ok()
}

#[cfg(not(unix))]
fn current_mode(_path: &Path) -> Option<FileMode> {
    None
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: FileMode) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode.bits()))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: FileMode) -> std::io::Result<()> {
    Err(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "permission modes are not supported on this platform",
    ))
}
