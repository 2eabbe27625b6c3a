//! Drift detection and repair against a baseline tree
//!
//! Two passes run in opposite directions:
//!
//! - **compare** walks the baseline and looks for each file in the live tree,
//!   flagging it `missing`, `changed` or (verbose only) `matched`.
//! - **find_non_core** walks the live tree and flags every path that has no
//!   baseline counterpart as `extra`. Those are warnings only.
//!
//! **repair** then copies baseline content over every changed or missing
//! live path, one atomic replace per file.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info, warn};
use wpsec_fs::{NormalizedPath, PathEntry, SkipList, checksum, io};

use crate::config::{ScanConfig, canonical_dir};
use crate::dispatch::{Visit, visit_tree};
use crate::report::{DriftStatus, IssueKind, Report};
use crate::{Error, Result};

/// Outcome counts of a repair pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RepairSummary {
    pub updated: usize,
    pub failed: usize,
}

/// Compares the live tree of a [`ScanConfig`] against baseline trees.
pub struct IntegrityEngine<'a> {
    config: &'a ScanConfig,
}

impl<'a> IntegrityEngine<'a> {
    pub fn new(config: &'a ScanConfig) -> Self {
        Self { config }
    }

    /// Compare, look for non-core paths, and repair when `fix` is set.
    pub fn run(&self, baseline: &Path, fix: bool) -> Result<Report> {
        let baseline = resolve_baseline(baseline)?;
        info!(
            live = %self.config.live_root().display(),
            baseline = %baseline.display(),
            fix,
            "Starting integrity check"
        );

        let mut report = self.compare(&baseline)?;
        self.find_non_core(&baseline, &mut report)?;

        if fix {
            let summary = self.repair(&baseline, &mut report)?;
            info!(updated = summary.updated, failed = summary.failed, "Repair finished");
        }

        Ok(report)
    }

    /// Walk the baseline and classify each of its files in the live tree.
    pub fn compare(&self, baseline: &Path) -> Result<Report> {
        let baseline = resolve_baseline(baseline)?;
        let start = self.config.start_in(&baseline);
        let report = Mutex::new(Report::new());

        if !start.exists() {
            debug!(start = %start.display(), "Scope absent from baseline, nothing to compare");
            return Ok(report.into_inner());
        }

        let live_root = self.config.live_root();
        let verbose = self.config.verbose();

        visit_tree(&baseline, &start, self.config.skip(), self.config.workers(), |entry| {
            if self.config.boundary().contains(&entry.relative) {
                return Visit::SkipSubtree;
            }
            if entry.is_dir {
                return Visit::Continue;
            }

            let live = entry.relative.under(live_root);
            match classify(&entry.path, &live) {
                Ok(DriftStatus::Matched) if !verbose => {}
                Ok(status) => {
                    debug!(path = %entry.relative, ?status, "classified");
                    if let Err(e) = report.lock().record(entry.relative.clone(), status) {
                        warn!(path = %entry.relative, error = %e, "Could not record drift");
                    }
                }
                Err(e) => {
                    warn!(path = %entry.relative, error = %e, "Could not hash file");
                    report
                        .lock()
                        .record_issue(entry.relative.clone(), IssueKind::Unreadable, e.to_string());
                }
            }
            Visit::Continue
        })?;

        Ok(report.into_inner())
    }

    /// Walk the live tree and record every path absent from the baseline.
    ///
    /// A non-core directory is recorded once; its contents are not listed.
    pub fn find_non_core(&self, baseline: &Path, report: &mut Report) -> Result<()> {
        let baseline = resolve_baseline(baseline)?;
        let start = self.config.start_in(self.config.live_root());
        let found = Mutex::new(Vec::new());

        if !start.exists() {
            return Ok(());
        }

        visit_tree(
            self.config.live_root(),
            &start,
            self.config.skip(),
            self.config.workers(),
            |entry: &PathEntry| {
                if self.config.boundary().contains(&entry.relative) {
                    return Visit::SkipSubtree;
                }
                if exists(&entry.relative.under(&baseline)) {
                    return Visit::Continue;
                }

                warn!("Non-core path found - {}", entry.relative);
                found.lock().push(entry.relative.clone());
                if entry.is_dir {
                    Visit::SkipSubtree
                } else {
                    Visit::Continue
                }
            },
        )?;

        for path in found.into_inner() {
            report.record(path, DriftStatus::Extra)?;
        }
        Ok(())
    }

    /// Copy baseline content over every changed or missing live path.
    ///
    /// A path that cannot be copied is recorded as a [`IssueKind::CopyFailure`]
    /// and the pass moves on.
    pub fn repair(&self, baseline: &Path, report: &mut Report) -> Result<RepairSummary> {
        let baseline = resolve_baseline(baseline)?;
        let drifted: Vec<NormalizedPath> = report.drifted().cloned().collect();
        let mut summary = RepairSummary::default();

        for relative in drifted {
            let source = relative.under(&baseline);
            let dest = relative.under(self.config.live_root());
            info!("copying {} -> {}", source.display(), dest.display());

            match io::copy_atomic(&source, &dest) {
                Ok(_) => {
                    report.record(relative, DriftStatus::Updated)?;
                    summary.updated += 1;
                }
                Err(e) => {
                    warn!(path = %relative, error = %e, "Could not repair");
                    report.record_issue(relative, IssueKind::CopyFailure, e.to_string());
                    summary.failed += 1;
                }
            }
        }

        Ok(summary)
    }
}

/// Compare `live_root` against `baseline_root` without repairing.
///
/// Uses the default content boundary.
pub fn check(live_root: &Path, baseline_root: &Path, skip: &SkipList, verbose: bool) -> Result<Report> {
    let config = ScanConfig::new(live_root)?
        .with_skip(skip.clone())
        .with_verbose(verbose);
    IntegrityEngine::new(&config).run(baseline_root, false)
}

fn resolve_baseline(baseline: &Path) -> Result<PathBuf> {
    canonical_dir(baseline).ok_or_else(|| Error::BaselineNotFound {
        path: baseline.to_path_buf(),
    })
}

/// Existence without following a final symlink, so dangling links count.
fn exists(path: &Path) -> bool {
    path.symlink_metadata().is_ok()
}

/// Classify one baseline file against its live counterpart.
///
/// A live file standing where the baseline has a parent directory leaves the
/// path unreachable, so it counts as missing.
fn classify(baseline_file: &Path, live: &Path) -> std::io::Result<DriftStatus> {
    match live.metadata() {
        Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory) => {
            return Ok(DriftStatus::Missing);
        }
        Err(e) => return Err(e),
        Ok(meta) if meta.is_dir() => return Ok(DriftStatus::Changed),
        Ok(_) => {}
    }

    if checksum::files_match(baseline_file, live)? {
        Ok(DriftStatus::Matched)
    } else {
        Ok(DriftStatus::Changed)
    }
}
