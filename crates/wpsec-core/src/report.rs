//! Per-run drift and permission report
//!
//! A [`Report`] is created empty for one command invocation, filled by the
//! engines and handed to the CLI for display. It is never written to disk.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use wpsec_fs::NormalizedPath;

use crate::mode::FileMode;
use crate::{Error, Result};

/// Observation made about one relative path during an integrity run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriftStatus {
    /// Identical to the baseline
    Matched,
    /// Content differs from the baseline
    Changed,
    /// In the baseline but absent from the live tree
    Missing,
    /// In the live tree but absent from the baseline
    Extra,
    /// Repaired from the baseline
    Updated,
}

/// Accumulated flags for one path. Flags are only ever set, never cleared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriftFlags {
    pub changed: bool,
    pub missing: bool,
    pub updated: bool,
    pub matched: bool,
}

impl DriftFlags {
    /// Changed or missing: eligible for repair.
    pub fn is_drifted(&self) -> bool {
        self.changed || self.missing
    }

    fn union(self, other: DriftFlags) -> DriftFlags {
        DriftFlags {
            changed: self.changed || other.changed,
            missing: self.missing || other.missing,
            updated: self.updated || other.updated,
            matched: self.matched || other.matched,
        }
    }
}

/// Kind of a recoverable, single-path failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// A file could not be read for hashing
    Unreadable,
    /// Baseline content could not be copied over the live path
    CopyFailure,
    /// The target mode could not be applied
    PermissionChangeFailure,
}

/// A per-path error that did not stop the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathIssue {
    pub path: NormalizedPath,
    pub kind: IssueKind,
    pub message: String,
}

/// A mode resolved (and, unless dry-running, applied) to one path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PermissionChange {
    pub path: NormalizedPath,
    pub mode: FileMode,
    /// Mode observed before the change, when it could be read
    pub previous: Option<FileMode>,
    pub applied: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportEntry {
    pub path: NormalizedPath,
    #[serde(flatten)]
    pub flags: DriftFlags,
}

/// One exported row: a path and its four flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub path: String,
    pub changed: bool,
    pub missing: bool,
    pub updated: bool,
    pub matched: bool,
}

impl ReportRow {
    /// Path followed by changed, missing, updated and matched as `yes`/`no`.
    pub fn cells(&self) -> [&str; 5] {
        [
            self.path.as_str(),
            yes_no(self.changed),
            yes_no(self.missing),
            yes_no(self.updated),
            yes_no(self.matched),
        ]
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

/// Counts used for the closing summary line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub matched: usize,
    pub changed: usize,
    pub missing: usize,
    pub updated: usize,
    pub non_core: usize,
    pub permissions: usize,
    pub issues: usize,
}

/// Ordered record of everything observed in one run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Report {
    entries: Vec<ReportEntry>,
    #[serde(skip)]
    index: HashMap<NormalizedPath, usize>,
    non_core: Vec<NormalizedPath>,
    #[serde(skip)]
    non_core_seen: HashSet<NormalizedPath>,
    permissions: Vec<PermissionChange>,
    issues: Vec<PathIssue>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert `status` for `path`, keeping any flags already set.
    ///
    /// `Extra` paths are kept in their own list and never get flags.
    /// `Updated` is refused for a path not previously changed or missing.
    pub fn record(&mut self, path: impl Into<NormalizedPath>, status: DriftStatus) -> Result<()> {
        let path = path.into();

        if status == DriftStatus::Extra {
            if self.non_core_seen.insert(path.clone()) {
                self.non_core.push(path);
            }
            return Ok(());
        }

        let flags = self.flags_mut(path.clone(), status)?;
        match status {
            DriftStatus::Matched => flags.matched = true,
            DriftStatus::Changed => flags.changed = true,
            DriftStatus::Missing => flags.missing = true,
            DriftStatus::Updated => flags.updated = true,
            DriftStatus::Extra => unreachable!("handled above"),
        }
        Ok(())
    }

    fn flags_mut(&mut self, path: NormalizedPath, status: DriftStatus) -> Result<&mut DriftFlags> {
        let idx = match self.index.get(&path) {
            Some(&idx) => idx,
            None => {
                if status == DriftStatus::Updated {
                    return Err(Error::InvalidTransition {
                        path: path.to_string(),
                        status,
                    });
                }
                self.entries.push(ReportEntry {
                    path: path.clone(),
                    flags: DriftFlags::default(),
                });
                self.index.insert(path, self.entries.len() - 1);
                self.entries.len() - 1
            }
        };

        if status == DriftStatus::Updated && !self.entries[idx].flags.is_drifted() {
            return Err(Error::InvalidTransition {
                path: self.entries[idx].path.to_string(),
                status,
            });
        }
        Ok(&mut self.entries[idx].flags)
    }

    pub fn record_issue(&mut self, path: impl Into<NormalizedPath>, kind: IssueKind, message: impl Into<String>) {
        self.issues.push(PathIssue {
            path: path.into(),
            kind,
            message: message.into(),
        });
    }

    pub fn record_permission(&mut self, change: PermissionChange) {
        self.permissions.push(change);
    }

    pub fn flags(&self, path: &str) -> Option<DriftFlags> {
        self.index
            .get(&NormalizedPath::new(path))
            .map(|&idx| self.entries[idx].flags)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
            && self.non_core.is_empty()
            && self.permissions.is_empty()
            && self.issues.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReportEntry> {
        self.entries.iter()
    }

    /// Paths flagged changed or missing, in insertion order.
    pub fn drifted(&self) -> impl Iterator<Item = &NormalizedPath> {
        self.entries
            .iter()
            .filter(|e| e.flags.is_drifted())
            .map(|e| &e.path)
    }

    pub fn non_core(&self) -> &[NormalizedPath] {
        &self.non_core
    }

    pub fn permissions(&self) -> &[PermissionChange] {
        &self.permissions
    }

    pub fn issues(&self) -> &[PathIssue] {
        &self.issues
    }

    /// Rows for a tabular reporter, in insertion order.
    pub fn export(&self) -> Vec<ReportRow> {
        self.entries
            .iter()
            .map(|e| ReportRow {
                path: e.path.to_string(),
                changed: e.flags.changed,
                missing: e.flags.missing,
                updated: e.flags.updated,
                matched: e.flags.matched,
            })
            .collect()
    }

    pub fn summary(&self) -> ReportSummary {
        let count = |pred: fn(&DriftFlags) -> bool| self.entries.iter().filter(|e| pred(&e.flags)).count();
        ReportSummary {
            matched: count(|f| f.matched),
            changed: count(|f| f.changed),
            missing: count(|f| f.missing),
            updated: count(|f| f.updated),
            non_core: self.non_core.len(),
            permissions: self.permissions.len(),
            issues: self.issues.len(),
        }
    }

    /// Fold another report into this one, unioning flags of shared paths.
    pub fn merge(&mut self, other: Report) {
        for entry in other.entries {
            match self.index.get(&entry.path) {
                Some(&idx) => {
                    let flags = &mut self.entries[idx].flags;
                    *flags = flags.union(entry.flags);
                }
                None => {
                    self.index.insert(entry.path.clone(), self.entries.len());
                    self.entries.push(entry);
                }
            }
        }
        for path in other.non_core {
            if self.non_core_seen.insert(path.clone()) {
                self.non_core.push(path);
            }
        }
        self.permissions.extend(other.permissions);
        self.issues.extend(other.issues);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn record_accumulates_flags() {
        let mut report = Report::new();
        report.record("wp-login.php", DriftStatus::Changed).unwrap();
        report.record("wp-login.php", DriftStatus::Updated).unwrap();

        let flags = report.flags("wp-login.php").unwrap();
        assert!(flags.changed);
        assert!(flags.updated);
        assert!(!flags.missing);
        assert_eq!(report.len(), 1);
    }

    #[test]
    fn record_is_idempotent() {
        let mut report = Report::new();
        report.record("a.php", DriftStatus::Missing).unwrap();
        report.record("a.php", DriftStatus::Missing).unwrap();
        assert_eq!(report.len(), 1);
        assert_eq!(report.summary().missing, 1);
    }

    #[test]
    fn updated_requires_prior_drift() {
        let mut report = Report::new();
        assert!(matches!(
            report.record("new.php", DriftStatus::Updated),
            Err(Error::InvalidTransition { .. })
        ));

        report.record("same.php", DriftStatus::Matched).unwrap();
        assert!(report.record("same.php", DriftStatus::Updated).is_err());
        assert!(report.flags("new.php").is_none());
    }

    #[test]
    fn extra_paths_are_listed_once_without_flags() {
        let mut report = Report::new();
        report.record("shell.php", DriftStatus::Extra).unwrap();
        report.record("shell.php", DriftStatus::Extra).unwrap();

        assert_eq!(report.non_core(), &[NormalizedPath::new("shell.php")]);
        assert!(report.flags("shell.php").is_none());
    }

    #[test]
    fn export_keeps_insertion_order_and_renders_yes_no() {
        let mut report = Report::new();
        report.record("wp-settings.php", DriftStatus::Changed).unwrap();
        report.record("index.php", DriftStatus::Matched).unwrap();

        let rows = report.export();
        assert_eq!(rows[0].cells(), ["wp-settings.php", "yes", "no", "no", "no"]);
        assert_eq!(rows[1].cells(), ["index.php", "no", "no", "no", "yes"]);
    }

    #[test]
    fn merge_unions_flags() {
        let mut left = Report::new();
        left.record("a.php", DriftStatus::Changed).unwrap();
        let mut right = Report::new();
        right.record("a.php", DriftStatus::Matched).unwrap();
        right.record("b.php", DriftStatus::Missing).unwrap();
        right.record("c.php", DriftStatus::Extra).unwrap();
        right.record_issue("d.php", IssueKind::CopyFailure, "denied");

        left.merge(right);

        let a = left.flags("a.php").unwrap();
        assert!(a.changed && a.matched);
        assert!(left.flags("b.php").unwrap().missing);
        assert_eq!(left.non_core().len(), 1);
        assert_eq!(left.issues().len(), 1);
        assert_eq!(left.drifted().count(), 2);
    }

    #[test]
    fn serializes_flags_inline() {
        let mut report = Report::new();
        report.record("a.php", DriftStatus::Missing).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["entries"][0]["path"], "a.php");
        assert_eq!(json["entries"][0]["missing"], true);
    }
}
