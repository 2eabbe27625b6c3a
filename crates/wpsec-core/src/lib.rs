//! Integrity and permission reconciliation for WordPress trees
//!
//! This crate compares an installed ("live") tree against a trusted
//! ("baseline") copy and normalizes permission bits, implementing:
//!
//! - **IntegrityEngine**: matched / changed / missing / non-core classification
//!   and atomic repair from the baseline
//! - **PermissionEngine**: policy-driven chmod sweep with last-rule-wins
//!   pattern overrides
//! - **Report**: the per-run record both engines write into
//! - **BaselineProvider**: where baseline trees come from
//!
//! # Architecture
//!
//! ```text
//!                  wpsec-cli
//!                      |
//!                 wpsec-core
//!     +--------+-------+--------+----------+
//!     |        |       |        |          |
//!  integrity permissions policy report  baseline
//!     |        |
//!     +-- dispatch (sequential / per-subtree workers)
//!                      |
//!                  wpsec-fs
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use wpsec_core::{IntegrityEngine, ScanConfig};
//!
//! fn audit() -> wpsec_core::Result<()> {
//!     let config = ScanConfig::new("/srv/site")?.with_verbose(true);
//!     let report = IntegrityEngine::new(&config).run(Path::new("/tmp/base"), false)?;
//!     for row in report.export() {
//!         println!("{:?}", row.cells());
//!     }
//!     Ok(())
//! }
//! ```

pub mod baseline;
pub mod config;
mod dispatch;
pub mod error;
pub mod integrity;
pub mod mode;
pub mod permissions;
pub mod policy;
pub mod report;

pub use baseline::{BaselineProvider, DirectoryBaseline, Release, ReleaseCache, detect_version};
pub use config::{ContentBoundary, DEFAULT_CONTENT_DIR, DEFAULT_SKIP, ScanConfig};
pub use error::{Error, Result};
pub use integrity::{IntegrityEngine, RepairSummary, check};
pub use mode::FileMode;
pub use permissions::{PermissionEngine, apply};
pub use policy::{DEFAULT_PROFILE, PathPolicy, PermissionRule, PolicyDocument, PolicyProfile};
pub use report::{
    DriftFlags, DriftStatus, IssueKind, PathIssue, PermissionChange, Report, ReportEntry, ReportRow,
    ReportSummary,
};
pub use wpsec_fs::{NormalizedPath, SkipList};
