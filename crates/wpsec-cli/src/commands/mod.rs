//! Command implementations for wpsec-cli

pub mod filecheck;
pub mod perms;

pub use filecheck::{FilecheckOptions, run_filecheck};
pub use perms::{PermsOptions, run_perms};
