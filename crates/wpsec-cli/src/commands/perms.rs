//! Permission reset

use std::path::{Path, PathBuf};

use colored::Colorize;
use serde::Serialize;
use wpsec_core::{DEFAULT_PROFILE, PermissionChange, PermissionEngine, PolicyDocument, ScanConfig};

use crate::error::Result;
use crate::render;
use crate::settings::Settings;

/// Flags of the `perms` command.
#[derive(Debug, Clone, Default)]
pub struct PermsOptions {
    pub policy: Option<PathBuf>,
    pub profile: Option<String>,
    pub directory: Option<String>,
    pub skip: Vec<String>,
    pub dry_run: bool,
    pub workers: Option<usize>,
    pub json: bool,
    pub verbose: bool,
}

#[derive(Serialize)]
struct PermsOutput<'a> {
    profile: &'a str,
    dry_run: bool,
    changes: &'a [PermissionChange],
    issues: &'a [wpsec_core::PathIssue],
}

/// Run the perms command
///
/// Returns `false` when some path could not be changed.
pub fn run_perms(live_root: &Path, settings: &Settings, opts: &PermsOptions) -> Result<bool> {
    let policy_path = opts.policy.as_ref().or(settings.policy.as_ref());
    let document = match policy_path {
        Some(path) => PolicyDocument::load(path)?,
        None => PolicyDocument::builtin(),
    };
    let profile_name = opts
        .profile
        .as_deref()
        .or(settings.profile.as_deref())
        .unwrap_or(DEFAULT_PROFILE);
    let profile = document.profile(profile_name)?;

    // Every change is listed when previewing.
    let mut config = ScanConfig::new(live_root)?
        .with_skip(settings.skip_list(&opts.skip))
        .with_workers(settings.workers(opts.workers))
        .with_verbose(opts.verbose || opts.dry_run || opts.json)
        .with_dry_run(opts.dry_run);
    if let Some(directory) = &opts.directory {
        config = config.with_scope(directory)?;
    }

    if !opts.json {
        println!(
            "{} Applying profile {} to {}",
            "=>".blue().bold(),
            profile.name().cyan(),
            config.live_root().display()
        );
    }

    let report = PermissionEngine::new(&config).apply(&profile)?;

    if opts.json {
        let output = PermsOutput {
            profile: profile.name(),
            dry_run: opts.dry_run,
            changes: report.permissions(),
            issues: report.issues(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(report.issues().is_empty());
    }

    if !report.permissions().is_empty() {
        let rows: Vec<Vec<String>> = report
            .permissions()
            .iter()
            .map(|change| {
                vec![
                    change.path.to_string(),
                    change.previous.map_or_else(|| "?".to_string(), |m| m.to_string()),
                    change.mode.to_string(),
                ]
            })
            .collect();
        print!("{}", render::table(&["path", "was", "mode"], &rows));
    }

    if !report.issues().is_empty() {
        println!();
        println!("{} Some permissions could not be changed:", "ERROR".red().bold());
        render::print_issues(report.issues());
        return Ok(false);
    }

    if opts.dry_run {
        println!(
            "{} Dry run: {} path(s) would be updated.",
            "=>".blue().bold(),
            report.permissions().len()
        );
    } else {
        println!("{} Permissions reset.", "OK".green().bold());
    }
    Ok(true)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use wpsec_test_utils::TreeFixture;

    #[test]
    fn builtin_default_profile_is_used() {
        let tree = TreeFixture::new().file("index.php", "<?php");
        tree.set_mode("index.php", 0o600);

        let ok = run_perms(tree.path(), &Settings::default(), &PermsOptions::default()).unwrap();

        assert!(ok);
        assert_eq!(tree.mode("index.php"), 0o644);
    }

    #[test]
    fn dry_run_changes_nothing() {
        let tree = TreeFixture::new().file("index.php", "<?php");
        tree.set_mode("index.php", 0o600);
        let opts = PermsOptions {
            dry_run: true,
            ..PermsOptions::default()
        };

        run_perms(tree.path(), &Settings::default(), &opts).unwrap();

        assert_eq!(tree.mode("index.php"), 0o600);
    }

    #[test]
    fn policy_file_from_settings() {
        let tree = TreeFixture::new()
            .file("index.php", "<?php")
            .file("perms.yml", "default:\n  file: '0640'\n  directory: '0750'\n");
        let settings = Settings {
            policy: Some(tree.join("perms.yml")),
            ..Settings::default()
        };

        run_perms(tree.path(), &settings, &PermsOptions::default()).unwrap();

        assert_eq!(tree.mode("index.php"), 0o640);
    }

    #[test]
    fn unknown_profile_is_fatal() {
        let tree = TreeFixture::new();
        let opts = PermsOptions {
            profile: Some("nope".into()),
            ..PermsOptions::default()
        };

        let result = run_perms(tree.path(), &Settings::default(), &opts);
        assert!(matches!(
            result,
            Err(crate::error::CliError::Core(wpsec_core::Error::InvalidPolicyProfile { .. }))
        ));
    }
}
