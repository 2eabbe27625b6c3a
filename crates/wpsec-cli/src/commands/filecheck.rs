//! File integrity check and repair

use std::path::{Path, PathBuf};

use colored::Colorize;
use serde::Serialize;
use wpsec_core::{
    BaselineProvider, DirectoryBaseline, IntegrityEngine, Release, ReleaseCache, Report,
    ReportSummary, ScanConfig, baseline::locale_from_env, detect_version,
};

use crate::error::{CliError, Result};
use crate::render;
use crate::settings::Settings;

/// Flags of the `filecheck` command.
#[derive(Debug, Clone, Default)]
pub struct FilecheckOptions {
    pub baseline: Option<PathBuf>,
    pub cache: Option<PathBuf>,
    pub wp_version: Option<String>,
    pub locale: Option<String>,
    pub fix: bool,
    pub directory: Option<String>,
    pub skip: Vec<String>,
    pub content_dirs: Vec<String>,
    pub workers: Option<usize>,
    pub json: bool,
    pub verbose: bool,
}

#[derive(Serialize)]
struct FilecheckOutput<'a> {
    baseline: &'a Path,
    summary: ReportSummary,
    report: &'a Report,
}

/// Run the filecheck command
///
/// Returns `false` when some path could not be checked or repaired.
pub fn run_filecheck(live_root: &Path, settings: &Settings, opts: &FilecheckOptions) -> Result<bool> {
    let mut config = ScanConfig::new(live_root)?
        .with_skip(settings.skip_list(&opts.skip))
        .with_boundary(settings.boundary(&opts.content_dirs))
        .with_workers(settings.workers(opts.workers))
        .with_verbose(opts.verbose);
    if let Some(directory) = &opts.directory {
        config = config.with_scope(directory)?;
    }

    let baseline = resolve_baseline(config.live_root(), settings, opts)?;

    if !opts.json {
        println!(
            "{} Checking {} against {}",
            "=>".blue().bold(),
            config.live_root().display(),
            baseline.display()
        );
    }

    let report = IntegrityEngine::new(&config).run(&baseline, opts.fix)?;
    let summary = report.summary();

    if opts.json {
        let output = FilecheckOutput {
            baseline: &baseline,
            summary,
            report: &report,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(report.issues().is_empty());
    }

    if report.iter().next().is_some() {
        print!("{}", render::drift_table(&report, opts.verbose));
    }
    render::print_non_core(&report);

    if !report.issues().is_empty() {
        println!();
        println!("{} Some paths could not be processed:", "ERROR".red().bold());
        render::print_issues(report.issues());
    }

    println!();
    print_summary(&summary, opts.fix);
    Ok(report.issues().is_empty())
}

fn print_summary(summary: &ReportSummary, fix: bool) {
    let drifted = summary.changed + summary.missing;
    if drifted == 0 {
        println!("{} No changed or missing core files.", "OK".green().bold());
    } else if fix {
        println!(
            "{} {} changed, {} missing, {} restored.",
            "FIXED".green().bold(),
            summary.changed,
            summary.missing,
            summary.updated
        );
    } else {
        println!(
            "{} {} changed, {} missing.",
            "DRIFTED".red().bold(),
            summary.changed,
            summary.missing
        );
        println!("Run {} to restore them.", "wp-secure filecheck --fix".cyan());
    }
    if summary.non_core > 0 {
        println!(
            "{} {} non-core path(s) left untouched.",
            "WARN".yellow().bold(),
            summary.non_core
        );
    }
}

/// Pick the baseline directory: explicit directory first, then the cache.
fn resolve_baseline(live_root: &Path, settings: &Settings, opts: &FilecheckOptions) -> Result<PathBuf> {
    if let Some(dir) = opts.baseline.as_ref().or(settings.baseline.as_ref()) {
        // A fixed directory serves any release.
        return Ok(DirectoryBaseline::new(dir).provide(&Release::default())?);
    }

    let Some(cache) = opts.cache.as_ref().or(settings.cache.as_ref()) else {
        return Err(CliError::user(
            "No baseline given: pass --baseline <DIR> or --cache <DIR>",
        ));
    };

    let version = match &opts.wp_version {
        Some(version) => version.clone(),
        None => detect_version(live_root)?,
    };
    let locale = opts.locale.clone().unwrap_or_else(locale_from_env);
    let release = Release::new(version, locale);
    tracing::debug!(version = %release.version, locale = %release.locale, "Using cached release");

    Ok(ReleaseCache::new(cache).provide(&release)?)
}
