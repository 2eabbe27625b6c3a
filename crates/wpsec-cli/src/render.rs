//! Terminal rendering of reports

use colored::Colorize;
use wpsec_core::{IssueKind, PathIssue, Report, ReportRow};

/// Render rows as a left-aligned, space-padded table.
///
/// Cells are padded before colouring so escape codes do not skew columns.
pub fn table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    let mut out = String::new();
    let header: Vec<String> = headers
        .iter()
        .zip(&widths)
        .map(|(h, w)| format!("{:<w$}", h, w = *w).bold().to_string())
        .collect();
    out.push_str(header.join("  ").trim_end());
    out.push('\n');

    for row in rows {
        let cells: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, w)| {
                let padded = format!("{:<w$}", cell, w = *w);
                if cell == "yes" {
                    padded.yellow().to_string()
                } else {
                    padded
                }
            })
            .collect();
        out.push_str(cells.join("  ").trim_end());
        out.push('\n');
    }
    out
}

/// Drift table: file, changed, missing, fixed, plus matched when verbose.
pub fn drift_table(report: &Report, verbose: bool) -> String {
    let columns = if verbose { 5 } else { 4 };
    let headers = ["file", "changed", "missing", "fixed", "matched"];
    let rows: Vec<Vec<String>> = report
        .export()
        .iter()
        .map(|row: &ReportRow| {
            row.cells()[..columns]
                .iter()
                .map(|c| c.to_string())
                .collect()
        })
        .collect();
    table(&headers[..columns], &rows)
}

pub fn print_non_core(report: &Report) {
    for path in report.non_core() {
        println!("{} Non-core path found - {}", "WARN".yellow().bold(), path);
    }
}

pub fn print_issues(issues: &[PathIssue]) {
    for issue in issues {
        let label = match issue.kind {
            IssueKind::Unreadable => "unreadable",
            IssueKind::CopyFailure => "copy failed",
            IssueKind::PermissionChangeFailure => "chmod failed",
        };
        println!(
            "   {} {} ({}): {}",
            "!".red(),
            issue.path.as_str().cyan(),
            label.dimmed(),
            issue.message
        );
    }
}
