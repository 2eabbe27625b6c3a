//! wp-secure CLI
//!
//! Checks a WordPress installation against a pristine release and resets
//! file permissions from a policy.

mod cli;
mod commands;
mod error;
mod logging;
mod render;
mod settings;

use clap::{CommandFactory, Parser};
use colored::Colorize;

use cli::{Cli, Commands};
use commands::{FilecheckOptions, PermsOptions};
use error::Result;
use settings::Settings;

fn main() {
    match run() {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            std::process::exit(1);
        }
    }
}

/// Returns `false` when the command finished with per-path issues.
fn run() -> Result<bool> {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    tracing::debug!("Verbose mode enabled");

    let Some(command) = cli.command else {
        println!("{} WordPress integrity and permissions", "wp-secure".green().bold());
        println!();
        println!("Run {} for available commands.", "wp-secure --help".cyan());
        return Ok(true);
    };

    match command {
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "wp-secure", &mut std::io::stdout());
            Ok(true)
        }
        Commands::Filecheck {
            baseline,
            cache,
            wp_version,
            locale,
            fix,
            directory,
            skip,
            content_dirs,
            workers,
            json,
        } => {
            let settings = Settings::load(&cli.path, cli.config.as_deref())?;
            let opts = FilecheckOptions {
                baseline,
                cache,
                wp_version,
                locale,
                fix,
                directory,
                skip,
                content_dirs,
                workers,
                json,
                verbose: cli.verbose,
            };
            commands::run_filecheck(&cli.path, &settings, &opts)
        }
        Commands::Perms {
            policy,
            profile,
            directory,
            skip,
            dry_run,
            workers,
            json,
        } => {
            let settings = Settings::load(&cli.path, cli.config.as_deref())?;
            let opts = PermsOptions {
                policy,
                profile,
                directory,
                skip,
                dry_run,
                workers,
                json,
                verbose: cli.verbose,
            };
            commands::run_perms(&cli.path, &settings, &opts)
        }
    }
}
