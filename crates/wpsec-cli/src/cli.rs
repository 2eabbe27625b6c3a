//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// wp-secure - Check a WordPress installation against its release and
/// normalize file permissions
#[derive(Parser, Debug)]
#[command(name = "wp-secure")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// WordPress installation root
    #[arg(long, global = true, env = "WP_SECURE_PATH", default_value = ".")]
    pub path: PathBuf,

    /// Settings file (defaults to wp-secure.toml in the installation root)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Compare installed files against a pristine release
    ///
    /// Files that differ from the release or are missing are listed, and
    /// restored from the release with --fix. Files that are not part of the
    /// release are reported as warnings and never touched.
    ///
    /// Examples:
    ///   wp-secure filecheck --baseline /tmp/wordpress
    ///   wp-secure filecheck --cache ~/.wp-cli/releases --fix
    ///   wp-secure filecheck --baseline /tmp/wordpress --directory wp-admin
    Filecheck {
        /// Directory holding the pristine release
        #[arg(long, conflicts_with = "cache")]
        baseline: Option<PathBuf>,

        /// Release cache laid out as <cache>/<version>/<locale>/wordpress
        #[arg(long)]
        cache: Option<PathBuf>,

        /// Release version to look up in the cache (detected when omitted)
        #[arg(long = "wp-version", requires = "cache")]
        wp_version: Option<String>,

        /// Release locale to look up in the cache (WP_CLI_LOCALE or en_US
        /// when omitted)
        #[arg(long, requires = "cache")]
        locale: Option<String>,

        /// Restore changed and missing files from the release
        #[arg(long)]
        fix: bool,

        /// Only check this subdirectory of the installation
        #[arg(short, long)]
        directory: Option<String>,

        /// File or directory name to ignore (repeatable)
        #[arg(long)]
        skip: Vec<String>,

        /// Subtree holding user content, never checked (repeatable)
        #[arg(long = "content-dir")]
        content_dirs: Vec<String>,

        /// Worker threads
        #[arg(short, long)]
        workers: Option<usize>,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Reset file and directory permissions from a policy
    ///
    /// Examples:
    ///   wp-secure perms
    ///   wp-secure perms --profile hardened --dry-run
    ///   wp-secure perms --policy perms.yml --profile custom
    Perms {
        /// Policy document (YAML, TOML or JSON); built-in policy when omitted
        #[arg(long)]
        policy: Option<PathBuf>,

        /// Profile of the policy to apply
        #[arg(long)]
        profile: Option<String>,

        /// Only sweep this subdirectory of the installation
        #[arg(short, long)]
        directory: Option<String>,

        /// File or directory name to ignore (repeatable)
        #[arg(long)]
        skip: Vec<String>,

        /// Show the modes that would be set without changing anything
        #[arg(long)]
        dry_run: bool,

        /// Worker threads
        #[arg(short, long)]
        workers: Option<usize>,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completions
    ///
    /// Outputs completion script for your shell.
    ///
    /// Examples:
    ///   wp-secure completions bash > ~/.local/share/bash-completion/completions/wp-secure
    ///   wp-secure completions zsh > ~/.zfunc/_wp-secure
    ///   wp-secure completions fish > ~/.config/fish/completions/wp-secure.fish
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}
