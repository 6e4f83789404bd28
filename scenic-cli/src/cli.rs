//! CLI argument parsing using clap derive API
//!
//! This module defines the command-line interface structure using clap's derive macros.
//! It is purely declarative with no side effects or I/O.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Scenic -- scenario-scoped BDD execution bridge.
///
/// Use `scenic <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "scenic", version, about, long_about = None)]
pub struct Cli {
    /// Path to the options file. Defaults to `scenic.toml`, skipped when absent.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Define a system property (`-D cucumber.filter.tags=@smoke`). Repeatable.
    #[arg(short = 'D', value_name = "KEY=VALUE", global = true)]
    pub define: Vec<String>,

    /// Ignore `CUCUMBER_*` environment variables.
    #[arg(long, global = true)]
    pub no_env: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Inspect the resolved run options.
    Options(OptionsArgs),
}

// ---- options ----

/// Inspect the run options resolved from file, environment, and overrides.
#[derive(Args, Debug)]
pub struct OptionsArgs {
    #[command(subcommand)]
    pub action: OptionsAction,

    #[command(flatten)]
    pub overrides: OptionOverrides,
}

#[derive(Subcommand, Debug)]
pub enum OptionsAction {
    /// Show the effective options (file + env + properties + overrides + defaults).
    Show,
    /// Validate the effective options and report errors.
    Validate,
    /// Print the effective options as `cucumber.*` property lines.
    Export,
}

/// Command-line option overrides, the highest-precedence layer.
#[derive(Args, Debug, Default, Clone)]
pub struct OptionOverrides {
    /// Feature paths to discover. Repeatable.
    #[arg(long = "features", value_name = "PATH", global = true)]
    pub features: Vec<String>,

    /// Glue namespaces. Repeatable.
    #[arg(long, value_name = "NAMESPACE", global = true)]
    pub glue: Vec<String>,

    /// Tag expression (`@smoke and not @slow`). Repeatable; all must match.
    #[arg(long, value_name = "EXPR", global = true)]
    pub tags: Vec<String>,

    /// Scenario name regex. Repeatable; any may match.
    #[arg(long, value_name = "REGEX", global = true)]
    pub name: Vec<String>,

    /// Plugin specification (`json:target/report.json`). Repeatable.
    #[arg(long, value_name = "PLUGIN", global = true)]
    pub plugin: Vec<String>,

    /// Number of worker threads.
    #[arg(long, global = true)]
    pub threads: Option<usize>,

    /// Maximum number of scenarios to run (0 = unlimited).
    #[arg(long, global = true)]
    pub limit: Option<usize>,

    /// Discover and report without executing steps.
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Disable ANSI colors.
    #[arg(long, global = true)]
    pub monochrome: bool,

    /// Fail if any scenario passes (work in progress).
    #[arg(long, global = true)]
    pub wip: bool,
}
