//! CLI command definitions and handlers

mod analyze;
mod files;
mod rules;

pub use files::{discover_flow_files, discover_flow_files_excluding};

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Parse and validate workers count (1-64)
fn parse_workers(s: &str) -> Result<usize, String> {
    let n: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if n == 0 {
        Err("workers must be at least 1".to_string())
    } else if n > 64 {
        Err("workers cannot exceed 64".to_string())
    } else {
        Ok(n)
    }
}

/// flowlint - static analysis for Mule flow definitions
#[derive(Parser, Debug)]
#[command(name = "flowlint")]
#[command(
    version,
    about = "Static analysis for Mule flow definitions: validation rules, flow complexity and A-E quality ratings",
    after_help = "\
Examples:
  flowlint .                                 Analyze the current project
  flowlint analyze . --format json           JSON output for scripting
  flowlint analyze . --fail-on error         Exit code 1 on errors (CI mode)
  flowlint analyze . --disable-rule flow-naming
  flowlint rules                             List the available rules"
)]
pub struct Cli {
    /// Path to the Mule project (default: current directory)
    #[arg(global = true, default_value = ".")]
    pub path: PathBuf,

    /// Log level when RUST_LOG is not set (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,

    /// Number of parallel workers (1-64, default: CPU count)
    #[arg(long, global = true, value_parser = parse_workers)]
    pub workers: Option<usize>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze the project's flows (default command)
    #[command(after_help = "\
Examples:
  flowlint analyze .                           Analyze current directory
  flowlint analyze . --format json -o out.json Write a JSON report
  flowlint analyze . --flows-dir app/mule      Non-standard flow directory
  flowlint analyze . --max-complexity 15       Raise the complexity limit")]
    Analyze(AnalyzeArgs),

    /// List the available rules and whether they are enabled
    Rules,
}

#[derive(Args, Debug, Clone, Default)]
pub struct AnalyzeArgs {
    /// Output format: text, json (default: [defaults].format or text)
    #[arg(long, short = 'f', value_parser = ["text", "json"])]
    pub format: Option<String>,

    /// Output file path (default: stdout)
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Exit with code 1 if issues at or above this severity are found
    #[arg(long, value_parser = ["error", "warning", "warn", "info"])]
    pub fail_on: Option<String>,

    /// Flow directory relative to the project root (default: src/main/mule)
    #[arg(long)]
    pub flows_dir: Option<String>,

    /// Skip specific rules (repeatable)
    #[arg(long)]
    pub disable_rule: Vec<String>,

    /// Override the flow-complexity rule's max_complexity option
    #[arg(long)]
    pub max_complexity: Option<i64>,
}

/// Run the CLI command
pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Some(Commands::Analyze(args)) => analyze::run(&cli.path, cli.workers, args),
        Some(Commands::Rules) => rules::run(&cli.path),
        None => analyze::run(&cli.path, cli.workers, AnalyzeArgs::default()),
    }
}
