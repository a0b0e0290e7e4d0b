#![warn(missing_docs)]
//! Gridbench CLI Library
//!
//! This module provides the CLI infrastructure for benchmark binaries.
//! Use `gridbench::run()` (or `gridbench_cli::run()`) in your main function to
//! get the full gridbench CLI experience with your registered suites.
//!
//! # Example
//!
//! ```ignore
//! use gridbench::prelude::*;
//!
//! fn register(h: &Harness) {
//!     h.register_simple(SimpleBench::new("parse_u64").case("decimal", || {
//!         let _ = "12345".parse::<u64>();
//!     }));
//! }
//!
//! gridbench::suite!("suites/parse.rs", register);
//!
//! fn main() {
//!     if let Err(e) = gridbench::run() {
//!         eprintln!("Error: {}", e);
//!         std::process::exit(1);
//!     }
//! }
//! ```

mod config;
mod discover;
mod preflight;

pub use config::*;
pub use discover::{discover_paths, plan_suites, registered_suites, SuitePlan};
pub use preflight::{check_preflight, PreflightError};

use clap::{Parser, Subcommand};
use gridbench_core::{Harness, RegistryLoader, RunSummary, SessionConfig};
use gridbench_report::{generate_json_report, RunReport};
use regex::Regex;
use std::path::PathBuf;
use std::time::Duration;

/// Gridbench CLI arguments
#[derive(Parser, Debug)]
#[command(name = "gridbench")]
#[command(author, version, about = "Gridbench - micro-benchmark harness with parameter grids")]
pub struct Cli {
    /// Optional subcommand (List, Run); defaults to Run
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Glob patterns matched against registered suite paths
    #[arg(value_name = "PATTERN")]
    pub patterns: Vec<String>,

    /// Only run benchmarks whose name matches this regex
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Time budget per case (e.g., "250ms", "1s"; bare numbers are milliseconds)
    #[arg(short, long)]
    pub budget: Option<String>,

    /// Write a JSON run report to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// CPU to pin the process to (overrides gridbench.toml)
    #[arg(long)]
    pub pin: Option<usize>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Internal: Absorb cargo bench's --bench flag
    #[arg(long, hide = true)]
    pub bench: bool,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List registered suites and which ones the patterns select
    List,
    /// Run benchmarks (default)
    Run,
}

/// Run the Gridbench CLI with the given arguments.
/// This is the main entry point for benchmark binaries.
///
/// # Returns
/// Returns `Ok(())` on success, or an error if something goes wrong.
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    run_with_cli(cli)
}

/// Run the Gridbench CLI with pre-parsed arguments.
pub fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    // Initialize logging; stderr keeps the result stream on stdout clean
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("gridbench=debug")
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter("gridbench=info")
            .with_writer(std::io::stderr)
            .init();
    }

    // Discover gridbench.toml configuration (CLI flags override)
    let config = GridConfig::discover().unwrap_or_default();

    match cli.command {
        Some(Commands::List) => list_suites(&cli, &config),
        Some(Commands::Run) | None => run_benchmarks(&cli, &config),
    }
}

/// Resolve the per-case budget by layering: gridbench.toml default, then CLI override.
fn resolve_budget(cli: &Cli, config: &GridConfig) -> anyhow::Result<Duration> {
    if let Some(ref text) = cli.budget {
        let ns = GridConfig::parse_duration(text)?;
        return Ok(Duration::from_nanos(ns));
    }
    // Config file values fall back to the default on parse errors
    let ns = GridConfig::parse_duration(&config.runner.budget).unwrap_or(1_000_000_000);
    Ok(Duration::from_nanos(ns))
}

/// Resolve discovery patterns: positional CLI patterns win over gridbench.toml.
fn resolve_patterns(cli: &Cli, config: &GridConfig) -> Vec<String> {
    if cli.patterns.is_empty() {
        config.discovery.patterns.clone()
    } else {
        cli.patterns.clone()
    }
}

fn list_suites(cli: &Cli, config: &GridConfig) -> anyhow::Result<()> {
    println!("Gridbench Plan:");

    let patterns = resolve_patterns(cli, config);
    let plan = discover_paths(&patterns)?;
    let selected: std::collections::BTreeSet<&str> =
        plan.paths.iter().map(|p| p.as_str()).collect();

    let suites = registered_suites();
    let mut total = 0;
    for path in &suites {
        if selected.contains(path) {
            println!("├── {}", path);
            total += 1;
        } else {
            println!("├── {} (not selected)", path);
        }
    }

    println!("{} of {} suites selected.", total, suites.len());
    Ok(())
}

fn run_benchmarks(cli: &Cli, config: &GridConfig) -> anyhow::Result<()> {
    let pin = cli.pin.unwrap_or(config.runner.pin_cpu);
    check_preflight(pin)?;

    let budget = resolve_budget(cli, config)?;
    let filter = match cli.filter.as_deref() {
        Some(pattern) => Some(
            Regex::new(pattern)
                .map_err(|e| anyhow::anyhow!("Invalid filter pattern '{}': {}", pattern, e))?,
        ),
        None => None,
    };

    let patterns = resolve_patterns(cli, config);
    let plan = discover_paths(&patterns)?;
    if plan.paths.is_empty() {
        println!("No suites found.");
        return Ok(());
    }

    println!(
        "Running {} suite file(s), budget {:?} per case...\n",
        plan.paths.len(),
        budget
    );

    let session = SessionConfig {
        default_budget: budget,
        filter,
    };

    // Registration is cooperative and single-threaded, so the whole
    // session runs on a local task set.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let local = tokio::task::LocalSet::new();
    let summary = local.block_on(&runtime, async {
        let (harness, done) = Harness::new(session);
        let mut loader = RegistryLoader;
        for path in &plan.paths {
            harness.append_file(path, &mut loader)?;
        }
        harness.finish();
        let summary = done
            .await
            .map_err(|_| anyhow::anyhow!("benchmark session ended without a summary"))?;
        anyhow::Ok(summary)
    })?;

    write_report_if_needed(cli, config, &summary, budget)?;

    // Exit with appropriate code
    let code = summary.exit_code();
    if code != 0 {
        eprintln!("\n{} benchmark(s) failed during execution", summary.totals.failed);
        std::process::exit(code);
    }

    Ok(())
}

/// Write the JSON run report if an output path was configured.
fn write_report_if_needed(
    cli: &Cli,
    config: &GridConfig,
    summary: &RunSummary,
    budget: Duration,
) -> anyhow::Result<()> {
    // Resolve path: CLI value > config value
    let path = match cli
        .output
        .clone()
        .or_else(|| config.output.report.as_ref().map(PathBuf::from))
    {
        Some(path) => path,
        None => return Ok(()),
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let report = RunReport::from_run(summary, budget);
    let json = generate_json_report(&report)?;
    std::fs::write(&path, json)?;
    println!("Report written to: {}", path.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli_from(args: &[&str]) -> Cli {
        Cli::parse_from(args)
    }

    #[test]
    fn test_cli_patterns_are_positional() {
        let cli = cli_from(&["gridbench", "suites/parse.rs", "suites/io/*"]);
        assert_eq!(cli.patterns, vec!["suites/parse.rs", "suites/io/*"]);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_cli_list_subcommand() {
        let cli = cli_from(&["gridbench", "list"]);
        assert!(matches!(cli.command, Some(Commands::List)));
    }

    #[test]
    fn test_cli_absorbs_cargo_bench_flag() {
        let cli = cli_from(&["gridbench", "--bench"]);
        assert!(cli.bench);
        assert!(cli.patterns.is_empty());
    }

    #[test]
    fn test_budget_cli_overrides_config() {
        let cli = cli_from(&["gridbench", "--budget", "250ms"]);
        let config = GridConfig {
            runner: RunnerConfig {
                budget: "9s".to_string(),
                ..RunnerConfig::default()
            },
            ..GridConfig::default()
        };
        assert_eq!(
            resolve_budget(&cli, &config).unwrap(),
            Duration::from_millis(250)
        );
    }

    #[test]
    fn test_budget_falls_back_to_config() {
        let cli = cli_from(&["gridbench"]);
        let config = GridConfig {
            runner: RunnerConfig {
                budget: "2s".to_string(),
                ..RunnerConfig::default()
            },
            ..GridConfig::default()
        };
        assert_eq!(
            resolve_budget(&cli, &config).unwrap(),
            Duration::from_secs(2)
        );
    }

    #[test]
    fn test_unparseable_config_budget_uses_default() {
        let cli = cli_from(&["gridbench"]);
        let config = GridConfig {
            runner: RunnerConfig {
                budget: "whenever".to_string(),
                ..RunnerConfig::default()
            },
            ..GridConfig::default()
        };
        assert_eq!(
            resolve_budget(&cli, &config).unwrap(),
            Duration::from_secs(1)
        );
    }

    #[test]
    fn test_invalid_cli_budget_is_an_error() {
        let cli = cli_from(&["gridbench", "--budget", "whenever"]);
        let config = GridConfig::default();
        assert!(resolve_budget(&cli, &config).is_err());
    }

    #[test]
    fn test_patterns_cli_overrides_config() {
        let cli = cli_from(&["gridbench", "suites/a.rs"]);
        let config = GridConfig {
            discovery: DiscoveryConfig {
                patterns: vec!["suites/b.rs".to_string()],
            },
            ..GridConfig::default()
        };
        assert_eq!(resolve_patterns(&cli, &config), vec!["suites/a.rs"]);
    }

    #[test]
    fn test_patterns_default_to_catch_all() {
        let cli = cli_from(&["gridbench"]);
        let config = GridConfig::default();
        assert_eq!(resolve_patterns(&cli, &config), vec!["**"]);
    }
}
