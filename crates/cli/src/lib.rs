//! CLI for Render Bench.
//!
//! This crate provides the command-line interface, including the `run`
//! subcommand that audits every target and persists the results.

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod config;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use render_bench_adapters::prelude::*;
use render_bench_benchmarks::{summarize, ResultSet, ResultsStore};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::config::BenchConfig;

/// Render Bench CLI.
#[derive(Parser, Debug)]
#[command(name = "render-bench")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to ./render-bench.toml when present).
    #[arg(short, long, global = true, env = "RENDER_BENCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Audit every target and persist the results.
    ///
    /// Writes a new `benchmark-<timestamp>.json` snapshot and replaces
    /// `latest.json` in the results directory, then prints a summary.
    Run {
        /// Results directory override.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Base URL override for the default targets.
        #[arg(long)]
        base_url: Option<String>,

        /// Also write a markdown report (`summary.md`).
        #[arg(long)]
        markdown: bool,
    },

    /// Print the summary of the latest run.
    Latest {
        /// Results directory override.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List stored snapshots.
    List {
        /// Results directory override.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show configuration and environment status.
    Status {
        /// Show detailed status information.
        #[arg(short, long)]
        detailed: bool,
    },
}

/// Install the global tracing subscriber.
///
/// Filtering follows `RUST_LOG` (default `info`). JSON output is selected by
/// `json` or `LOG_FORMAT=json`.
pub fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = json || std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

/// Run the CLI with the process arguments.
///
/// # Returns
///
/// Returns `Ok(())` on success, or an error if the command fails.
pub fn run() -> Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let mut config = BenchConfig::load(cli.config.as_deref()).context("failed to load configuration")?;

    match cli.command {
        Commands::Run {
            output,
            base_url,
            markdown,
        } => {
            if let Some(output) = output {
                config.results_dir = output;
            }
            if let Some(base_url) = base_url {
                config.base_url = base_url;
            }
            run_benchmarks(&config, markdown)
        }
        Commands::Latest { output } => {
            let store = ResultsStore::new(output.unwrap_or(config.results_dir));
            let results = store
                .read_latest()
                .with_context(|| format!("no results found in {}", store.dir().display()))?;
            print!("{}", summarize(&results));
            Ok(())
        }
        Commands::List { output } => {
            let store = ResultsStore::new(output.unwrap_or(config.results_dir));
            let snapshots = store.list_snapshots().context("failed to read results")?;
            for snapshot in &snapshots {
                println!(
                    "{}  {} targets, {} failed",
                    snapshot.filename,
                    snapshot.data.len(),
                    snapshot.data.failure_count()
                );
            }
            println!("{} snapshot(s)", snapshots.len());
            Ok(())
        }
        Commands::Status { detailed } => {
            print_status(&config, detailed);
            Ok(())
        }
    }
}

/// Audit all configured targets, persist the result set and print the summary.
///
/// The summary is printed even when persisting fails; the persistence error
/// is returned afterwards.
pub fn run_benchmarks(config: &BenchConfig, markdown: bool) -> Result<()> {
    let targets = config.targets();
    info!(
        targets = targets.len(),
        results_dir = %config.results_dir.display(),
        "Starting benchmark run"
    );
    let orchestrator = RunOrchestrator::new(
        Arc::new(ChromeLauncher::new(config.browser.clone())),
        AuditRunner::new(Arc::new(LighthouseAuditor::new(config.audit.clone()))),
    );

    // Audits are strictly sequential; a single-threaded runtime is enough.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    let results = runtime
        .block_on(orchestrator.run_all(&targets))
        .context("benchmark run failed")?;

    report_outcomes(&results);

    let store = ResultsStore::new(&config.results_dir);
    let persisted = persist(&store, &results, markdown);
    match &persisted {
        Ok(()) => info!(
            targets = results.len(),
            failed = results.failure_count(),
            "Benchmark run complete"
        ),
        Err(e) => error!(error = %format!("{e:#}"), "Failed to persist results"),
    }

    println!();
    print!("{}", summarize(&results));
    persisted
}

fn persist(store: &ResultsStore, results: &ResultSet, markdown: bool) -> Result<()> {
    let snapshot = store.persist(results).context("failed to save results")?;
    println!("Results saved to: {}", snapshot.path.display());
    println!("Latest results saved to: {}", store.latest_path().display());

    if markdown {
        let path = store
            .write_summary(results)
            .context("failed to write markdown report")?;
        println!("Markdown report saved to: {}", path.display());
    }
    Ok(())
}

fn report_outcomes(results: &ResultSet) {
    for result in results {
        match (result.metrics(), result.error()) {
            (Some(metrics), _) => println!(
                "{} {}: Performance Score = {:.1}",
                "ok".green(),
                result.target.name,
                metrics.performance
            ),
            (None, Some(error)) => println!("{} {}: {}", "failed".red(), result.target.name, error),
            (None, None) => {}
        }
    }
}

fn print_status(config: &BenchConfig, detailed: bool) {
    println!("Render Bench");
    println!("Version: {}", env!("CARGO_PKG_VERSION"));
    println!("Results directory: {}", config.results_dir.display());

    let launcher = ChromeLauncher::new(config.browser.clone());
    match launcher.resolve_binary() {
        Ok(path) => println!("Browser: {}", path.display()),
        Err(e) => println!("Browser: {}", e.to_string().yellow()),
    }
    println!("Lighthouse: {}", config.audit.lighthouse_path.display());

    if detailed {
        println!("\nTargets:");
        for target in config.targets() {
            println!(
                "  - {} [{}] {}",
                target.name, target.render_method, target.url
            );
        }
        let throttling = &config.audit.throttling;
        println!("\nThrottling:");
        println!("  - rtt: {}ms", throttling.rtt_ms);
        println!("  - throughput: {}kbps", throttling.throughput_kbps);
        println!("  - cpu slowdown: {}x", throttling.cpu_slowdown_multiplier);
    }
}
