//! vin-watch main entry point
//!
//! This is the command-line interface for the VIN web-search monitor. It is
//! meant to be invoked on a schedule; each invocation performs one run.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use vin_watch::config::{load_config, Config};
use vin_watch::monitor::{print_report, run_once};
use vin_watch::storage::{ledger_stats, open_store, print_ledger_stats, StateStore};
use vin_watch::VinError;

/// vin-watch: alert on new web listings for a VIN
///
/// Searches the web for exact-phrase matches of each configured VIN, drops
/// results already reported by a previous run, and sends one alert listing
/// only the new ones.
#[derive(Parser, Debug)]
#[command(name = "vin-watch")]
#[command(version = "1.0.0")]
#[command(about = "Alert on new web listings for a VIN", long_about = None)]
struct Cli {
    /// Optional TOML configuration file; environment variables override it
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Path of the seen-URL state file
    #[arg(long, value_name = "PATH")]
    state: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be searched without searching
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show what the state file holds and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = match resolve_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return ExitCode::from(e.exit_code());
        }
    };

    let result = if cli.dry_run {
        handle_dry_run(&config);
        Ok(0)
    } else if cli.stats {
        handle_stats(&config)
    } else {
        handle_run(config).await
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("Run aborted: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// `RUST_LOG`, when set, takes precedence over the flags.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if quiet {
            // Only show errors
            EnvFilter::new("error")
        } else {
            match verbose {
                0 => EnvFilter::new("vin_watch=info,warn"),
                1 => EnvFilter::new("vin_watch=debug,info"),
                2 => EnvFilter::new("vin_watch=trace,debug"),
                _ => EnvFilter::new("trace"),
            }
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Loads the file (if any) and environment, then applies `--state`
fn resolve_config(cli: &Cli) -> Result<Config, VinError> {
    if let Some(path) = &cli.config {
        tracing::info!("Loading configuration from: {}", path.display());
    }

    let mut config = load_config(cli.config.as_deref(), |key| std::env::var(key).ok())?;
    if let Some(state) = &cli.state {
        config.state_path = state.clone();
    }

    tracing::debug!("Configuration loaded: {:?}", config);
    Ok(config)
}

/// Handles the --dry-run mode: shows what a run would do
fn handle_dry_run(config: &Config) {
    println!("=== vin-watch dry run ===\n");

    println!("VINs ({}):", config.identifiers.len());
    for identifier in &config.identifiers {
        println!("  - {}", identifier);
    }

    println!("\nSearch:");
    for provider in &config.search.providers {
        println!("  - {}", provider.kind().as_str());
    }
    println!("  Max results: {}", config.search.max_results);
    println!("  Timeout: {}s", config.search.timeout_secs);
    println!("  User agent: {}", config.search.user_agent);

    println!("\nNotify:");
    if let Some(email) = &config.notify.email {
        println!(
            "  - email to {} via {}:{}",
            email.to, email.smtp_server, email.smtp_port
        );
    }
    if config.notify.slack.is_some() {
        println!("  - slack webhook");
    }
    if !config.notify.has_channels() {
        println!("  - console (no channel configured)");
    }

    println!("\nState: {}", config.state_path.display());
    println!("Baseline policy: {}", config.baseline);

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: shows what the ledger holds
fn handle_stats(config: &Config) -> Result<u8, VinError> {
    let store = open_store(&config.state_path);
    let state = store.load()?;
    print_ledger_stats(&store.location(), &ledger_stats(&state));
    Ok(0)
}

/// Handles a normal monitoring run
async fn handle_run(config: Config) -> Result<u8, VinError> {
    let report = run_once(config).await?;
    print_report(&report);

    tracing::info!(
        "Run finished: {} new matches, {} failed searches",
        report.new_url_count(),
        report.failed().len()
    );
    Ok(report.exit_code())
}
