//! docwatch - documentation build orchestrator
//!
//! Entry point for the docwatch CLI.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use docwatch::config::QuartoConfig;
use docwatch::error::InterlinksError;
use docwatch::interlinks::Synchronizer;
use docwatch::logging::init_tracing;
use docwatch::pipeline::{BuildTrigger, CommandPipeline};
use docwatch::watcher::{WatchFilter, WatchSession};
use docwatch::{Error, Result};

/// docwatch - documentation build orchestrator
#[derive(Parser, Debug)]
#[command(name = "docwatch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable JSON logging output
    #[arg(long, env = "DOCWATCH_LOG_JSON", global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate API docs based on the given configuration file
    Build {
        /// Path to the configuration file
        #[arg(long, default_value = "_quarto.yml")]
        config: PathBuf,

        /// Filter to select specific files; '*' selects all
        #[arg(long, default_value = "*")]
        filter: String,

        /// Prevent new documents from being generated
        #[arg(long)]
        dry_run: bool,

        /// Keep running and watch the source directory for changes
        #[arg(long)]
        watch: bool,

        /// Enable verbose logging
        #[arg(long)]
        verbose: bool,
    },

    /// Fetch configured external inventories into the local cache
    Interlinks {
        /// Path to the configuration file
        #[arg(default_value = "_quarto.yml")]
        config: PathBuf,

        /// Fetch and convert, but write no cache files
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Build {
            config,
            filter,
            dry_run,
            watch,
            verbose,
        } => {
            let level = if verbose { "debug" } else { "info" };
            init_tracing(level, cli.log_json);
            run_build(&config, &filter, dry_run, watch).await
        }
        Command::Interlinks { config, dry_run } => {
            init_tracing("info", cli.log_json);
            run_interlinks(&config, dry_run).await
        }
    }
}

/// Directory containing the config file; the pipeline runs from here and
/// cache paths resolve against it.
fn config_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

async fn run_build(config_path: &Path, filter: &str, dry_run: bool, watch: bool) -> Result<()> {
    let config = QuartoConfig::load(config_path)?;
    let dir = config_dir(config_path);

    let pipeline = Arc::new(CommandPipeline::from_config(config.build.as_ref()));
    let trigger = BuildTrigger::new(&dir, filter, pipeline);

    if dry_run {
        tracing::info!("Dry run, skipping doc generation");
        return Ok(());
    }

    if watch {
        let root = config.watch_root(&dir)?;
        println!("Watching {} for changes...", root.display());

        let mut session =
            WatchSession::start(&root, trigger.into_callback(), WatchFilter::new())?;

        // Cooperative shutdown: ctrl-c trips the token, then the session
        // is stopped exactly once and torn down before we return.
        let shutdown = CancellationToken::new();
        let signal_token = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                signal_token.cancel();
            }
        });

        shutdown.cancelled().await;
        session.stop();
        Ok(())
    } else {
        trigger.run()
    }
}

async fn run_interlinks(config_path: &Path, dry_run: bool) -> Result<()> {
    let config = QuartoConfig::load(config_path)?;
    let root = config_dir(config_path);

    let sync = Synchronizer::over_http(dry_run);
    match sync.sync(&config, &root).await {
        Ok(report) => {
            tracing::info!(
                written = report.written.len(),
                skipped = report.skipped.len(),
                failed = report.failed.len(),
                "Interlink sync complete"
            );
            Ok(())
        }
        Err(Error::Interlinks(InterlinksError::ConfigMissing)) => {
            println!("No interlinks field found in your config. Quitting.");
            Ok(())
        }
        Err(e) => Err(e),
    }
}
