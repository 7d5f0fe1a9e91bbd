//! Remote Media Cache - prefetch remote files into a local bounded cache
//!
//! Copies a remote or slow-storage file to local disk under a
//! content-derived name, evicts stale cached files past the size budget,
//! and optionally hands the local path to an external command.

mod cache;
mod cli;
mod errors;
mod forward;
mod prefs;
mod progress;
mod source;

use std::env;
use std::process;

use anyhow::{Context, Result};
use tracing::{error, Level};
use tracing_subscriber::FmtSubscriber;

use cache::orchestrator::{self, CacheRequest};
use cli::{Cli, Commands};
use prefs::PreferenceStore;

/// Final outcome of an invocation: one exit code, one message
struct Report {
    code: i32,
    message: String,
}

fn main() {
    // Initialize logging
    let log_level = env::var("RUST_LOG")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(Level::INFO);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Error: failed to initialize logging: {e}");
        process::exit(1);
    }

    match dispatch(cli::parse()) {
        Ok(report) => {
            println!("{}", report.message);
            process::exit(report.code);
        }
        Err(e) => {
            error!(error = %e, "Invocation failed");
            eprintln!("Error: {e:#}");
            process::exit(1);
        }
    }
}

fn dispatch(cli: Cli) -> Result<Report> {
    match cli.command {
        Commands::Cache(args) => {
            let prefs = PreferenceStore::open_default()
                .load_or_init()
                .context("Failed to get preferences")?;

            let request = CacheRequest {
                path: args.path,
                cache_non_network_paths: args.cache_non_network_paths,
                forward_to_command: args.forward_to_command,
                forward_to_command_arguments: args.forward_to_command_arguments,
            };
            let outcome = orchestrator::run(&request, &prefs)?;

            Ok(Report {
                code: outcome.forward_exit.unwrap_or(0),
                message: outcome.status_message(),
            })
        }
        Commands::PseudoCache(args) => {
            let bytes = cache::warm::run(&args.path, args.cache_non_network_paths)?;
            Ok(Report {
                code: 0,
                message: format!("Pseudo-cache read {bytes} bytes from '{}'.", args.path),
            })
        }
        Commands::Settings(args) => {
            let prefs = PreferenceStore::open_default()
                .update(args.cache_directory, args.max_cache_size_mb)
                .context("Failed to update preferences")?;
            Ok(Report {
                code: 0,
                message: format!(
                    "Preferences: cache directory '{}', max cache size {} MB.",
                    prefs.cache_directory.display(),
                    prefs.max_cache_size_mb
                ),
            })
        }
    }
}
