//! Command-Line Interface
//!
//! Three commands: `cache` (the default when no subcommand is named),
//! `pseudo-cache`, and `settings`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "rmcache")]
#[command(about = "Prefetch remote media files into a size-bounded local cache", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Prefetch a file into the local cache (default command)
    Cache(TransferArgs),

    /// Stream a file without writing anything locally (read-through warm-up)
    PseudoCache(TransferArgs),

    /// Update persisted preferences
    Settings(SettingsArgs),
}

#[derive(Args, Debug, Clone)]
pub struct TransferArgs {
    /// Source path: local file, network share, or http(s) URL
    pub path: String,

    /// Also cache sources that are not network paths
    #[arg(long)]
    pub cache_non_network_paths: bool,

    /// Command to run with the resolved file path after caching
    #[arg(long)]
    pub forward_to_command: Option<String>,

    /// Argument template for the forwarded command; `{0}` and `{1}` are
    /// replaced with the single-quoted resolved path. Templates usually
    /// start with a hyphen themselves (`-i {0}`), so hyphen values are let
    /// through.
    #[arg(long, allow_hyphen_values = true)]
    pub forward_to_command_arguments: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct SettingsArgs {
    /// Directory to store cached files in
    #[arg(long)]
    pub cache_directory: Option<PathBuf>,

    /// Maximum total cache size in megabytes
    #[arg(long)]
    pub max_cache_size_mb: Option<u64>,
}

const SUBCOMMANDS: &[&str] = &["cache", "pseudo-cache", "settings", "help"];

/// Parse argv, treating a leading non-subcommand argument as the default
/// `cache` command's path
pub fn parse() -> Cli {
    let mut args: Vec<String> = std::env::args().collect();
    if let Some(first) = args.get(1) {
        let named = SUBCOMMANDS.contains(&first.as_str()) || first.starts_with('-');
        if !named {
            args.insert(1, "cache".to_string());
        }
    }
    Cli::parse_from(args)
}
