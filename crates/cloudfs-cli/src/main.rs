//! cloudfs CLI - Command-line interface for cloudfs
//!
//! Provides commands for:
//! - Listing, reading and writing files in a Cloudinary account
//! - Moving, copying and deleting files and directories
//! - Inspecting file metadata and public URLs
//! - Viewing and validating configuration

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use cloudfs_core::config::Config;
use commands::{
    completions::CompletionsCommand,
    config::ConfigCommand,
    directory::{ListCommand, MkdirCommand, RmdirCommand},
    file::{
        CatCommand, CopyCommand, ExistsCommand, GetCommand, MoveCommand, PutCommand,
        RemoveCommand, StatCommand, UrlCommand,
    },
};
use output::OutputFormat;

#[derive(Debug, Parser)]
#[command(
    name = "cloudfs",
    version,
    about = "Browse and manage a Cloudinary account like a filesystem"
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use alternate config file
    #[arg(long, global = true)]
    config: Option<String>,

    /// Minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List directory contents
    Ls(ListCommand),
    /// Print a file to stdout
    Cat(CatCommand),
    /// Upload a local file
    Put(PutCommand),
    /// Download a file to the local disk
    Get(GetCommand),
    /// Delete a file
    Rm(RemoveCommand),
    /// Delete a directory and everything below it
    Rmdir(RmdirCommand),
    /// Create a directory
    Mkdir(MkdirCommand),
    /// Move or rename a file
    Mv(MoveCommand),
    /// Copy a file
    Cp(CopyCommand),
    /// Show file metadata
    Stat(StatCommand),
    /// Print the public URL of a file
    Url(UrlCommand),
    /// Check whether a file or directory exists
    Exists(ExistsCommand),
    /// View and manage configuration
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Generate shell completions
    Completions(CompletionsCommand),
}

/// Log filter for the verbosity flags, falling back to the configured level
fn log_filter(verbose: u8, quiet: bool, configured: &str) -> String {
    if quiet {
        return "error".to_string();
    }
    match verbose {
        0 => configured.to_string(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .as_ref()
        .map(PathBuf::from)
        .unwrap_or_else(Config::default_path);

    // Setup tracing
    let configured_level = Config::load_or_default(&config_path).logging.level;
    let filter = log_filter(cli.verbose, cli.quiet, &configured_level);
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Human
    };

    match cli.command {
        Commands::Ls(cmd) => cmd.execute(format, &config_path).await,
        Commands::Cat(cmd) => cmd.execute(format, &config_path).await,
        Commands::Put(cmd) => cmd.execute(format, &config_path).await,
        Commands::Get(cmd) => cmd.execute(format, &config_path).await,
        Commands::Rm(cmd) => cmd.execute(format, &config_path).await,
        Commands::Rmdir(cmd) => cmd.execute(format, &config_path).await,
        Commands::Mkdir(cmd) => cmd.execute(format, &config_path).await,
        Commands::Mv(cmd) => cmd.execute(format, &config_path).await,
        Commands::Cp(cmd) => cmd.execute(format, &config_path).await,
        Commands::Stat(cmd) => cmd.execute(format, &config_path).await,
        Commands::Url(cmd) => cmd.execute(format, &config_path).await,
        Commands::Exists(cmd) => cmd.execute(format, &config_path).await,
        Commands::Config(cmd) => cmd.execute(format, &config_path).await,
        Commands::Completions(cmd) => cmd.execute(format).await,
    }
}
