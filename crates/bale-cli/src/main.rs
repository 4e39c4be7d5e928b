//! bale command line tool
//!
//! Builds package archives from a spec file and installs packages, with
//! their dependencies, from a remote store reachable over SSH.

mod commands;
mod dotenv;

use anyhow::Context;
use bale_pm::resolver::DEFAULT_MAX_DEPTH;
use clap::{Parser, Subcommand};
use commands::RemoteArgs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "bale=info,bale_pm=info";

#[derive(Parser)]
#[command(name = "bale")]
#[command(about = "Build, upload and install package archives over SSH", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a package archive and upload it to the remote store
    Create {
        /// Build spec (JSON, YAML or TOML)
        spec: PathBuf,
        /// Output archive path (default: <name>-<version>.tar.gz)
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[command(flatten)]
        remote: RemoteArgs,
    },

    /// Install packages and their dependencies from the remote store
    Update {
        /// Update spec (JSON, YAML or TOML)
        spec: PathBuf,
        /// Destination directory
        #[arg(long, default_value = ".")]
        local_dir: PathBuf,
        /// Maximum depth of transitive dependencies
        #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
        max_depth: usize,
        #[command(flatten)]
        remote: RemoteArgs,
    },
}

fn main() -> anyhow::Result<()> {
    // Must run before parsing so the flags see the file's variables.
    let from_dotenv = dotenv::load(Path::new(".env")).context("failed to load .env file")?;

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    if !from_dotenv.is_empty() {
        tracing::debug!(variables = ?from_dotenv, "loaded .env");
    }

    let cli = Cli::parse();

    match cli.command {
        Commands::Create {
            spec,
            output,
            remote,
        } => commands::create::execute(&spec, output, &remote),
        Commands::Update {
            spec,
            local_dir,
            max_depth,
            remote,
        } => commands::update::execute(&spec, local_dir, max_depth, &remote),
    }
}
