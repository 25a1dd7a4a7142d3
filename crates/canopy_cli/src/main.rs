//! Canopy CLI
//!
//! Command-line tools for persisted hierarchy index storage parts.
//!
//! # Commands
//!
//! - `inspect` - Display storage part statistics
//! - `verify` - Check the structural invariants of a storage part
//! - `tree` - Print the attached hierarchy as an outline

mod commands;
mod error;

use clap::{Parser, Subcommand};
use error::{CliError, CliResult};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Canopy hierarchy index tools.
#[derive(Parser)]
#[command(name = "canopy")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the storage part file
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display storage part statistics
    Inspect {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Verify storage part integrity
    Verify,

    /// Print the hierarchy as an indented outline
    Tree {
        /// Levels shown below the starting nodes
        #[arg(short, long)]
        levels: Option<u32>,

        /// Start from this node instead of the roots
        #[arg(short, long)]
        root: Option<i32>,
    },

    /// Show version information
    Version,
}

fn require_path(path: Option<PathBuf>, command: &'static str) -> CliResult<PathBuf> {
    path.ok_or(CliError::MissingPath { command })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Inspect { format } => {
            let path = require_path(cli.path, "inspect")?;
            commands::inspect::run(&path, &format)?;
        }
        Commands::Verify => {
            let path = require_path(cli.path, "verify")?;
            commands::verify::run(&path)?;
        }
        Commands::Tree { levels, root } => {
            let path = require_path(cli.path, "tree")?;
            commands::tree::run(&path, levels, root)?;
        }
        Commands::Version => {
            println!("Canopy CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("Canopy Core v{}", canopy_core::VERSION);
        }
    }

    Ok(())
}
