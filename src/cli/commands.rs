//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Marketing cloud extractor
#[derive(Parser, Debug)]
#[command(name = "mc-extract")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (JSON or YAML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Input state file (JSON); a missing file means a fresh start
    #[arg(short, long, global = true)]
    pub state: Option<PathBuf>,

    /// Catalog with stream and field selections (JSON)
    #[arg(long, global = true)]
    pub catalog: Option<PathBuf>,

    /// Write the final state here after a sync
    #[arg(long, global = true)]
    pub state_out: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Test the credentials and SOAP access
    Check,

    /// Print the catalog of known streams and discovered data extensions
    Discover,

    /// Sync the selected streams to stdout
    Sync,
}
