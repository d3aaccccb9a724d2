//! CLI module
//!
//! Command-line interface for the extractor.
//!
//! # Commands
//!
//! - `check` - Test credentials and SOAP access
//! - `discover` - Print the stream catalog with selection metadata
//! - `sync` - Extract the selected streams as JSON lines on stdout

mod commands;
mod runner;

pub use commands::{Cli, Commands};
pub use runner::Runner;
