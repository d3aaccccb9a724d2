//! mc-extract CLI
//!
//! Logs go to stderr; stdout carries only schema, record and state messages.

use anyhow::Context;
use clap::Parser;
use mc_extract::cli::{Cli, Runner};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let succeeded = Runner::new(cli).run().await.context("mc-extract failed")?;
    if !succeeded {
        std::process::exit(1);
    }
    Ok(())
}
