#![forbid(unsafe_code)]

//! Bookgraph CLI
//!
//! Generates knowledge graphs of books with a language model and refines
//! them through rate-and-improve rounds.

use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;
mod config;
mod config_handlers;

use cli::{Cli, Command};
use config::BookgraphConfig;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so JSON on stdout stays parseable
    let default_filter = if cli.verbose {
        "debug"
    } else {
        "info,bookgraph=debug"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.as_deref();
    match cli.command {
        Command::Config { action } => {
            config_handlers::handle_config_command(config_path, action)?;
        }
        command => {
            let mut config = BookgraphConfig::load(config_path)?;
            if cli.mock {
                config.llm.use_mock = true;
            }
            commands::run(command, &config).await?;
        }
    }

    Ok(())
}
