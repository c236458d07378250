//! Command-line argument definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Generate and refine knowledge graphs of books
#[derive(Parser, Debug)]
#[command(name = "bookgraph", author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Answer completions from a canned offline gateway
    #[arg(long, global = true)]
    pub mock: bool,

    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate one knowledge graph for a book
    Generate {
        /// Book title
        book: String,

        /// Generation model (defaults to the configured one)
        #[arg(short, long)]
        model: Option<String>,

        /// Write the graph here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate, rate and improve a graph until the policy stops
    Refine {
        /// Book title
        book: String,

        /// Improvement rounds
        #[arg(short = 'n', long)]
        iterations: Option<u32>,

        /// Stop once a graph is rated at least this high (0-10)
        #[arg(short, long)]
        target_rating: Option<u8>,

        /// Model generating graphs
        #[arg(long)]
        generation_model: Option<String>,

        /// Model rating graphs
        #[arg(long)]
        rating_model: Option<String>,

        /// Ratings per cycle
        #[arg(long, default_value_t = 1)]
        num_ratings: u32,

        /// Write the session snapshot here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Report structural problems in a graph JSON file
    Check {
        /// Graph file
        file: PathBuf,
    },

    /// Configuration helpers
    Config {
        /// Config action
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// `config` subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the resolved config file path
    Path,
    /// Print the effective configuration
    Show,
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
