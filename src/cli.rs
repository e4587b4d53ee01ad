//! Command-line interface definition for cartgate
//!
//! This module defines the CLI structure using clap's derive API.

use clap::{Parser, Subcommand};

/// cartgate - authenticated tool server
///
/// Verifies bearer tokens against a third-party identity provider's key set
/// and serves cart tools backed by a remote session store.
#[derive(Parser, Debug, Clone)]
#[command(name = "cartgate")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for cartgate
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Serve tool calls over stdio
    Serve,

    /// Print the definitions of all registered tools and exit
    Tools,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
