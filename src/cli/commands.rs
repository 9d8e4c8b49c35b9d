//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - run: run a paper session in the foreground
//! - status: show a session's checkpoint
//! - restart-from: reset a session's stage for re-execution
//! - sessions: list stored session documents

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Rotor - lap orchestration over rotating worker identity pools
#[derive(Parser, Debug)]
#[command(name = "rotor")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a paper session in the foreground (Ctrl-C stops cleanly)
    Run {
        /// Resume an existing session by reference
        #[arg(short, long)]
        session: Option<String>,

        /// Stop after this many laps
        #[arg(short, long)]
        laps: Option<u64>,

        /// Primary resource the paper admin starts with
        #[arg(long, default_value_t = 1.0)]
        fund: f64,

        /// Secondary resource the paper admin starts with
        #[arg(long, default_value_t = 0.0)]
        fund_secondary: f64,
    },

    /// Show a session's checkpoint
    Status {
        /// Session reference to inspect
        session: String,
    },

    /// Reset a session's stage; the next run re-executes from there
    RestartFrom {
        /// Session reference to reset
        session: String,

        /// Stage number to restart from (1-6)
        stage: u8,
    },

    /// List stored session documents
    Sessions,
}
