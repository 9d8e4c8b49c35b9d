//! CLI module for rotor - command-line interface and subcommands.
//!
//! Provides the main entry point with subcommands for running paper
//! sessions, inspecting checkpoints, and resetting a session's stage.

pub mod commands;

pub use commands::Cli;
