//! Command-line interface module for cfa-forge.
//!
//! Contains the clap command definitions and their handlers.

mod commands;

pub use commands::{parse_cli, run, run_with_cli, Cli, Commands, LOG_FILENAME};
