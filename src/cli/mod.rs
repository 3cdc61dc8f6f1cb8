//! CLI module for ledgerlens
//!
//! This module provides the command-line interface, including:
//! - Argument parsing (`args`)
//! - Command handlers (`commands`)
//! - Terminal rendering (`output`)
//! - Runtime setup: logging, colors, configuration (`setup`)

pub mod args;
pub mod commands;
pub mod output;
pub mod setup;

pub use args::{Cli, Commands, OutputFormat};
pub use commands::{run, CommandContext};
pub use setup::{configure_color, init_logging, resolve_config};

/// Parse CLI arguments using Clap
pub fn parse_args() -> Cli {
    args::parse_args()
}
