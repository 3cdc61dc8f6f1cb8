//! Setup and initialization functions for the CLI
//!
//! Logging, color control and configuration loading. Everything here runs
//! once, before a command handler.

use std::io::IsTerminal;
use std::path::Path;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use crate::config::{load_config, load_config_from_path, LedgerlensConfig};

/// Environment variable holding a tracing filter directive
pub const LOG_ENV_VAR: &str = "LEDGERLENS_LOG";

/// Default filter directive for a verbosity count.
pub fn default_log_level(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Install the global tracing subscriber, writing to stderr.
///
/// `LEDGERLENS_LOG` overrides the verbosity-derived level. `log` records
/// from dependencies are forwarded through the subscriber's log bridge.
pub fn init_logging(verbosity: u8) {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new(default_log_level(verbosity)));

    // A second initialization (e.g. from tests) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Decide whether to colorize, honoring `--plain`, NO_COLOR and CLICOLOR_FORCE.
pub fn configure_color(plain: bool) -> bool {
    let enabled = if plain || std::env::var_os("NO_COLOR").is_some() {
        false
    } else if std::env::var("CLICOLOR_FORCE").is_ok_and(|v| v == "1") {
        true
    } else {
        std::io::stdout().is_terminal()
    };
    colored::control::set_override(enabled);
    enabled
}

/// Load the explicit config file, or discover one from the current directory.
pub fn resolve_config(path: Option<&Path>) -> Result<LedgerlensConfig> {
    match path {
        Some(path) => load_config_from_path(path)
            .with_context(|| format!("loading configuration from {}", path.display())),
        None => Ok(load_config()),
    }
}
