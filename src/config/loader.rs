use std::fs;
use std::path::{Path, PathBuf};

use super::core::LedgerlensConfig;
use crate::errors::{Error, Result};

pub const CONFIG_FILE_NAME: &str = ".ledgerlens.toml";
const MAX_TRAVERSAL_DEPTH: usize = 10;

/// Pure function to parse and validate config from TOML string
pub fn parse_and_validate_config(contents: &str) -> Result<LedgerlensConfig> {
    let config = toml::from_str::<LedgerlensConfig>(contents)
        .map_err(|e| Error::configuration(format!("Failed to parse {CONFIG_FILE_NAME}: {e}")))?;
    config.validate()?;
    Ok(config)
}

/// Load an explicitly named config file. Unlike discovery, every failure is
/// reported to the caller.
pub fn load_config_from_path(path: &Path) -> Result<LedgerlensConfig> {
    let contents = fs::read_to_string(path)
        .map_err(|e| Error::file_system("Failed to read config file", path, e))?;
    parse_and_validate_config(&contents).map_err(|e| e.with_context(path.display().to_string()))
}

/// Try loading config from a discovered path, logging and skipping failures
pub(crate) fn try_load_config_from_path(config_path: &Path) -> Option<LedgerlensConfig> {
    let contents = match fs::read_to_string(config_path) {
        Ok(contents) => contents,
        Err(e) => {
            handle_read_error(config_path, &e);
            return None;
        }
    };

    match parse_and_validate_config(&contents) {
        Ok(config) => {
            log::debug!("Loaded config from {}", config_path.display());
            Some(config)
        }
        Err(e) => {
            log::warn!("{}: {}. Using defaults.", config_path.display(), e);
            Some(LedgerlensConfig::default())
        }
    }
}

/// Handle file read errors with appropriate logging
fn handle_read_error(config_path: &Path, error: &std::io::Error) {
    // Only log actual errors, not "file not found"
    if error.kind() != std::io::ErrorKind::NotFound {
        log::warn!(
            "Failed to read config file {}: {}",
            config_path.display(),
            error
        );
    }
}

/// Generate directory ancestors up to a depth limit, starting with `start`
pub fn directory_ancestors(start: PathBuf, max_depth: usize) -> impl Iterator<Item = PathBuf> {
    std::iter::successors(Some(start), |dir| {
        let mut parent = dir.clone();
        if parent.pop() {
            Some(parent)
        } else {
            None
        }
    })
    .take(max_depth)
}

/// User-level config, e.g. `~/.config/ledgerlens/config.toml`
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("ledgerlens").join("config.toml"))
}

/// Discover configuration starting from `start`: the nearest
/// `.ledgerlens.toml` in `start` or its ancestors, then the user config,
/// then defaults.
pub fn discover_config(start: &Path) -> LedgerlensConfig {
    directory_ancestors(start.to_path_buf(), MAX_TRAVERSAL_DEPTH)
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .chain(user_config_path())
        .find_map(|path| try_load_config_from_path(&path))
        .unwrap_or_else(|| {
            log::debug!(
                "No config found after checking {} directories. Using default config.",
                MAX_TRAVERSAL_DEPTH
            );
            LedgerlensConfig::default()
        })
}

pub fn load_config() -> LedgerlensConfig {
    match std::env::current_dir() {
        Ok(dir) => discover_config(&dir),
        Err(e) => {
            log::warn!(
                "Failed to get current directory: {}. Using default config.",
                e
            );
            LedgerlensConfig::default()
        }
    }
}
