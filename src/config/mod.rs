//! Configuration loading.
//!
//! Settings live in `.ledgerlens.toml`, found by walking up from the current
//! directory, or in the user config directory. Every table is optional and
//! every field has a default, so an empty file is a valid configuration.

mod core;
mod loader;
pub mod retry;

pub use core::{LedgerlensConfig, OutputConfig};
pub use loader::{
    directory_ancestors, discover_config, load_config, load_config_from_path,
    parse_and_validate_config, user_config_path, CONFIG_FILE_NAME,
};
pub use retry::{RetryConfig, RetryStrategy};
