mod config;

pub use config::{Config, EngineSection, LoggingSection};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns `~/.config/screentime[-dev]/` based on SCREENTIME_ENV.
///
/// Set SCREENTIME_ENV=dev to use the development directory, or
/// SCREENTIME_CONFIG_DIR to point somewhere else entirely.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("SCREENTIME_CONFIG_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("SCREENTIME_ENV").unwrap_or_else(|_| "production".to_string());

            if env == "dev" {
                base_dir.join("screentime-dev")
            } else {
                base_dir.join("screentime")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
