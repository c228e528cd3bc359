use std::fs;
use std::path::{Path, PathBuf};

use crate::model::config::AppConfig;

/// Directory created by `tm init`
pub const DATA_DIR_NAME: &str = ".taskmate";
pub const CONFIG_FILE: &str = "taskmate.toml";
/// Environment override for the data directory
pub const DATA_DIR_ENV: &str = "TASKMATE_DIR";

const CONFIG_TEMPLATE: &str = r##"# TaskMate configuration

[log]
# Filter used when RUST_LOG is unset
level = "info"
# Relative to this directory
file = "taskmate.log"

[ui]
# First column of the calendar: "monday" or "sunday"
week_starts_on = "monday"

# [ui.colors]
# background = "#1B0A17"
# text = "#F3D1EC"
# text_bright = "#FFFFFF"
# highlight = "#E84393"
# accent = "#6F1E51"
# dim = "#9C6F91"
# green = "#55E6A5"
# red = "#FF5C7A"
"##;

/// Error type for locating and reading the data directory
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no taskmate data directory found (run `tm init` or pass -D)")]
    NotInitialized,
    #[error("{0} already exists (use --force to rewrite its config)")]
    AlreadyInitialized(PathBuf),
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse {CONFIG_FILE}: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Walk up from `start` looking for `.taskmate/taskmate.toml`
pub fn discover_data_dir(start: &Path) -> Result<PathBuf, ConfigError> {
    let mut current = start.to_path_buf();
    loop {
        let candidate = current.join(DATA_DIR_NAME);
        if candidate.join(CONFIG_FILE).is_file() {
            return Ok(candidate);
        }
        if !current.pop() {
            return Err(ConfigError::NotInitialized);
        }
    }
}

/// Pick the data directory: explicit flag, then environment, then discovery
/// from `cwd`. Explicit locations must already be initialized.
pub fn resolve_data_dir(
    flag: Option<&Path>,
    env: Option<&Path>,
    cwd: &Path,
) -> Result<PathBuf, ConfigError> {
    match flag.or(env) {
        Some(dir) => {
            if dir.join(CONFIG_FILE).is_file() {
                Ok(dir.to_path_buf())
            } else {
                Err(ConfigError::NotInitialized)
            }
        }
        None => discover_data_dir(cwd),
    }
}

/// Read taskmate.toml from the data directory
pub fn read_config(data_dir: &Path) -> Result<AppConfig, ConfigError> {
    let path = data_dir.join(CONFIG_FILE);
    let text = fs::read_to_string(&path).map_err(|e| ConfigError::ReadError {
        path: path.clone(),
        source: e,
    })?;
    Ok(toml::from_str(&text)?)
}

/// Create a data directory with a default config. With `force`, an existing
/// directory keeps its data and only the config is rewritten.
pub fn init_data_dir(data_dir: &Path, force: bool) -> Result<(), ConfigError> {
    let config_path = data_dir.join(CONFIG_FILE);
    if config_path.exists() && !force {
        return Err(ConfigError::AlreadyInitialized(data_dir.to_path_buf()));
    }
    fs::create_dir_all(data_dir)?;
    fs::write(&config_path, CONFIG_TEMPLATE)?;
    Ok(())
}
