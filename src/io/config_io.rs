use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::model::config::Config;

/// Name of the config file inside the data directory
pub const CONFIG_FILE: &str = "config.toml";

/// Environment variable overriding the data directory
pub const DATA_DIR_ENV: &str = "TASKDECK_DIR";

/// Error type for configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    ReadError { path: PathBuf, source: io::Error },
    #[error("could not parse {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("no data directory: pass -C, or set TASKDECK_DIR or HOME")]
    NoDataDir,
}

/// Pick the data directory: explicit flag, then `$TASKDECK_DIR`, then
/// `$XDG_DATA_HOME/taskdeck`, then `$HOME/.local/share/taskdeck`.
pub fn resolve_data_dir(flag: Option<&Path>) -> Result<PathBuf, ConfigError> {
    resolve_data_dir_with(flag, |key| std::env::var(key).ok())
}

pub fn resolve_data_dir_with(
    flag: Option<&Path>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<PathBuf, ConfigError> {
    if let Some(dir) = flag {
        return Ok(dir.to_path_buf());
    }
    let non_empty = |key: &str| env(key).filter(|v| !v.is_empty());
    if let Some(dir) = non_empty(DATA_DIR_ENV) {
        return Ok(PathBuf::from(dir));
    }
    if let Some(dir) = non_empty("XDG_DATA_HOME") {
        return Ok(PathBuf::from(dir).join("taskdeck"));
    }
    non_empty("HOME")
        .map(|home| PathBuf::from(home).join(".local/share/taskdeck"))
        .ok_or(ConfigError::NoDataDir)
}

/// Read config.toml from the data directory. A missing file yields defaults.
pub fn read_config(data_dir: &Path) -> Result<Config, ConfigError> {
    let path = data_dir.join(CONFIG_FILE);
    let text = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Config::default()),
        Err(e) => return Err(ConfigError::ReadError { path, source: e }),
    };
    toml::from_str(&text).map_err(|e| ConfigError::ParseError { path, source: e })
}

/// Location of the key-value file for this data directory and config.
pub fn storage_path(data_dir: &Path, config: &Config) -> PathBuf {
    data_dir.join(&config.storage.file)
}
