use serde::{Deserialize, Serialize};

/// Configuration from config.toml in the data directory
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Key-value file, relative to the data directory
    #[serde(default = "default_storage_file")]
    pub file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            file: default_storage_file(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiConfig {
    /// Color tags with ANSI escapes in human-readable output
    #[serde(default = "default_true")]
    pub color: bool,
    /// strftime format for day headings (upcoming groups, calendar selection)
    #[serde(default = "default_date_format")]
    pub date_format: String,
}

impl Default for UiConfig {
    fn default() -> Self {
        UiConfig {
            color: true,
            date_format: default_date_format(),
        }
    }
}

/// Default: see src/templates/config.toml
fn default_storage_file() -> String {
    "storage.json".to_string()
}

/// Default: see src/templates/config.toml
fn default_true() -> bool {
    true
}

/// Default: see src/templates/config.toml
fn default_date_format() -> String {
    "%A, %B %-d, %Y".to_string()
}
