use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Configuration from taskmate.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Filter directive used when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log file, relative to the data directory
    #[serde(default = "default_log_file")]
    pub file: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "taskmate.log".to_string()
}

/// First column of the calendar
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekStart {
    #[default]
    Monday,
    Sunday,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UiConfig {
    #[serde(default)]
    pub week_starts_on: WeekStart,
    /// Color overrides by theme slot name, e.g. `highlight = "#E84393"`
    #[serde(default)]
    pub colors: HashMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.log.level, "info");
        assert_eq!(config.log.file, "taskmate.log");
        assert_eq!(config.ui.week_starts_on, WeekStart::Monday);
        assert!(config.ui.colors.is_empty());
    }

    #[test]
    fn partial_sections_fill_in() {
        let config: AppConfig = toml::from_str(
            r##"
[log]
level = "debug"

[ui]
week_starts_on = "sunday"
colors = { highlight = "#FF0000" }
"##,
        )
        .unwrap();
        assert_eq!(config.log.level, "debug");
        assert_eq!(config.log.file, "taskmate.log");
        assert_eq!(config.ui.week_starts_on, WeekStart::Sunday);
        assert_eq!(config.ui.colors["highlight"], "#FF0000");
    }
}
