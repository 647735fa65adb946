// Application settings
// Loaded from ~/.config/loanrec/settings.json

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "loanrec";

/// Log verbosity when neither RUST_LOG nor --verbose say otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Off,
    Error,
    #[default]
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Off => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Data
    #[serde(rename = "data.dir")]
    pub data_dir: Option<PathBuf>,  // None = platform data dir

    #[serde(rename = "data.snapshotFile")]
    pub snapshot_file: String,

    // Views
    #[serde(rename = "view.pageSize")]
    pub page_size: usize,

    #[serde(rename = "dashboard.topN")]
    pub top_n: usize,

    // Columns
    #[serde(rename = "columns.aliasFile")]
    pub alias_file: Option<PathBuf>,  // None = built-in aliases

    // Logging
    #[serde(rename = "log.level")]
    pub log_level: LogLevel,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: None,
            snapshot_file: "dataset.json".to_string(),
            page_size: 20,
            top_n: 10,
            alias_file: None,
            log_level: LogLevel::Warn,
        }
    }
}

impl Settings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR);
        config_dir.join("settings.json")
    }

    /// Load settings from the default location, falling back to defaults
    pub fn load() -> Self {
        let path = Self::config_path();

        if !path.exists() {
            let settings = Self::default();
            settings.create_default_file(&path);
            return settings;
        }

        Self::load_from(&path)
    }

    /// Load settings from `path`. Missing or malformed files yield defaults.
    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => {
                // Strip comments (lines starting with //)
                let cleaned: String = contents
                    .lines()
                    .filter(|line| !line.trim().starts_with("//"))
                    .collect::<Vec<_>>()
                    .join("\n");

                match serde_json::from_str(&cleaned) {
                    Ok(settings) => settings,
                    Err(e) => {
                        log::warn!("Error parsing {}: {}; using default settings", path.display(), e);
                        Self::default()
                    }
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(e) => {
                log::warn!("Error reading {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Save settings to `path`
    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }

        let json = serde_json::to_string_pretty(self)
            .map_err(|e| e.to_string())?;

        fs::write(path, json).map_err(|e| e.to_string())
    }

    /// Directory holding the dataset snapshot. An explicit override wins over `data.dir`.
    pub fn data_dir(&self, override_dir: Option<&Path>) -> PathBuf {
        if let Some(dir) = override_dir {
            return dir.to_path_buf();
        }
        if let Some(dir) = &self.data_dir {
            return dir.clone();
        }
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
    }

    pub fn snapshot_path(&self, override_dir: Option<&Path>) -> PathBuf {
        self.data_dir(override_dir).join(&self.snapshot_file)
    }

    /// Create default settings file with comments
    fn create_default_file(&self, path: &Path) {
        if let Some(parent) = path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                log::warn!("Error creating config directory: {}", e);
                return;
            }
        }

        let default_config = r#"{
    // Where the merged dataset is kept (null = platform data directory)
    "data.dir": null,
    "data.snapshotFile": "dataset.json",

    // Rows per page for `loanrec list`
    "view.pageSize": 20,

    // Entries in each dashboard ranking
    "dashboard.topN": 10,

    // TOML file overriding the accepted source column names (null = built-in)
    "columns.aliasFile": null,

    // off, error, warn, info, debug, trace (RUST_LOG takes precedence)
    "log.level": "warn"
}
"#;

        if let Err(e) = fs::write(path, default_config) {
            log::warn!("Error writing default settings.json: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(
            &path,
            r#"{
    // page size only
    "view.pageSize": 50,
    "log.level": "debug"
}"#,
        )
        .unwrap();

        let s = Settings::load_from(&path);
        assert_eq!(s.page_size, 50);
        assert_eq!(s.log_level, LogLevel::Debug);
        assert_eq!(s.top_n, 10);
        assert_eq!(s.snapshot_file, "dataset.json");
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ \"view.pageSize\": \"many\" }").unwrap();
        assert_eq!(Settings::load_from(&path), Settings::default());
    }

    #[test]
    fn missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(Settings::load_from(&dir.path().join("none.json")), Settings::default());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg").join("settings.json");
        let settings = Settings {
            data_dir: Some(dir.path().join("data")),
            alias_file: Some(PathBuf::from("aliases.toml")),
            ..Settings::default()
        };
        settings.save_to(&path).unwrap();
        assert_eq!(Settings::load_from(&path), settings);
    }

    #[test]
    fn data_dir_precedence() {
        let s = Settings {
            data_dir: Some(PathBuf::from("/srv/loans")),
            ..Settings::default()
        };
        assert_eq!(s.snapshot_path(None), PathBuf::from("/srv/loans/dataset.json"));
        assert_eq!(
            s.snapshot_path(Some(Path::new("/tmp/x"))),
            PathBuf::from("/tmp/x/dataset.json")
        );
    }
}
