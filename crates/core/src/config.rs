//! Application configuration.
//!
//! Values are layered: built-in defaults, then `~/.config/quizboard/config.toml`,
//! then `QUIZBOARD_*` environment variables.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

/// Directory name used under the platform config and data directories.
pub const APP_DIR: &str = "quizboard";

const DEFAULT_CONFIG: &str = r#"# quizboard configuration

# Where the autosave snapshot and backups are written.
# save_dir = "/home/me/.local/share/quizboard"

# Directory scanned for preset game files (*.json).
# presets_dir = "/home/me/.config/quizboard/presets"

# Log file directory. Defaults to <save_dir>/logs.
# log_dir = "/home/me/.local/share/quizboard/logs"

# Write the session snapshot after every change once play has started.
autosave = true
"#;

/// Resolved runtime settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AppConfig {
    /// Holds `current.json` and the `backups/` directory.
    pub save_dir: PathBuf,
    /// Scanned recursively for preset games.
    pub presets_dir: PathBuf,
    /// Destination of `quizboard.log`.
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
    /// Whether the session snapshot is kept on disk.
    pub autosave: bool,
}

impl AppConfig {
    /// Load configuration from the default file and the environment.
    pub fn load() -> Result<Self> {
        Self::load_from(&config_file())
    }

    /// Load configuration using `path` as the config file. A missing file is
    /// fine; defaults and environment variables still apply.
    pub fn load_from(path: &Path) -> Result<Self> {
        let settings = Config::builder()
            .set_default("save_dir", path_value(&default_save_dir()))?
            .set_default("presets_dir", path_value(&default_presets_dir()))?
            .set_default("autosave", true)?
            .add_source(File::from(path.to_path_buf()).required(false))
            .add_source(Environment::with_prefix("QUIZBOARD"))
            .build()
            .with_context(|| format!("failed to read config {}", path.display()))?;
        settings
            .try_deserialize()
            .context("invalid quizboard configuration")
    }

    /// Directory for log files.
    pub fn log_dir(&self) -> PathBuf {
        self.log_dir
            .clone()
            .unwrap_or_else(|| self.save_dir.join("logs"))
    }
}

/// Path of the user config file.
pub fn config_file() -> PathBuf {
    config_root().join("config.toml")
}

/// Write a commented default config file if none exists yet.
pub fn ensure_default_config() -> Result<PathBuf> {
    let path = config_file();
    write_default_config(&path)?;
    Ok(path)
}

fn write_default_config(path: &Path) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, DEFAULT_CONFIG)
        .with_context(|| format!("failed to write {}", path.display()))
}

fn config_root() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

fn default_save_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

fn default_presets_dir() -> PathBuf {
    config_root().join("presets")
}

fn path_value(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
