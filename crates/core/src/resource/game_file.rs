//! Game file parsing.

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use thiserror::Error;

use crate::models::GameData;

/// Why a game file could not be used.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Valid JSON, but not a game file.
    #[error("game key not found in JSON payload")]
    MissingGameKey,

    /// Not JSON, or the board does not have the expected shape.
    #[error("invalid game file: {0}")]
    Parse(#[from] serde_json::Error),

    /// The file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// File that was requested.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// No preset with that id.
    #[error("unknown preset {0:?}")]
    UnknownPreset(String),
}

static QUERY_GAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[?&]game=([A-Za-z0-9_-]+)").expect("invalid game query regex")
});

/// Parse a game file. The payload must be a JSON object with a `game` key.
pub fn parse_game_file(text: &str) -> Result<GameData, LoadError> {
    let value: Value = serde_json::from_str(text)?;
    if value.get("game").is_none() {
        return Err(LoadError::MissingGameKey);
    }
    Ok(serde_json::from_value(value)?)
}

/// Read and parse a game file from disk.
pub async fn load_file(path: impl AsRef<Path>) -> Result<GameData, LoadError> {
    let path = path.as_ref();
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    parse_game_file(&text)
}

/// Extract the preset id from a `?game=<id>` query string.
pub fn preset_from_query(url: &str) -> Option<String> {
    QUERY_GAME_RE
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
