use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use regex::Regex;
use serde_json::Value;
use tracing::warn;
use walkdir::WalkDir;

use super::game_file::{parse_game_file, LoadError};
use crate::models::GameData;

/// Id of the game bundled with the binary.
pub const SAMPLE_PRESET_ID: &str = "sample";

/// File name of the authoring template written by [`write_sample_template`].
pub const SAMPLE_TEMPLATE_FILE: &str = "sample_game.json";

const SAMPLE_GAME: &str = include_str!("../../assets/sample_game.json");

static PRESET_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("invalid preset id regex"));

/// A game that can be started by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresetInfo {
    /// File stem, used in `--preset` and `?game=`.
    pub id: String,
    /// Optional `title` from the file, else the id.
    pub title: String,
    /// Source file; `None` for the bundled sample.
    pub path: Option<PathBuf>,
}

/// Thread-safe catalogue of preset games found under a directory.
#[derive(Clone)]
pub struct PresetLibrary {
    inner: Arc<RwLock<Inner>>,
}

struct Inner {
    root: PathBuf,
    cache: Option<Vec<PresetInfo>>,
}

impl PresetLibrary {
    /// Build a library rooted at `root`. Nothing is read until first use.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                root: root.into(),
                cache: None,
            })),
        }
    }

    /// Forget the cached listing so the next call rescans.
    pub fn refresh(&self) {
        self.inner.write().cache = None;
    }

    /// All presets sorted by id, populating the cache on first use.
    pub fn presets(&self) -> Result<Vec<PresetInfo>> {
        if let Some(cache) = self.inner.read().cache.as_ref() {
            return Ok(cache.clone());
        }
        let mut inner = self.inner.write();
        let presets = discover_presets(&inner.root)?;
        inner.cache = Some(presets.clone());
        Ok(presets)
    }

    /// Look a preset up by id.
    pub fn find(&self, id: &str) -> Result<Option<PresetInfo>> {
        if !is_valid_preset_id(id) {
            return Ok(None);
        }
        Ok(self.presets()?.into_iter().find(|preset| preset.id == id))
    }

    /// Read and parse a preset.
    pub fn load(&self, id: &str) -> Result<GameData> {
        let preset = self
            .find(id)?
            .ok_or_else(|| LoadError::UnknownPreset(id.to_string()))?;
        let text = match preset.path.as_ref() {
            Some(path) => fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?,
            None => SAMPLE_GAME.to_string(),
        };
        parse_game_file(&text).with_context(|| format!("failed to load preset {id}"))
    }
}

/// Whether `id` is a syntactically valid preset id.
pub fn is_valid_preset_id(id: &str) -> bool {
    PRESET_ID_RE.is_match(id)
}

/// The bundled sample game as JSON text.
pub fn sample_game() -> &'static str {
    SAMPLE_GAME
}

/// Write the bundled sample game, pretty-printed, into `dir` so it can be
/// copied and edited into a new game file. Returns the written path.
pub fn write_sample_template(dir: &Path) -> Result<PathBuf> {
    let value: Value =
        serde_json::from_str(sample_game()).context("bundled sample game is not valid JSON")?;
    fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
    let path = dir.join(SAMPLE_TEMPLATE_FILE);
    fs::write(&path, serde_json::to_string_pretty(&value)?)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

fn discover_presets(root: &Path) -> Result<Vec<PresetInfo>> {
    let mut presets = Vec::new();
    if root.is_dir() {
        for entry in WalkDir::new(root).follow_links(true) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!("Skipping unreadable preset entry: {err}");
                    continue;
                }
            };
            let path = entry.path();
            if !entry.file_type().is_file()
                || path.extension().and_then(|ext| ext.to_str()) != Some("json")
            {
                continue;
            }
            let Some(id) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            if !is_valid_preset_id(id) {
                warn!("Skipping preset {}: invalid id", path.display());
                continue;
            }
            match read_title(path) {
                Ok(title) => presets.push(PresetInfo {
                    id: id.to_string(),
                    title: title.unwrap_or_else(|| id.to_string()),
                    path: Some(path.to_path_buf()),
                }),
                Err(err) => warn!("Skipping preset {}: {err:#}", path.display()),
            }
        }
    }

    presets.sort_by(|a, b| a.id.cmp(&b.id));
    presets.dedup_by(|later, earlier| {
        let duplicate = later.id == earlier.id;
        if duplicate {
            warn!("Ignoring duplicate preset id {}", later.id);
        }
        duplicate
    });
    if !presets.iter().any(|preset| preset.id == SAMPLE_PRESET_ID) {
        presets.push(PresetInfo {
            id: SAMPLE_PRESET_ID.to_string(),
            title: "Sample Game".to_string(),
            path: None,
        });
    }
    Ok(presets)
}

fn read_title(path: &Path) -> Result<Option<String>> {
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let value: Value = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    if value.get("game").is_none() {
        return Err(LoadError::MissingGameKey.into());
    }
    Ok(value
        .get("title")
        .and_then(Value::as_str)
        .map(|title| title.trim().to_string())
        .filter(|title| !title.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn game_json(title: Option<&str>) -> String {
        let mut value = json!({
            "game": {
                "single": [{ "category": "Art", "clues": [{ "clue": "Water lilies", "value": 200 }] }],
                "final": { "category": "Music", "clue": "Bolero", "solution": "Ravel" }
            }
        });
        if let Some(title) = title {
            value["title"] = json!(title);
        }
        value.to_string()
    }

    #[test]
    fn discovers_presets_recursively() -> Result<()> {
        let temp = tempdir()?;
        let root = temp.path();
        fs::create_dir_all(root.join("2024/spring"))?;
        fs::write(root.join("trivia_night.json"), game_json(Some("Trivia Night")))?;
        fs::write(root.join("2024/spring/finals.json"), game_json(None))?;
        fs::write(root.join("notes.txt"), "not a game")?;
        fs::write(root.join("broken.json"), "{")?;
        fs::write(root.join("no-game.json"), "{\"single\": []}")?;
        fs::write(root.join("bad id.json"), game_json(None))?;

        let library = PresetLibrary::new(root);
        let presets = library.presets()?;
        let ids: Vec<&str> = presets.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["finals", "trivia_night", SAMPLE_PRESET_ID]);
        assert_eq!(presets[0].title, "finals");
        assert_eq!(presets[1].title, "Trivia Night");
        assert!(presets[2].path.is_none());
        Ok(())
    }

    #[test]
    fn cache_holds_until_refresh() -> Result<()> {
        let temp = tempdir()?;
        let library = PresetLibrary::new(temp.path());
        assert_eq!(library.presets()?.len(), 1);

        fs::write(temp.path().join("late.json"), game_json(None))?;
        assert_eq!(library.presets()?.len(), 1);
        library.refresh();
        assert_eq!(library.presets()?.len(), 2);
        Ok(())
    }

    #[test]
    fn loads_presets_by_id() -> Result<()> {
        let temp = tempdir()?;
        fs::write(temp.path().join("art.json"), game_json(None))?;
        let library = PresetLibrary::new(temp.path());

        let art = library.load("art")?;
        assert_eq!(art.game.single[0].category, "Art");

        let sample = library.load(SAMPLE_PRESET_ID)?;
        assert!(sample.game.has_double());
        assert!(sample.players.is_none());

        assert!(library.load("missing").is_err());
        assert!(library.load("../art").is_err());
        Ok(())
    }

    #[test]
    fn sample_template_is_a_loadable_game_file() -> Result<()> {
        let temp = tempdir()?;
        let dir = temp.path().join("saves");
        let path = write_sample_template(&dir)?;
        assert_eq!(path, dir.join(SAMPLE_TEMPLATE_FILE));

        let text = fs::read_to_string(&path)?;
        assert!(text.contains("\n  \"game\""));
        let data = parse_game_file(&text)?;
        assert_eq!(data, parse_game_file(sample_game())?);

        write_sample_template(&dir)?;
        assert_eq!(fs::read_to_string(&path)?, text);
        Ok(())
    }

    #[test]
    fn validates_preset_ids() {
        assert!(is_valid_preset_id("spring-2024_final"));
        assert!(!is_valid_preset_id(""));
        assert!(!is_valid_preset_id("a/b"));
        assert!(!is_valid_preset_id("game id"));
    }
}
