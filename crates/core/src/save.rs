//! Snapshot and backup persistence.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::models::GameData;

/// File name of the autosave slot inside the save directory.
pub const SNAPSHOT_FILE: &str = "current.json";

/// Sub-directory holding user backups.
pub const BACKUP_DIR: &str = "backups";

/// A backup file on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveEntry {
    /// Absolute path to the backup file.
    pub path: PathBuf,
    /// Name given when the backup was written.
    pub name: String,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

/// Reads and writes the session snapshot and user backups.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    root: PathBuf,
}

impl SnapshotStore {
    /// Create a store rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory this store writes to.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the autosave slot.
    pub fn snapshot_path(&self) -> PathBuf {
        self.root.join(SNAPSHOT_FILE)
    }

    /// Overwrite the autosave slot.
    pub fn write_snapshot(&self, data: &GameData) -> Result<()> {
        write_json(&self.snapshot_path(), data, false)
    }

    /// Read the autosave slot.
    ///
    /// A snapshot that cannot be parsed is deleted and reported as absent.
    pub fn load_snapshot(&self) -> Result<Option<GameData>> {
        let path = self.snapshot_path();
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        match serde_json::from_str(&content) {
            Ok(data) => Ok(Some(data)),
            Err(err) => {
                warn!("Discarding unreadable snapshot {}: {err}", path.display());
                self.clear()?;
                Ok(None)
            }
        }
    }

    /// Delete the autosave slot if present.
    pub fn clear(&self) -> Result<()> {
        let path = self.snapshot_path();
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err).with_context(|| format!("failed to remove {}", path.display())),
        }
    }

    /// Write `data` as a pretty-printed backup and return its entry.
    pub fn export_backup(&self, name: &str, data: &GameData) -> Result<SaveEntry> {
        let updated_at = Utc::now();
        let name = sanitize_component(name);
        let file_name = format!("{}_{}.json", name, updated_at.format("%Y%m%d%H%M%S%3f"));
        let path = self.backup_dir().join(file_name);
        write_json(&path, data, true)?;
        Ok(SaveEntry {
            path,
            name,
            updated_at,
        })
    }

    /// All backups, most recent first.
    pub fn backups(&self) -> Result<Vec<SaveEntry>> {
        let dir = self.backup_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        for entry in fs::read_dir(&dir).context("failed to read backup directory")? {
            let entry = entry?;
            let path = entry.path();
            if !entry.file_type()?.is_file()
                || path.extension().and_then(|ext| ext.to_str()) != Some("json")
            {
                continue;
            }
            let updated_at = match entry.metadata().and_then(|meta| meta.modified()) {
                Ok(time) => DateTime::<Utc>::from(time),
                Err(err) => {
                    warn!("Skipping backup {:?}: {err}", path);
                    continue;
                }
            };
            let name = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .and_then(|stem| stem.rsplit_once('_'))
                .map(|(name, _)| name.to_string())
                .unwrap_or_else(|| "backup".to_string());
            entries.push(SaveEntry {
                path,
                name,
                updated_at,
            });
        }

        entries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(b.path.cmp(&a.path)));
        Ok(entries)
    }

    fn backup_dir(&self) -> PathBuf {
        self.root.join(BACKUP_DIR)
    }
}

fn write_json(path: &Path, data: &GameData, pretty: bool) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let serialised = if pretty {
        serde_json::to_vec_pretty(data)?
    } else {
        serde_json::to_vec(data)?
    };
    fs::write(path, serialised).with_context(|| format!("failed to write {}", path.display()))
}

/// Reduce `input` to characters that are safe in a file name.
pub fn sanitize_component(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    for ch in input.chars() {
        if ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_') {
            result.push(ch);
        }
    }
    if result.is_empty() {
        "quizboard".to_string()
    } else {
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Board, Category, Clue, FinalClue, Player, RoundName};
    use tempfile::tempdir;

    fn sample_game() -> GameData {
        let mut clue = Clue::new("Largest planet", 200);
        clue.chosen = true;
        let mut data = GameData::new(Board {
            single: vec![Category {
                category: "Space".to_string(),
                clues: vec![clue, Clue::new("Red planet", 400)],
            }],
            double: None,
            final_clue: FinalClue {
                category: "Moons".to_string(),
                clue: "Largest moon".to_string(),
                solution: "Ganymede".to_string(),
                html: false,
            },
        });
        let mut player = Player::new("Ann");
        player.score = -200;
        player.incorrect = 1;
        data.players = Some(vec![player]);
        data.round = Some(RoundName::Single);
        data.categories_shown = Some(1);
        data
    }

    #[test]
    fn snapshot_round_trip() -> Result<()> {
        let dir = tempdir()?;
        let store = SnapshotStore::new(dir.path());
        assert_eq!(store.load_snapshot()?, None);

        let data = sample_game();
        store.write_snapshot(&data)?;
        assert_eq!(store.load_snapshot()?, Some(data));

        store.clear()?;
        assert!(!store.snapshot_path().exists());
        store.clear()?;
        Ok(())
    }

    #[test]
    fn unreadable_snapshot_is_discarded() -> Result<()> {
        let dir = tempdir()?;
        let store = SnapshotStore::new(dir.path());
        fs::write(store.snapshot_path(), "{ not json")?;
        assert_eq!(store.load_snapshot()?, None);
        assert!(!store.snapshot_path().exists());
        Ok(())
    }

    #[test]
    fn backups_are_listed_newest_first() -> Result<()> {
        let dir = tempdir()?;
        let store = SnapshotStore::new(dir.path());
        assert!(store.backups()?.is_empty());

        let first = store.export_backup("Game Night!", &sample_game())?;
        let second = store.export_backup("rematch", &sample_game())?;
        assert_eq!(first.name, "GameNight");
        assert!(first.path.exists());

        let listed = store.backups()?;
        assert_eq!(listed.len(), 2);
        assert!(listed.iter().any(|entry| entry.path == second.path));
        assert!(listed.iter().all(|entry| entry.updated_at >= listed[1].updated_at));

        let content = fs::read_to_string(&first.path)?;
        assert!(content.contains('\n'));
        let parsed: GameData = serde_json::from_str(&content)?;
        assert_eq!(parsed, sample_game());
        Ok(())
    }

    #[test]
    fn sanitize_creates_safe_filenames() {
        assert_eq!(sanitize_component("Hello World!* 18??"), "HelloWorld18");
        assert_eq!(sanitize_component("../.."), "quizboard");
    }
}
