#![allow(missing_docs)]

//! Outbound hooks: named game events and snapshot persistence.

use std::fmt;

use crate::{clue::ClueStage, models::GameData, models::RoundName};

/// Something the host just did, reported after the engine commits it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    /// A game file, preset or cached snapshot was installed.
    Loaded {
        /// Whether the game resumed past player setup.
        resumed: bool,
    },
    PlayerAdded(String),
    PlayerRemoved(String),
    PlayerRenamed {
        from: String,
        to: String,
    },
    PlayStarted,
    CategoryShown(usize),
    ClueSelected {
        category: usize,
        clue: usize,
    },
    ClueAdvanced(ClueStage),
    ClueClosed,
    ReturnedToBoard,
    ScoreUpdated {
        player: usize,
        delta: i64,
        correct: bool,
    },
    RoundAdvanced {
        from: RoundName,
        to: RoundName,
    },
    GameFinished,
    Restarted,
    ImageOpened(String),
    ImageClosed,
}

impl GameEvent {
    /// Stable event name, suitable for analytics.
    pub fn name(&self) -> &'static str {
        match self {
            GameEvent::Loaded { resumed: true } => "Resume Game",
            GameEvent::Loaded { resumed: false } => "Load Game",
            GameEvent::PlayerAdded(_) => "Add Player",
            GameEvent::PlayerRemoved(_) => "Remove Player",
            GameEvent::PlayerRenamed { .. } => "Edit Player",
            GameEvent::PlayStarted => "Play Game",
            GameEvent::CategoryShown(_) => "Show Category",
            GameEvent::ClueSelected { .. } => "Show Clue",
            GameEvent::ClueAdvanced(_) => "Advance Clue",
            GameEvent::ClueClosed => "Close Clue",
            GameEvent::ReturnedToBoard => "Back to Board",
            GameEvent::ScoreUpdated { .. } => "Update Score",
            GameEvent::RoundAdvanced {
                to: RoundName::Double,
                ..
            } => "Proceed to Double Jeopardy",
            GameEvent::RoundAdvanced { .. } => "Proceed to Final Jeopardy",
            GameEvent::GameFinished => "Finish Game",
            GameEvent::Restarted => "Restart Game",
            GameEvent::ImageOpened(_) => "Open Image",
            GameEvent::ImageClosed => "Close Image",
        }
    }
}

impl fmt::Display for GameEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Callback invoked with every committed event. It cannot influence the engine.
pub type EventHook = Box<dyn FnMut(&GameEvent) + Send>;

/// Destination for session snapshots.
///
/// Implementations must not block: the engine calls them inline after each
/// committed command and never looks at the outcome.
pub trait SnapshotSink: Send {
    /// Record the latest snapshot.
    fn persist(&mut self, snapshot: &GameData);

    /// Forget any stored snapshot.
    fn clear(&mut self);
}

/// Sink that drops everything, used when autosave is off.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl SnapshotSink for NullSink {
    fn persist(&mut self, _snapshot: &GameData) {}

    fn clear(&mut self) {}
}
