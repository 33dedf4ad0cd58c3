#![warn(clippy::all, missing_docs)]

//! Core game logic for quizboard.
//!
//! This crate hosts the data models, the game-flow state machine and its
//! keyboard routing, configuration handling, preset discovery, and the
//! persistence layer used by the terminal UI and any future frontends.

pub mod clue;
pub mod config;
pub mod engine;
pub mod error;
pub mod gate;
pub mod input;
pub mod ledger;
pub mod models;
pub mod resource;
pub mod save;
pub mod wager;

pub use config::AppConfig;
pub use engine::{Command, GameEngine, GameEvent, GamePhase, NullSink, SnapshotSink};
pub use error::EngineError;
pub use input::{dispatch, InputContext, Key};
pub use models::{Board, Category, Clue, FinalClue, GameData, Player, RoundName};
pub use resource::{LoadError, PresetLibrary};
pub use save::SnapshotStore;
