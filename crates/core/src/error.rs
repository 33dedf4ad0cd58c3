#![allow(missing_docs)]

//! Errors returned by game commands.
//!
//! Every variant describes a command that was absorbed without touching the
//! session. Front-ends log them and carry on.

use thiserror::Error;

use crate::{engine::GamePhase, models::RoundName};

/// Reason a command left the game unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("{command} is not available while {phase}")]
    InvalidPhase {
        command: &'static str,
        phase: GamePhase,
    },

    #[error("player name must not be blank")]
    BlankName,

    #[error("a player named {0:?} already exists")]
    DuplicateName(String),

    #[error("no player named {0:?}")]
    UnknownPlayer(String),

    #[error("at least one player is required")]
    NoPlayers,

    #[error("no player at position {0}")]
    PlayerOutOfRange(usize),

    #[error("all categories must be revealed first")]
    CategoriesHidden,

    #[error("all categories are already revealed")]
    CategoriesComplete,

    #[error("another clue is already open")]
    ClueActive,

    #[error("no clue is open")]
    NoActiveClue,

    #[error("no clue at category {category}, row {clue}")]
    ClueNotFound { category: usize, clue: usize },

    #[error("clue at category {category}, row {clue} was already chosen")]
    ClueAlreadyChosen { category: usize, clue: usize },

    #[error("the clue has no further stage")]
    NothingToAdvance,

    #[error("the {0} round still has unchosen clues")]
    RoundIncomplete(RoundName),

    #[error("the solution has not been revealed yet")]
    SolutionHidden,

    #[error("the game has no {0} board")]
    MissingBoard(RoundName),

    #[error("the clue has no images")]
    NoImage,
}
