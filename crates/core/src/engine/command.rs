#![allow(missing_docs)]

//! Command vocabulary shared by keyboard shortcuts and on-screen controls.

/// A host action. Every input channel resolves to one of these before
/// touching the game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Reveal the next category title of the current board round.
    RevealCategory,
    /// Open a clue from the board.
    SelectClue { category: usize, clue: usize },
    /// Move the open clue to its next stage.
    AdvanceClue,
    /// Dismiss the open board clue.
    CloseClue,
    /// Leave the open board clue without committing anything further.
    ReturnToBoard,
    /// Score a response to the open clue using its value or the player's wager.
    Answer { player: usize, correct: bool },
    /// Move on from an exhausted board round.
    AdvanceRound,
    /// End the final round and show results.
    FinishGame,
    /// Discard the session.
    Restart,
    /// Show the first image embedded in the open clue.
    OpenImage,
    /// Hide the image overlay.
    CloseImage,
}
