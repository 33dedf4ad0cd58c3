//! Shared domain models.
//!
//! Serialized field names follow the established game file format
//! (`dailyDouble`, `numCategoriesShown`, ...), so existing board files load
//! unchanged and backups stay interchangeable with them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Ordered phases of a game.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum RoundName {
    /// First board round.
    #[default]
    Single,
    /// Second board round, optional in a game file.
    Double,
    /// Single wagered clue.
    Final,
    /// Results.
    Done,
}

impl RoundName {
    /// Board rounds are the ones played from a category/clue grid.
    pub fn is_board_round(self) -> bool {
        matches!(self, RoundName::Single | RoundName::Double)
    }

    /// User-facing label for headings.
    pub fn label(self) -> &'static str {
        match self {
            RoundName::Single => "Jeopardy!",
            RoundName::Double => "Double Jeopardy!",
            RoundName::Final => "Final Jeopardy!",
            RoundName::Done => "Final Results",
        }
    }
}

impl fmt::Display for RoundName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RoundName::Single => "single",
            RoundName::Double => "double",
            RoundName::Final => "final",
            RoundName::Done => "done",
        };
        f.write_str(name)
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// A single clue on a board round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clue {
    /// Clue text, plain or HTML depending on `html`.
    pub clue: String,
    /// Expected response, shown to the host only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solution: Option<String>,
    /// Face value in dollars.
    pub value: u32,
    /// Whether `clue` carries HTML markup.
    #[serde(default, skip_serializing_if = "is_false")]
    pub html: bool,
    /// Daily doubles are scored with a wager instead of `value`.
    #[serde(default, rename = "dailyDouble", skip_serializing_if = "is_false")]
    pub daily_double: bool,
    /// Set once when the clue is selected from the board.
    #[serde(default, skip_serializing_if = "is_false")]
    pub chosen: bool,
}

impl Clue {
    /// Plain clue with no solution text.
    pub fn new(clue: impl Into<String>, value: u32) -> Self {
        Self {
            clue: clue.into(),
            solution: None,
            value,
            html: false,
            daily_double: false,
            chosen: false,
        }
    }
}

/// A titled column of clues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Category title.
    pub category: String,
    /// Clues from lowest to highest row.
    #[serde(default)]
    pub clues: Vec<Clue>,
}

/// The one clue of the final round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalClue {
    /// Category title revealed before the clue.
    pub category: String,
    /// Clue text.
    pub clue: String,
    /// Expected response.
    #[serde(default)]
    pub solution: String,
    /// Whether `clue` and `solution` carry HTML markup.
    #[serde(default, skip_serializing_if = "is_false")]
    pub html: bool,
}

/// Per-round board content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    /// First board round.
    pub single: Vec<Category>,
    /// Second board round; when absent the game skips to the final round.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub double: Option<Vec<Category>>,
    /// Final round clue.
    #[serde(rename = "final")]
    pub final_clue: FinalClue,
}

impl Board {
    /// Categories for a board round, `None` for final/done or a missing double round.
    pub fn round(&self, round: RoundName) -> Option<&[Category]> {
        match round {
            RoundName::Single => Some(&self.single),
            RoundName::Double => self.double.as_deref(),
            RoundName::Final | RoundName::Done => None,
        }
    }

    /// Mutable access to a board round's categories.
    pub fn round_mut(&mut self, round: RoundName) -> Option<&mut Vec<Category>> {
        match round {
            RoundName::Single => Some(&mut self.single),
            RoundName::Double => self.double.as_mut(),
            RoundName::Final | RoundName::Done => None,
        }
    }

    /// Whether the game file carries a second board round.
    pub fn has_double(&self) -> bool {
        self.double.is_some()
    }

    /// Look up a single clue.
    pub fn clue(&self, round: RoundName, category: usize, clue: usize) -> Option<&Clue> {
        self.round(round)?.get(category)?.clues.get(clue)
    }
}

/// A contestant and their running tally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Display name, unique within a session.
    pub name: String,
    /// Running score; may go negative.
    #[serde(default)]
    pub score: i64,
    /// Number of correct responses.
    #[serde(default)]
    pub correct: u32,
    /// Number of incorrect responses.
    #[serde(default)]
    pub incorrect: u32,
}

impl Player {
    /// Fresh player with a zero score.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            score: 0,
            correct: 0,
            incorrect: 0,
        }
    }

    /// Score formatted the way the podium shows it (`$400`, `-$400`).
    pub fn score_label(&self) -> String {
        format_dollars(self.score)
    }
}

/// Format a signed dollar amount with the sign ahead of the symbol.
pub fn format_dollars(amount: i64) -> String {
    if amount >= 0 {
        format!("${amount}")
    } else {
        format!("-${}", amount.unsigned_abs())
    }
}

/// Serialized game: what game files, backups and the cached snapshot contain.
///
/// A missing `players` list means the game has not left player setup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameData {
    /// Board content for all rounds.
    pub game: Board,
    /// Player roster, present once play has started.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub players: Option<Vec<Player>>,
    /// Round to resume at.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub round: Option<RoundName>,
    /// Progress through the category reveal sequence.
    #[serde(
        default,
        rename = "numCategoriesShown",
        skip_serializing_if = "Option::is_none"
    )]
    pub categories_shown: Option<usize>,
}

impl GameData {
    /// Wrap a board with no roster or progress.
    pub fn new(game: Board) -> Self {
        Self {
            game,
            players: None,
            round: None,
            categories_shown: None,
        }
    }
}
