//! Reveal state of the clue currently on screen.
//!
//! Board clues go `DailyDouble -> Clue` and are then closed by the host from
//! any stage. The final clue goes `Category -> Text <-> Solution` and may only
//! be finished from `Solution`.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::EngineError;

/// Where the open clue lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClueTarget {
    /// A clue on the current board round.
    Board {
        /// Category column.
        category: usize,
        /// Clue row within the category.
        clue: usize,
        /// Scored with a wager instead of the face value.
        daily_double: bool,
    },
    /// The final round clue.
    Final,
}

/// Presentation stage of the open clue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClueStage {
    /// Daily double splash shown before the clue text.
    DailyDouble,
    /// Board clue text.
    Clue,
    /// Final round category, clue still hidden.
    Category,
    /// Final round clue text.
    Text,
    /// Final round solution.
    Solution,
}

/// The single open clue and its reveal stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveClue {
    target: ClueTarget,
    stage: ClueStage,
}

impl ActiveClue {
    /// Open a board clue; daily doubles start on their splash screen.
    pub fn board(category: usize, clue: usize, daily_double: bool) -> Self {
        let stage = if daily_double {
            ClueStage::DailyDouble
        } else {
            ClueStage::Clue
        };
        Self {
            target: ClueTarget::Board {
                category,
                clue,
                daily_double,
            },
            stage,
        }
    }

    /// Open the final clue on its category.
    pub fn final_round() -> Self {
        Self {
            target: ClueTarget::Final,
            stage: ClueStage::Category,
        }
    }

    /// What this clue points at.
    pub fn target(&self) -> ClueTarget {
        self.target
    }

    /// Current stage.
    pub fn stage(&self) -> ClueStage {
        self.stage
    }

    /// Board position, `None` for the final clue.
    pub fn position(&self) -> Option<(usize, usize)> {
        match self.target {
            ClueTarget::Board { category, clue, .. } => Some((category, clue)),
            ClueTarget::Final => None,
        }
    }

    /// Whether this is the final round clue.
    pub fn is_final(&self) -> bool {
        matches!(self.target, ClueTarget::Final)
    }

    /// Whether responses are scored from the wager registry.
    pub fn is_wagering(&self) -> bool {
        match self.target {
            ClueTarget::Board { daily_double, .. } => daily_double,
            ClueTarget::Final => true,
        }
    }

    /// Whether the daily double splash is still up.
    pub fn interstitial_pending(&self) -> bool {
        self.stage == ClueStage::DailyDouble
    }

    /// Whether clue text is visible (as opposed to a splash or category card).
    pub fn text_visible(&self) -> bool {
        matches!(self.stage, ClueStage::Clue | ClueStage::Text)
    }

    /// The final clue can only be finished once its solution has been shown.
    pub fn can_finish(&self) -> bool {
        self.stage == ClueStage::Solution
    }

    /// Move to the next stage.
    ///
    /// Board clues have nothing past their text; the final clue toggles
    /// between text and solution.
    pub fn advance(&mut self) -> Result<ClueStage, EngineError> {
        let next = match self.stage {
            ClueStage::DailyDouble => ClueStage::Clue,
            ClueStage::Clue => return Err(EngineError::NothingToAdvance),
            ClueStage::Category => ClueStage::Text,
            ClueStage::Text => ClueStage::Solution,
            ClueStage::Solution => ClueStage::Text,
        };
        self.stage = next;
        Ok(next)
    }
}

/// Full-screen image overlay, independent of the clue stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Lightbox {
    /// No overlay.
    #[default]
    Closed,
    /// Overlay showing the image at this URL.
    Open(String),
}

impl Lightbox {
    /// Whether the overlay is showing.
    pub fn is_open(&self) -> bool {
        matches!(self, Lightbox::Open(_))
    }

    /// URL of the image on display.
    pub fn url(&self) -> Option<&str> {
        match self {
            Lightbox::Open(url) => Some(url),
            Lightbox::Closed => None,
        }
    }
}

static IMG_SRC_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<img\b[^>]*?\bsrc\s*=\s*["']([^"']+)["']"#).expect("invalid img regex")
});

/// Image sources embedded in HTML clue text, in document order.
pub fn image_urls(html: &str) -> Vec<String> {
    IMG_SRC_RE
        .captures_iter(html)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
        .collect()
}
