//! Player roster and score arithmetic.

use crate::{error::EngineError, models::Player};

/// Ordered roster with each player's running score and answer tally.
///
/// Order matters: it is the podium order and the keyboard shortcut order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScoreLedger {
    players: Vec<Player>,
}

impl ScoreLedger {
    /// Wrap an existing roster.
    pub fn new(players: Vec<Player>) -> Self {
        Self { players }
    }

    /// Players in podium order.
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// Player at `index`, if any.
    pub fn get(&self, index: usize) -> Option<&Player> {
        self.players.get(index)
    }

    /// Number of players.
    pub fn len(&self) -> usize {
        self.players.len()
    }

    /// Whether the roster is empty.
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Append a player with a zero score. Names are trimmed and must be unique.
    pub fn add(&mut self, name: &str) -> Result<&Player, EngineError> {
        let name = normalize_name(name)?;
        if self.position(&name).is_some() {
            return Err(EngineError::DuplicateName(name));
        }
        self.players.push(Player::new(name));
        let index = self.players.len() - 1;
        Ok(&self.players[index])
    }

    /// Remove the player with exactly this name.
    pub fn remove(&mut self, name: &str) -> Result<Player, EngineError> {
        let index = self
            .position(name)
            .ok_or_else(|| EngineError::UnknownPlayer(name.to_string()))?;
        Ok(self.players.remove(index))
    }

    /// Rename a player, keeping their position and tally.
    pub fn rename(&mut self, old: &str, new: &str) -> Result<&Player, EngineError> {
        let index = self
            .position(old)
            .ok_or_else(|| EngineError::UnknownPlayer(old.to_string()))?;
        let new = normalize_name(new)?;
        if let Some(existing) = self.position(&new) {
            if existing != index {
                return Err(EngineError::DuplicateName(new));
            }
        }
        let renamed = Player {
            name: new,
            ..self.players[index].clone()
        };
        self.players[index] = renamed;
        Ok(&self.players[index])
    }

    /// Apply a signed score delta and classify the response.
    ///
    /// The previous record is replaced, never edited, so anything holding a
    /// clone of the roster keeps seeing the old values.
    pub fn record(
        &mut self,
        index: usize,
        delta: i64,
        correct: bool,
    ) -> Result<&Player, EngineError> {
        let current = self
            .players
            .get(index)
            .ok_or(EngineError::PlayerOutOfRange(index))?;
        let updated = Player {
            score: current.score.saturating_add(delta),
            correct: current.correct + u32::from(correct),
            incorrect: current.incorrect + u32::from(!correct),
            ..current.clone()
        };
        self.players[index] = updated;
        Ok(&self.players[index])
    }

    /// Player indices ordered by score, highest first. Ties keep podium order.
    pub fn standings(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.players.len()).collect();
        order.sort_by(|a, b| self.players[*b].score.cmp(&self.players[*a].score));
        order
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.players.iter().position(|player| player.name == name)
    }
}

fn normalize_name(name: &str) -> Result<String, EngineError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(EngineError::BlankName);
    }
    Ok(trimmed.to_string())
}
