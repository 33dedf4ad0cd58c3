//! Keyboard shortcut routing.
//!
//! Keys are resolved to a [`Command`] from the engine's current state, so the
//! shortcut layer and on-screen controls always drive the same transitions.

use crate::{
    clue::ClueTarget,
    engine::{Command, GameEngine, GamePhase},
};

/// Row of keys that mark players 1 to 9 incorrect.
pub const INCORRECT_KEYS: [char; 9] = ['q', 'w', 'e', 'r', 't', 'y', 'u', 'i', 'o'];

/// A key press, independent of the terminal backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// Printable character.
    Char(char),
    /// Space bar.
    Space,
    /// Enter / Return.
    Enter,
    /// Escape.
    Esc,
    /// Anything the dispatcher does not care about.
    Other,
}

/// Host UI state the dispatcher needs besides the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputContext {
    /// A text field (wager, player name) currently owns the keyboard.
    pub text_focused: bool,
}

/// Resolve a key press into a command, or `None` when the key does nothing in
/// the current state. Nothing is applied here.
pub fn dispatch(engine: &GameEngine, key: Key, ctx: InputContext) -> Option<Command> {
    if key == Key::Esc && engine.lightbox().is_open() {
        return Some(Command::CloseImage);
    }
    if !matches!(engine.phase(), GamePhase::RoundInPlay(_)) {
        return None;
    }
    if matches!(key, Key::Space | Key::Enter) && engine.category_reveal_pending() {
        return Some(Command::RevealCategory);
    }

    let active = engine.active_clue()?;
    let on_board = matches!(active.target(), ClueTarget::Board { .. });

    match key {
        Key::Space if on_board => active
            .interstitial_pending()
            .then_some(Command::AdvanceClue),
        Key::Space => Some(Command::AdvanceClue),
        Key::Enter if on_board && !active.interstitial_pending() => Some(Command::CloseClue),
        Key::Enter => Some(Command::AdvanceClue),
        Key::Esc if on_board => Some(Command::ReturnToBoard),
        Key::Esc => active.can_finish().then_some(Command::FinishGame),
        Key::Char(_) if ctx.text_focused => None,
        Key::Char(ch) => shortcut(ch, engine.players().len()),
        Key::Other => None,
    }
}

fn shortcut(ch: char, players: usize) -> Option<Command> {
    let lower = ch.to_ascii_lowercase();
    if let Some(digit) = ch.to_digit(10).filter(|d| (1..=9).contains(d)) {
        let player = digit as usize - 1;
        return (player < players).then_some(Command::Answer {
            player,
            correct: true,
        });
    }
    if let Some(player) = INCORRECT_KEYS.iter().position(|key| *key == lower) {
        return (player < players).then_some(Command::Answer {
            player,
            correct: false,
        });
    }
    (lower == 'z').then_some(Command::OpenImage)
}
