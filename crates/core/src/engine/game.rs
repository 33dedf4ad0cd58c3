//! Top-level game state machine.

use std::fmt;

use tracing::debug;

use crate::{
    clue::{image_urls, ActiveClue, ClueStage, ClueTarget, Lightbox},
    error::EngineError,
    gate,
    ledger::ScoreLedger,
    models::{Board, Category, Clue, FinalClue, GameData, Player, RoundName},
    wager::WagerRegistry,
};

use super::{
    command::Command,
    events::{EventHook, GameEvent, NullSink, SnapshotSink},
};

/// Coarse state of the game as seen by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    /// Nothing loaded yet.
    NoSession,
    /// Board loaded, roster still editable.
    PlayerSetup,
    /// A board round or the final round is being played.
    RoundInPlay(RoundName),
    /// Results.
    Done,
}

impl fmt::Display for GamePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GamePhase::NoSession => f.write_str("no game is loaded"),
            GamePhase::PlayerSetup => f.write_str("setting up players"),
            GamePhase::RoundInPlay(round) => write!(f, "playing the {round} round"),
            GamePhase::Done => f.write_str("the game is over"),
        }
    }
}

#[derive(Debug, Clone)]
struct Session {
    board: Board,
    ledger: ScoreLedger,
    round: RoundName,
    categories_shown: usize,
    started: bool,
}

impl Session {
    fn phase(&self) -> GamePhase {
        if !self.started {
            GamePhase::PlayerSetup
        } else if self.round == RoundName::Done {
            GamePhase::Done
        } else {
            GamePhase::RoundInPlay(self.round)
        }
    }

    fn categories(&self) -> &[Category] {
        self.board.round(self.round).unwrap_or(&[])
    }
}

/// Owns the session and applies host commands to it.
///
/// Every command either commits completely (and then persists a snapshot and
/// reports a [`GameEvent`]) or returns an [`EngineError`] having changed
/// nothing.
pub struct GameEngine {
    session: Option<Session>,
    active: Option<ActiveClue>,
    wagers: WagerRegistry,
    lightbox: Lightbox,
    sink: Box<dyn SnapshotSink>,
    hook: Option<EventHook>,
}

impl Default for GameEngine {
    fn default() -> Self {
        Self::new(Box::new(NullSink))
    }
}

impl fmt::Debug for GameEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameEngine")
            .field("phase", &self.phase())
            .field("active", &self.active)
            .field("lightbox", &self.lightbox)
            .finish()
    }
}

impl GameEngine {
    /// Engine with no session that persists through `sink`.
    pub fn new(sink: Box<dyn SnapshotSink>) -> Self {
        Self {
            session: None,
            active: None,
            wagers: WagerRegistry::default(),
            lightbox: Lightbox::Closed,
            sink,
            hook: None,
        }
    }

    /// Install the callback that receives every committed event.
    pub fn set_event_hook(&mut self, hook: EventHook) {
        self.hook = Some(hook);
    }

    // --- projections -----------------------------------------------------

    /// Current phase.
    pub fn phase(&self) -> GamePhase {
        self.session
            .as_ref()
            .map(Session::phase)
            .unwrap_or(GamePhase::NoSession)
    }

    /// Current round, `None` without a session.
    pub fn round(&self) -> Option<RoundName> {
        self.session.as_ref().map(|session| session.round)
    }

    /// Full board content for all rounds.
    pub fn board(&self) -> Option<&Board> {
        self.session.as_ref().map(|session| &session.board)
    }

    /// Categories of the board round being played.
    pub fn current_board(&self) -> Option<&[Category]> {
        let session = self.session.as_ref()?;
        session.board.round(session.round)
    }

    /// The final round clue.
    pub fn final_clue(&self) -> Option<&FinalClue> {
        self.board().map(|board| &board.final_clue)
    }

    /// Players in podium order; empty without a session.
    pub fn players(&self) -> &[Player] {
        self.session
            .as_ref()
            .map(|session| session.ledger.players())
            .unwrap_or(&[])
    }

    /// Player indices from highest to lowest score.
    pub fn standings(&self) -> Vec<usize> {
        self.session
            .as_ref()
            .map(|session| session.ledger.standings())
            .unwrap_or_default()
    }

    /// How many categories of the current round have been revealed.
    pub fn categories_shown(&self) -> usize {
        self.session
            .as_ref()
            .map(|session| session.categories_shown)
            .unwrap_or(0)
    }

    /// Whether a board round is still revealing its category titles.
    pub fn category_reveal_pending(&self) -> bool {
        match self.session.as_ref() {
            Some(session)
                if session.phase() == GamePhase::RoundInPlay(session.round)
                    && session.round.is_board_round() =>
            {
                session.categories_shown < session.categories().len()
            }
            _ => false,
        }
    }

    /// The open clue, if any. During the final round this is the final clue.
    pub fn active_clue(&self) -> Option<&ActiveClue> {
        self.active.as_ref()
    }

    /// Board data of the open board clue.
    pub fn active_board_clue(&self) -> Option<&Clue> {
        let (category, clue) = self.active.as_ref()?.position()?;
        let session = self.session.as_ref()?;
        session.board.clue(session.round, category, clue)
    }

    /// Category title of the open clue.
    pub fn active_category_title(&self) -> Option<&str> {
        let active = self.active.as_ref()?;
        match active.position() {
            Some((category, _)) => self
                .current_board()?
                .get(category)
                .map(|category| category.category.as_str()),
            None => self.final_clue().map(|clue| clue.category.as_str()),
        }
    }

    /// Face value of the open board clue.
    pub fn current_value(&self) -> Option<u32> {
        self.active_board_clue().map(|clue| clue.value)
    }

    /// Whether the open clue is scored from wagers.
    pub fn is_wagering(&self) -> bool {
        self.active.map(|clue| clue.is_wagering()).unwrap_or(false)
    }

    /// Wager entry for each player.
    pub fn wagers(&self) -> &WagerRegistry {
        &self.wagers
    }

    /// Image overlay state.
    pub fn lightbox(&self) -> &Lightbox {
        &self.lightbox
    }

    /// Whether the host may leave the current round from the board.
    pub fn can_advance_round(&self) -> bool {
        match self.session.as_ref() {
            Some(session) if session.started && self.active.is_none() => {
                gate::can_advance(session.round, &session.board)
            }
            _ => false,
        }
    }

    /// Round that `advance_round` would move to.
    pub fn next_round(&self) -> Option<RoundName> {
        let session = self.session.as_ref()?;
        gate::target_round(session.round, session.board.has_double())
    }

    /// Complete record of the session, as written to the autosave slot.
    pub fn snapshot(&self) -> Option<GameData> {
        let session = self.session.as_ref()?;
        Some(GameData {
            game: session.board.clone(),
            players: session
                .started
                .then(|| session.ledger.players().to_vec()),
            round: Some(session.round),
            categories_shown: Some(session.categories_shown),
        })
    }

    /// Record for a user backup.
    ///
    /// Once play has started this is `{game, players, round}`. During player
    /// setup the roster is left out so reloading the file returns to setup.
    pub fn export(&self) -> Option<GameData> {
        let mut data = self.snapshot()?;
        if data.players.is_some() {
            data.categories_shown = None;
        }
        Some(data)
    }

    // --- commands --------------------------------------------------------

    /// Apply a command from any input channel.
    pub fn apply(&mut self, command: Command) -> Result<(), EngineError> {
        let result = match &command {
            Command::RevealCategory => self.reveal_category(),
            Command::SelectClue { category, clue } => self.select_clue(*category, *clue),
            Command::AdvanceClue => self.advance_clue_stage().map(|_| ()),
            Command::CloseClue => self.close_clue(),
            Command::ReturnToBoard => self.return_to_board(),
            Command::Answer { player, correct } => self.answer(*player, *correct),
            Command::AdvanceRound => self.advance_round().map(|_| ()),
            Command::FinishGame => self.finish_game(),
            Command::Restart => {
                self.restart();
                Ok(())
            }
            Command::OpenImage => self.open_first_image(),
            Command::CloseImage => self.close_image(),
        };
        if let Err(err) = &result {
            debug!(?command, %err, "Command ignored");
        }
        result
    }

    /// Install a game. Without a roster the game lands in player setup,
    /// whatever round the data names.
    ///
    /// Data that cannot be played (no board for the named round, or an empty
    /// single round) is refused and the previous state is kept.
    pub fn load(&mut self, data: GameData) -> Result<(), EngineError> {
        let started = data.players.is_some();
        let round = if started {
            data.round.unwrap_or_default()
        } else {
            RoundName::Single
        };

        if data.game.single.is_empty() {
            return Err(EngineError::MissingBoard(RoundName::Single));
        }
        if round.is_board_round() {
            match data.game.round(round) {
                Some(categories) if !categories.is_empty() => {}
                _ => return Err(EngineError::MissingBoard(round)),
            }
        }

        let mut categories_shown = data.categories_shown.unwrap_or(0);
        if let Some(categories) = data.game.round(round) {
            categories_shown = categories_shown.min(categories.len());
        }
        let ledger = ScoreLedger::new(data.players.unwrap_or_default());

        self.wagers.reset(ledger.len());
        self.active = (round == RoundName::Final).then(ActiveClue::final_round);
        self.lightbox = Lightbox::Closed;
        self.session = Some(Session {
            board: data.game,
            ledger,
            round,
            categories_shown,
            started,
        });
        self.emit(GameEvent::Loaded { resumed: started });
        Ok(())
    }

    /// Add a player during setup.
    pub fn add_player(&mut self, name: &str) -> Result<(), EngineError> {
        let session = self.setup_session("add_player")?;
        let name = session.ledger.add(name)?.name.clone();
        self.commit(GameEvent::PlayerAdded(name));
        Ok(())
    }

    /// Remove a player during setup.
    pub fn remove_player(&mut self, name: &str) -> Result<(), EngineError> {
        let session = self.setup_session("remove_player")?;
        let removed = session.ledger.remove(name)?;
        self.commit(GameEvent::PlayerRemoved(removed.name));
        Ok(())
    }

    /// Rename a player during setup.
    pub fn rename_player(&mut self, old: &str, new: &str) -> Result<(), EngineError> {
        let session = self.setup_session("rename_player")?;
        let to = session.ledger.rename(old, new)?.name.clone();
        self.commit(GameEvent::PlayerRenamed {
            from: old.to_string(),
            to,
        });
        Ok(())
    }

    /// Leave player setup for the single round.
    pub fn start_play(&mut self) -> Result<(), EngineError> {
        let session = self.setup_session("start_play")?;
        if session.ledger.is_empty() {
            return Err(EngineError::NoPlayers);
        }
        session.started = true;
        session.round = RoundName::Single;
        let players = session.ledger.len();
        self.wagers.reset(players);
        self.commit(GameEvent::PlayStarted);
        Ok(())
    }

    /// Reveal the next category title.
    pub fn reveal_category(&mut self) -> Result<(), EngineError> {
        let session = self.board_session("reveal_category")?;
        if session.categories_shown >= session.categories().len() {
            return Err(EngineError::CategoriesComplete);
        }
        session.categories_shown += 1;
        let shown = session.categories_shown;
        self.commit(GameEvent::CategoryShown(shown));
        Ok(())
    }

    /// Open a clue from the board and mark it chosen straight away.
    pub fn select_clue(&mut self, category: usize, clue: usize) -> Result<(), EngineError> {
        if self.active.is_some() {
            return Err(EngineError::ClueActive);
        }
        let session = self.board_session("select_clue")?;
        if session.categories_shown < session.categories().len() {
            return Err(EngineError::CategoriesHidden);
        }
        let players = session.ledger.len();
        let round = session.round;
        let target = session
            .board
            .round_mut(round)
            .and_then(|categories| categories.get_mut(category))
            .and_then(|column| column.clues.get_mut(clue))
            .ok_or(EngineError::ClueNotFound { category, clue })?;
        if target.chosen {
            return Err(EngineError::ClueAlreadyChosen { category, clue });
        }
        target.chosen = true;
        let daily_double = target.daily_double;

        self.active = Some(ActiveClue::board(category, clue, daily_double));
        self.lightbox = Lightbox::Closed;
        if daily_double {
            self.wagers.reset(players);
        }
        self.commit(GameEvent::ClueSelected { category, clue });
        Ok(())
    }

    /// Move the open clue to its next stage.
    pub fn advance_clue_stage(&mut self) -> Result<ClueStage, EngineError> {
        let active = self.active.as_mut().ok_or(EngineError::NoActiveClue)?;
        let stage = active.advance()?;
        self.lightbox = Lightbox::Closed;
        self.commit(GameEvent::ClueAdvanced(stage));
        Ok(stage)
    }

    /// Dismiss the open board clue. It stays chosen.
    pub fn close_clue(&mut self) -> Result<(), EngineError> {
        self.dismiss_board_clue("close_clue")?;
        self.commit(GameEvent::ClueClosed);
        Ok(())
    }

    /// Go back to the board from the open clue. It stays chosen.
    pub fn return_to_board(&mut self) -> Result<(), EngineError> {
        self.dismiss_board_clue("return_to_board")?;
        self.commit(GameEvent::ReturnedToBoard);
        Ok(())
    }

    /// Leave an exhausted board round. Returns the round entered.
    pub fn advance_round(&mut self) -> Result<RoundName, EngineError> {
        if self.active.is_some() {
            return Err(EngineError::ClueActive);
        }
        let session = self.board_session("advance_round")?;
        let from = session.round;
        if !gate::can_advance(from, &session.board) {
            return Err(EngineError::RoundIncomplete(from));
        }
        let to = gate::target_round(from, session.board.has_double())
            .ok_or(EngineError::RoundIncomplete(from))?;

        session.round = to;
        if from == RoundName::Single {
            session.categories_shown = 0;
        }
        let players = session.ledger.len();
        if to == RoundName::Final {
            self.active = Some(ActiveClue::final_round());
            self.wagers.reset(players);
        }
        self.commit(GameEvent::RoundAdvanced { from, to });
        Ok(to)
    }

    /// End the final round. Only possible once its solution has been shown.
    pub fn finish_game(&mut self) -> Result<(), EngineError> {
        let phase = self.phase();
        if phase != GamePhase::RoundInPlay(RoundName::Final) {
            return Err(EngineError::InvalidPhase {
                command: "finish_game",
                phase,
            });
        }
        match self.active {
            Some(active) if active.is_final() && active.can_finish() => {}
            _ => return Err(EngineError::SolutionHidden),
        }
        if let Some(session) = self.session.as_mut() {
            session.round = RoundName::Done;
        }
        self.active = None;
        self.lightbox = Lightbox::Closed;
        self.commit(GameEvent::GameFinished);
        Ok(())
    }

    /// Add `magnitude` for a correct response or subtract it for an incorrect
    /// one, and count the response.
    pub fn score_player(
        &mut self,
        player: usize,
        magnitude: u32,
        correct: bool,
    ) -> Result<(), EngineError> {
        let phase = self.phase();
        let Some(session) = self
            .session
            .as_mut()
            .filter(|_| matches!(phase, GamePhase::RoundInPlay(_)))
        else {
            return Err(EngineError::InvalidPhase {
                command: "score_player",
                phase,
            });
        };
        let delta = if correct {
            i64::from(magnitude)
        } else {
            -i64::from(magnitude)
        };
        session.ledger.record(player, delta, correct)?;
        self.commit(GameEvent::ScoreUpdated {
            player,
            delta,
            correct,
        });
        Ok(())
    }

    /// Score a response to the open clue.
    ///
    /// Wagering clues use the player's coerced wager, everything else the face
    /// value. The player's wager entry is emptied afterwards.
    pub fn answer(&mut self, player: usize, correct: bool) -> Result<(), EngineError> {
        if self.active.is_none() {
            return Err(EngineError::NoActiveClue);
        }
        if player >= self.players().len() {
            return Err(EngineError::PlayerOutOfRange(player));
        }
        let magnitude = if self.is_wagering() {
            self.wagers.take(player)
        } else {
            self.current_value().unwrap_or(0)
        };
        self.score_player(player, magnitude, correct)
    }

    /// Replace a player's wager text while a wagering clue is open.
    pub fn set_wager(&mut self, player: usize, text: &str) -> Result<(), EngineError> {
        if !self.is_wagering() {
            return Err(EngineError::NoActiveClue);
        }
        if self.wagers.set(player, text) {
            Ok(())
        } else {
            Err(EngineError::PlayerOutOfRange(player))
        }
    }

    /// Show the first image embedded in the visible clue text.
    pub fn open_first_image(&mut self) -> Result<(), EngineError> {
        let url = self
            .visible_html()
            .and_then(|html| image_urls(html).into_iter().next())
            .ok_or(EngineError::NoImage)?;
        self.lightbox = Lightbox::Open(url.clone());
        self.emit(GameEvent::ImageOpened(url));
        Ok(())
    }

    /// Hide the image overlay.
    pub fn close_image(&mut self) -> Result<(), EngineError> {
        if !self.lightbox.is_open() {
            return Err(EngineError::NoImage);
        }
        self.lightbox = Lightbox::Closed;
        self.emit(GameEvent::ImageClosed);
        Ok(())
    }

    /// Drop the session and the stored snapshot.
    pub fn restart(&mut self) {
        self.session = None;
        self.active = None;
        self.lightbox = Lightbox::Closed;
        self.wagers.reset(0);
        self.sink.clear();
        self.emit(GameEvent::Restarted);
    }

    // --- internals -------------------------------------------------------

    fn setup_session(&mut self, command: &'static str) -> Result<&mut Session, EngineError> {
        let phase = self.phase();
        match self.session.as_mut() {
            Some(session) if phase == GamePhase::PlayerSetup => Ok(session),
            _ => Err(EngineError::InvalidPhase { command, phase }),
        }
    }

    fn board_session(&mut self, command: &'static str) -> Result<&mut Session, EngineError> {
        let phase = self.phase();
        match (self.session.as_mut(), phase) {
            (Some(session), GamePhase::RoundInPlay(round)) if round.is_board_round() => {
                Ok(session)
            }
            _ => Err(EngineError::InvalidPhase { command, phase }),
        }
    }

    fn dismiss_board_clue(&mut self, command: &'static str) -> Result<(), EngineError> {
        match self.active {
            None => Err(EngineError::NoActiveClue),
            Some(active) if active.is_final() => Err(EngineError::InvalidPhase {
                command,
                phase: self.phase(),
            }),
            Some(_) => {
                self.active = None;
                self.lightbox = Lightbox::Closed;
                Ok(())
            }
        }
    }

    fn visible_html(&self) -> Option<&str> {
        let active = self.active.as_ref()?;
        match active.target() {
            ClueTarget::Board { .. } => {
                let clue = self.active_board_clue()?;
                (clue.html && active.text_visible()).then_some(clue.clue.as_str())
            }
            ClueTarget::Final => {
                let clue = self.final_clue()?;
                if !clue.html {
                    return None;
                }
                match active.stage() {
                    ClueStage::Text => Some(clue.clue.as_str()),
                    ClueStage::Solution => Some(clue.solution.as_str()),
                    _ => None,
                }
            }
        }
    }

    fn commit(&mut self, event: GameEvent) {
        if matches!(self.phase(), GamePhase::RoundInPlay(_) | GamePhase::Done) {
            if let Some(snapshot) = self.snapshot() {
                self.sink.persist(&snapshot);
            }
        }
        self.emit(event);
    }

    fn emit(&mut self, event: GameEvent) {
        if let Some(hook) = self.hook.as_mut() {
            hook(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    #[derive(Clone, Default)]
    struct RecordingSink {
        writes: Arc<Mutex<Vec<GameData>>>,
        clears: Arc<Mutex<usize>>,
    }

    impl SnapshotSink for RecordingSink {
        fn persist(&mut self, snapshot: &GameData) {
            self.writes.lock().expect("lock").push(snapshot.clone());
        }

        fn clear(&mut self) {
            *self.clears.lock().expect("lock") += 1;
        }
    }

    fn category(name: &str, values: &[u32]) -> Category {
        Category {
            category: name.to_string(),
            clues: values
                .iter()
                .map(|value| Clue::new(format!("{name} for {value}"), *value))
                .collect(),
        }
    }

    fn game(with_double: bool) -> GameData {
        let mut single = vec![category("Rivers", &[200, 400]), category("Maps", &[200, 400])];
        single[1].clues[1].daily_double = true;
        GameData::new(Board {
            single,
            double: with_double.then(|| vec![category("Stars", &[400])]),
            final_clue: FinalClue {
                category: "Oceans".to_string(),
                clue: "Deepest trench".to_string(),
                solution: "Mariana".to_string(),
                html: false,
            },
        })
    }

    fn engine_in_play(with_double: bool, players: &[&str]) -> (GameEngine, RecordingSink) {
        let sink = RecordingSink::default();
        let mut engine = GameEngine::new(Box::new(sink.clone()));
        engine.load(game(with_double)).expect("load");
        for name in players {
            engine.add_player(name).expect("add");
        }
        engine.start_play().expect("start");
        let categories = engine.current_board().map(|c| c.len()).unwrap_or(0);
        for _ in 0..categories {
            engine.reveal_category().expect("reveal");
        }
        (engine, sink)
    }

    fn clear_board(engine: &mut GameEngine) {
        let open: Vec<(usize, usize)> = engine
            .current_board()
            .expect("board")
            .iter()
            .enumerate()
            .flat_map(|(c, category)| {
                category
                    .clues
                    .iter()
                    .enumerate()
                    .filter(|(_, clue)| !clue.chosen)
                    .map(move |(i, _)| (c, i))
            })
            .collect();
        for (category, clue) in open {
            engine.select_clue(category, clue).expect("select");
            if engine.active_clue().map(|c| c.interstitial_pending()) == Some(true) {
                engine.advance_clue_stage().expect("advance");
            }
            engine.close_clue().expect("close");
        }
    }

    #[test]
    fn load_without_players_lands_in_setup() {
        let mut engine = GameEngine::default();
        let mut data = game(true);
        data.round = Some(RoundName::Double);
        data.categories_shown = Some(1);
        engine.load(data).expect("load");
        assert_eq!(engine.phase(), GamePhase::PlayerSetup);
        assert_eq!(engine.round(), Some(RoundName::Single));
        assert_eq!(engine.categories_shown(), 1);
    }

    #[test]
    fn load_resumes_at_persisted_round() {
        let mut engine = GameEngine::default();
        let mut data = game(true);
        data.players = Some(vec![Player::new("Ann")]);
        data.round = Some(RoundName::Final);
        engine.load(data).expect("load");
        assert_eq!(engine.phase(), GamePhase::RoundInPlay(RoundName::Final));
        assert!(engine.active_clue().map(ActiveClue::is_final).unwrap_or(false));
    }

    #[test]
    fn load_defaults_and_clamps_progress() {
        let mut engine = GameEngine::default();
        let mut data = game(false);
        data.players = Some(vec![Player::new("Ann")]);
        data.categories_shown = Some(99);
        engine.load(data).expect("load");
        assert_eq!(engine.phase(), GamePhase::RoundInPlay(RoundName::Single));
        assert_eq!(engine.categories_shown(), 2);
    }

    #[test]
    fn unplayable_load_keeps_previous_session() {
        let (mut engine, _) = engine_in_play(true, &["Ann"]);
        let before = engine.snapshot();
        let mut data = game(false);
        data.players = Some(vec![]);
        data.round = Some(RoundName::Double);
        assert_eq!(
            engine.load(data),
            Err(EngineError::MissingBoard(RoundName::Double))
        );
        assert_eq!(engine.snapshot(), before);
    }

    #[test]
    fn roster_is_frozen_once_play_starts() {
        let (mut engine, _) = engine_in_play(true, &["Ann"]);
        assert!(matches!(
            engine.add_player("Bo"),
            Err(EngineError::InvalidPhase { .. })
        ));
        assert!(matches!(
            engine.rename_player("Ann", "Anna"),
            Err(EngineError::InvalidPhase { .. })
        ));
        assert!(matches!(
            engine.remove_player("Ann"),
            Err(EngineError::InvalidPhase { .. })
        ));
        assert_eq!(engine.players().len(), 1);
    }

    #[test]
    fn start_requires_a_player() {
        let mut engine = GameEngine::default();
        engine.load(game(true)).expect("load");
        assert_eq!(engine.start_play(), Err(EngineError::NoPlayers));
        assert_eq!(engine.phase(), GamePhase::PlayerSetup);
    }

    #[test]
    fn clues_stay_hidden_until_categories_are_revealed() {
        let mut engine = GameEngine::default();
        engine.load(game(true)).expect("load");
        engine.add_player("Ann").expect("add");
        engine.start_play().expect("start");
        assert!(engine.category_reveal_pending());
        assert_eq!(engine.select_clue(0, 0), Err(EngineError::CategoriesHidden));
        engine.reveal_category().expect("reveal");
        engine.reveal_category().expect("reveal");
        assert_eq!(engine.reveal_category(), Err(EngineError::CategoriesComplete));
        assert!(!engine.category_reveal_pending());
        engine.select_clue(0, 0).expect("select");
    }

    #[test]
    fn selecting_twice_is_a_no_op() {
        let (mut engine, _) = engine_in_play(true, &["Ann"]);
        engine.select_clue(0, 1).expect("select");
        assert_eq!(engine.select_clue(0, 1), Err(EngineError::ClueActive));
        engine.return_to_board().expect("back");
        assert_eq!(
            engine.select_clue(0, 1),
            Err(EngineError::ClueAlreadyChosen {
                category: 0,
                clue: 1
            })
        );
        assert!(engine.active_clue().is_none());
        assert!(engine.current_board().expect("board")[0].clues[1].chosen);
    }

    #[test]
    fn another_clue_cannot_open_over_the_active_one() {
        let (mut engine, _) = engine_in_play(true, &["Ann"]);
        engine.select_clue(0, 0).expect("select");
        assert_eq!(engine.select_clue(1, 0), Err(EngineError::ClueActive));
        assert!(!engine.current_board().expect("board")[1].clues[0].chosen);
        assert_eq!(engine.active_clue().and_then(|c| c.position()), Some((0, 0)));
    }

    #[test]
    fn advancing_requires_an_exhausted_board() {
        let (mut engine, _) = engine_in_play(true, &["Ann"]);
        assert_eq!(
            engine.advance_round(),
            Err(EngineError::RoundIncomplete(RoundName::Single))
        );
        clear_board(&mut engine);
        assert!(engine.can_advance_round());
        assert_eq!(engine.next_round(), Some(RoundName::Double));
        assert_eq!(engine.advance_round(), Ok(RoundName::Double));
        assert_eq!(engine.categories_shown(), 0);
        assert!(engine.category_reveal_pending());
    }

    #[test]
    fn double_to_final_keeps_reveal_count() {
        let (mut engine, _) = engine_in_play(true, &["Ann"]);
        clear_board(&mut engine);
        engine.advance_round().expect("to double");
        engine.reveal_category().expect("reveal");
        clear_board(&mut engine);
        assert_eq!(engine.advance_round(), Ok(RoundName::Final));
        assert_eq!(engine.categories_shown(), 1);
        assert!(!engine.category_reveal_pending());
    }

    #[test]
    fn final_cannot_finish_before_solution() {
        let (mut engine, _) = engine_in_play(false, &["Ann"]);
        clear_board(&mut engine);
        assert_eq!(engine.advance_round(), Ok(RoundName::Final));
        assert_eq!(engine.finish_game(), Err(EngineError::SolutionHidden));
        engine.advance_clue_stage().expect("clue");
        assert_eq!(engine.finish_game(), Err(EngineError::SolutionHidden));
        engine.advance_clue_stage().expect("solution");
        engine.finish_game().expect("finish");
        assert_eq!(engine.phase(), GamePhase::Done);
        assert!(engine.active_clue().is_none());
    }

    #[test]
    fn final_clue_cannot_be_closed_like_a_board_clue() {
        let (mut engine, _) = engine_in_play(false, &["Ann"]);
        clear_board(&mut engine);
        engine.advance_round().expect("final");
        assert!(matches!(
            engine.close_clue(),
            Err(EngineError::InvalidPhase { .. })
        ));
        assert!(engine.active_clue().is_some());
    }

    #[test]
    fn final_round_scores_from_wagers() {
        let (mut engine, _) = engine_in_play(false, &["Ann", "Bo"]);
        engine.select_clue(0, 0).expect("select");
        engine.answer(0, true).expect("answer");
        engine.close_clue().expect("close");
        clear_board(&mut engine);
        engine.advance_round().expect("final");
        engine.set_wager(0, "150").expect("wager");
        engine.set_wager(1, "abc").expect("wager");
        engine.answer(0, false).expect("answer");
        engine.answer(1, true).expect("answer");
        let scores: Vec<i64> = engine.players().iter().map(|p| p.score).collect();
        assert_eq!(scores, vec![50, 0]);
        assert_eq!(engine.wagers().text(0), "");
    }

    #[test]
    fn answer_needs_an_open_clue() {
        let (mut engine, _) = engine_in_play(true, &["Ann"]);
        assert_eq!(engine.answer(0, true), Err(EngineError::NoActiveClue));
        engine.select_clue(0, 0).expect("select");
        assert_eq!(engine.answer(3, true), Err(EngineError::PlayerOutOfRange(3)));
        assert_eq!(engine.players()[0].score, 0);
    }

    #[test]
    fn wagers_are_refused_outside_wagering_clues() {
        let (mut engine, _) = engine_in_play(true, &["Ann"]);
        engine.select_clue(0, 0).expect("select");
        assert_eq!(engine.set_wager(0, "100"), Err(EngineError::NoActiveClue));
    }

    #[test]
    fn persists_only_once_play_started_and_clears_on_restart() {
        let sink = RecordingSink::default();
        let mut engine = GameEngine::new(Box::new(sink.clone()));
        engine.load(game(true)).expect("load");
        engine.add_player("Ann").expect("add");
        assert!(sink.writes.lock().expect("lock").is_empty());

        engine.start_play().expect("start");
        engine.reveal_category().expect("reveal");
        let writes = sink.writes.lock().expect("lock").clone();
        assert_eq!(writes.len(), 2);
        let last = writes.last().expect("write");
        assert_eq!(last.categories_shown, Some(1));
        assert_eq!(last.players.as_ref().map(Vec::len), Some(1));

        engine.restart();
        assert_eq!(engine.phase(), GamePhase::NoSession);
        assert_eq!(*sink.clears.lock().expect("lock"), 1);
    }

    #[test]
    fn rejected_commands_do_not_persist() {
        let (mut engine, sink) = engine_in_play(true, &["Ann"]);
        let before = sink.writes.lock().expect("lock").len();
        let _ = engine.advance_round();
        let _ = engine.answer(0, true);
        assert_eq!(sink.writes.lock().expect("lock").len(), before);
    }

    #[test]
    fn events_are_reported_by_name() {
        let names = Arc::new(Mutex::new(Vec::new()));
        let mut engine = GameEngine::default();
        let recorded = Arc::clone(&names);
        engine.set_event_hook(Box::new(move |event| {
            recorded.lock().expect("lock").push(event.name());
        }));
        engine.load(game(true)).expect("load");
        engine.add_player("Ann").expect("add");
        engine.start_play().expect("start");
        let _ = engine.select_clue(0, 0);
        assert_eq!(
            *names.lock().expect("lock"),
            vec!["Load Game", "Add Player", "Play Game"]
        );
    }

    #[test]
    fn export_omits_roster_during_setup() {
        let mut engine = GameEngine::default();
        engine.load(game(true)).expect("load");
        engine.add_player("Ann").expect("add");
        let export = engine.export().expect("export");
        assert!(export.players.is_none());
        assert_eq!(export.categories_shown, Some(0));

        engine.start_play().expect("start");
        let export = engine.export().expect("export");
        assert_eq!(export.players.as_ref().map(Vec::len), Some(1));
        assert!(export.categories_shown.is_none());
    }

    #[test]
    fn lightbox_opens_on_html_images_only() {
        let mut data = game(true);
        data.game.single[0].clues[0].html = true;
        data.game.single[0].clues[0].clue = r#"Who is this? <img src="face.png">"#.to_string();
        data.players = Some(vec![Player::new("Ann")]);
        data.categories_shown = Some(2);
        let mut engine = GameEngine::default();
        engine.load(data).expect("load");

        engine.select_clue(0, 1).expect("select");
        assert_eq!(engine.open_first_image(), Err(EngineError::NoImage));
        engine.close_clue().expect("close");

        engine.select_clue(0, 0).expect("select");
        engine.open_first_image().expect("open");
        assert_eq!(engine.lightbox().url(), Some("face.png"));
        engine.close_image().expect("close image");
        assert!(!engine.lightbox().is_open());
        assert!(engine.active_clue().is_some());
    }
}
