use std::{io, path::PathBuf, thread, time::Duration};

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::{spawn, sync::mpsc};
use tracing::{debug, error, info};
use quizboard_core::{
    dispatch,
    models::{GameData, RoundName},
    resource::{self, LoadError, PresetInfo, PresetLibrary},
    save::{SaveEntry, SnapshotStore},
    Command, GameEngine, GameEvent, GamePhase, InputContext, Key,
};

use crate::theme::Theme;

mod render;

const TICK_RATE: Duration = Duration::from_millis(250);
const MAX_NAME_LEN: usize = 32;
const MAX_PATH_LEN: usize = 512;
const MAX_WAGER_LEN: usize = 9;

enum AppEvent {
    Input(Event),
    Tick,
    GameLoaded {
        source: String,
        result: Result<GameData, LoadError>,
    },
}

/// Single-line editable text with a character cursor.
#[derive(Debug, Clone)]
struct TextInput {
    value: String,
    cursor: usize,
    limit: usize,
}

impl TextInput {
    fn new(limit: usize) -> Self {
        Self {
            value: String::new(),
            cursor: 0,
            limit,
        }
    }

    fn with_value(value: &str, limit: usize) -> Self {
        let mut input = Self::new(limit);
        input.value = value.chars().take(limit).collect();
        input.cursor = input.len();
        input
    }

    fn text(&self) -> &str {
        &self.value
    }

    fn cursor(&self) -> usize {
        self.cursor
    }

    fn len(&self) -> usize {
        self.value.chars().count()
    }

    fn is_blank(&self) -> bool {
        self.value.trim().is_empty()
    }

    fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    fn byte_index(&self) -> usize {
        self.value
            .char_indices()
            .nth(self.cursor)
            .map(|(index, _)| index)
            .unwrap_or(self.value.len())
    }

    fn move_cursor(&mut self, delta: isize) {
        let next = self.cursor as isize + delta;
        self.cursor = next.clamp(0, self.len() as isize) as usize;
    }

    fn insert(&mut self, ch: char) {
        if self.len() >= self.limit || ch.is_control() {
            return;
        }
        let at = self.byte_index();
        self.value.insert(at, ch);
        self.cursor += 1;
    }

    fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let at = self.byte_index();
            self.value.remove(at);
        }
    }

    fn delete(&mut self) {
        if self.cursor < self.len() {
            let at = self.byte_index();
            self.value.remove(at);
        }
    }

    /// Apply an editing key. Returns `false` for keys the field ignores.
    fn handle(&mut self, key: &KeyEvent) -> bool {
        match key.code {
            KeyCode::Left => self.move_cursor(-1),
            KeyCode::Right => self.move_cursor(1),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.len(),
            KeyCode::Backspace => self.backspace(),
            KeyCode::Delete => self.delete(),
            KeyCode::Char(ch) if !has_command_modifier(key) => self.insert(ch),
            _ => return false,
        }
        true
    }
}

#[derive(Debug, Clone)]
enum LoaderEntry {
    Preset(PresetInfo),
    Backup(SaveEntry),
}

impl LoaderEntry {
    fn label(&self) -> String {
        match self {
            LoaderEntry::Preset(preset) => preset.title.clone(),
            LoaderEntry::Backup(entry) => format!(
                "Backup: {} ({})",
                entry.name,
                entry
                    .updated_at
                    .with_timezone(&chrono::Local)
                    .format("%Y-%m-%d %H:%M")
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoaderFocus {
    List,
    Path,
}

struct LoaderState {
    entries: Vec<LoaderEntry>,
    cursor: usize,
    focus: LoaderFocus,
    path: TextInput,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SetupFocus {
    Name,
    List,
}

struct SetupState {
    name: TextInput,
    focus: SetupFocus,
    cursor: usize,
    /// Player being renamed and the replacement text.
    editing: Option<(String, TextInput)>,
}

impl Default for SetupState {
    fn default() -> Self {
        Self {
            name: TextInput::new(MAX_NAME_LEN),
            focus: SetupFocus::Name,
            cursor: 0,
            editing: None,
        }
    }
}

struct UiState {
    status: String,
    should_quit: bool,
    show_help: bool,
    pending_load: bool,
    source: String,
    loader: LoaderState,
    setup: SetupState,
    board_cursor: (usize, usize),
    board_round: Option<RoundName>,
    wager_focus: Option<usize>,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            status: "Ready".to_string(),
            should_quit: false,
            show_help: false,
            pending_load: false,
            source: String::new(),
            loader: LoaderState {
                entries: Vec::new(),
                cursor: 0,
                focus: LoaderFocus::List,
                path: TextInput::new(MAX_PATH_LEN),
            },
            setup: SetupState::default(),
            board_cursor: (0, 0),
            board_round: None,
            wager_focus: None,
        }
    }
}

impl UiState {
    fn set_status(&mut self, message: impl Into<String>) {
        self.status = message.into();
    }

    fn reset_session(&mut self) {
        self.setup = SetupState::default();
        self.board_cursor = (0, 0);
        self.board_round = None;
        self.wager_focus = None;
        self.show_help = false;
    }
}

/// Terminal host console around a [`GameEngine`].
pub struct QuizApp {
    engine: GameEngine,
    store: SnapshotStore,
    presets: PresetLibrary,
    theme: Theme,
    ui: UiState,
    event_tx: Option<mpsc::Sender<AppEvent>>,
}

impl QuizApp {
    pub fn new(mut engine: GameEngine, store: SnapshotStore, presets: PresetLibrary) -> Self {
        engine.set_event_hook(Box::new(log_game_event));
        Self {
            engine,
            store,
            presets,
            theme: Theme::default(),
            ui: UiState::default(),
            event_tx: None,
        }
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.ui.set_status(message);
    }

    /// Install a game. Returns `false` and reports the reason when the game
    /// cannot be played.
    pub fn load(&mut self, source: &str, data: GameData) -> bool {
        match self.engine.load(data) {
            Ok(()) => {
                self.ui.reset_session();
                self.ui.source = source.to_string();
                info!(source, phase = %self.engine.phase(), "Game loaded");
                let message = match self.engine.phase() {
                    GamePhase::PlayerSetup => format!("Loaded {source}. Add players to begin."),
                    _ => format!("Resumed {source}"),
                };
                self.ui.set_status(message);
                true
            }
            Err(err) => {
                error!(source, %err, "Game rejected");
                self.ui.set_status(format!("Cannot play {source}: {err}"));
                false
            }
        }
    }

    /// Rescan presets and backups for the loader screen.
    pub fn refresh_loader(&mut self) -> Result<()> {
        self.presets.refresh();
        let mut entries: Vec<LoaderEntry> = self
            .presets
            .presets()?
            .into_iter()
            .map(LoaderEntry::Preset)
            .collect();
        entries.extend(self.store.backups()?.into_iter().map(LoaderEntry::Backup));
        info!(total = entries.len(), "Loader entries refreshed");
        self.ui.loader.entries = entries;
        self.ui.loader.cursor = self
            .ui
            .loader
            .cursor
            .min(self.ui.loader.entries.len().saturating_sub(1));
        Ok(())
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enter raw mode")?;
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        let (event_tx, mut event_rx) = mpsc::channel::<AppEvent>(128);
        spawn_input_thread(event_tx.clone());
        self.event_tx = Some(event_tx);

        loop {
            terminal.draw(|frame| self.draw(frame))?;
            if self.ui.should_quit {
                break;
            }

            let maybe_event = event_rx.recv().await;
            if !self.process_app_event(maybe_event) {
                break;
            }
        }

        restore_terminal(&mut terminal)?;
        self.event_tx = None;
        Ok(())
    }

    fn process_app_event(&mut self, maybe_event: Option<AppEvent>) -> bool {
        match maybe_event {
            Some(AppEvent::Input(Event::Key(key))) => {
                if key.kind == KeyEventKind::Press {
                    if let Err(err) = self.handle_key(key) {
                        error!(?err, "Key handling failed");
                        self.ui.set_status(format!("Error: {err:#}"));
                    }
                }
                true
            }
            Some(AppEvent::Input(_)) | Some(AppEvent::Tick) => true,
            Some(AppEvent::GameLoaded { source, result }) => {
                self.ui.pending_load = false;
                match result {
                    Ok(data) => {
                        self.load(&source, data);
                    }
                    Err(err) => {
                        error!(source = %source, %err, "Game file load failed");
                        self.ui.set_status(format!("Failed to load {source}: {err}"));
                    }
                }
                true
            }
            None => false,
        }
    }

    fn text_focused(&self) -> bool {
        match self.engine.phase() {
            GamePhase::NoSession => self.ui.loader.focus == LoaderFocus::Path,
            GamePhase::PlayerSetup => {
                self.ui.setup.focus == SetupFocus::Name || self.ui.setup.editing.is_some()
            }
            GamePhase::RoundInPlay(_) | GamePhase::Done => self.ui.wager_focus.is_some(),
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('c') | KeyCode::Char('q') => {
                    self.ui.should_quit = true;
                    return Ok(());
                }
                KeyCode::Char('r') => {
                    self.restart();
                    return Ok(());
                }
                _ => {}
            }
        }

        if self.ui.show_help {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('?')) {
                self.ui.show_help = false;
            }
            return Ok(());
        }
        if key.code == KeyCode::Char('?') && !self.text_focused() {
            self.ui.show_help = true;
            return Ok(());
        }

        match self.engine.phase() {
            GamePhase::NoSession => self.handle_loader_key(key),
            GamePhase::PlayerSetup => self.handle_setup_key(key),
            GamePhase::RoundInPlay(_) | GamePhase::Done => self.handle_play_key(key),
        }
    }

    fn restart(&mut self) {
        self.engine.restart();
        self.ui.reset_session();
        self.ui.source.clear();
        match self.refresh_loader() {
            Ok(()) => self.ui.set_status("Game restarted"),
            Err(err) => {
                error!(?err, "Loader refresh failed");
                self.ui.set_status(format!("Game restarted; listing games failed: {err:#}"));
            }
        }
    }

    // --- loader ----------------------------------------------------------

    fn handle_loader_key(&mut self, key: KeyEvent) -> Result<()> {
        let loader = &mut self.ui.loader;
        match loader.focus {
            LoaderFocus::Path => match key.code {
                KeyCode::Esc | KeyCode::Tab => loader.focus = LoaderFocus::List,
                KeyCode::Enter => {
                    let path = loader.path.text().trim().to_string();
                    if path.is_empty() {
                        self.ui.set_status("Type the path of a game file");
                    } else {
                        self.start_file_load(PathBuf::from(path));
                    }
                }
                _ => {
                    loader.path.handle(&key);
                }
            },
            LoaderFocus::List => match key.code {
                KeyCode::Esc | KeyCode::Char('q') => self.ui.should_quit = true,
                KeyCode::Tab | KeyCode::Char('o') => loader.focus = LoaderFocus::Path,
                KeyCode::Char('j') | KeyCode::Down => {
                    if loader.cursor + 1 < loader.entries.len() {
                        loader.cursor += 1;
                    }
                }
                KeyCode::Char('k') | KeyCode::Up => {
                    loader.cursor = loader.cursor.saturating_sub(1);
                }
                KeyCode::Char('r') => {
                    self.refresh_loader()?;
                    self.ui.set_status("Game list refreshed");
                }
                KeyCode::Char('t') => self.write_template(),
                KeyCode::Enter => self.load_selected_entry(),
                _ => {}
            },
        }
        Ok(())
    }

    fn load_selected_entry(&mut self) {
        let Some(entry) = self.ui.loader.entries.get(self.ui.loader.cursor).cloned() else {
            self.ui.set_status("No games available");
            return;
        };
        match entry {
            LoaderEntry::Preset(preset) => match self.presets.load(&preset.id) {
                Ok(data) => {
                    self.load(&preset.title, data);
                }
                Err(err) => {
                    error!(preset = %preset.id, ?err, "Preset load failed");
                    self.ui
                        .set_status(format!("Failed to load {}: {err:#}", preset.title));
                }
            },
            LoaderEntry::Backup(entry) => self.start_file_load(entry.path),
        }
    }

    fn start_file_load(&mut self, path: PathBuf) {
        if self.ui.pending_load {
            return;
        }
        let Some(sender) = self.event_tx.clone() else {
            self.ui
                .set_status("Internal error: event channel unavailable");
            error!("event_channel_missing");
            return;
        };

        let source = path.display().to_string();
        self.ui.pending_load = true;
        info!(path = %source, "Loading game file");
        self.ui.set_status(format!("Loading {source}…"));
        spawn(async move {
            let result = resource::load_file(&path).await;
            let _ = sender.send(AppEvent::GameLoaded { source, result }).await;
        });
    }

    // --- player setup ----------------------------------------------------

    fn handle_setup_key(&mut self, key: KeyEvent) -> Result<()> {
        if let Some((original, mut input)) = self.ui.setup.editing.take() {
            match key.code {
                KeyCode::Esc => self.ui.set_status("Rename cancelled"),
                KeyCode::Enter => match self.engine.rename_player(&original, input.text()) {
                    Ok(()) => self
                        .ui
                        .set_status(format!("Renamed {original} to {}", input.text().trim())),
                    Err(err) => {
                        self.ui.set_status(err.to_string());
                        self.ui.setup.editing = Some((original, input));
                    }
                },
                _ => {
                    input.handle(&key);
                    self.ui.setup.editing = Some((original, input));
                }
            }
            return Ok(());
        }

        match self.ui.setup.focus {
            SetupFocus::Name => match key.code {
                KeyCode::Tab => {
                    if !self.engine.players().is_empty() {
                        self.ui.setup.focus = SetupFocus::List;
                    }
                }
                KeyCode::Enter if self.ui.setup.name.is_blank() => self.start_play(),
                KeyCode::Enter => {
                    let name = self.ui.setup.name.text().to_string();
                    match self.engine.add_player(&name) {
                        Ok(()) => {
                            self.ui.setup.name.clear();
                            self.ui.set_status(format!("Added {}", name.trim()));
                        }
                        Err(err) => self.ui.set_status(err.to_string()),
                    }
                }
                KeyCode::Esc => self.ui.setup.name.clear(),
                _ => {
                    self.ui.setup.name.handle(&key);
                }
            },
            SetupFocus::List => {
                let players = self.engine.players().len();
                match key.code {
                    KeyCode::Tab | KeyCode::Esc => self.ui.setup.focus = SetupFocus::Name,
                    KeyCode::Char('j') | KeyCode::Down => {
                        if self.ui.setup.cursor + 1 < players {
                            self.ui.setup.cursor += 1;
                        }
                    }
                    KeyCode::Char('k') | KeyCode::Up => {
                        self.ui.setup.cursor = self.ui.setup.cursor.saturating_sub(1);
                    }
                    KeyCode::Char('e') => {
                        if let Some(player) = self.engine.players().get(self.ui.setup.cursor) {
                            let input = TextInput::with_value(&player.name, MAX_NAME_LEN);
                            self.ui.setup.editing = Some((player.name.clone(), input));
                        }
                    }
                    KeyCode::Char('d') | KeyCode::Delete => {
                        let Some(name) = self
                            .engine
                            .players()
                            .get(self.ui.setup.cursor)
                            .map(|player| player.name.clone())
                        else {
                            return Ok(());
                        };
                        if self.engine.remove_player(&name).is_ok() {
                            self.ui.set_status(format!("Removed {name}"));
                        }
                        let remaining = self.engine.players().len();
                        self.ui.setup.cursor = self.ui.setup.cursor.min(remaining.saturating_sub(1));
                        if remaining == 0 {
                            self.ui.setup.focus = SetupFocus::Name;
                        }
                    }
                    KeyCode::Char('b') => self.write_backup(),
                    KeyCode::Char('s') | KeyCode::Enter => self.start_play(),
                    _ => {}
                }
            }
        }
        Ok(())
    }

    fn start_play(&mut self) {
        match self.engine.start_play() {
            Ok(()) => {
                self.ui.board_cursor = (0, 0);
                self.ui
                    .set_status("Press Space to reveal each category");
            }
            Err(err) => self.ui.set_status(err.to_string()),
        }
    }

    // --- play ------------------------------------------------------------

    fn handle_play_key(&mut self, key: KeyEvent) -> Result<()> {
        if matches!(key.code, KeyCode::Tab | KeyCode::BackTab) {
            if self.engine.is_wagering() {
                let step = if key.code == KeyCode::BackTab { -1 } else { 1 };
                self.cycle_wager_focus(step);
            }
            return Ok(());
        }
        if let Some(player) = self
            .ui
            .wager_focus
            .filter(|_| !self.engine.lightbox().is_open())
        {
            if self.handle_wager_key(player, &key) {
                return Ok(());
            }
        }

        let ctx = InputContext {
            text_focused: self.ui.wager_focus.is_some(),
        };
        if let Some(command) = dispatch(&self.engine, to_key(&key), ctx) {
            self.apply(command);
            return Ok(());
        }
        if ctx.text_focused {
            return Ok(());
        }
        // The final clue stays open for its whole round, so only a board
        // clue blocks backups.
        let board_clue_open = self
            .engine
            .active_clue()
            .is_some_and(|clue| !clue.is_final());
        if key.code == KeyCode::Char('b') && !board_clue_open {
            self.write_backup();
            return Ok(());
        }
        if self.engine.active_clue().is_some() {
            return Ok(());
        }

        match key.code {
            KeyCode::Char('n') if self.board_visible() => {
                if self.engine.can_advance_round() {
                    self.apply(Command::AdvanceRound);
                    if let Some(round) = self.engine.round() {
                        self.ui.set_status(format!("{} begins", round.label()));
                    }
                } else {
                    self.ui
                        .set_status("Every clue must be played before moving on");
                }
            }
            KeyCode::Left | KeyCode::Char('h') => self.move_board_cursor(-1, 0),
            KeyCode::Right | KeyCode::Char('l') => self.move_board_cursor(1, 0),
            KeyCode::Up | KeyCode::Char('k') => self.move_board_cursor(0, -1),
            KeyCode::Down | KeyCode::Char('j') => self.move_board_cursor(0, 1),
            KeyCode::Enter if self.board_visible() => {
                let (category, clue) = self.ui.board_cursor;
                self.apply(Command::SelectClue { category, clue });
            }
            _ => {}
        }
        Ok(())
    }

    fn apply(&mut self, command: Command) {
        if self.engine.apply(command).is_err() {
            return;
        }
        if !self.engine.is_wagering() {
            self.ui.wager_focus = None;
        }
        let round = self.engine.round();
        if round != self.ui.board_round {
            self.ui.board_round = round;
            self.ui.board_cursor = (0, 0);
        }
    }

    fn board_visible(&self) -> bool {
        matches!(self.engine.phase(), GamePhase::RoundInPlay(round) if round.is_board_round())
            && !self.engine.category_reveal_pending()
            && self.engine.active_clue().is_none()
    }

    fn move_board_cursor(&mut self, dx: isize, dy: isize) {
        if !self.board_visible() {
            return;
        }
        let Some(categories) = self.engine.current_board() else {
            return;
        };
        if categories.is_empty() {
            return;
        }
        let (col, row) = self.ui.board_cursor;
        let col = (col as isize + dx).clamp(0, categories.len() as isize - 1) as usize;
        let rows = categories[col].clues.len();
        let row = (row as isize + dy).clamp(0, rows.saturating_sub(1) as isize) as usize;
        self.ui.board_cursor = (col, row);
    }

    fn cycle_wager_focus(&mut self, step: isize) {
        let players = self.engine.players().len() as isize;
        if players == 0 {
            return;
        }
        // Cycle through every field and then "no field".
        let slots = players + 1;
        let current = self.ui.wager_focus.map(|i| i as isize).unwrap_or(players);
        let next = (current + step).rem_euclid(slots);
        self.ui.wager_focus = (next < players).then_some(next as usize);
    }

    fn handle_wager_key(&mut self, player: usize, key: &KeyEvent) -> bool {
        let mut text = self.engine.wagers().text(player).to_string();
        match key.code {
            KeyCode::Char(ch) if ch.is_ascii_digit() || ch == '-' => {
                if text.len() < MAX_WAGER_LEN {
                    text.push(ch);
                }
            }
            KeyCode::Backspace => {
                text.pop();
            }
            KeyCode::Esc => {
                self.ui.wager_focus = None;
                return true;
            }
            _ => return false,
        }
        if let Err(err) = self.engine.set_wager(player, &text) {
            debug!(player, %err, "Wager ignored");
        }
        true
    }

    fn write_template(&mut self) {
        match resource::write_sample_template(self.store.root()) {
            Ok(path) => {
                info!(path = %path.display(), "Sample template written");
                self.ui
                    .set_status(format!("Sample game template written to {}", path.display()));
            }
            Err(err) => {
                error!(?err, "Sample template failed");
                self.ui.set_status(format!("Writing the template failed: {err:#}"));
            }
        }
    }

    fn write_backup(&mut self) {
        let Some(data) = self.engine.export() else {
            return;
        };
        match self.store.export_backup(&self.ui.source, &data) {
            Ok(entry) => {
                info!(path = %entry.path.display(), "Backup written");
                self.ui
                    .set_status(format!("Backup written to {}", entry.path.display()));
            }
            Err(err) => {
                error!(?err, "Backup failed");
                self.ui.set_status(format!("Backup failed: {err:#}"));
            }
        }
    }
}

fn has_command_modifier(key: &KeyEvent) -> bool {
    key.modifiers
        .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
}

fn to_key(key: &KeyEvent) -> Key {
    match key.code {
        KeyCode::Char(' ') => Key::Space,
        KeyCode::Char(ch) if !has_command_modifier(key) => Key::Char(ch),
        KeyCode::Enter => Key::Enter,
        KeyCode::Esc => Key::Esc,
        _ => Key::Other,
    }
}

fn log_game_event(event: &GameEvent) {
    let name = event.name();
    match event {
        GameEvent::PlayerAdded(player) | GameEvent::PlayerRemoved(player) => {
            info!(event = name, player = %player, "Game event")
        }
        GameEvent::PlayerRenamed { from, to } => {
            info!(event = name, from = %from, to = %to, "Game event")
        }
        GameEvent::CategoryShown(shown) => info!(event = name, shown = *shown, "Game event"),
        GameEvent::ClueSelected { category, clue } => {
            info!(event = name, category = *category, clue = *clue, "Game event")
        }
        GameEvent::ClueAdvanced(stage) => info!(event = name, stage = ?stage, "Game event"),
        GameEvent::ScoreUpdated {
            player,
            delta,
            correct,
        } => info!(
            event = name,
            player = *player,
            delta = *delta,
            correct = *correct,
            "Game event"
        ),
        GameEvent::RoundAdvanced { from, to } => {
            info!(event = name, from = %from, to = %to, "Game event")
        }
        GameEvent::ImageOpened(url) => info!(event = name, url = %url, "Game event"),
        _ => info!(event = name, "Game event"),
    }
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor()?;
    Ok(())
}

fn spawn_input_thread(sender: mpsc::Sender<AppEvent>) {
    thread::spawn(move || loop {
        match event::poll(TICK_RATE) {
            Ok(true) => match event::read() {
                Ok(evt) => {
                    if sender.blocking_send(AppEvent::Input(evt)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            },
            Ok(false) => {
                if sender.blocking_send(AppEvent::Tick).is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use quizboard_core::models::{Board, Category, Clue, FinalClue};
    use tempfile::{tempdir, TempDir};

    fn press(app: &mut QuizApp, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
            .expect("key");
    }

    fn type_text(app: &mut QuizApp, text: &str) {
        for ch in text.chars() {
            press(app, KeyCode::Char(ch));
        }
    }

    fn game() -> GameData {
        let mut single = vec![
            Category {
                category: "Oceans".to_string(),
                clues: vec![Clue::new("Largest", 200), Clue::new("Saltiest", 400)],
            },
            Category {
                category: "Deserts".to_string(),
                clues: vec![Clue::new("Driest", 200), Clue::new("Coldest", 400)],
            },
        ];
        single[1].clues[1].daily_double = true;
        single[0].clues[0].solution = Some("SECRETANSWER".to_string());
        GameData::new(Board {
            single,
            double: None,
            final_clue: FinalClue {
                category: "Peaks".to_string(),
                clue: "Tallest".to_string(),
                solution: "Everest".to_string(),
                html: false,
            },
        })
    }

    fn app() -> (QuizApp, TempDir) {
        let dir = tempdir().expect("tempdir");
        let store = SnapshotStore::new(dir.path().join("saves"));
        let presets = PresetLibrary::new(dir.path().join("presets"));
        let mut app = QuizApp::new(GameEngine::default(), store, presets);
        assert!(app.load("test", game()));
        (app, dir)
    }

    fn in_play(players: &[&str]) -> (QuizApp, TempDir) {
        let (mut app, dir) = app();
        for name in players {
            type_text(&mut app, name);
            press(&mut app, KeyCode::Enter);
        }
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Char(' '));
        press(&mut app, KeyCode::Char(' '));
        (app, dir)
    }

    #[test]
    fn text_input_edits_at_cursor() {
        let mut input = TextInput::new(5);
        for ch in "Zoë".chars() {
            input.insert(ch);
        }
        input.move_cursor(-2);
        input.insert('e');
        assert_eq!(input.text(), "Zeoë");
        input.backspace();
        input.delete();
        assert_eq!(input.text(), "Zë");
        for ch in "abcdef".chars() {
            input.insert(ch);
        }
        assert_eq!(input.len(), 5);
        assert_eq!(input.cursor(), 4);
    }

    #[test]
    fn setup_keys_build_roster_and_start() {
        let (mut app, _dir) = app();
        type_text(&mut app, "Ann");
        press(&mut app, KeyCode::Enter);
        type_text(&mut app, "Ann");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.engine.players().len(), 1);

        press(&mut app, KeyCode::Esc);
        type_text(&mut app, "Bo");
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Char('j'));
        press(&mut app, KeyCode::Char('e'));
        press(&mut app, KeyCode::Backspace);
        press(&mut app, KeyCode::Backspace);
        type_text(&mut app, "Cy");
        press(&mut app, KeyCode::Enter);
        let names: Vec<&str> = app.engine.players().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Ann", "Cy"]);

        press(&mut app, KeyCode::Char('s'));
        assert_eq!(app.engine.phase(), GamePhase::RoundInPlay(RoundName::Single));
    }

    #[test]
    fn board_cursor_selects_clue() {
        let (mut app, _dir) = in_play(&["Ann"]);
        assert!(!app.engine.category_reveal_pending());
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Down);
        assert_eq!(app.ui.board_cursor, (1, 1));
        press(&mut app, KeyCode::Left);
        press(&mut app, KeyCode::Enter);
        assert_eq!(
            app.engine.active_clue().and_then(|clue| clue.position()),
            Some((0, 1))
        );
        press(&mut app, KeyCode::Char('1'));
        press(&mut app, KeyCode::Esc);
        assert!(app.engine.active_clue().is_none());
        assert_eq!(app.engine.players()[0].score, 400);
    }

    #[test]
    fn wager_field_captures_digits_until_released() {
        let (mut app, _dir) = in_play(&["Ann", "Bo"]);
        app.ui.board_cursor = (1, 1);
        press(&mut app, KeyCode::Enter);
        assert!(app.engine.is_wagering());

        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.ui.wager_focus, Some(1));
        type_text(&mut app, "300x");
        assert_eq!(app.engine.wagers().text(1), "300");
        assert_eq!(app.engine.players()[0].score, 0);

        press(&mut app, KeyCode::Esc);
        press(&mut app, KeyCode::Char(' '));
        press(&mut app, KeyCode::Char('2'));
        assert_eq!(app.engine.players()[1].score, 300);
        press(&mut app, KeyCode::Enter);
        assert!(app.engine.active_clue().is_none());
        assert_eq!(app.ui.wager_focus, None);
    }

    #[test]
    fn advance_needs_a_cleared_board() {
        let (mut app, _dir) = in_play(&["Ann"]);
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.engine.round(), Some(RoundName::Single));
        for (category, clue) in [(0, 0), (0, 1), (1, 0), (1, 1)] {
            app.ui.board_cursor = (category, clue);
            press(&mut app, KeyCode::Enter);
            press(&mut app, KeyCode::Esc);
        }
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.engine.round(), Some(RoundName::Final));
    }

    #[test]
    fn backup_is_written_from_board_and_restart_clears() {
        let (mut app, _dir) = in_play(&["Ann"]);
        press(&mut app, KeyCode::Char('b'));
        assert_eq!(app.store.backups().expect("backups").len(), 1);

        app.handle_key(KeyEvent::new(KeyCode::Char('r'), KeyModifiers::CONTROL))
            .expect("restart");
        assert_eq!(app.engine.phase(), GamePhase::NoSession);
        let labels: Vec<String> = app.ui.loader.entries.iter().map(LoaderEntry::label).collect();
        assert!(labels.iter().any(|label| label.starts_with("Backup: test")));
    }

    fn screen_text(app: &QuizApp) -> String {
        let mut terminal =
            Terminal::new(ratatui::backend::TestBackend::new(160, 50)).expect("terminal");
        terminal.draw(|frame| app.draw(frame)).expect("draw");
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn board_clue_screen_never_shows_the_solution() {
        let (mut app, _dir) = in_play(&["Ann"]);
        press(&mut app, KeyCode::Enter);
        assert_eq!(
            app.engine.active_clue().and_then(|clue| clue.position()),
            Some((0, 0))
        );

        let screen = screen_text(&app);
        assert!(screen.contains("Largest"));
        assert!(!screen.contains("SECRETANSWER"));
    }

    #[test]
    fn backup_is_allowed_during_the_final_round() {
        let (mut app, _dir) = in_play(&["Ann"]);
        for (category, clue) in [(0, 0), (0, 1), (1, 0), (1, 1)] {
            app.ui.board_cursor = (category, clue);
            press(&mut app, KeyCode::Enter);
            press(&mut app, KeyCode::Esc);
        }
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.engine.phase(), GamePhase::RoundInPlay(RoundName::Final));
        assert!(app.engine.active_clue().is_some());

        press(&mut app, KeyCode::Char('b'));
        assert_eq!(app.store.backups().expect("backups").len(), 1);
    }

    #[test]
    fn backup_waits_while_a_board_clue_is_open() {
        let (mut app, _dir) = in_play(&["Ann"]);
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Char('b'));
        assert!(app.store.backups().expect("backups").is_empty());
    }

    #[test]
    fn loader_writes_the_sample_template() {
        let dir = tempdir().expect("tempdir");
        let saves = dir.path().join("saves");
        let mut app = QuizApp::new(
            GameEngine::default(),
            SnapshotStore::new(&saves),
            PresetLibrary::new(dir.path().join("presets")),
        );
        assert_eq!(app.engine.phase(), GamePhase::NoSession);

        press(&mut app, KeyCode::Char('t'));
        let path = saves.join(resource::SAMPLE_TEMPLATE_FILE);
        let text = std::fs::read_to_string(&path).expect("template");
        assert!(resource::parse_game_file(&text).is_ok());
        assert!(app.ui.status.contains(&path.display().to_string()));
    }

    #[test]
    fn help_overlay_swallows_keys() {
        let (mut app, _dir) = in_play(&["Ann"]);
        press(&mut app, KeyCode::Char('?'));
        assert!(app.ui.show_help);
        press(&mut app, KeyCode::Enter);
        assert!(app.engine.active_clue().is_none());
        press(&mut app, KeyCode::Esc);
        assert!(!app.ui.show_help);
    }
}
