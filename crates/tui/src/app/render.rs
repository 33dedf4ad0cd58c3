use once_cell::sync::Lazy;
use quizboard_core::{
    clue::{image_urls, ClueStage},
    models::{format_dollars, Category, RoundName},
    GamePhase,
};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};
use regex::Regex;

use super::{LoaderFocus, QuizApp, SetupFocus, TextInput};

static BREAK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<br\s*/?>|</p\s*>").expect("valid break regex"));
static IMG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<img\b[^>]*>").expect("valid image regex"));
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid tag regex"));

const HELP_LINES: &[(&str, &str)] = &[
    ("Space", "reveal category / next stage"),
    ("Enter", "select clue / close clue"),
    ("Esc", "back to board / finish final / close image"),
    ("1-9", "player answered correctly"),
    ("q-o", "player answered incorrectly"),
    ("Tab", "move between wager fields"),
    ("z", "open the clue image"),
    ("Arrows, hjkl", "move on the board"),
    ("n", "next round once the board is cleared"),
    ("b", "write a backup"),
    ("t", "write the sample game template (game list)"),
    ("Ctrl+R", "restart"),
    ("Ctrl+Q", "quit"),
];

/// Flatten clue HTML into terminal text. Images become `[image]`.
fn html_to_text(html: &str) -> String {
    let text = BREAK_RE.replace_all(html, "\n");
    let text = IMG_RE.replace_all(&text, "[image]");
    let text = TAG_RE.replace_all(&text, "");
    let text = text
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn display_text(text: &str, html: bool) -> String {
    if html {
        html_to_text(text)
    } else {
        text.to_string()
    }
}

impl QuizApp {
    pub(super) fn draw(&self, frame: &mut Frame) {
        let area = frame.size();
        frame.render_widget(
            Block::default().style(
                Style::default()
                    .bg(self.theme.primary_bg)
                    .fg(self.theme.primary_fg),
            ),
            area,
        );
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(8),
                Constraint::Length(4),
            ])
            .split(area);

        self.render_header(frame, layout[0]);
        match self.engine.phase() {
            GamePhase::NoSession => self.render_loader(frame, layout[1]),
            GamePhase::PlayerSetup => self.render_setup(frame, layout[1]),
            GamePhase::RoundInPlay(round) => self.render_round(frame, layout[1], round),
            GamePhase::Done => self.render_results(frame, layout[1]),
        }
        self.render_status(frame, layout[2]);

        if let Some(url) = self.engine.lightbox().url() {
            self.render_lightbox(frame, url);
        }
        if self.ui.show_help {
            self.render_help(frame);
        }
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let mut spans = vec![Span::styled("quizboard", self.theme.title())];
        if !self.ui.source.is_empty() {
            spans.push(Span::raw("  "));
            spans.push(Span::raw(self.ui.source.clone()));
        }
        if let GamePhase::RoundInPlay(round) = self.engine.phase() {
            spans.push(Span::raw("  "));
            spans.push(Span::styled(
                round.label(),
                Style::default().fg(self.theme.accent),
            ));
        }
        let paragraph = Paragraph::new(Line::from(spans))
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(paragraph, area);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title("Status");
        let status_style = if self.ui.pending_load {
            Style::default().fg(self.theme.warning)
        } else {
            Style::default()
        };
        let paragraph = Paragraph::new(vec![
            Line::from(Span::styled(self.ui.status.clone(), status_style)),
            Line::from(Span::styled(self.key_hints(), self.theme.hint())),
        ])
        .block(block)
        .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn key_hints(&self) -> &'static str {
        match self.engine.phase() {
            GamePhase::NoSession => match self.ui.loader.focus {
                LoaderFocus::List => "Enter load  Tab path  r refresh  t template  ? help  q quit",
                LoaderFocus::Path => "Enter load file  Tab/Esc back to list",
            },
            GamePhase::PlayerSetup => {
                if self.ui.setup.editing.is_some() {
                    "Enter save  Esc cancel"
                } else {
                    match self.ui.setup.focus {
                        SetupFocus::Name => "Enter add player  Enter (empty) start  Tab roster",
                        SetupFocus::List => "e rename  d remove  s start  b backup  Tab name",
                    }
                }
            }
            GamePhase::RoundInPlay(_) if self.engine.category_reveal_pending() => {
                "Space reveal category"
            }
            GamePhase::RoundInPlay(_) if self.ui.wager_focus.is_some() => {
                "Type wager  Tab next field  Esc done"
            }
            GamePhase::RoundInPlay(RoundName::Final) => {
                "Tab wagers  Space next  1-9 correct  q-o incorrect  Esc finish"
            }
            GamePhase::RoundInPlay(_) if self.engine.active_clue().is_some() => {
                "1-9 correct  q-o incorrect  z image  Enter close  Esc board"
            }
            GamePhase::RoundInPlay(_) => "Arrows move  Enter select  n next round  b backup",
            GamePhase::Done => "b backup  Ctrl+R new game  Ctrl+Q quit",
        }
    }

    fn render_loader(&self, frame: &mut Frame, area: Rect) {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(3)])
            .split(area);

        let loader = &self.ui.loader;
        let items: Vec<ListItem> = if loader.entries.is_empty() {
            vec![ListItem::new("No games found")]
        } else {
            loader
                .entries
                .iter()
                .map(|entry| ListItem::new(entry.label()))
                .collect()
        };
        let mut list_state = ListState::default();
        if !loader.entries.is_empty() && loader.focus == LoaderFocus::List {
            list_state.select(Some(loader.cursor));
        }
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title("Games"))
            .highlight_style(self.theme.selected())
            .highlight_symbol("> ");
        frame.render_stateful_widget(list, layout[0], &mut list_state);

        self.render_input(
            frame,
            layout[1],
            "Game file",
            &loader.path,
            loader.focus == LoaderFocus::Path,
        );
    }

    fn render_setup(&self, frame: &mut Frame, area: Rect) {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(3)])
            .split(area);
        let setup = &self.ui.setup;

        self.render_input(
            frame,
            layout[0],
            "Add player",
            &setup.name,
            setup.focus == SetupFocus::Name && setup.editing.is_none(),
        );

        let items: Vec<ListItem> = self
            .engine
            .players()
            .iter()
            .enumerate()
            .map(|(index, player)| ListItem::new(format!("{}. {}", index + 1, player.name)))
            .collect();
        let mut list_state = ListState::default();
        if setup.focus == SetupFocus::List && !items.is_empty() {
            list_state.select(Some(setup.cursor));
        }
        let title = format!("Players ({})", items.len());
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(title))
            .highlight_style(self.theme.selected())
            .highlight_symbol("> ");
        frame.render_stateful_widget(list, layout[1], &mut list_state);

        if let Some((original, input)) = &setup.editing {
            let modal = centered_rect(48, 3, frame.size());
            frame.render_widget(Clear, modal);
            self.render_input(frame, modal, &format!("Rename {original}"), input, true);
        }
    }

    fn render_input(
        &self,
        frame: &mut Frame,
        area: Rect,
        title: &str,
        input: &TextInput,
        focused: bool,
    ) {
        let border = if focused {
            Style::default().fg(self.theme.accent)
        } else {
            Style::default().fg(self.theme.muted)
        };
        let line = Line::from(vec![
            Span::styled("> ", Style::default().fg(self.theme.accent)),
            Span::raw(input.text().to_string()),
        ]);
        let paragraph = Paragraph::new(line).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border)
                .title(title.to_string()),
        );
        frame.render_widget(paragraph, area);

        if focused {
            let cursor_x = (area.x + 3 + input.cursor() as u16)
                .min(area.x + area.width.saturating_sub(2));
            frame.set_cursor(cursor_x, area.y + 1);
        }
    }

    fn render_round(&self, frame: &mut Frame, area: Rect, round: RoundName) {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(5), Constraint::Length(5)])
            .split(area);

        if self.engine.category_reveal_pending() {
            self.render_category_reveal(frame, layout[0]);
        } else if self.engine.active_clue().is_some_and(|clue| clue.is_final()) {
            self.render_final(frame, layout[0]);
        } else if self.engine.active_clue().is_some() {
            self.render_clue(frame, layout[0]);
        } else if round.is_board_round() {
            self.render_board(frame, layout[0]);
        }
        self.render_scores(frame, layout[1]);
    }

    fn render_category_reveal(&self, frame: &mut Frame, area: Rect) {
        let categories = self.engine.current_board().unwrap_or_default();
        let index = self.engine.categories_shown();
        let Some(category) = categories.get(index) else {
            return;
        };
        let lines = vec![
            Line::from(Span::styled(
                format!("Category {} of {}", index + 1, categories.len()),
                self.theme.hint(),
            )),
            Line::from(""),
            Line::from(Span::styled(
                display_text(&category.category, true).to_uppercase(),
                self.theme.title(),
            )),
        ];
        self.render_card(frame, area, lines);
    }

    fn render_board(&self, frame: &mut Frame, area: Rect) {
        let categories = self.engine.current_board().unwrap_or_default();
        if categories.is_empty() {
            return;
        }
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(vec![
                Constraint::Ratio(1, categories.len() as u32);
                categories.len()
            ])
            .split(area);
        for (index, (category, column)) in categories.iter().zip(columns.iter()).enumerate() {
            self.render_board_column(frame, *column, index, category);
        }
    }

    fn render_board_column(&self, frame: &mut Frame, area: Rect, index: usize, category: &Category) {
        let rows = category.clues.len().max(1) as u32;
        let mut constraints = vec![Constraint::Length(4)];
        constraints.extend(std::iter::repeat(Constraint::Ratio(1, rows)).take(category.clues.len()));
        let cells = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);

        let header = Paragraph::new(display_text(&category.category, true).to_uppercase())
            .style(self.theme.board_cell().add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(header, cells[0]);

        for (row, clue) in category.clues.iter().enumerate() {
            let selected = self.ui.board_cursor == (index, row);
            let style = if selected {
                self.theme.selected()
            } else {
                self.theme.board_cell().add_modifier(Modifier::BOLD)
            };
            let label = if clue.chosen {
                String::new()
            } else {
                format_dollars(i64::from(clue.value))
            };
            let cell = Paragraph::new(label)
                .style(style)
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL));
            frame.render_widget(cell, cells[row + 1]);
        }
    }

    fn render_clue(&self, frame: &mut Frame, area: Rect) {
        let (Some(active), Some(clue)) = (self.engine.active_clue(), self.engine.active_board_clue())
        else {
            return;
        };
        let category = self.engine.active_category_title().unwrap_or_default();
        let heading = format!(
            "{} for {}",
            display_text(category, true),
            format_dollars(i64::from(clue.value))
        );

        let mut lines = vec![
            Line::from(Span::styled(heading, self.theme.hint())),
            Line::from(""),
        ];
        if active.interstitial_pending() {
            lines.push(Line::from(Span::styled(
                "DAILY DOUBLE",
                Style::default()
                    .fg(self.theme.warning)
                    .add_modifier(Modifier::BOLD),
            )));
            lines.push(Line::from(""));
            lines.push(Line::from("Enter the wager, then press Space for the clue"));
        } else {
            lines.extend(text_lines(&display_text(&clue.clue, clue.html), self.theme.title()));
            if clue.html && !image_urls(&clue.clue).is_empty() {
                lines.push(Line::from(Span::styled(
                    "Press z to view the image",
                    Style::default().fg(self.theme.accent),
                )));
            }
        }
        self.render_card(frame, area, lines);
    }

    fn render_final(&self, frame: &mut Frame, area: Rect) {
        let (Some(active), Some(final_clue)) = (self.engine.active_clue(), self.engine.final_clue())
        else {
            return;
        };
        let category = display_text(&final_clue.category, final_clue.html).to_uppercase();
        let mut lines = vec![
            Line::from(Span::styled(category, self.theme.hint())),
            Line::from(""),
        ];
        match active.stage() {
            ClueStage::Category => {
                lines.push(Line::from(Span::styled(
                    RoundName::Final.label(),
                    self.theme.title(),
                )));
                lines.push(Line::from(""));
                lines.push(Line::from("Collect wagers, then press Space for the clue"));
            }
            ClueStage::Text => {
                lines.extend(text_lines(
                    &display_text(&final_clue.clue, final_clue.html),
                    self.theme.title(),
                ));
            }
            _ => {
                lines.extend(text_lines(
                    &display_text(&final_clue.clue, final_clue.html),
                    self.theme.hint(),
                ));
                lines.push(Line::from(""));
                lines.extend(text_lines(
                    &display_text(&final_clue.solution, final_clue.html),
                    Style::default()
                        .fg(self.theme.success)
                        .add_modifier(Modifier::BOLD),
                ));
            }
        }
        self.render_card(frame, area, lines);
    }

    fn render_card(&self, frame: &mut Frame, area: Rect, lines: Vec<Line<'static>>) {
        let paragraph = Paragraph::new(lines)
            .style(Style::default().bg(self.theme.board_bg).fg(self.theme.primary_fg))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(paragraph, area);
    }

    fn render_scores(&self, frame: &mut Frame, area: Rect) {
        let players = self.engine.players();
        if players.is_empty() {
            return;
        }
        let wagering = self.engine.is_wagering();
        let slots = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(vec![Constraint::Ratio(1, players.len() as u32); players.len()])
            .split(area);

        for (index, (player, slot)) in players.iter().zip(slots.iter()).enumerate() {
            let keys = format!(
                "{} / {}",
                index + 1,
                quizboard_core::input::INCORRECT_KEYS
                    .get(index)
                    .copied()
                    .unwrap_or(' ')
            );
            let mut lines = vec![
                Line::from(Span::styled(player.name.clone(), self.theme.title())),
                Line::from(Span::styled(player.score_label(), self.theme.score(player.score))),
            ];
            let focused = self.ui.wager_focus == Some(index);
            if wagering {
                let style = if focused {
                    self.theme.selected()
                } else {
                    self.theme.hint()
                };
                lines.push(Line::from(Span::styled(
                    format!("Wager: {}", self.engine.wagers().text(index)),
                    style,
                )));
            }
            let paragraph = Paragraph::new(lines)
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL).title(keys));
            frame.render_widget(paragraph, *slot);

            if focused {
                let text_width = self.engine.wagers().text(index).chars().count() as u16;
                let label_width = 7 + text_width;
                let inner_width = slot.width.saturating_sub(2);
                let start = slot.x + 1 + inner_width.saturating_sub(label_width) / 2;
                let cursor_x = (start + label_width).min(slot.x + slot.width.saturating_sub(2));
                frame.set_cursor(cursor_x, slot.y + 3);
            }
        }
    }

    fn render_results(&self, frame: &mut Frame, area: Rect) {
        let players = self.engine.players();
        let mut lines = vec![
            Line::from(Span::styled(RoundName::Done.label(), self.theme.title())),
            Line::from(""),
            Line::from(Span::styled(
                format!(
                    "{:<4}{:<24}{:>12}{:>10}{:>10}",
                    "#", "Player", "Score", "Right", "Wrong"
                ),
                self.theme.hint(),
            )),
        ];
        for (rank, index) in self.engine.standings().into_iter().enumerate() {
            let Some(player) = players.get(index) else {
                continue;
            };
            lines.push(Line::from(vec![
                Span::raw(format!("{:<4}{:<24}", rank + 1, player.name)),
                Span::styled(
                    format!("{:>12}", player.score_label()),
                    self.theme.score(player.score),
                ),
                Span::raw(format!("{:>10}{:>10}", player.correct, player.incorrect)),
            ]));
        }
        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(paragraph, area);
    }

    fn render_lightbox(&self, frame: &mut Frame, url: &str) {
        let area = centered_rect(72, 7, frame.size());
        frame.render_widget(Clear, area);
        let paragraph = Paragraph::new(vec![
            Line::from(Span::styled(url.to_string(), Style::default().fg(self.theme.accent))),
            Line::from(""),
            Line::from(vec![
                Span::styled("Esc", Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(" close"),
            ]),
        ])
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("Image"));
        frame.render_widget(paragraph, area);
    }

    fn render_help(&self, frame: &mut Frame) {
        let height = HELP_LINES.len() as u16 + 4;
        let area = centered_rect(60, height, frame.size());
        frame.render_widget(Clear, area);
        let mut lines: Vec<Line> = HELP_LINES
            .iter()
            .map(|(key, action)| {
                Line::from(vec![
                    Span::styled(
                        format!("{key:<14}"),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                    Span::raw(*action),
                ])
            })
            .collect();
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("Esc or ? to close", self.theme.hint())));
        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Keys"));
        frame.render_widget(paragraph, area);
    }
}

fn text_lines(text: &str, style: Style) -> Vec<Line<'static>> {
    text.lines()
        .map(|line| Line::from(Span::styled(line.to_string(), style)))
        .collect()
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}
