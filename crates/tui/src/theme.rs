use ratatui::style::{Color, Modifier, Style};

/// Palette for the game display.
#[derive(Debug, Clone)]
pub struct Theme {
    pub primary_bg: Color,
    pub primary_fg: Color,
    pub board_bg: Color,
    pub value_fg: Color,
    pub accent: Color,
    pub muted: Color,
    pub selection_bg: Color,
    pub selection_fg: Color,
    pub success: Color,
    pub warning: Color,
    pub danger: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary_bg: Color::Reset,
            primary_fg: Color::White,
            board_bg: Color::Rgb(6, 12, 233),
            value_fg: Color::Rgb(255, 204, 0),
            accent: Color::Cyan,
            muted: Color::DarkGray,
            selection_bg: Color::Rgb(255, 204, 0),
            selection_fg: Color::Black,
            success: Color::Green,
            warning: Color::Yellow,
            danger: Color::Red,
        }
    }
}

impl Theme {
    pub fn title(&self) -> Style {
        Style::default()
            .fg(self.value_fg)
            .add_modifier(Modifier::BOLD)
    }

    pub fn board_cell(&self) -> Style {
        Style::default().fg(self.value_fg).bg(self.board_bg)
    }

    pub fn selected(&self) -> Style {
        Style::default()
            .fg(self.selection_fg)
            .bg(self.selection_bg)
            .add_modifier(Modifier::BOLD)
    }

    /// Positive scores in green, negative in red.
    pub fn score(&self, score: i64) -> Style {
        let color = match score {
            s if s < 0 => self.danger,
            0 => self.primary_fg,
            _ => self.success,
        };
        Style::default().fg(color).add_modifier(Modifier::BOLD)
    }

    pub fn hint(&self) -> Style {
        Style::default().fg(self.muted)
    }
}
