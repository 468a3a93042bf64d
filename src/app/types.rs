use ratatui::style::{Color, Modifier, Style};

#[derive(Clone, Copy)]
pub(crate) struct ThemePalette {
    pub(crate) line_text: Color,
    pub(crate) line_number: Color,
    pub(crate) error_text: Color,
    pub(crate) error_marker: Color,
    pub(crate) muted_text: Color,
    pub(crate) highlight_fg: Color,
    pub(crate) highlight_bg: Color,
    pub(crate) caption_running: Color,
    pub(crate) caption_done: Color,
    pub(crate) counter_bracket: Color,
    pub(crate) counter_value: Color,
    pub(crate) error_bracket: Color,
    pub(crate) error_value: Color,
    pub(crate) status_text: Color,
}

impl ThemePalette {
    pub(crate) fn body_style(self) -> Style {
        Style::default().fg(self.line_text)
    }

    pub(crate) fn number_style(self) -> Style {
        Style::default().fg(self.line_number)
    }

    pub(crate) fn error_style(self) -> Style {
        Style::default().fg(self.error_text)
    }

    pub(crate) fn error_marker_style(self) -> Style {
        Style::default()
            .fg(self.error_marker)
            .add_modifier(Modifier::BOLD)
    }

    pub(crate) fn muted_style(self) -> Style {
        Style::default().fg(self.muted_text)
    }

    pub(crate) fn highlight_style(self) -> Style {
        Style::default()
            .fg(self.highlight_fg)
            .bg(self.highlight_bg)
            .add_modifier(Modifier::BOLD)
    }

    pub(crate) fn caption_style(self, finished: bool) -> Style {
        let fg = if finished {
            self.caption_done
        } else {
            self.caption_running
        };
        Style::default().fg(fg)
    }

    pub(crate) fn counter_bracket_style(self) -> Style {
        Style::default().fg(self.counter_bracket)
    }

    pub(crate) fn counter_value_style(self) -> Style {
        Style::default().fg(self.counter_value)
    }

    pub(crate) fn error_bracket_style(self) -> Style {
        Style::default().fg(self.error_bracket)
    }

    pub(crate) fn error_value_style(self) -> Style {
        Style::default().fg(self.error_value)
    }

    pub(crate) fn status_style(self) -> Style {
        Style::default().fg(self.status_text)
    }
}

pub(crate) fn default_palette() -> ThemePalette {
    ThemePalette {
        line_text: Color::Rgb(210, 210, 210),
        line_number: Color::Rgb(110, 130, 150),
        error_text: Color::Rgb(230, 120, 120),
        error_marker: Color::Rgb(220, 100, 100),
        muted_text: Color::Rgb(128, 128, 128),
        highlight_fg: Color::Rgb(255, 255, 255),
        highlight_bg: Color::Rgb(40, 60, 80),
        caption_running: Color::Rgb(200, 160, 120),
        caption_done: Color::Rgb(140, 180, 140),
        counter_bracket: Color::Green,
        counter_value: Color::White,
        error_bracket: Color::Red,
        error_value: Color::Yellow,
        status_text: Color::Rgb(100, 150, 200),
    }
}
