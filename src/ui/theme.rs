use ratatui::style::{Color, Modifier, Style};

/// Colors for the two-pane window.
#[derive(Debug, Clone)]
pub struct Theme {
    // Backgrounds
    pub window_background: Color,
    pub sidebar_background: Color,
    pub transcript_background: Color,

    // Transcript tags
    pub user_style: Style,
    pub provider_a_style: Style,
    pub provider_b_style: Style,

    // Chrome
    pub text_style: Style,
    pub selection_style: Style,
    pub button_style: Style,
    pub focused_border_style: Style,
    pub border_style: Style,
    pub status_style: Style,
}

impl Theme {
    pub fn dark_default() -> Self {
        let foreground = Color::Rgb(0xEA, 0xEA, 0xEA);
        let accent = Color::Rgb(0x00, 0x7A, 0xCC);
        Theme {
            window_background: Color::Rgb(0x2D, 0x2D, 0x2D),
            sidebar_background: Color::Rgb(0x3C, 0x3F, 0x41),
            transcript_background: Color::Rgb(0x1E, 0x1E, 0x1E),

            user_style: Style::default().fg(foreground),
            provider_a_style: Style::default().fg(Color::Rgb(0x85, 0xE0, 0x85)),
            provider_b_style: Style::default().fg(Color::Rgb(0xBD, 0xB7, 0x6B)),

            text_style: Style::default().fg(foreground),
            selection_style: Style::default()
                .bg(accent)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
            button_style: Style::default().bg(accent).fg(Color::White),
            focused_border_style: Style::default().fg(accent),
            border_style: Style::default().fg(Color::Gray),
            status_style: Style::default().fg(Color::Gray),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark_default()
    }
}
