use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Margin, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
    Frame,
};

use super::state::{Focus, Speaker, WindowState};
use crate::ui::theme::Theme;

const SIDEBAR_MAX_WIDTH: u16 = 32;
const SEND_BUTTON_WIDTH: u16 = 10;
const HINT: &str = "Tab switch pane · Enter send/open · Ctrl+N new chat · PgUp/PgDn scroll · Esc quit";

/// Screen regions, shared by drawing and mouse hit-testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowLayout {
    pub sidebar: Rect,
    /// Inside the sidebar border: one row per conversation.
    pub sidebar_rows: Rect,
    pub new_chat_button: Rect,
    pub transcript: Rect,
    pub input: Rect,
    pub send_button: Rect,
    pub status: Rect,
}

impl WindowLayout {
    pub fn compute(area: Rect) -> Self {
        let sidebar_width = (area.width / 3).min(SIDEBAR_MAX_WIDTH);
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(sidebar_width), Constraint::Min(0)])
            .split(area);

        let sidebar_parts = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(3)])
            .split(columns[0]);

        let main_parts = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(0),
                Constraint::Length(3),
                Constraint::Length(1),
            ])
            .split(columns[1]);

        let input_parts = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(0), Constraint::Length(SEND_BUTTON_WIDTH)])
            .split(main_parts[1]);

        WindowLayout {
            sidebar: sidebar_parts[0],
            sidebar_rows: sidebar_parts[0].inner(Margin::new(1, 1)),
            new_chat_button: sidebar_parts[1],
            transcript: main_parts[0],
            input: input_parts[0],
            send_button: input_parts[1],
            status: main_parts[2],
        }
    }

    /// Visible transcript rows, used as the page size for scrolling.
    pub fn transcript_page_height(&self) -> u16 {
        self.transcript.height.saturating_sub(2)
    }
}

pub fn ui(f: &mut Frame, state: &mut WindowState, theme: &Theme) {
    let layout = WindowLayout::compute(f.area());

    f.render_widget(
        Block::default().style(Style::default().bg(theme.window_background)),
        f.area(),
    );

    render_sidebar(f, state, theme, &layout);
    render_transcript(f, state, theme, layout.transcript);
    render_input(f, state, theme, &layout);

    let status = state.status.as_deref().unwrap_or(HINT);
    f.render_widget(
        Paragraph::new(status).style(theme.status_style),
        layout.status,
    );
}

fn border_style(theme: &Theme, focused: bool) -> Style {
    if focused {
        theme.focused_border_style
    } else {
        theme.border_style
    }
}

fn render_sidebar(f: &mut Frame, state: &mut WindowState, theme: &Theme, layout: &WindowLayout) {
    let items: Vec<ListItem> = state
        .sidebar
        .iter()
        .map(|entry| ListItem::new(entry.preview.lines().next().unwrap_or_default().to_string()))
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style(theme, state.focus == Focus::Sidebar))
                .title("History"),
        )
        .style(theme.text_style.bg(theme.sidebar_background))
        .highlight_style(theme.selection_style);
    f.render_stateful_widget(list, layout.sidebar, &mut state.list_state);

    f.render_widget(button("New Chat", theme), layout.new_chat_button);
}

fn button<'a>(label: &'a str, theme: &Theme) -> Paragraph<'a> {
    Paragraph::new(label)
        .alignment(Alignment::Center)
        .style(theme.button_style)
        .block(Block::default().borders(Borders::ALL))
}

/// Transcript lines: the speaker tag and first line share a row, the rest
/// of a multi-line message follows in the same color.
fn transcript_lines(state: &WindowState, theme: &Theme) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for entry in &state.transcript {
        let style = match entry.speaker {
            Speaker::User => theme.user_style,
            Speaker::ProviderA => theme.provider_a_style,
            Speaker::ProviderB => theme.provider_b_style,
        };
        let mut text_lines = entry.text.lines();
        let first = text_lines.next().unwrap_or_default();
        lines.push(Line::from(vec![
            Span::styled(format!("{}: ", state.label(entry.speaker)), style),
            Span::styled(first.to_string(), style),
        ]));
        lines.extend(text_lines.map(|line| Line::styled(line.to_string(), style)));
    }
    lines
}

fn render_transcript(f: &mut Frame, state: &mut WindowState, theme: &Theme, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.border_style)
        .title("Conversation");
    let inner = block.inner(area);

    let paragraph = Paragraph::new(transcript_lines(state, theme))
        .style(theme.text_style.bg(theme.transcript_background))
        .wrap(Wrap { trim: false });

    let total = paragraph.line_count(inner.width);
    let max_top = u16::try_from(total.saturating_sub(usize::from(inner.height))).unwrap_or(u16::MAX);
    state.scroll_from_bottom = state.scroll_from_bottom.min(max_top);
    let top = max_top - state.scroll_from_bottom;

    f.render_widget(paragraph.block(block).scroll((top, 0)), area);
}

fn render_input(f: &mut Frame, state: &mut WindowState, theme: &Theme, layout: &WindowLayout) {
    state.input.set_block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style(theme, state.focus == Focus::Input))
            .title("Message"),
    );
    state
        .input
        .set_style(theme.text_style.bg(theme.transcript_background));
    f.render_widget(&state.input, layout.input);
    f.render_widget(button("Send", theme), layout.send_button);
}
