//! Window state and the pure key/mouse dispatch over it.
//!
//! Handlers only touch presentation state. Anything that needs the session
//! (loading, sending, starting a chat) comes back as a [`WindowAction`] for
//! the event loop to carry out.

use ratatui::crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::layout::{Position, Rect};
use ratatui::widgets::{Block, Borders, ListState};
use tui_textarea::{Input as TAInput, TextArea};

use super::render::WindowLayout;
use crate::core::conversation::{Conversation, ConversationId, Turn};

const MOUSE_SCROLL_LINES: u16 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Sidebar,
    Input,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    User,
    ProviderA,
    ProviderB,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEntry {
    pub speaker: Speaker,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidebarEntry {
    pub id: ConversationId,
    pub preview: String,
}

/// What the event loop should do after an input event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowAction {
    None,
    Quit,
    LoadSelected,
    NewChat,
    Send,
}

pub struct WindowState {
    pub label_a: String,
    pub label_b: String,
    pub sidebar: Vec<SidebarEntry>,
    pub list_state: ListState,
    pub transcript: Vec<TranscriptEntry>,
    pub input: TextArea<'static>,
    pub focus: Focus,
    /// Lines scrolled up from the newest transcript line.
    pub scroll_from_bottom: u16,
    pub status: Option<String>,
}

impl WindowState {
    pub fn new(label_a: impl Into<String>, label_b: impl Into<String>) -> Self {
        Self {
            label_a: label_a.into(),
            label_b: label_b.into(),
            sidebar: Vec::new(),
            list_state: ListState::default(),
            transcript: Vec::new(),
            input: new_input(),
            focus: Focus::Input,
            scroll_from_bottom: 0,
            status: None,
        }
    }

    pub fn label(&self, speaker: Speaker) -> &str {
        match speaker {
            Speaker::User => "You",
            Speaker::ProviderA => &self.label_a,
            Speaker::ProviderB => &self.label_b,
        }
    }

    /// Replace the sidebar with `conversations`, keeping the highlighted
    /// conversation when it is still listed.
    pub fn set_sidebar(&mut self, conversations: &[Conversation], active: Option<&ConversationId>) {
        let highlighted = active
            .cloned()
            .or_else(|| self.selected_id().cloned());
        self.sidebar = conversations
            .iter()
            .map(|conversation| SidebarEntry {
                id: conversation.id.clone(),
                preview: conversation.preview().to_string(),
            })
            .collect();
        let index = highlighted.and_then(|id| self.sidebar.iter().position(|e| e.id == id));
        self.list_state.select(index);
    }

    pub fn selected_id(&self) -> Option<&ConversationId> {
        self.list_state
            .selected()
            .and_then(|index| self.sidebar.get(index))
            .map(|entry| &entry.id)
    }

    pub fn show_conversation(&mut self, turns: &[Turn]) {
        self.transcript.clear();
        for turn in turns {
            self.push_turn(turn);
        }
    }

    fn push_turn(&mut self, turn: &Turn) {
        self.push(Speaker::User, &turn.user_input);
        self.push(Speaker::ProviderA, &turn.response_a);
        self.push(Speaker::ProviderB, &turn.response_b);
    }

    /// Append a transcript line and follow the newest output.
    pub fn push(&mut self, speaker: Speaker, text: &str) {
        self.transcript.push(TranscriptEntry {
            speaker,
            text: text.to_string(),
        });
        self.scroll_from_bottom = 0;
    }

    pub fn clear_chat(&mut self) {
        self.transcript.clear();
        self.input = new_input();
        self.list_state.select(None);
        self.scroll_from_bottom = 0;
        self.status = None;
    }

    /// Take the typed message out of the input box.
    pub fn take_input(&mut self) -> String {
        let text = self.input.lines().join("\n");
        self.input = new_input();
        text
    }

    fn select_offset(&mut self, delta: isize) {
        let next = match self.list_state.selected() {
            Some(current) => current.saturating_add_signed(delta),
            None if delta < 0 => usize::MAX,
            None => 0,
        };
        self.select_clamped(next);
    }

    fn select_clamped(&mut self, index: usize) {
        let clamped = match self.sidebar.len() {
            0 => None,
            len => Some(index.min(len - 1)),
        };
        self.list_state.select(clamped);
    }

    fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Sidebar => Focus::Input,
            Focus::Input => Focus::Sidebar,
        };
    }

    fn scroll_up(&mut self, lines: u16) {
        self.scroll_from_bottom = self.scroll_from_bottom.saturating_add(lines);
    }

    fn scroll_down(&mut self, lines: u16) {
        self.scroll_from_bottom = self.scroll_from_bottom.saturating_sub(lines);
    }
}

fn new_input() -> TextArea<'static> {
    let mut input = TextArea::default();
    input.set_block(Block::default().borders(Borders::ALL).title("Message"));
    input.set_placeholder_text("Type a message and press Enter");
    input
}

pub fn handle_key(state: &mut WindowState, key: KeyEvent, page_height: u16) -> WindowAction {
    if key.kind == KeyEventKind::Release {
        return WindowAction::None;
    }
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    match key.code {
        KeyCode::Char('c') if ctrl => return WindowAction::Quit,
        KeyCode::Char('n') if ctrl => return WindowAction::NewChat,
        KeyCode::Esc => return WindowAction::Quit,
        KeyCode::Tab | KeyCode::BackTab => {
            state.toggle_focus();
            return WindowAction::None;
        }
        KeyCode::PageUp => {
            state.scroll_up(page_height.max(1));
            return WindowAction::None;
        }
        KeyCode::PageDown => {
            state.scroll_down(page_height.max(1));
            return WindowAction::None;
        }
        _ => {}
    }

    match state.focus {
        Focus::Sidebar => match key.code {
            KeyCode::Up => state.select_offset(-1),
            KeyCode::Down => state.select_offset(1),
            KeyCode::Home => state.select_clamped(0),
            KeyCode::End => state.select_clamped(usize::MAX),
            KeyCode::Enter if state.list_state.selected().is_some() => {
                return WindowAction::LoadSelected
            }
            _ => {}
        },
        Focus::Input => match key.code {
            KeyCode::Enter => return WindowAction::Send,
            _ => {
                state.input.input(TAInput::from(key));
            }
        },
    }
    WindowAction::None
}

pub fn handle_mouse(state: &mut WindowState, mouse: MouseEvent, layout: &WindowLayout) -> WindowAction {
    let position = Position::new(mouse.column, mouse.row);
    match mouse.kind {
        MouseEventKind::ScrollUp if layout.transcript.contains(position) => {
            state.scroll_up(MOUSE_SCROLL_LINES);
            WindowAction::None
        }
        MouseEventKind::ScrollDown if layout.transcript.contains(position) => {
            state.scroll_down(MOUSE_SCROLL_LINES);
            WindowAction::None
        }
        MouseEventKind::Down(MouseButton::Left) => {
            if layout.new_chat_button.contains(position) {
                return WindowAction::NewChat;
            }
            if layout.send_button.contains(position) {
                return WindowAction::Send;
            }
            if layout.input.contains(position) {
                state.focus = Focus::Input;
                return WindowAction::None;
            }
            if let Some(index) = sidebar_row(state, layout.sidebar_rows, position) {
                state.focus = Focus::Sidebar;
                state.list_state.select(Some(index));
                return WindowAction::LoadSelected;
            }
            WindowAction::None
        }
        _ => WindowAction::None,
    }
}

/// Sidebar entry under `position`, if any.
fn sidebar_row(state: &WindowState, rows: Rect, position: Position) -> Option<usize> {
    if !rows.contains(position) {
        return None;
    }
    let index = state.list_state.offset() + usize::from(position.y - rows.y);
    (index < state.sidebar.len()).then_some(index)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn click(column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    fn conversations(previews: &[&str]) -> Vec<Conversation> {
        previews
            .iter()
            .enumerate()
            .map(|(i, preview)| {
                Conversation::new(
                    ConversationId::from(i as i64 + 1),
                    vec![Turn::new(*preview, "a", "b")],
                )
            })
            .collect()
    }

    fn state_with_sidebar(previews: &[&str]) -> WindowState {
        let mut state = WindowState::new("Cohere", "Gemini");
        state.set_sidebar(&conversations(previews), None);
        state
    }

    #[test]
    fn typing_fills_the_input_and_enter_sends() {
        let mut state = WindowState::new("Cohere", "Gemini");
        for c in "hi!".chars() {
            assert_eq!(handle_key(&mut state, key(KeyCode::Char(c)), 10), WindowAction::None);
        }
        assert_eq!(handle_key(&mut state, key(KeyCode::Enter), 10), WindowAction::Send);
        assert_eq!(state.take_input(), "hi!");
        assert_eq!(state.input.lines(), vec![String::new()]);
    }

    #[test]
    fn sidebar_navigation_clamps_and_loads() {
        let mut state = state_with_sidebar(&["one", "two", "three"]);
        handle_key(&mut state, key(KeyCode::Tab), 10);
        assert_eq!(state.focus, Focus::Sidebar);

        handle_key(&mut state, key(KeyCode::Down), 10);
        assert_eq!(state.list_state.selected(), Some(0));
        for _ in 0..5 {
            handle_key(&mut state, key(KeyCode::Down), 10);
        }
        assert_eq!(state.list_state.selected(), Some(2));
        handle_key(&mut state, key(KeyCode::Home), 10);
        assert_eq!(state.list_state.selected(), Some(0));

        assert_eq!(
            handle_key(&mut state, key(KeyCode::Enter), 10),
            WindowAction::LoadSelected
        );
    }

    #[test]
    fn enter_on_an_empty_sidebar_does_nothing() {
        let mut state = WindowState::new("Cohere", "Gemini");
        state.focus = Focus::Sidebar;
        handle_key(&mut state, key(KeyCode::Down), 10);
        assert_eq!(handle_key(&mut state, key(KeyCode::Enter), 10), WindowAction::None);
    }

    #[test]
    fn shortcuts_work_from_either_pane() {
        let mut state = WindowState::new("Cohere", "Gemini");
        assert_eq!(handle_key(&mut state, ctrl('n'), 10), WindowAction::NewChat);
        assert_eq!(handle_key(&mut state, ctrl('c'), 10), WindowAction::Quit);
        state.focus = Focus::Sidebar;
        assert_eq!(handle_key(&mut state, key(KeyCode::Esc), 10), WindowAction::Quit);
    }

    #[test]
    fn paging_scrolls_away_from_and_back_to_the_bottom() {
        let mut state = WindowState::new("Cohere", "Gemini");
        handle_key(&mut state, key(KeyCode::PageUp), 8);
        handle_key(&mut state, key(KeyCode::PageUp), 8);
        assert_eq!(state.scroll_from_bottom, 16);
        handle_key(&mut state, key(KeyCode::PageDown), 8);
        assert_eq!(state.scroll_from_bottom, 8);

        state.push(Speaker::User, "new line");
        assert_eq!(state.scroll_from_bottom, 0);
    }

    #[test]
    fn sidebar_refresh_keeps_the_highlighted_conversation() {
        let mut state = state_with_sidebar(&["one", "two"]);
        state.list_state.select(Some(1));

        let mut updated = conversations(&["one", "two"]);
        updated.insert(
            0,
            Conversation::new(ConversationId::new("0"), vec![Turn::new("zero", "", "")]),
        );
        state.set_sidebar(&updated, None);

        assert_eq!(state.list_state.selected(), Some(2));
        assert_eq!(state.sidebar[2].preview, "two");
    }

    #[test]
    fn showing_a_conversation_tags_each_line() {
        let mut state = WindowState::new("Cohere", "Gemini");
        state.show_conversation(&[Turn::new("hello", "hi there", "greetings")]);
        let speakers: Vec<_> = state.transcript.iter().map(|e| e.speaker).collect();
        assert_eq!(
            speakers,
            vec![Speaker::User, Speaker::ProviderA, Speaker::ProviderB]
        );
        assert_eq!(state.label(Speaker::ProviderA), "Cohere");

        state.show_conversation(&[]);
        assert!(state.transcript.is_empty());
    }

    #[test]
    fn clicks_map_to_actions() {
        let layout = WindowLayout::compute(Rect::new(0, 0, 100, 30));
        let mut state = state_with_sidebar(&["one", "two"]);

        let button = layout.new_chat_button;
        assert_eq!(
            handle_mouse(&mut state, click(button.x + 1, button.y + 1), &layout),
            WindowAction::NewChat
        );

        let send = layout.send_button;
        assert_eq!(
            handle_mouse(&mut state, click(send.x + 1, send.y + 1), &layout),
            WindowAction::Send
        );

        let rows = layout.sidebar_rows;
        assert_eq!(
            handle_mouse(&mut state, click(rows.x, rows.y + 1), &layout),
            WindowAction::LoadSelected
        );
        assert_eq!(state.list_state.selected(), Some(1));
        assert_eq!(state.focus, Focus::Sidebar);

        // Below the last entry.
        assert_eq!(
            handle_mouse(&mut state, click(rows.x, rows.y + 5), &layout),
            WindowAction::None
        );
    }
}
