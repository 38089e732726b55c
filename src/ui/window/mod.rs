//! Full-screen two-pane front end: conversation sidebar on the left,
//! transcript and input on the right.
//!
//! The loop is single-task. While a message is being relayed no input is
//! read; the screen is redrawn after each provider reply.

mod render;
mod state;

pub use render::{ui, WindowLayout};
pub use state::{
    handle_key, handle_mouse, Focus, SidebarEntry, Speaker, TranscriptEntry, WindowAction,
    WindowState,
};

use std::error::Error;
use std::io;
use std::time::Duration;

use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::layout::Rect;
use ratatui::Terminal;
use tracing::{debug, warn};

use crate::core::session::ChatSession;
use crate::ui::theme::Theme;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

pub async fn run_window(session: &mut ChatSession) -> Result<(), Box<dyn Error>> {
    let mut terminal = setup_terminal()?;
    let result = event_loop(&mut terminal, session, &Theme::default()).await;
    restore_terminal(&mut terminal)?;
    result
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>, Box<dyn Error>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

    let terminal = Terminal::new(CrosstermBackend::new(stdout)).inspect_err(|_| {
        let _ = disable_raw_mode();
    })?;
    Ok(terminal)
}

fn restore_terminal(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
) -> Result<(), Box<dyn Error>> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

async fn event_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    session: &mut ChatSession,
    theme: &Theme,
) -> Result<(), Box<dyn Error>> {
    let mut state = WindowState::new(session.engine().label_a(), session.engine().label_b());
    refresh_sidebar(&mut state, session);

    loop {
        terminal.draw(|f| ui(f, &mut state, theme))?;

        if !event::poll(POLL_INTERVAL)? {
            continue;
        }
        let size = terminal.size()?;
        let layout = WindowLayout::compute(Rect::new(0, 0, size.width, size.height));
        let action = match event::read()? {
            Event::Key(key) => handle_key(&mut state, key, layout.transcript_page_height()),
            Event::Mouse(mouse) => handle_mouse(&mut state, mouse, &layout),
            _ => WindowAction::None,
        };

        match action {
            WindowAction::None => {}
            WindowAction::Quit => return Ok(()),
            WindowAction::LoadSelected => load_selected(&mut state, session),
            WindowAction::NewChat => new_chat(&mut state, session),
            WindowAction::Send => send_message(terminal, &mut state, session, theme).await?,
        }
    }
}

/// Reload the sidebar from the store.
pub fn refresh_sidebar(state: &mut WindowState, session: &ChatSession) {
    match session.conversations() {
        Ok(conversations) => state.set_sidebar(&conversations, session.current_conversation()),
        Err(err) => {
            warn!(error = %err, "failed to load conversations");
            state.status = Some(format!("Failed to load chat history: {err}"));
        }
    }
}

/// Show the highlighted conversation and make it the active one.
pub fn load_selected(state: &mut WindowState, session: &mut ChatSession) {
    let Some(id) = state.selected_id().cloned() else {
        return;
    };
    match session.open_conversation(&id) {
        Ok(Some(conversation)) => {
            debug!(conversation = %id, turns = conversation.turns.len(), "opened conversation");
            state.show_conversation(&conversation.turns);
            state.status = None;
        }
        Ok(None) => {
            state.show_conversation(&[]);
            state.status = Some(format!("Conversation {id} no longer exists"));
            refresh_sidebar(state, session);
        }
        Err(err) => {
            state.status = Some(format!("Failed to load conversation: {err}"));
        }
    }
}

pub fn new_chat(state: &mut WindowState, session: &mut ChatSession) {
    session.start_new_chat();
    state.clear_chat();
    refresh_sidebar(state, session);
}

/// Relay the typed message. The user line is shown first; each reply is
/// drawn as soon as it arrives.
pub async fn send_message<B: Backend>(
    terminal: &mut Terminal<B>,
    state: &mut WindowState,
    session: &mut ChatSession,
    theme: &Theme,
) -> io::Result<()> {
    let message = state.input.lines().join("\n");
    if message.trim().is_empty() {
        return Ok(());
    }
    state.take_input();
    state.push(Speaker::User, &message);
    state.status = Some("Waiting for replies...".to_string());
    terminal.draw(|f| ui(f, state, theme))?;

    let mut drawn: io::Result<()> = Ok(());
    let report = session
        .send(&message, |exchange| {
            state.push(Speaker::ProviderA, &exchange.response_a);
            state.push(Speaker::ProviderB, &exchange.response_b);
            if drawn.is_ok() {
                drawn = terminal.draw(|f| ui(f, state, theme)).map(|_| ());
            }
        })
        .await;
    drawn?;

    state.status = match report.map(|report| report.saved) {
        Some(Err(err)) => Some(format!("Failed to save conversation: {err}")),
        _ => None,
    };
    refresh_sidebar(state, session);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::conversation::Turn;
    use crate::core::relay::tests::FakeProvider;
    use crate::core::relay::{Participant, RelayEngine, RelayPolicy};
    use crate::core::store::{ConversationStore, DocumentStore, MemoryStore};
    use ratatui::backend::TestBackend;

    fn session_with(store: MemoryStore, replies_a: Vec<Result<&str, &str>>) -> ChatSession {
        let (a, _) = FakeProvider::new("Cohere", replies_a);
        let engine = RelayEngine::new(
            Participant::new(Box::new(a), false),
            Participant::new(Box::new(FakeProvider::echo("Gemini")), false),
            RelayPolicy::chained(1),
        );
        ChatSession::new(engine, Box::new(store))
    }

    fn test_terminal() -> Terminal<TestBackend> {
        Terminal::new(TestBackend::new(100, 30)).expect("terminal")
    }

    fn type_text(state: &mut WindowState, text: &str) {
        state.input.insert_str(text);
    }

    #[tokio::test]
    async fn send_shows_replies_and_adds_a_sidebar_entry() {
        let mut session = session_with(MemoryStore::new(), vec![Ok("hi there")]);
        let mut state = WindowState::new("Cohere", "Gemini");
        let mut terminal = test_terminal();

        type_text(&mut state, "hello");
        send_message(&mut terminal, &mut state, &mut session, &Theme::default())
            .await
            .expect("send");

        let texts: Vec<_> = state.transcript.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["hello", "hi there", "Gemini: hi there"]);
        assert_eq!(state.sidebar.len(), 1);
        assert_eq!(state.sidebar[0].preview, "hello");
        assert_eq!(state.list_state.selected(), Some(0));
        assert!(state.status.is_none());
        assert_eq!(state.input.lines(), vec![String::new()]);
    }

    #[tokio::test]
    async fn whitespace_message_is_rejected() {
        let mut session = session_with(MemoryStore::new(), vec![]);
        let mut state = WindowState::new("Cohere", "Gemini");
        let mut terminal = test_terminal();

        type_text(&mut state, "   ");
        send_message(&mut terminal, &mut state, &mut session, &Theme::default())
            .await
            .expect("send");

        assert!(state.transcript.is_empty());
        assert!(session.conversations().expect("load").is_empty());
    }

    #[tokio::test]
    async fn provider_failure_is_shown_and_saved_as_text() {
        let mut session = session_with(MemoryStore::new(), vec![Err("timed out")]);
        let mut state = WindowState::new("Cohere", "Gemini");
        let mut terminal = test_terminal();

        type_text(&mut state, "hello");
        send_message(&mut terminal, &mut state, &mut session, &Theme::default())
            .await
            .expect("send");

        assert!(state.transcript[1].text.starts_with("Error: "));
        let saved = &session.conversations().expect("load")[0].turns[0];
        assert_eq!(saved.response_a, state.transcript[1].text);
    }

    #[tokio::test]
    async fn selecting_then_sending_appends_to_that_conversation() {
        let mut store = MemoryStore::new();
        store
            .save(&Turn::new("old question", "old a", "old b"), None)
            .expect("seed");
        let mut session = session_with(store, vec![Ok("fresh")]);
        let mut state = WindowState::new("Cohere", "Gemini");
        let mut terminal = test_terminal();
        refresh_sidebar(&mut state, &session);

        state.list_state.select(Some(0));
        load_selected(&mut state, &mut session);
        assert_eq!(state.transcript.len(), 3);

        type_text(&mut state, "follow-up");
        send_message(&mut terminal, &mut state, &mut session, &Theme::default())
            .await
            .expect("send");

        let all = session.conversations().expect("load");
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].turns.len(), 2);
        assert_eq!(state.transcript.len(), 6);
    }

    #[test]
    fn new_chat_clears_everything_but_history() {
        let mut store = MemoryStore::new();
        store.save(&Turn::new("kept", "a", "b"), None).expect("seed");
        let mut session = session_with(store, vec![]);
        let mut state = WindowState::new("Cohere", "Gemini");
        refresh_sidebar(&mut state, &session);
        state.list_state.select(Some(0));
        load_selected(&mut state, &mut session);
        type_text(&mut state, "draft");

        new_chat(&mut state, &mut session);

        assert!(state.transcript.is_empty());
        assert_eq!(state.input.lines(), vec![String::new()]);
        assert_eq!(state.list_state.selected(), None);
        assert_eq!(session.current_conversation(), None);
        assert_eq!(state.sidebar.len(), 1);
    }

    #[test]
    fn loading_a_conversation_without_turns_shows_an_empty_transcript() {
        let temp_dir = tempfile::TempDir::new().expect("temp dir");
        let path = temp_dir.path().join("conversations.json");
        std::fs::write(
            &path,
            r#"{"conversations": [{"_id": "65a1f0c2e4b0a1b2c3d4e5f6", "messages": []}]}"#,
        )
        .expect("write");
        let (a, _) = FakeProvider::new("Cohere", vec![]);
        let engine = RelayEngine::new(
            Participant::new(Box::new(a), false),
            Participant::new(Box::new(FakeProvider::echo("Gemini")), false),
            RelayPolicy::chained(1),
        );
        let store = DocumentStore::open(&path).expect("open");
        let mut session = ChatSession::new(engine, Box::new(store));
        let mut state = WindowState::new("Cohere", "Gemini");
        refresh_sidebar(&mut state, &session);
        assert_eq!(state.sidebar[0].preview, "[No messages in chat]");
        state.push(Speaker::User, "stale");

        state.list_state.select(Some(0));
        load_selected(&mut state, &mut session);

        assert!(state.transcript.is_empty());
        assert!(state.status.is_none());
        assert_eq!(
            session.current_conversation().map(|id| id.as_str()),
            Some("65a1f0c2e4b0a1b2c3d4e5f6")
        );
    }

    #[test]
    fn loading_a_vanished_conversation_reports_it() {
        let mut session = session_with(MemoryStore::new(), vec![]);
        let mut state = WindowState::new("Cohere", "Gemini");
        state.sidebar = vec![SidebarEntry {
            id: crate::core::conversation::ConversationId::new("7"),
            preview: "[No messages in chat]".to_string(),
        }];
        state.list_state.select(Some(0));
        state.push(Speaker::User, "stale");

        load_selected(&mut state, &mut session);

        assert!(state.transcript.is_empty());
        assert!(state.status.is_some());
    }
}
