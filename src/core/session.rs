//! A chat session: the relay engine, the store it saves into, and the
//! conversation new turns are appended to.

use tracing::{info, warn};

use crate::core::config::Profile;
use crate::core::conversation::{Conversation, ConversationId, Turn};
use crate::core::providers::{build_http_client, build_provider};
use crate::core::relay::{Exchange, Participant, RelayEngine};
use crate::core::store::{open_store, ConversationStore, StoreError};

/// Result of sending one message.
#[derive(Debug)]
pub struct SendReport {
    pub exchanges: Vec<Exchange>,
    pub turn: Turn,
    /// Where the turn was saved. A failed save leaves the active
    /// conversation unchanged.
    pub saved: Result<ConversationId, StoreError>,
}

pub struct ChatSession {
    engine: RelayEngine,
    store: Box<dyn ConversationStore>,
    current: Option<ConversationId>,
}

impl ChatSession {
    pub fn new(engine: RelayEngine, store: Box<dyn ConversationStore>) -> Self {
        Self {
            engine,
            store,
            current: None,
        }
    }

    /// Wire up providers and the store described by `profile`.
    pub fn from_profile(profile: &Profile) -> Result<Self, Box<dyn std::error::Error>> {
        let client = build_http_client(profile.request_timeout)?;
        let a = Participant::new(
            build_provider(&profile.provider_a, client.clone()),
            profile.provider_a.format_markdown,
        );
        let b = Participant::new(
            build_provider(&profile.provider_b, client),
            profile.provider_b.format_markdown,
        );
        let store = open_store(&profile.store)?;
        info!(
            provider_a = a.name(),
            provider_b = b.name(),
            store = %profile.store.path.display(),
            "session ready"
        );
        Ok(Self::new(RelayEngine::new(a, b, profile.policy), store))
    }

    pub fn engine(&self) -> &RelayEngine {
        &self.engine
    }

    pub fn current_conversation(&self) -> Option<&ConversationId> {
        self.current.as_ref()
    }

    /// Forget the active conversation; the next send starts a new one.
    pub fn start_new_chat(&mut self) {
        self.current = None;
    }

    pub fn conversations(&self) -> Result<Vec<Conversation>, StoreError> {
        self.store.load_all()
    }

    /// Load `id` and make it the target of later sends. Returns `None`
    /// (and clears the active conversation) when the store no longer has it.
    pub fn open_conversation(
        &mut self,
        id: &ConversationId,
    ) -> Result<Option<Conversation>, StoreError> {
        let conversation = self.store.load(id)?;
        self.current = conversation.as_ref().map(|c| c.id.clone());
        Ok(conversation)
    }

    /// Relay `input` and save the resulting turn into the active
    /// conversation, creating one if needed. Whitespace-only input is
    /// ignored and yields `None`.
    pub async fn send<F>(&mut self, input: &str, on_exchange: F) -> Option<SendReport>
    where
        F: FnMut(&Exchange),
    {
        if input.trim().is_empty() {
            return None;
        }

        let outcome = self.engine.run(input, on_exchange).await;
        let saved = self.store.save(&outcome.turn, self.current.as_ref());
        match &saved {
            Ok(id) => self.current = Some(id.clone()),
            Err(err) => warn!(error = %err, "failed to save turn"),
        }

        Some(SendReport {
            exchanges: outcome.exchanges,
            turn: outcome.turn,
            saved,
        })
    }
}
