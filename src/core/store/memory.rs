use super::{ConversationStore, StoreError};
use crate::core::conversation::{Conversation, ConversationId, Turn};

/// Process-local store. Ids are sequential integers starting at 1.
#[derive(Debug, Default)]
pub struct MemoryStore {
    conversations: Vec<Conversation>,
    next_id: i64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConversationStore for MemoryStore {
    fn save(
        &mut self,
        turn: &Turn,
        conversation_id: Option<&ConversationId>,
    ) -> Result<ConversationId, StoreError> {
        match conversation_id {
            Some(id) => {
                let conversation = self
                    .conversations
                    .iter_mut()
                    .find(|c| &c.id == id)
                    .ok_or_else(|| StoreError::NotFound(id.clone()))?;
                conversation.turns.push(turn.clone());
                Ok(id.clone())
            }
            None => {
                self.next_id += 1;
                let id = ConversationId::from(self.next_id);
                self.conversations
                    .push(Conversation::new(id.clone(), vec![turn.clone()]));
                Ok(id)
            }
        }
    }

    fn load_all(&self) -> Result<Vec<Conversation>, StoreError> {
        Ok(self.conversations.clone())
    }

    fn load(&self, id: &ConversationId) -> Result<Option<Conversation>, StoreError> {
        Ok(self.conversations.iter().find(|c| &c.id == id).cloned())
    }
}
