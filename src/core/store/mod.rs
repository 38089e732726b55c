//! Conversation persistence.
//!
//! A store hands out a fresh [`ConversationId`] when a turn is saved without
//! one and appends to the existing conversation otherwise. Turns are never
//! edited or removed.

mod document;
mod memory;
mod sqlite;

pub use document::DocumentStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use std::error::Error as StdError;
use std::fmt;
use std::path::PathBuf;

use crate::core::config::{StoreKind, StoreSettings};
use crate::core::conversation::{Conversation, ConversationId, Turn};

pub trait ConversationStore: Send {
    /// Persist `turn`. Without an id a new conversation is created and its
    /// id returned; with one the turn is appended and the same id returned.
    fn save(
        &mut self,
        turn: &Turn,
        conversation_id: Option<&ConversationId>,
    ) -> Result<ConversationId, StoreError>;

    /// Every conversation in creation order.
    fn load_all(&self) -> Result<Vec<Conversation>, StoreError>;

    fn load(&self, id: &ConversationId) -> Result<Option<Conversation>, StoreError>;
}

#[derive(Debug)]
pub enum StoreError {
    Sqlite(rusqlite::Error),
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    Serialize(serde_json::Error),
    /// An append targeted a conversation the store does not have.
    NotFound(ConversationId),
    IdGeneration(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Sqlite(source) => write!(f, "SQLite error: {source}"),
            StoreError::Io { path, source } => {
                write!(f, "Failed to access {}: {}", path.display(), source)
            }
            StoreError::Parse { path, source } => {
                write!(f, "Failed to parse {}: {}", path.display(), source)
            }
            StoreError::Serialize(source) => {
                write!(f, "Failed to serialize conversations: {source}")
            }
            StoreError::NotFound(id) => write!(f, "No conversation with id {id}"),
            StoreError::IdGeneration(message) => {
                write!(f, "Failed to generate conversation id: {message}")
            }
        }
    }
}

impl StdError for StoreError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            StoreError::Sqlite(source) => Some(source),
            StoreError::Io { source, .. } => Some(source),
            StoreError::Parse { source, .. } => Some(source),
            StoreError::Serialize(source) => Some(source),
            StoreError::NotFound(_) | StoreError::IdGeneration(_) => None,
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Sqlite(err)
    }
}

/// Open the store described by `settings`.
pub fn open_store(settings: &StoreSettings) -> Result<Box<dyn ConversationStore>, StoreError> {
    Ok(match settings.kind {
        StoreKind::Sqlite => Box::new(SqliteStore::open(&settings.path)?),
        StoreKind::Document => Box::new(DocumentStore::open(&settings.path)?),
        StoreKind::Memory => Box::new(MemoryStore::new()),
    })
}

/// Contract checks shared by every store implementation.
#[cfg(test)]
pub(crate) mod contract {
    use super::*;
    use std::collections::HashSet;

    pub(crate) fn new_conversations_get_distinct_ids(store: &mut dyn ConversationStore) {
        let mut ids = HashSet::new();
        for i in 0..5 {
            let turn = Turn::new(format!("question {i}"), "a", "b");
            let id = store.save(&turn, None).expect("save");
            assert!(ids.insert(id), "id issued twice");
        }
        assert_eq!(store.load_all().expect("load_all").len(), 5);
    }

    pub(crate) fn append_keeps_the_id(store: &mut dyn ConversationStore) {
        let first = store
            .save(&Turn::new("hello", "hi there", "greetings"), None)
            .expect("create");
        let again = store
            .save(&Turn::new("and then?", "more", "still more"), Some(&first))
            .expect("append");
        assert_eq!(again, first);

        let all = store.load_all().expect("load_all");
        assert_eq!(all.len(), 1);
        assert_eq!(
            all[0].turns,
            vec![
                Turn::new("hello", "hi there", "greetings"),
                Turn::new("and then?", "more", "still more"),
            ]
        );
        assert_eq!(store.load(&first).expect("load"), Some(all[0].clone()));
    }

    pub(crate) fn order_is_stable(store: &mut dyn ConversationStore) {
        let a = store.save(&Turn::new("one", "", ""), None).expect("save");
        let b = store.save(&Turn::new("two", "", ""), None).expect("save");
        store
            .save(&Turn::new("one again", "", ""), Some(&a))
            .expect("append");

        let first = store.load_all().expect("load_all");
        let second = store.load_all().expect("load_all");
        assert_eq!(first, second);
        let ids: Vec<_> = first.iter().map(|c| c.id.clone()).collect();
        assert_eq!(ids, vec![a, b]);
    }

    pub(crate) fn unknown_ids(store: &mut dyn ConversationStore) {
        let missing = ConversationId::new("424242");
        assert_eq!(store.load(&missing).expect("load"), None);
        let err = store
            .save(&Turn::new("x", "y", "z"), Some(&missing))
            .expect_err("append to unknown id");
        assert!(matches!(err, StoreError::NotFound(id) if id == missing));
        assert!(store.load_all().expect("load_all").is_empty());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn open_store_creates_each_kind() {
        let temp_dir = TempDir::new().expect("temp dir");
        for (kind, file) in [
            (StoreKind::Sqlite, "chat.sqlite"),
            (StoreKind::Document, "chat.json"),
            (StoreKind::Memory, "unused"),
        ] {
            let settings = StoreSettings {
                kind,
                path: temp_dir.path().join(file),
            };
            let mut store = open_store(&settings).expect("open");
            let id = store.save(&Turn::new("hi", "a", "b"), None).expect("save");
            assert_eq!(store.load_all().expect("load_all")[0].id, id);
        }
    }

    #[test]
    fn not_found_message_names_the_id() {
        let err = StoreError::NotFound(ConversationId::new("abc"));
        assert_eq!(err.to_string(), "No conversation with id abc");
    }
}
