use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tempfile::NamedTempFile;
use tracing::debug;

use super::{ConversationStore, StoreError};
use crate::core::conversation::{Conversation, ConversationId, Turn};

#[derive(Debug, Default, Serialize, Deserialize)]
struct Collection {
    #[serde(default)]
    conversations: Vec<Document>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Document {
    #[serde(rename = "_id")]
    id: ConversationId,
    #[serde(default)]
    messages: Vec<Turn>,
}

impl From<&Document> for Conversation {
    fn from(document: &Document) -> Self {
        Conversation::new(document.id.clone(), document.messages.clone())
    }
}

/// Document collection kept in a single JSON file. Every document is
/// `{ "_id": <24 hex digits>, "messages": [turn, ...] }`.
pub struct DocumentStore {
    path: PathBuf,
    collection: Collection,
}

impl DocumentStore {
    /// Open the collection at `path`. A missing or empty file is an empty
    /// collection; nothing is written until the first save.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let collection = match fs::read_to_string(path) {
            Ok(contents) if contents.trim().is_empty() => Collection::default(),
            Ok(contents) => serde_json::from_str(&contents).map_err(|source| StoreError::Parse {
                path: path.to_path_buf(),
                source,
            })?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Collection::default(),
            Err(source) => {
                return Err(StoreError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        Ok(Self {
            path: path.to_path_buf(),
            collection,
        })
    }

    fn position(&self, id: &ConversationId) -> Option<usize> {
        self.collection
            .conversations
            .iter()
            .position(|document| &document.id == id)
    }

    /// Generate an id that no document in the collection already uses.
    fn fresh_id(&self) -> Result<ConversationId, StoreError> {
        loop {
            let id = generate_object_id()?;
            if self.position(&id).is_none() {
                return Ok(id);
            }
        }
    }

    /// Write the collection to a temp file next to `path`, then rename it
    /// over the original.
    fn persist(&self) -> Result<(), StoreError> {
        let io_error = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };
        let parent = self
            .path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty());

        if let Some(dir) = parent {
            fs::create_dir_all(dir).map_err(io_error)?;
        }

        let contents =
            serde_json::to_string_pretty(&self.collection).map_err(StoreError::Serialize)?;
        let mut temp_file = match parent {
            Some(dir) => NamedTempFile::new_in(dir),
            None => NamedTempFile::new_in("."),
        }
        .map_err(io_error)?;

        temp_file.write_all(contents.as_bytes()).map_err(io_error)?;
        temp_file.as_file_mut().sync_all().map_err(io_error)?;
        temp_file
            .persist(&self.path)
            .map_err(|err| io_error(err.error))?;
        Ok(())
    }
}

/// 4 bytes of seconds since the epoch followed by 8 random bytes, as 24
/// lowercase hex digits. Ids sort roughly by creation time.
fn generate_object_id() -> Result<ConversationId, StoreError> {
    let seconds = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs() as u32)
        .unwrap_or_default();

    let mut bytes = [0u8; 12];
    bytes[..4].copy_from_slice(&seconds.to_be_bytes());
    getrandom::fill(&mut bytes[4..]).map_err(|err| StoreError::IdGeneration(err.to_string()))?;

    let hex: String = bytes.iter().map(|byte| format!("{byte:02x}")).collect();
    Ok(ConversationId::new(hex))
}

impl ConversationStore for DocumentStore {
    fn save(
        &mut self,
        turn: &Turn,
        conversation_id: Option<&ConversationId>,
    ) -> Result<ConversationId, StoreError> {
        let id = match conversation_id {
            Some(id) => {
                let pos = self
                    .position(id)
                    .ok_or_else(|| StoreError::NotFound(id.clone()))?;
                self.collection.conversations[pos].messages.push(turn.clone());
                debug!(conversation = %id, "appended turn");
                id.clone()
            }
            None => {
                let id = self.fresh_id()?;
                self.collection.conversations.push(Document {
                    id: id.clone(),
                    messages: vec![turn.clone()],
                });
                debug!(conversation = %id, "created conversation");
                id
            }
        };

        if let Err(err) = self.persist() {
            // Keep memory in step with the file.
            match conversation_id {
                Some(_) => {
                    if let Some(pos) = self.position(&id) {
                        self.collection.conversations[pos].messages.pop();
                    }
                }
                None => {
                    self.collection.conversations.pop();
                }
            }
            return Err(err);
        }
        Ok(id)
    }

    fn load_all(&self) -> Result<Vec<Conversation>, StoreError> {
        Ok(self
            .collection
            .conversations
            .iter()
            .map(Conversation::from)
            .collect())
    }

    fn load(&self, id: &ConversationId) -> Result<Option<Conversation>, StoreError> {
        Ok(self
            .position(id)
            .map(|pos| Conversation::from(&self.collection.conversations[pos])))
    }
}
