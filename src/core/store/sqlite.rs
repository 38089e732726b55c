use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

use super::{ConversationStore, StoreError};
use crate::core::conversation::{Conversation, ConversationId, Turn};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS conversations (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_input TEXT,
        response_a TEXT,
        response_b TEXT
    );
    CREATE TABLE IF NOT EXISTS conversation_turns (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        conversation_id INTEGER NOT NULL REFERENCES conversations(id),
        user_input TEXT,
        response_a TEXT,
        response_b TEXT
    );
    CREATE INDEX IF NOT EXISTS idx_conversation_turns_conversation
        ON conversation_turns (conversation_id, id);";

/// Relational store. Each conversation's first turn is a `conversations`
/// row; later turns go to `conversation_turns`.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|source| StoreError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    fn row_id(&self, id: &ConversationId) -> Result<Option<i64>, StoreError> {
        let Ok(row_id) = id.as_str().parse::<i64>() else {
            return Ok(None);
        };
        let found = self
            .conn
            .query_row(
                "SELECT id FROM conversations WHERE id = ?1",
                [row_id],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        Ok(found)
    }

    fn appended_turns(&self, row_id: i64) -> Result<Vec<Turn>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT user_input, response_a, response_b
             FROM conversation_turns
             WHERE conversation_id = ?1
             ORDER BY id",
        )?;
        let turns = stmt
            .query_map([row_id], turn_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(turns)
    }
}

fn turn_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Turn> {
    turn_from_columns(row, 0)
}

/// Read a turn from three consecutive columns starting at `first`. NULL
/// columns read as empty text.
fn turn_from_columns(row: &rusqlite::Row<'_>, first: usize) -> rusqlite::Result<Turn> {
    Ok(Turn {
        user_input: row.get::<_, Option<String>>(first)?.unwrap_or_default(),
        response_a: row.get::<_, Option<String>>(first + 1)?.unwrap_or_default(),
        response_b: row.get::<_, Option<String>>(first + 2)?.unwrap_or_default(),
    })
}

impl ConversationStore for SqliteStore {
    fn save(
        &mut self,
        turn: &Turn,
        conversation_id: Option<&ConversationId>,
    ) -> Result<ConversationId, StoreError> {
        match conversation_id {
            Some(id) => {
                let row_id = self
                    .row_id(id)?
                    .ok_or_else(|| StoreError::NotFound(id.clone()))?;
                self.conn.execute(
                    "INSERT INTO conversation_turns (conversation_id, user_input, response_a, response_b)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![row_id, turn.user_input, turn.response_a, turn.response_b],
                )?;
                debug!(conversation = row_id, "appended turn");
                Ok(id.clone())
            }
            None => {
                self.conn.execute(
                    "INSERT INTO conversations (user_input, response_a, response_b)
                     VALUES (?1, ?2, ?3)",
                    params![turn.user_input, turn.response_a, turn.response_b],
                )?;
                let row_id = self.conn.last_insert_rowid();
                debug!(conversation = row_id, "created conversation");
                Ok(ConversationId::from(row_id))
            }
        }
    }

    fn load_all(&self) -> Result<Vec<Conversation>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_input, response_a, response_b FROM conversations ORDER BY id",
        )?;
        let mut conversations = stmt
            .query_map([], |row| {
                let id: i64 = row.get(0)?;
                Ok((id, turn_from_columns(row, 1)?))
            })?
            .map(|row| row.map(|(id, turn)| (id, Conversation::new(id.into(), vec![turn]))))
            .collect::<Result<Vec<_>, _>>()?;

        let index: HashMap<i64, usize> = conversations
            .iter()
            .enumerate()
            .map(|(pos, (id, _))| (*id, pos))
            .collect();

        let mut stmt = self.conn.prepare(
            "SELECT conversation_id, user_input, response_a, response_b
             FROM conversation_turns
             ORDER BY conversation_id, id",
        )?;
        let rows = stmt.query_map([], |row| {
            let conversation_id: i64 = row.get(0)?;
            Ok((conversation_id, turn_from_columns(row, 1)?))
        })?;
        for row in rows {
            let (conversation_id, turn) = row?;
            if let Some(&pos) = index.get(&conversation_id) {
                conversations[pos].1.turns.push(turn);
            }
        }

        Ok(conversations
            .into_iter()
            .map(|(_, conversation)| conversation)
            .collect())
    }

    fn load(&self, id: &ConversationId) -> Result<Option<Conversation>, StoreError> {
        let Ok(row_id) = id.as_str().parse::<i64>() else {
            return Ok(None);
        };
        let first = self
            .conn
            .query_row(
                "SELECT user_input, response_a, response_b FROM conversations WHERE id = ?1",
                [row_id],
                turn_from_row,
            )
            .optional()?;
        let Some(first) = first else {
            return Ok(None);
        };

        let mut turns = vec![first];
        turns.extend(self.appended_turns(row_id)?);
        Ok(Some(Conversation::new(id.clone(), turns)))
    }
}
