//! Conversation persistence
//!
//! Stores each conversation's state as JSON plus a transcript of what was
//! said. Nothing else about a conversation survives a restart.

mod schema;

pub use schema::*;

use crate::state_machine::ConversationState;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("State encoding error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Conversation not found: {0}")]
    ConversationNotFound(String),
    #[error("Conversation already exists: {0}")]
    ConversationExists(String),
    #[error("Database lock poisoned")]
    Poisoned,
}

pub type DbResult<T> = Result<T, DbError>;

/// Thread-safe database handle
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        Self::init(Connection::open(path)?)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> DbResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> DbResult<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn conn(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| DbError::Poisoned)
    }

    // ==================== Conversation Operations ====================

    /// Create a new conversation with empty state
    pub fn create_conversation(&self, id: &str) -> DbResult<Conversation> {
        let conn = self.conn()?;
        let now = Utc::now();
        let state = ConversationState::default();

        let inserted = conn.execute(
            "INSERT OR IGNORE INTO conversations (id, state, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?3)",
            params![id, serde_json::to_string(&state)?, now.to_rfc3339()],
        )?;
        if inserted == 0 {
            return Err(DbError::ConversationExists(id.to_string()));
        }

        Ok(Conversation {
            id: id.to_string(),
            state,
            created_at: now,
            updated_at: now,
            message_count: 0,
        })
    }

    /// Get conversation by ID
    pub fn get_conversation(&self, id: &str) -> DbResult<Conversation> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT c.id, c.state, c.created_at, c.updated_at,
                    (SELECT COUNT(*) FROM messages m WHERE m.conversation_id = c.id)
             FROM conversations c WHERE c.id = ?1",
        )?;

        stmt.query_row(params![id], parse_conversation_row)
            .optional()?
            .ok_or_else(|| DbError::ConversationNotFound(id.to_string()))
    }

    /// List conversations, most recently active first
    pub fn list_conversations(&self) -> DbResult<Vec<Conversation>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT c.id, c.state, c.created_at, c.updated_at,
                    (SELECT COUNT(*) FROM messages m WHERE m.conversation_id = c.id)
             FROM conversations c
             ORDER BY c.updated_at DESC",
        )?;

        let rows = stmt.query_map([], parse_conversation_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Delete a conversation and its transcript
    pub fn delete_conversation(&self, id: &str) -> DbResult<()> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM conversations WHERE id = ?1", params![id])?;
        if deleted == 0 {
            return Err(DbError::ConversationNotFound(id.to_string()));
        }
        Ok(())
    }

    // ==================== State Operations ====================

    /// Load a conversation's state
    pub fn load_state(&self, id: &str) -> DbResult<ConversationState> {
        let conn = self.conn()?;
        let json: Option<String> = conn
            .query_row(
                "SELECT state FROM conversations WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;
        let json = json.ok_or_else(|| DbError::ConversationNotFound(id.to_string()))?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Replace a conversation's state
    pub fn save_state(&self, id: &str, state: &ConversationState) -> DbResult<()> {
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE conversations SET state = ?1, updated_at = ?2 WHERE id = ?3",
            params![serde_json::to_string(state)?, Utc::now().to_rfc3339(), id],
        )?;
        if updated == 0 {
            return Err(DbError::ConversationNotFound(id.to_string()));
        }
        Ok(())
    }

    // ==================== Transcript Operations ====================

    /// Append a transcript line
    pub fn add_message(
        &self,
        conversation_id: &str,
        role: MessageRole,
        text: &str,
    ) -> DbResult<Message> {
        let conn = self.conn()?;
        let now = Utc::now();

        let sequence_id: i64 = conn.query_row(
            "SELECT COALESCE(MAX(sequence_id), 0) + 1 FROM messages WHERE conversation_id = ?1",
            params![conversation_id],
            |row| row.get(0),
        )?;

        conn.execute(
            "INSERT INTO messages (conversation_id, sequence_id, role, text, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![conversation_id, sequence_id, role.to_string(), text, now.to_rfc3339()],
        )
        .map_err(|e| match e {
            rusqlite::Error::SqliteFailure(err, _)
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                DbError::ConversationNotFound(conversation_id.to_string())
            }
            other => DbError::Sqlite(other),
        })?;

        Ok(Message {
            conversation_id: conversation_id.to_string(),
            sequence_id,
            role,
            text: text.to_string(),
            created_at: now,
        })
    }

    /// Transcript of a conversation in order
    pub fn get_messages(&self, conversation_id: &str) -> DbResult<Vec<Message>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT conversation_id, sequence_id, role, text, created_at
             FROM messages WHERE conversation_id = ?1 ORDER BY sequence_id ASC",
        )?;
        let rows = stmt.query_map(params![conversation_id], parse_message_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

fn parse_conversation_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Conversation> {
    let state_json: String = row.get(1)?;
    let state = serde_json::from_str(&state_json).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Unreadable conversation state, starting fresh");
        ConversationState::default()
    });
    Ok(Conversation {
        id: row.get(0)?,
        state,
        created_at: parse_datetime(&row.get::<_, String>(2)?),
        updated_at: parse_datetime(&row.get::<_, String>(3)?),
        message_count: row.get(4)?,
    })
}

fn parse_message_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Message> {
    let role: String = row.get(2)?;
    Ok(Message {
        conversation_id: row.get(0)?,
        sequence_id: row.get(1)?,
        role: MessageRole::parse(&role).unwrap_or(MessageRole::Bot),
        text: row.get(3)?,
        created_at: parse_datetime(&row.get::<_, String>(4)?),
    })
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc))
}
