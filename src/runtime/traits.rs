//! Trait abstractions for runtime I/O
//!
//! These traits let the executor run against mocks in tests and against
//! the database and broadcast channel in production.

use super::OutgoingEvent;
use crate::db::{Database, MessageRole};
use crate::state_machine::ConversationState;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast;

/// A reply could not be handed to the transport
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Failed to deliver reply to {conv_id}: {reason}")]
pub struct DeliveryError {
    pub conv_id: String,
    pub reason: String,
}

impl DeliveryError {
    pub fn new(conv_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            conv_id: conv_id.into(),
            reason: reason.into(),
        }
    }
}

/// Storage for conversation state
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Replace the persisted state of a conversation
    async fn save_state(&self, conv_id: &str, state: &ConversationState) -> Result<(), String>;
}

/// Storage for what was said
#[async_trait]
pub trait TranscriptStore: Send + Sync {
    async fn record(&self, conv_id: &str, role: MessageRole, text: &str) -> Result<(), String>;
}

/// Combined storage trait for convenience
pub trait Storage: StateStore + TranscriptStore {}
impl<T: StateStore + TranscriptStore> Storage for T {}

/// Transport for outgoing replies
#[async_trait]
pub trait ReplySink: Send + Sync {
    /// Deliver one message; resolves once the transport has accepted it
    async fn deliver(&self, conv_id: &str, message: &str) -> Result<(), DeliveryError>;
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: StateStore + ?Sized> StateStore for Arc<T> {
    async fn save_state(&self, conv_id: &str, state: &ConversationState) -> Result<(), String> {
        (**self).save_state(conv_id, state).await
    }
}

#[async_trait]
impl<T: TranscriptStore + ?Sized> TranscriptStore for Arc<T> {
    async fn record(&self, conv_id: &str, role: MessageRole, text: &str) -> Result<(), String> {
        (**self).record(conv_id, role, text).await
    }
}

#[async_trait]
impl<T: ReplySink + ?Sized> ReplySink for Arc<T> {
    async fn deliver(&self, conv_id: &str, message: &str) -> Result<(), DeliveryError> {
        (**self).deliver(conv_id, message).await
    }
}

// ============================================================================
// Production Adapters
// ============================================================================

/// Adapter to use Database as Storage
#[derive(Clone)]
pub struct DatabaseStorage {
    db: Database,
}

impl DatabaseStorage {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl StateStore for DatabaseStorage {
    async fn save_state(&self, conv_id: &str, state: &ConversationState) -> Result<(), String> {
        self.db.save_state(conv_id, state).map_err(|e| e.to_string())
    }
}

#[async_trait]
impl TranscriptStore for DatabaseStorage {
    async fn record(&self, conv_id: &str, role: MessageRole, text: &str) -> Result<(), String> {
        self.db
            .add_message(conv_id, role, text)
            .map(|_| ())
            .map_err(|e| e.to_string())
    }
}

/// Delivers replies to every SSE subscriber of one conversation.
///
/// Having no subscriber is not a failure: the reply still reaches the
/// caller in the turn result and the transcript.
#[derive(Clone)]
pub struct BroadcastSink {
    tx: broadcast::Sender<OutgoingEvent>,
}

impl BroadcastSink {
    pub fn new(tx: broadcast::Sender<OutgoingEvent>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl ReplySink for BroadcastSink {
    async fn deliver(&self, conv_id: &str, message: &str) -> Result<(), DeliveryError> {
        let receivers = self
            .tx
            .send(OutgoingEvent::Message {
                text: message.to_string(),
            })
            .unwrap_or(0);
        tracing::trace!(conv_id = %conv_id, receivers, "Reply broadcast");
        Ok(())
    }
}
