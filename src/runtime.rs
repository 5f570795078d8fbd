//! Runtime for executing conversations
//!
//! Each conversation gets its own task that owns its store and consumes
//! utterances from a channel in arrival order. Conversations share nothing
//! mutable, so distinct conversations run concurrently.

mod executor;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use executor::ConversationRuntime;
pub use traits::*;

use crate::bot::{RecipeBot, TurnError, TurnOutcome};
use crate::db::{Conversation, Database, DbError};
use crate::reply::ReplySequencer;
use crate::state_machine::ConversationState;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot, RwLock};
use tokio_util::sync::CancellationToken;

/// Type alias for production runtime with concrete implementations
pub type ProductionRuntime = ConversationRuntime<DatabaseStorage, BroadcastSink>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Turn(#[from] TurnError),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error(transparent)]
    Delivery(#[from] DeliveryError),
    #[error(transparent)]
    Db(#[from] DbError),
    #[error("Conversation runtime stopped: {0}")]
    Stopped(String),
}

/// One utterance waiting for its turn
#[derive(Debug)]
pub struct TurnRequest {
    pub utterance: String,
    pub respond_to: oneshot::Sender<Result<TurnReply, RuntimeError>>,
}

/// What the caller gets back once a turn has fully drained
#[derive(Debug, Clone)]
pub struct TurnReply {
    pub replies: Vec<String>,
    pub outcome: TurnOutcome,
    pub state: ConversationState,
}

/// Events sent to SSE clients
#[derive(Debug, Clone)]
pub enum OutgoingEvent {
    Message {
        text: String,
    },
    TurnComplete {
        outcome: TurnOutcome,
        replies: usize,
    },
    Error {
        message: String,
    },
}

/// Handle to interact with a running conversation
#[derive(Clone)]
pub struct ConversationHandle {
    pub turn_tx: mpsc::Sender<TurnRequest>,
    pub broadcast_tx: broadcast::Sender<OutgoingEvent>,
}

/// Manager for all conversation runtimes
pub struct RuntimeManager {
    db: Database,
    bot: Arc<RecipeBot>,
    sequencer: ReplySequencer,
    runtimes: RwLock<HashMap<String, ConversationHandle>>,
    shutdown: CancellationToken,
}

impl RuntimeManager {
    pub fn new(db: Database, bot: Arc<RecipeBot>, sequencer: ReplySequencer) -> Self {
        Self {
            db,
            bot,
            sequencer,
            runtimes: RwLock::new(HashMap::new()),
            shutdown: CancellationToken::new(),
        }
    }

    /// Start a fresh conversation
    pub fn create_conversation(&self) -> Result<Conversation, RuntimeError> {
        let id = uuid::Uuid::new_v4().to_string();
        let conv = self.db.create_conversation(&id)?;
        tracing::info!(conv_id = %id, "Conversation created");
        Ok(conv)
    }

    /// Get or create a runtime for a conversation
    pub async fn get_or_create(
        &self,
        conversation_id: &str,
    ) -> Result<ConversationHandle, RuntimeError> {
        if let Some(handle) = self.runtimes.read().await.get(conversation_id) {
            return Ok(handle.clone());
        }

        let mut runtimes = self.runtimes.write().await;
        // Another caller may have started it while we waited for the lock
        if let Some(handle) = runtimes.get(conversation_id) {
            return Ok(handle.clone());
        }

        let store = self.bot.restore(self.db.load_state(conversation_id)?);

        let (turn_tx, turn_rx) = mpsc::channel(32);
        let (broadcast_tx, _) = broadcast::channel(128);

        let runtime: ProductionRuntime = ConversationRuntime::new(
            conversation_id,
            self.bot.clone(),
            store,
            DatabaseStorage::new(self.db.clone()),
            BroadcastSink::new(broadcast_tx.clone()),
            self.sequencer,
            turn_rx,
            broadcast_tx.clone(),
        )
        .with_cancel(self.shutdown.child_token());

        let conv_id = conversation_id.to_string();
        tokio::spawn(async move {
            runtime.run().await;
            tracing::info!(conv_id = %conv_id, "Conversation runtime finished");
        });

        let handle = ConversationHandle {
            turn_tx,
            broadcast_tx,
        };
        runtimes.insert(conversation_id.to_string(), handle.clone());
        Ok(handle)
    }

    /// Queue an utterance and wait until its turn has fully drained
    pub async fn send_utterance(
        &self,
        conversation_id: &str,
        utterance: &str,
    ) -> Result<TurnReply, RuntimeError> {
        let handle = self.get_or_create(conversation_id).await?;
        let (respond_to, response) = oneshot::channel();
        handle
            .turn_tx
            .send(TurnRequest {
                utterance: utterance.to_string(),
                respond_to,
            })
            .await
            .map_err(|_| RuntimeError::Stopped(conversation_id.to_string()))?;
        response
            .await
            .map_err(|_| RuntimeError::Stopped(conversation_id.to_string()))?
    }

    /// Subscribe to conversation updates
    pub async fn subscribe(
        &self,
        conversation_id: &str,
    ) -> Result<broadcast::Receiver<OutgoingEvent>, RuntimeError> {
        let handle = self.get_or_create(conversation_id).await?;
        Ok(handle.broadcast_tx.subscribe())
    }

    /// Stop the runtime (if any) and remove the conversation
    pub async fn delete_conversation(&self, conversation_id: &str) -> Result<(), RuntimeError> {
        // Dropping the last sender ends the runtime after its current turn
        self.runtimes.write().await.remove(conversation_id);
        self.db.delete_conversation(conversation_id)?;
        tracing::info!(conv_id = %conversation_id, "Conversation deleted");
        Ok(())
    }

    /// Stop every runtime between turns
    pub fn shutdown(&self) {
        tracing::info!("Shutting down conversation runtimes");
        self.shutdown.cancel();
    }

    /// Get the database handle
    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn bot(&self) -> &RecipeBot {
        &self.bot
    }
}
