//! Conversation runtime executor

use super::traits::{ReplySink, Storage};
use super::{OutgoingEvent, RuntimeError, TurnReply, TurnRequest};

use crate::bot::RecipeBot;
use crate::db::MessageRole;
use crate::reply::ReplySequencer;
use crate::state_machine::ConversationStore;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;

/// Owns one conversation and runs its turns strictly one at a time.
///
/// A turn (handler, persistence and reply drain) finishes before the next
/// request is taken off the channel. Cancellation is only observed between
/// turns.
pub struct ConversationRuntime<S, R>
where
    S: Storage + 'static,
    R: ReplySink + 'static,
{
    conv_id: String,
    bot: Arc<RecipeBot>,
    store: ConversationStore,
    storage: S,
    sink: R,
    sequencer: ReplySequencer,
    turn_rx: mpsc::Receiver<TurnRequest>,
    broadcast_tx: broadcast::Sender<OutgoingEvent>,
    cancel: CancellationToken,
}

impl<S, R> ConversationRuntime<S, R>
where
    S: Storage + 'static,
    R: ReplySink + 'static,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        conv_id: impl Into<String>,
        bot: Arc<RecipeBot>,
        store: ConversationStore,
        storage: S,
        sink: R,
        sequencer: ReplySequencer,
        turn_rx: mpsc::Receiver<TurnRequest>,
        broadcast_tx: broadcast::Sender<OutgoingEvent>,
    ) -> Self {
        Self {
            conv_id: conv_id.into(),
            bot,
            store,
            storage,
            sink,
            sequencer,
            turn_rx,
            broadcast_tx,
            cancel: CancellationToken::new(),
        }
    }

    /// Stop taking turns once `cancel` fires
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub async fn run(mut self) {
        tracing::info!(conv_id = %self.conv_id, "Starting conversation runtime");

        loop {
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => break,
                request = self.turn_rx.recv() => {
                    let Some(request) = request else { break };
                    let result = self.process_turn(&request.utterance).await;
                    if let Err(e) = &result {
                        tracing::error!(conv_id = %self.conv_id, error = %e, "Turn failed");
                        let _ = self.broadcast_tx.send(OutgoingEvent::Error {
                            message: e.to_string(),
                        });
                    }
                    // The caller may have gone away; the turn still counts
                    let _ = request.respond_to.send(result);
                }
            }
        }

        tracing::info!(conv_id = %self.conv_id, "Conversation runtime stopped");
    }

    async fn process_turn(&mut self, utterance: &str) -> Result<TurnReply, RuntimeError> {
        if let Err(e) = self
            .storage
            .record(&self.conv_id, MessageRole::User, utterance)
            .await
        {
            tracing::warn!(conv_id = %self.conv_id, error = %e, "Failed to record utterance");
        }

        let previous = self.store.get_state().clone();
        let output = self.bot.run_turn(&mut self.store, utterance).await?;

        if !output.actions.is_empty() {
            if let Err(e) = self
                .storage
                .save_state(&self.conv_id, self.store.get_state())
                .await
            {
                // Keep memory in step with what is persisted
                self.store = ConversationStore::new(previous);
                return Err(RuntimeError::Storage(e));
            }
        }

        let messages = output.replies.into_messages();
        for message in &messages {
            if let Err(e) = self
                .storage
                .record(&self.conv_id, MessageRole::Bot, message)
                .await
            {
                tracing::warn!(conv_id = %self.conv_id, error = %e, "Failed to record reply");
            }
        }

        self.sequencer
            .drain(&self.conv_id, messages.iter().cloned(), &self.sink)
            .await?;

        let reply = TurnReply {
            replies: messages,
            outcome: output.outcome,
            state: self.store.get_state().clone(),
        };
        let _ = self.broadcast_tx.send(OutgoingEvent::TurnComplete {
            outcome: reply.outcome.clone(),
            replies: reply.replies.len(),
        });
        Ok(reply)
    }
}
