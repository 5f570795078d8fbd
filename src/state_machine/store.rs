//! Per-conversation state container

use super::{reduce, Action, ConversationState, StoreError};

/// Single-writer owner of one conversation's state.
///
/// Each conversation gets its own store; nothing here is shared between
/// conversations. Successfully dispatched actions are journaled so a turn
/// can report what it changed.
#[derive(Debug, Clone, Default)]
pub struct ConversationStore {
    state: ConversationState,
    journal: Vec<Action>,
}

impl ConversationStore {
    pub fn new(state: ConversationState) -> Self {
        Self {
            state,
            journal: Vec::new(),
        }
    }

    pub fn get_state(&self) -> &ConversationState {
        &self.state
    }

    /// Apply an action. On error the state is left untouched.
    pub fn dispatch(&mut self, action: Action) -> Result<(), StoreError> {
        let next = reduce(&self.state, action.clone())?;
        tracing::debug!(action = action.kind(), "Dispatched action");
        self.state = next;
        self.journal.push(action);
        Ok(())
    }

    /// Actions dispatched since the last call
    pub fn take_journal(&mut self) -> Vec<Action> {
        std::mem::take(&mut self.journal)
    }

    pub fn into_state(self) -> ConversationState {
        self.state
    }
}
