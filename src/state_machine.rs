//! Conversation state and its reducer
//!
//! Implements a pure `(state, action) -> state` reduction behind a
//! per-conversation store.

mod action;
mod reducer;
pub mod state;
mod store;

#[cfg(test)]
mod proptests;

pub use action::Action;
pub use reducer::{reduce, StoreError};
pub use state::{ConversationState, PromptStatus};
pub use store::ConversationStore;
