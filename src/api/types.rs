//! API request and response types

use crate::bot::TurnOutcome;
use crate::db::{Conversation, Message};
use crate::state_machine::ConversationState;
use serde::{Deserialize, Serialize};

/// Request to say something in a conversation
#[derive(Debug, Deserialize)]
pub struct UtteranceRequest {
    pub text: String,
}

/// Everything one turn produced, once its replies have been delivered
#[derive(Debug, Serialize)]
pub struct TurnResponse {
    pub replies: Vec<String>,
    pub outcome: TurnOutcome,
    pub state: ConversationState,
}

/// Response with a list of conversations
#[derive(Debug, Serialize)]
pub struct ConversationListResponse {
    pub conversations: Vec<Conversation>,
}

/// Response with a single conversation
#[derive(Debug, Serialize)]
pub struct ConversationResponse {
    pub conversation: Conversation,
}

/// Response with conversation and transcript
#[derive(Debug, Serialize)]
pub struct ConversationWithMessagesResponse {
    pub conversation: Conversation,
    pub messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
pub struct StateResponse {
    pub state: ConversationState,
}

#[derive(Debug, Serialize)]
pub struct RecipeListResponse {
    pub recipes: Vec<String>,
}

/// Response for lifecycle actions
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
