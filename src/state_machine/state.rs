//! Conversation state types

use crate::catalog::Recipe;
use serde::{Deserialize, Serialize};

/// Everything the bot remembers about one conversation.
///
/// This is also the persisted shape: nothing else about a conversation is
/// stored between turns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationState {
    /// The recipe being cooked, if one has been chosen
    #[serde(default)]
    pub recipe: Option<Recipe>,
    /// Index into the recipe's instructions of the last one spoken.
    /// Only meaningful while `recipe` is set.
    #[serde(default)]
    pub last_instruction_sent: Option<usize>,
    /// Key of the outstanding prompt, if any
    #[serde(default)]
    pub prompt_key: Option<String>,
}

/// Whether a question is outstanding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptStatus<'a> {
    Idle,
    AwaitingAnswer(&'a str),
}

impl ConversationState {
    pub fn has_recipe(&self) -> bool {
        self.recipe.is_some()
    }

    /// True once any instruction of the current recipe has been spoken
    pub fn instructions_started(&self) -> bool {
        self.last_instruction_sent.is_some()
    }

    pub fn prompt_status(&self) -> PromptStatus<'_> {
        match self.prompt_key.as_deref() {
            Some(key) => PromptStatus::AwaitingAnswer(key),
            None => PromptStatus::Idle,
        }
    }

    /// Name of the current recipe, for logging
    pub fn recipe_name(&self) -> Option<&str> {
        self.recipe.as_ref().and_then(|recipe| recipe.name.as_deref())
    }
}
