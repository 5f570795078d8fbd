//! Pure state reduction
//!
//! Given the same state and action this always produces the same result,
//! with no I/O side effects.

use super::{Action, ConversationState};
use thiserror::Error;

/// Invariant violations raised by the reducer.
///
/// These are caller bugs, never user-facing conditions.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Cannot set instruction {instruction}: no recipe selected")]
    NoRecipe { instruction: usize },
    #[error("Instruction {instruction} is out of range (recipe has {count})")]
    InstructionOutOfRange { instruction: usize, count: usize },
}

/// Reduce one action over a state
pub fn reduce(state: &ConversationState, action: Action) -> Result<ConversationState, StoreError> {
    match action {
        Action::SetRecipe { recipe } => Ok(ConversationState {
            recipe: Some(*recipe),
            last_instruction_sent: None,
            prompt_key: state.prompt_key.clone(),
        }),

        Action::SetInstruction { instruction } => {
            let Some(recipe) = &state.recipe else {
                return Err(StoreError::NoRecipe { instruction });
            };
            let count = recipe.recipe_instructions.len();
            if instruction >= count {
                return Err(StoreError::InstructionOutOfRange { instruction, count });
            }
            Ok(ConversationState {
                last_instruction_sent: Some(instruction),
                ..state.clone()
            })
        }

        Action::SetPromptKey { prompt_key } => Ok(ConversationState {
            prompt_key,
            ..state.clone()
        }),

        Action::Unknown => Ok(state.clone()),
    }
}
