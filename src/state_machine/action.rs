//! Actions that can be dispatched against a conversation store

use crate::catalog::Recipe;
use serde::{Deserialize, Serialize};

/// Actions that trigger state reductions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    /// Select a recipe; always forgets the instruction position
    SetRecipe { recipe: Box<Recipe> },
    /// Record the index of the instruction just spoken
    SetInstruction { instruction: usize },
    /// Open (`Some`) or close (`None`) a prompt
    SetPromptKey { prompt_key: Option<String> },
    /// An action tag this build does not know; reduces to a no-op
    #[serde(other)]
    Unknown,
}

impl Action {
    pub fn set_recipe(recipe: Recipe) -> Self {
        Action::SetRecipe {
            recipe: Box::new(recipe),
        }
    }

    pub fn set_instruction(instruction: usize) -> Self {
        Action::SetInstruction { instruction }
    }

    pub fn open_prompt(key: impl Into<String>) -> Self {
        Action::SetPromptKey {
            prompt_key: Some(key.into()),
        }
    }

    pub fn close_prompt() -> Self {
        Action::SetPromptKey { prompt_key: None }
    }

    /// Short tag used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            Action::SetRecipe { .. } => "set_recipe",
            Action::SetInstruction { .. } => "set_instruction",
            Action::SetPromptKey { .. } => "set_prompt_key",
            Action::Unknown => "unknown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_format_is_tagged() {
        let json = serde_json::to_value(Action::set_instruction(2)).unwrap();
        assert_eq!(json["type"], "set_instruction");
        assert_eq!(json["instruction"], 2);

        let json = serde_json::to_value(Action::close_prompt()).unwrap();
        assert_eq!(json["type"], "set_prompt_key");
        assert!(json["prompt_key"].is_null());
    }

    #[test]
    fn test_unrecognised_tag_becomes_unknown() {
        let action: Action = serde_json::from_str(r#"{"type": "set_timer"}"#).unwrap();
        assert_eq!(action, Action::Unknown);
    }

    #[test]
    fn test_set_recipe_parses() {
        let action: Action =
            serde_json::from_str(r#"{"type": "set_recipe", "recipe": {"name": "Toast"}}"#).unwrap();
        match action {
            Action::SetRecipe { recipe } => assert_eq!(recipe.name.as_deref(), Some("Toast")),
            other => panic!("Expected SetRecipe, got {other:?}"),
        }
    }
}
