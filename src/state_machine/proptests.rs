//! Property-based tests for the reducer
//!
//! These tests verify key invariants hold across all possible inputs.

use super::*;
use crate::catalog::Recipe;
use proptest::prelude::*;

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_recipe() -> impl Strategy<Value = Recipe> {
    (
        "[A-Z][a-z]{2,10}",
        proptest::collection::vec("[a-z ]{1,15}", 0..5),
        proptest::collection::vec("[a-zA-Z ]{1,30}", 0..6),
    )
        .prop_map(|(name, recipe_ingredient, recipe_instructions)| Recipe {
            name: Some(name),
            recipe_ingredient,
            recipe_instructions,
            ..Recipe::default()
        })
}

fn arb_prompt_key() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        Just(Some("Favorite_Color".to_string())),
        Just(Some("Favorite_Cheese".to_string())),
        Just(Some("Like_Cheese".to_string())),
    ]
}

fn arb_action() -> impl Strategy<Value = Action> {
    prop_oneof![
        arb_recipe().prop_map(Action::set_recipe),
        (0usize..8).prop_map(Action::set_instruction),
        arb_prompt_key().prop_map(|prompt_key| Action::SetPromptKey { prompt_key }),
        Just(Action::Unknown),
    ]
}

fn arb_state() -> impl Strategy<Value = ConversationState> {
    (proptest::option::of(arb_recipe()), arb_prompt_key(), 0usize..6).prop_map(
        |(recipe, prompt_key, instruction)| {
            let last_instruction_sent = recipe
                .as_ref()
                .filter(|r| instruction < r.recipe_instructions.len())
                .map(|_| instruction);
            ConversationState {
                recipe,
                last_instruction_sent,
                prompt_key,
            }
        },
    )
}

/// Apply actions in order, skipping invariant violations like the store does
fn replay(initial: &ConversationState, actions: &[Action]) -> ConversationState {
    let mut store = ConversationStore::new(initial.clone());
    for action in actions {
        let _ = store.dispatch(action.clone());
    }
    store.into_state()
}

// ============================================================================
// State Validity Checkers
// ============================================================================

fn is_valid_state(state: &ConversationState) -> bool {
    match (&state.recipe, state.last_instruction_sent) {
        (None, Some(_)) => false,
        (Some(recipe), Some(index)) => index < recipe.recipe_instructions.len(),
        _ => true,
    }
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    // Invariant 1: Replaying the same actions from the same state is deterministic
    #[test]
    fn prop_replay_is_deterministic(
        initial in arb_state(),
        actions in proptest::collection::vec(arb_action(), 0..20)
    ) {
        prop_assert_eq!(replay(&initial, &actions), replay(&initial, &actions));
    }

    // Invariant 2: Every reachable state is valid
    #[test]
    fn prop_dispatch_preserves_validity(
        actions in proptest::collection::vec(arb_action(), 0..20)
    ) {
        let mut store = ConversationStore::default();
        for action in actions {
            let _ = store.dispatch(action);
            prop_assert!(
                is_valid_state(store.get_state()),
                "Invalid state: {:?}",
                store.get_state()
            );
        }
    }

    // Invariant 3: SetRecipe always clears the instruction position
    #[test]
    fn prop_set_recipe_clears_instruction(state in arb_state(), recipe in arb_recipe()) {
        let next = reduce(&state, Action::set_recipe(recipe.clone())).unwrap();
        prop_assert_eq!(next.last_instruction_sent, None);
        prop_assert_eq!(next.recipe, Some(recipe));
        prop_assert_eq!(next.prompt_key, state.prompt_key);
    }

    // Invariant 4: Unknown actions never change state
    #[test]
    fn prop_unknown_action_is_noop(state in arb_state()) {
        prop_assert_eq!(reduce(&state, Action::Unknown).unwrap(), state);
    }

    // Invariant 5: A rejected action leaves the store exactly as it was
    #[test]
    fn prop_rejected_action_has_no_effect(state in arb_state(), action in arb_action()) {
        let mut store = ConversationStore::new(state.clone());
        if store.dispatch(action).is_err() {
            prop_assert_eq!(store.get_state(), &state);
            prop_assert!(store.take_journal().is_empty());
        }
    }

    // Invariant 6: Prompt key changes touch nothing else
    #[test]
    fn prop_prompt_key_is_independent(state in arb_state(), prompt_key in arb_prompt_key()) {
        let next = reduce(&state, Action::SetPromptKey { prompt_key: prompt_key.clone() }).unwrap();
        prop_assert_eq!(next.prompt_key, prompt_key);
        prop_assert_eq!(next.recipe, state.recipe);
        prop_assert_eq!(next.last_instruction_sent, state.last_instruction_sent);
    }
}
