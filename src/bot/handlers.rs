//! What each handler does once its rule has matched

use super::ingredients::find_ingredient;
use super::intents::BotHandler;
use super::{RecipeBot, TurnError};
use crate::catalog::Recipe;
use crate::matchers::Match;
use crate::reply::Replies;
use crate::state_machine::{Action, ConversationStore};
use crate::units::{convert_ingredient, UnitSystem};

const THATS_IT: &str = "That's it!";
const AT_BEGINNING: &str = "We're at the beginning.";
const CHOOSE_FIRST: &str = "First please choose a recipe";

fn clean_name(raw: &str) -> &str {
    raw.trim().trim_end_matches(['.', '!', '?']).trim_end()
}

fn current_recipe(store: &ConversationStore, handler: BotHandler) -> Result<Recipe, TurnError> {
    store
        .get_state()
        .recipe
        .clone()
        .ok_or(TurnError::NoRecipe {
            handler: handler.name(),
        })
}

impl RecipeBot {
    pub(super) fn execute(
        &self,
        handler: BotHandler,
        matched: &Match,
        store: &mut ConversationStore,
        replies: &mut Replies,
    ) -> Result<(), TurnError> {
        match handler {
            BotHandler::Ask(question) => self.prompts.ask(question.key(), store, replies)?,
            BotHandler::SingASong => {
                let song = matched.entity("song").unwrap_or("something");
                replies.push(format!("Let's sing {song}"));
            }
            BotHandler::FindSomething => {
                let what = matched.entity("what").unwrap_or("something");
                let place = matched.entity("where").unwrap_or("somewhere");
                replies.push(format!("Okay let's find a {what} in {place}"));
            }
            BotHandler::ChooseRecipe => {
                let name = clean_name(matched.group(1).unwrap_or_default());
                self.choose_recipe(name, store, replies)?;
            }
            BotHandler::ChooseRecipeFirst => replies.push(CHOOSE_FIRST),
            BotHandler::QueryQuantity => {
                let recipe = current_recipe(store, handler)?;
                let query = clean_name(matched.group(1).unwrap_or_default());
                replies.push(self.lookup_ingredient(&recipe, query));
            }
            BotHandler::ConvertQuantity => {
                let recipe = current_recipe(store, handler)?;
                let query = clean_name(matched.group(1).unwrap_or_default());
                let system = matched
                    .group(2)
                    .and_then(|s| s.parse::<UnitSystem>().ok())
                    .unwrap_or(UnitSystem::Metric);
                let ingredient = self.lookup_ingredient(&recipe, query);
                replies.push(convert_ingredient(&ingredient, system).unwrap_or(ingredient));
            }
            BotHandler::StartInstructions | BotHandler::RestartInstructions => {
                let recipe = current_recipe(store, handler)?;
                say_instruction(&recipe, 0, store, replies)?;
            }
            BotHandler::NextInstruction => {
                let recipe = current_recipe(store, handler)?;
                let next = store.get_state().last_instruction_sent.map_or(0, |i| i + 1);
                say_instruction(&recipe, next, store, replies)?;
            }
            BotHandler::PreviousInstruction => {
                let recipe = current_recipe(store, handler)?;
                match store.get_state().last_instruction_sent {
                    Some(last) if last > 0 => say_instruction(&recipe, last - 1, store, replies)?,
                    _ => replies.push(AT_BEGINNING),
                }
            }
            BotHandler::RepeatInstruction => {
                let recipe = current_recipe(store, handler)?;
                let current = store.get_state().last_instruction_sent.unwrap_or(0);
                say_instruction(&recipe, current, store, replies)?;
            }
        }
        Ok(())
    }

    fn choose_recipe(
        &self,
        name: &str,
        store: &mut ConversationStore,
        replies: &mut Replies,
    ) -> Result<(), TurnError> {
        let Some(recipe) = self.catalog.find_by_name(name) else {
            tracing::info!(recipe = %name, "Unknown recipe requested");
            replies.push(format!(
                "Sorry, I don't know how to make {name}. Maybe one day you can teach me."
            ));
            return Ok(());
        };

        store.dispatch(Action::set_recipe(recipe.clone()))?;

        let display = recipe.name.as_deref().unwrap_or(name);
        replies.push(match &recipe.recipe_yield {
            Some(yields) => format!(
                "Great, let's make {display} which {}!",
                yields.to_lowercase()
            ),
            None => format!("Great, let's make {display}!"),
        });
        replies.push("Here are the ingredients:");
        replies.extend(recipe.recipe_ingredient.iter().cloned());
        replies.push("Let me know when you're ready to go.");
        Ok(())
    }

    fn lookup_ingredient(&self, recipe: &Recipe, query: &str) -> String {
        find_ingredient(
            &recipe.recipe_ingredient,
            query,
            self.settings.tie_break,
            self.settings.min_ingredient_score,
        )
        .map_or_else(
            || format!("Sorry, I couldn't find {query} in this recipe."),
            ToString::to_string,
        )
    }
}

/// Speak instruction `index` and remember it; past the end only says so
fn say_instruction(
    recipe: &Recipe,
    index: usize,
    store: &mut ConversationStore,
    replies: &mut Replies,
) -> Result<(), TurnError> {
    let Some(text) = recipe.recipe_instructions.get(index) else {
        replies.push(THATS_IT);
        return Ok(());
    };
    store.dispatch(Action::set_instruction(index))?;
    replies.push(text.clone());
    if index + 1 == recipe.recipe_instructions.len() {
        replies.push(THATS_IT);
    }
    Ok(())
}
