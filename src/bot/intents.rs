//! Utterance patterns and the dialog's decision tree

use super::questions::Question;
use crate::rules::{best_match, filter, first_match, intent, regex, Rule};
use crate::state_machine::ConversationState;

pub const START: &str = r"\b(?:let's start|start|let's go|go|i'm ready|ready|ok|okay)\b";
pub const NEXT: &str = r"\b(?:next|what's next|next up|ok|okay|go|continue)\b";
pub const PREVIOUS: &str = r"\b(?:go back|back up|previous)\b";
pub const REPEAT: &str =
    r"\b(?:what's that again|huh|say that again|please repeat that|repeat that|repeat)\b";
pub const RESTART: &str = r"\b(?:start over|start again|restart)\b";
pub const CHOOSE_RECIPE: &str = r"\bi want to make (?:(?:a|an|some|the)\s+)?(.+)";
pub const CONVERT_QUANTITY: &str = r"\bhow (?:many|much) (.+?) in (metric|imperial)\b";
pub const QUERY_QUANTITY: &str = r"\bhow (?:many|much) (.+)";
pub const ASK_TEXT: &str = r"\bask\b";
pub const ASK_CONFIRM: &str = r"\byorn\b";
pub const ASK_CHOICE: &str = r"\bchoice\b";
pub const ANYTHING: &str = r"(.+)";

pub const SING_A_SONG: &str = "singASong";
pub const FIND_SOMETHING: &str = "findSomething";

/// What the bot does once a rule has matched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotHandler {
    Ask(Question),
    SingASong,
    FindSomething,
    ChooseRecipe,
    ChooseRecipeFirst,
    QueryQuantity,
    ConvertQuantity,
    StartInstructions,
    NextInstruction,
    PreviousInstruction,
    RepeatInstruction,
    RestartInstructions,
}

impl BotHandler {
    pub fn name(self) -> &'static str {
        match self {
            BotHandler::Ask(Question::FavoriteColor) => "ask_favorite_color",
            BotHandler::Ask(Question::FavoriteCheese) => "ask_favorite_cheese",
            BotHandler::Ask(Question::LikeCheese) => "ask_like_cheese",
            BotHandler::SingASong => "sing_a_song",
            BotHandler::FindSomething => "find_something",
            BotHandler::ChooseRecipe => "choose_recipe",
            BotHandler::ChooseRecipeFirst => "choose_recipe_first",
            BotHandler::QueryQuantity => "query_quantity",
            BotHandler::ConvertQuantity => "convert_quantity",
            BotHandler::StartInstructions => "start_instructions",
            BotHandler::NextInstruction => "next_instruction",
            BotHandler::PreviousInstruction => "previous_instruction",
            BotHandler::RepeatInstruction => "repeat_instruction",
            BotHandler::RestartInstructions => "restart_instructions",
        }
    }
}

pub fn no_recipe(state: &ConversationState) -> bool {
    !state.has_recipe()
}

pub fn no_instructions_sent(state: &ConversationState) -> bool {
    !state.instructions_started()
}

/// Build the full decision tree, highest priority first.
///
/// Prompt answers are handled before this tree is consulted.
pub fn build_rules(threshold: f64) -> Result<Rule<BotHandler>, regex::Error> {
    Ok(first_match([
        first_match([
            regex(&[ASK_TEXT], BotHandler::Ask(Question::FavoriteColor))?,
            regex(&[ASK_CONFIRM], BotHandler::Ask(Question::LikeCheese))?,
            regex(&[ASK_CHOICE], BotHandler::Ask(Question::FavoriteCheese))?,
        ]),
        best_match([
            intent(SING_A_SONG, BotHandler::SingASong).with_threshold(threshold),
            intent(FIND_SOMETHING, BotHandler::FindSomething).with_threshold(threshold),
        ]),
        filter(
            "no_recipe",
            no_recipe,
            first_match([
                regex(&[CHOOSE_RECIPE], BotHandler::ChooseRecipe)?,
                regex(
                    &[
                        CONVERT_QUANTITY,
                        QUERY_QUANTITY,
                        START,
                        NEXT,
                        PREVIOUS,
                        REPEAT,
                        RESTART,
                    ],
                    BotHandler::ChooseRecipeFirst,
                )?,
                regex(&[ANYTHING], BotHandler::ChooseRecipe)?,
            ]),
        ),
        regex(&[CHOOSE_RECIPE], BotHandler::ChooseRecipe)?,
        regex(&[CONVERT_QUANTITY], BotHandler::ConvertQuantity)?,
        regex(&[QUERY_QUANTITY], BotHandler::QueryQuantity)?,
        filter(
            "no_instructions_sent",
            no_instructions_sent,
            regex(&[START, NEXT], BotHandler::StartInstructions)?,
        ),
        first_match([
            regex(&[RESTART], BotHandler::RestartInstructions)?,
            regex(&[PREVIOUS], BotHandler::PreviousInstruction)?,
            regex(&[REPEAT], BotHandler::RepeatInstruction)?,
            regex(&[NEXT], BotHandler::NextInstruction)?,
        ]),
    ]))
}
