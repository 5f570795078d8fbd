//! Questions the bot can ask, and how it reacts to the answers

use crate::prompts::{PromptAnswer, PromptError, PromptRegistry};
use crate::reply::Replies;

pub const CHEESES: [&str; 4] = ["Cheddar", "Wensleydale", "Brie", "Velveeta"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Question {
    FavoriteColor,
    FavoriteCheese,
    LikeCheese,
}

impl Question {
    pub fn key(self) -> &'static str {
        match self {
            Question::FavoriteColor => "Favorite_Color",
            Question::FavoriteCheese => "Favorite_Cheese",
            Question::LikeCheese => "Like_Cheese",
        }
    }
}

/// Register every question with its expected answer shape
pub fn register(prompts: &mut PromptRegistry<Question>) -> Result<(), PromptError> {
    prompts.text(
        Question::FavoriteColor.key(),
        "What is your favorite color?",
        Question::FavoriteColor,
    )?;
    prompts.choice(
        Question::FavoriteCheese.key(),
        "What is your favorite cheese?",
        CHEESES,
        Question::FavoriteCheese,
    )?;
    prompts.confirm(
        Question::LikeCheese.key(),
        "Do you like cheese?",
        Question::LikeCheese,
    )?;
    Ok(())
}

/// React to a resolved answer
pub fn answer(question: Question, answer: &PromptAnswer, replies: &mut Replies) {
    match (question, answer) {
        (Question::FavoriteColor, PromptAnswer::Text(color)) => {
            replies.push(if color.eq_ignore_ascii_case("blue") {
                "That is correct!"
            } else {
                "That is incorrect"
            });
        }
        (Question::FavoriteCheese, PromptAnswer::Choice(cheese)) => {
            replies.push(if cheese == "Velveeta" {
                "Ima let you finish but FYI that is not really cheese."
            } else {
                "Interesting."
            });
        }
        (Question::LikeCheese, PromptAnswer::Confirm(likes)) => {
            replies.push(if *likes {
                "That is correct."
            } else {
                "That is incorrect."
            });
        }
        (question, answer) => {
            tracing::warn!(prompt = question.key(), ?answer, "Answer shape does not fit question");
        }
    }
}
