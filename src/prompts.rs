//! Prompt state machine
//!
//! While a prompt is outstanding (`prompt_key` set) the next utterance is
//! read as its answer before any other rule is consulted. Prompts are
//! registered once at startup with the shape of answer they expect.

use crate::reply::Replies;
use crate::state_machine::{Action, ConversationState, ConversationStore, PromptStatus, StoreError};
use std::collections::HashMap;
use thiserror::Error;

const AFFIRMATIVE: &[&str] = &[
    "yes", "y", "yeah", "yep", "yup", "sure", "ok", "okay", "of course", "absolutely",
    "definitely", "certainly", "please", "i do", "yes please",
];

const NEGATIVE: &[&str] = &[
    "no", "n", "nope", "nah", "not really", "no thanks", "never", "i don't", "i do not",
    "absolutely not",
];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PromptError {
    #[error("Prompt not registered: {0}")]
    Unregistered(String),
    #[error("Prompt already registered: {0}")]
    Duplicate(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// What kind of answer a prompt expects
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerShape {
    /// Any utterance is the answer
    Text,
    /// One of these options, compared case-insensitively
    Choice(Vec<String>),
    /// Yes or no
    Confirm,
}

/// An answer coerced into the prompt's shape
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptAnswer {
    Text(String),
    /// The canonical spelling of the chosen option
    Choice(String),
    Confirm(bool),
}

#[derive(Debug, Clone)]
pub struct PromptDescriptor<H> {
    pub key: String,
    pub question: String,
    pub shape: AnswerShape,
    pub handler: H,
}

/// Result of reading an utterance against the prompt state
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<H> {
    /// No prompt outstanding
    Idle,
    /// The utterance answered the prompt
    Answered {
        key: String,
        answer: PromptAnswer,
        handler: H,
    },
    /// A prompt is outstanding but the utterance did not fit its shape
    Unresolved { key: String },
}

/// All prompts known to the bot, keyed by prompt key
#[derive(Debug, Clone)]
pub struct PromptRegistry<H> {
    prompts: HashMap<String, PromptDescriptor<H>>,
}

impl<H> Default for PromptRegistry<H> {
    fn default() -> Self {
        Self {
            prompts: HashMap::new(),
        }
    }
}

impl<H: Clone> PromptRegistry<H> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, descriptor: PromptDescriptor<H>) -> Result<(), PromptError> {
        if self.prompts.contains_key(&descriptor.key) {
            return Err(PromptError::Duplicate(descriptor.key));
        }
        self.prompts.insert(descriptor.key.clone(), descriptor);
        Ok(())
    }

    pub fn text(
        &mut self,
        key: impl Into<String>,
        question: impl Into<String>,
        handler: H,
    ) -> Result<(), PromptError> {
        self.register(PromptDescriptor {
            key: key.into(),
            question: question.into(),
            shape: AnswerShape::Text,
            handler,
        })
    }

    pub fn choice<S: Into<String>>(
        &mut self,
        key: impl Into<String>,
        question: impl Into<String>,
        options: impl IntoIterator<Item = S>,
        handler: H,
    ) -> Result<(), PromptError> {
        self.register(PromptDescriptor {
            key: key.into(),
            question: question.into(),
            shape: AnswerShape::Choice(options.into_iter().map(Into::into).collect()),
            handler,
        })
    }

    pub fn confirm(
        &mut self,
        key: impl Into<String>,
        question: impl Into<String>,
        handler: H,
    ) -> Result<(), PromptError> {
        self.register(PromptDescriptor {
            key: key.into(),
            question: question.into(),
            shape: AnswerShape::Confirm,
            handler,
        })
    }

    pub fn get(&self, key: &str) -> Option<&PromptDescriptor<H>> {
        self.prompts.get(key)
    }

    fn descriptor(&self, key: &str) -> Result<&PromptDescriptor<H>, PromptError> {
        self.get(key)
            .ok_or_else(|| PromptError::Unregistered(key.to_string()))
    }

    /// `Idle` to `AwaitingAnswer`: open the prompt and send its question
    pub fn ask(
        &self,
        key: &str,
        store: &mut ConversationStore,
        replies: &mut Replies,
    ) -> Result<(), PromptError> {
        let descriptor = self.descriptor(key)?;
        store.dispatch(Action::open_prompt(key))?;
        write_question(descriptor, replies);
        tracing::debug!(prompt = %key, "Prompt opened");
        Ok(())
    }

    /// Send the outstanding prompt's question again
    pub fn reprompt(&self, key: &str, replies: &mut Replies) -> Result<(), PromptError> {
        write_question(self.descriptor(key)?, replies);
        Ok(())
    }

    /// Read an utterance against the current prompt state. Does not mutate
    /// anything; the caller closes the prompt on `Answered`.
    pub fn resolve(
        &self,
        utterance: &str,
        state: &ConversationState,
    ) -> Result<Resolution<H>, PromptError> {
        let PromptStatus::AwaitingAnswer(key) = state.prompt_status() else {
            return Ok(Resolution::Idle);
        };
        let descriptor = self.descriptor(key)?;
        Ok(match coerce(&descriptor.shape, utterance) {
            Some(answer) => Resolution::Answered {
                key: key.to_string(),
                answer,
                handler: descriptor.handler.clone(),
            },
            None => Resolution::Unresolved {
                key: key.to_string(),
            },
        })
    }
}

fn write_question<H>(descriptor: &PromptDescriptor<H>, replies: &mut Replies) {
    replies.push(descriptor.question.clone());
    match &descriptor.shape {
        AnswerShape::Text => {}
        AnswerShape::Choice(options) => replies.push(options.join(" | ")),
        AnswerShape::Confirm => replies.push("Yes | No"),
    }
}

/// Coerce an utterance into the expected answer shape
pub fn coerce(shape: &AnswerShape, utterance: &str) -> Option<PromptAnswer> {
    let utterance = utterance.trim();
    match shape {
        AnswerShape::Text => Some(PromptAnswer::Text(utterance.to_string())),
        AnswerShape::Choice(options) => {
            let wanted = utterance.to_lowercase();
            options
                .iter()
                .find(|option| option.to_lowercase() == wanted)
                .map(|option| PromptAnswer::Choice(option.clone()))
        }
        AnswerShape::Confirm => confirm_value(utterance).map(PromptAnswer::Confirm),
    }
}

fn confirm_value(utterance: &str) -> Option<bool> {
    let normalized = utterance
        .trim_end_matches(['.', '!', '?', ','])
        .trim()
        .to_lowercase();
    if AFFIRMATIVE.contains(&normalized.as_str()) {
        Some(true)
    } else if NEGATIVE.contains(&normalized.as_str()) {
        Some(false)
    } else {
        None
    }
}
