//! The recipe bot: one turn in, replies and state changes out
//!
//! A turn reads the utterance against the outstanding prompt first, then
//! against the rule tree. Whatever wins runs its handler against a working
//! copy of the conversation store; the copy is committed only when the
//! whole turn succeeds.

mod handlers;
pub mod ingredients;
pub mod intents;
pub mod questions;

pub use ingredients::TieBreak;
pub use intents::BotHandler;
pub use questions::Question;

use crate::catalog::RecipeCatalog;
use crate::matchers::DEFAULT_THRESHOLD;
use crate::nlu::{classify_within, Classifier, NluConfig, NoopClassifier};
use crate::prompts::{PromptError, PromptRegistry, Resolution};
use crate::reply::Replies;
use crate::rules::{Rule, Turn};
use crate::state_machine::{Action, ConversationState, ConversationStore, StoreError};
use serde::Serialize;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// What to do with an utterance that does not answer the outstanding prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnresolvedPrompt {
    /// Ask the question again; no other rule runs
    #[default]
    Reprompt,
    /// Evaluate the rule tree as usual; the prompt stays open
    FallThrough,
}

impl FromStr for UnresolvedPrompt {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "reprompt" => Ok(UnresolvedPrompt::Reprompt),
            "fall_through" | "fallthrough" => Ok(UnresolvedPrompt::FallThrough),
            other => Err(format!("unknown prompt policy: {other}")),
        }
    }
}

/// Knobs for dialog behaviour
#[derive(Debug, Clone)]
pub struct BotSettings {
    /// Minimum classifier confidence for an intent rule
    pub threshold: f64,
    pub classifier_timeout: Duration,
    pub unresolved_prompt: UnresolvedPrompt,
    /// Sent when no rule matches
    pub default_reply: Option<String>,
    pub tie_break: TieBreak,
    /// Ingredient scores below this get an apology instead of a guess
    pub min_ingredient_score: usize,
}

impl Default for BotSettings {
    fn default() -> Self {
        let nlu = NluConfig::default();
        Self {
            threshold: DEFAULT_THRESHOLD,
            classifier_timeout: nlu.timeout,
            unresolved_prompt: UnresolvedPrompt::default(),
            default_reply: None,
            tie_break: TieBreak::default(),
            min_ingredient_score: 0,
        }
    }
}

impl BotSettings {
    /// Read overrides from the environment, falling back to defaults
    pub fn from_env(nlu: &NluConfig) -> Self {
        let defaults = Self::default();
        Self {
            threshold: nlu.threshold,
            classifier_timeout: nlu.timeout,
            unresolved_prompt: parse_env("RECIPE_BOT_PROMPT_POLICY")
                .unwrap_or(defaults.unresolved_prompt),
            default_reply: std::env::var("RECIPE_BOT_DEFAULT_REPLY")
                .ok()
                .filter(|reply| !reply.trim().is_empty()),
            tie_break: parse_env("RECIPE_BOT_TIE_BREAK").unwrap_or(defaults.tie_break),
            min_ingredient_score: parse_env("RECIPE_BOT_MIN_INGREDIENT_SCORE")
                .unwrap_or(defaults.min_ingredient_score),
        }
    }
}

fn parse_env<T: FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(var = name, value = %raw, "Ignoring unparseable setting");
            None
        }
    }
}

/// Failure while building the bot
#[derive(Debug, Error)]
pub enum BotError {
    #[error("Invalid intent pattern: {0}")]
    Pattern(#[from] regex::Error),
    #[error(transparent)]
    Prompt(#[from] PromptError),
}

/// A turn that could not complete. The conversation state is unchanged.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TurnError {
    #[error("State invariant violated: {0}")]
    Invariant(#[from] StoreError),
    #[error(transparent)]
    Prompt(#[from] PromptError),
    #[error("Handler {handler} needs a recipe but none is selected")]
    NoRecipe { handler: &'static str },
}

/// Which path a turn took
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TurnOutcome {
    PromptAnswered { prompt: String },
    Reprompted { prompt: String },
    Rule { handler: &'static str },
    NoMatch,
}

/// Observable result of one turn
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutput {
    pub replies: Replies,
    pub outcome: TurnOutcome,
    /// Actions dispatched during the turn, in order
    pub actions: Vec<Action>,
}

pub struct RecipeBot {
    catalog: Arc<RecipeCatalog>,
    rules: Rule<BotHandler>,
    prompts: PromptRegistry<Question>,
    classifier: Arc<dyn Classifier>,
    settings: BotSettings,
}

impl RecipeBot {
    pub fn new(
        catalog: Arc<RecipeCatalog>,
        classifier: Arc<dyn Classifier>,
        settings: BotSettings,
    ) -> Result<Self, BotError> {
        let rules = intents::build_rules(settings.threshold)?;
        tracing::debug!(
            handlers = ?rules.handlers().iter().map(|h| h.name()).collect::<Vec<_>>(),
            "Rule tree built"
        );
        let mut prompts = PromptRegistry::new();
        questions::register(&mut prompts)?;
        Ok(Self {
            catalog,
            rules,
            prompts,
            classifier,
            settings,
        })
    }

    /// Bot with default settings and no classifier
    pub fn with_catalog(catalog: Arc<RecipeCatalog>) -> Result<Self, BotError> {
        Self::new(catalog, Arc::new(NoopClassifier), BotSettings::default())
    }

    pub fn catalog(&self) -> &RecipeCatalog {
        &self.catalog
    }

    /// Store for a conversation resumed from persisted state.
    ///
    /// A prompt key that is no longer registered is dropped so the
    /// conversation can carry on.
    pub fn restore(&self, mut state: ConversationState) -> ConversationStore {
        if let Some(key) = &state.prompt_key {
            if self.prompts.get(key).is_none() {
                tracing::warn!(prompt = %key, "Dropping unregistered prompt from stored state");
                state.prompt_key = None;
            }
        }
        ConversationStore::new(state)
    }

    /// Run one turn against `store`.
    ///
    /// On success the store holds the new state; on error it is untouched.
    pub async fn run_turn(
        &self,
        store: &mut ConversationStore,
        utterance: &str,
    ) -> Result<TurnOutput, TurnError> {
        let utterance = utterance.trim();
        let mut working = store.clone();
        working.take_journal();
        let mut replies = Replies::new();

        tracing::debug!(
            utterance,
            recipe = ?working.get_state().recipe_name(),
            last_instruction_sent = ?working.get_state().last_instruction_sent,
            prompt_key = ?working.get_state().prompt_key,
            "State before turn"
        );

        let outcome = match self.decide(&mut working, utterance, &mut replies).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(utterance, error = %e, "Turn failed");
                return Err(e);
            }
        };

        let actions = working.take_journal();
        *store = working;

        tracing::debug!(
            recipe = ?store.get_state().recipe_name(),
            last_instruction_sent = ?store.get_state().last_instruction_sent,
            prompt_key = ?store.get_state().prompt_key,
            "State after turn"
        );
        tracing::info!(
            outcome = ?outcome,
            actions = actions.len(),
            replies = replies.len(),
            "Turn completed"
        );

        Ok(TurnOutput {
            replies,
            outcome,
            actions,
        })
    }

    async fn decide(
        &self,
        store: &mut ConversationStore,
        utterance: &str,
        replies: &mut Replies,
    ) -> Result<TurnOutcome, TurnError> {
        match self.prompts.resolve(utterance, store.get_state())? {
            Resolution::Answered {
                key,
                answer,
                handler,
            } => {
                store.dispatch(Action::close_prompt())?;
                questions::answer(handler, &answer, replies);
                return Ok(TurnOutcome::PromptAnswered { prompt: key });
            }
            Resolution::Unresolved { key }
                if self.settings.unresolved_prompt == UnresolvedPrompt::Reprompt =>
            {
                self.prompts.reprompt(&key, replies)?;
                return Ok(TurnOutcome::Reprompted { prompt: key });
            }
            Resolution::Unresolved { .. } | Resolution::Idle => {}
        }

        let intents = if self.rules.needs_classification() && !utterance.is_empty() {
            classify_within(
                self.classifier.as_ref(),
                utterance,
                self.settings.classifier_timeout,
            )
            .await
        } else {
            Vec::new()
        };

        let outcome = self
            .rules
            .attempt(&Turn::new(utterance, store.get_state()).with_intents(&intents));

        let Some(outcome) = outcome else {
            if let Some(reply) = &self.settings.default_reply {
                replies.push(reply.clone());
            }
            return Ok(TurnOutcome::NoMatch);
        };

        tracing::debug!(
            handler = outcome.handler.name(),
            matched = %outcome.matched.text,
            "Rule matched"
        );
        self.execute(outcome.handler, &outcome.matched, store, replies)?;
        Ok(TurnOutcome::Rule {
            handler: outcome.handler.name(),
        })
    }
}
