//! Rule combinators
//!
//! A rule tries to recognise a turn and, if it does, yields an [`Outcome`]
//! naming the handler to run. Rules nest arbitrarily: `first_match`,
//! `filter` and `best_match` all build rules out of rules, so the whole
//! dialog is one inspectable tree evaluated once per turn.
//!
//! Evaluation is side-effect free. Handlers run afterwards, outside the
//! tree, so a rule that is skipped can never have touched state.

#[cfg(test)]
mod proptests;

use crate::matchers::{most_confident, ClassifierMatcher, IntentScore, Match, PatternMatcher};
use crate::state_machine::ConversationState;

/// Everything a rule may look at while matching
#[derive(Debug, Clone, Copy)]
pub struct Turn<'a> {
    pub utterance: &'a str,
    pub state: &'a ConversationState,
    /// Classifier output for this utterance; empty when none was requested
    /// or the classifier had nothing confident to say
    pub intents: &'a [IntentScore],
}

impl<'a> Turn<'a> {
    pub fn new(utterance: &'a str, state: &'a ConversationState) -> Self {
        Self {
            utterance,
            state,
            intents: &[],
        }
    }

    pub fn with_intents(mut self, intents: &'a [IntentScore]) -> Self {
        self.intents = intents;
        self
    }
}

/// The winning handler and what it matched
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome<H> {
    pub handler: H,
    pub matched: Match,
}

/// State query gating a sub-rule
pub type Predicate = fn(&ConversationState) -> bool;

/// Pattern-backed leaf
#[derive(Debug, Clone)]
pub struct RegexRule<H> {
    pub matcher: PatternMatcher,
    pub handler: H,
}

/// Classifier-backed leaf
#[derive(Debug, Clone)]
pub struct ClassifierRule<H> {
    pub intent: String,
    pub matcher: ClassifierMatcher,
    pub handler: H,
}

impl<H> ClassifierRule<H> {
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.matcher = ClassifierMatcher::new(threshold);
        self
    }
}

/// Predicate-guarded sub-rule
#[derive(Debug, Clone)]
pub struct Filter<H> {
    pub name: &'static str,
    pub predicate: Predicate,
    pub rule: Box<Rule<H>>,
}

/// A node of the decision tree
#[derive(Debug, Clone)]
pub enum Rule<H> {
    Regex(RegexRule<H>),
    Classifier(ClassifierRule<H>),
    /// Children in priority order; the first that matches wins
    FirstMatch(Vec<Rule<H>>),
    Filter(Filter<H>),
    /// All candidates are scored; the most confident wins
    BestMatch(Vec<ClassifierRule<H>>),
}

impl<H: Clone> Rule<H> {
    /// Try to recognise the turn
    pub fn attempt(&self, turn: &Turn<'_>) -> Option<Outcome<H>> {
        match self {
            Rule::Regex(rule) => rule.matcher.attempt(turn.utterance).map(|matched| Outcome {
                handler: rule.handler.clone(),
                matched,
            }),

            Rule::Classifier(rule) => rule
                .matcher
                .attempt(turn.utterance, &rule.intent, turn.intents)
                .map(|matched| Outcome {
                    handler: rule.handler.clone(),
                    matched,
                }),

            Rule::FirstMatch(rules) => rules.iter().find_map(|rule| rule.attempt(turn)),

            Rule::Filter(filter) => {
                if (filter.predicate)(turn.state) {
                    filter.rule.attempt(turn)
                } else {
                    tracing::trace!(filter = filter.name, "Filter closed");
                    None
                }
            }

            Rule::BestMatch(candidates) => most_confident(candidates.iter().filter_map(|c| {
                let matched = c.matcher.attempt(turn.utterance, &c.intent, turn.intents)?;
                let score = matched.score().unwrap_or_default();
                Some((
                    score,
                    Outcome {
                        handler: c.handler.clone(),
                        matched,
                    },
                ))
            })),
        }
    }
}

impl<H> Rule<H> {
    /// Whether evaluating this tree can consult classifier output
    pub fn needs_classification(&self) -> bool {
        match self {
            Rule::Regex(_) => false,
            Rule::Classifier(_) | Rule::BestMatch(_) => true,
            Rule::FirstMatch(rules) => rules.iter().any(Rule::needs_classification),
            Rule::Filter(filter) => filter.rule.needs_classification(),
        }
    }

    /// Every handler in the tree in priority order
    pub fn handlers(&self) -> Vec<&H> {
        match self {
            Rule::Regex(rule) => vec![&rule.handler],
            Rule::Classifier(rule) => vec![&rule.handler],
            Rule::FirstMatch(rules) => rules.iter().flat_map(Rule::handlers).collect(),
            Rule::Filter(filter) => filter.rule.handlers(),
            Rule::BestMatch(candidates) => candidates.iter().map(|c| &c.handler).collect(),
        }
    }
}

// ============================================================================
// Constructors
// ============================================================================

/// Leaf matching any of `patterns`, tried in order
pub fn regex<H>(patterns: &[&str], handler: H) -> Result<Rule<H>, regex::Error> {
    Ok(Rule::Regex(RegexRule {
        matcher: PatternMatcher::new(patterns)?,
        handler,
    }))
}

/// Leaf matching a classifier intent at the default threshold
pub fn intent<H>(name: impl Into<String>, handler: H) -> ClassifierRule<H> {
    ClassifierRule {
        intent: name.into(),
        matcher: ClassifierMatcher::default(),
        handler,
    }
}

pub fn first_match<H>(rules: impl IntoIterator<Item = Rule<H>>) -> Rule<H> {
    Rule::FirstMatch(rules.into_iter().collect())
}

pub fn filter<H>(name: &'static str, predicate: Predicate, rule: Rule<H>) -> Rule<H> {
    Rule::Filter(Filter {
        name,
        predicate,
        rule: Box::new(rule),
    })
}

pub fn best_match<H>(candidates: impl IntoIterator<Item = ClassifierRule<H>>) -> Rule<H> {
    Rule::BestMatch(candidates.into_iter().collect())
}

impl<H> From<ClassifierRule<H>> for Rule<H> {
    fn from(rule: ClassifierRule<H>) -> Self {
        Rule::Classifier(rule)
    }
}
