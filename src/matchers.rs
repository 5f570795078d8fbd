//! Intent matchers
//!
//! Both kinds of matcher turn an utterance into a [`Match`] or nothing:
//! pattern matchers try ordered regular expressions, classifier matchers
//! pick the best intent reported by the NLU collaborator.

mod classifier;
mod pattern;

pub use classifier::{most_confident, ClassifierMatcher, IntentScore, DEFAULT_THRESHOLD};
pub use pattern::PatternMatcher;

use std::collections::HashMap;

/// What a matcher recognised in one utterance. Lives for one turn.
#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    /// The matched text (the whole regex match, or the utterance for intents)
    pub text: String,
    pub detail: MatchDetail,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MatchDetail {
    /// Positional capture groups; index 0 is the whole match
    Groups(Vec<Option<String>>),
    /// A classifier intent with its confidence and named entities
    Intent {
        name: String,
        score: f64,
        entities: HashMap<String, String>,
    },
}

impl Match {
    /// Capture group by position
    pub fn group(&self, index: usize) -> Option<&str> {
        match &self.detail {
            MatchDetail::Groups(groups) => groups.get(index).and_then(Option::as_deref),
            MatchDetail::Intent { .. } => None,
        }
    }

    /// Entity value by name
    pub fn entity(&self, name: &str) -> Option<&str> {
        match &self.detail {
            MatchDetail::Intent { entities, .. } => entities.get(name).map(String::as_str),
            MatchDetail::Groups(_) => None,
        }
    }

    /// Classifier confidence, if this came from a classifier
    pub fn score(&self) -> Option<f64> {
        match &self.detail {
            MatchDetail::Intent { score, .. } => Some(*score),
            MatchDetail::Groups(_) => None,
        }
    }

    pub fn intent(&self) -> Option<&str> {
        match &self.detail {
            MatchDetail::Intent { name, .. } => Some(name),
            MatchDetail::Groups(_) => None,
        }
    }
}
