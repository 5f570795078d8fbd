//! Best-of-N intent selection over classifier output

use super::{Match, MatchDetail};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Confidence an intent must reach to count as recognised
pub const DEFAULT_THRESHOLD: f64 = 0.5;

/// One intent reported by the classifier for an utterance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentScore {
    pub intent: String,
    pub score: f64,
    #[serde(default)]
    pub entities: HashMap<String, String>,
}

impl IntentScore {
    pub fn new(intent: impl Into<String>, score: f64) -> Self {
        Self {
            intent: intent.into(),
            score,
            entities: HashMap::new(),
        }
    }

    pub fn with_entity(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.entities.insert(name.into(), value.into());
        self
    }
}

/// Selects intents whose confidence clears a threshold
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassifierMatcher {
    threshold: f64,
}

impl Default for ClassifierMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

impl ClassifierMatcher {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    fn clears(&self, score: f64) -> bool {
        score >= self.threshold
    }

    /// Match a specific intent label if the classifier reported it with
    /// enough confidence
    pub fn attempt(&self, utterance: &str, intent: &str, intents: &[IntentScore]) -> Option<Match> {
        most_confident(
            intents
                .iter()
                .filter(|i| i.intent == intent && self.clears(i.score))
                .map(|i| (i.score, i)),
        )
        .map(|scored| to_match(utterance, scored))
    }
}

/// Highest-scoring item; the earlier item wins a tie
pub fn most_confident<T>(scored: impl IntoIterator<Item = (f64, T)>) -> Option<T> {
    scored
        .into_iter()
        .fold(None, |best: Option<(f64, T)>, (score, item)| match best {
            Some((top, _)) if top >= score => best,
            _ => Some((score, item)),
        })
        .map(|(_, item)| item)
}

fn to_match(utterance: &str, scored: &IntentScore) -> Match {
    Match {
        text: utterance.to_string(),
        detail: MatchDetail::Intent {
            name: scored.intent.clone(),
            score: scored.score,
            entities: scored.entities.clone(),
        },
    }
}
