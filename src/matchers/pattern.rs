//! Ordered regular-expression alternatives

use super::{Match, MatchDetail};
use regex::{Regex, RegexBuilder};

/// Tries each alternative in order; the first that matches wins.
///
/// Groups come from the winning alternative only and are never merged
/// across alternatives. Matching is case-insensitive.
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    alternatives: Vec<Regex>,
}

impl PatternMatcher {
    pub fn new(patterns: &[&str]) -> Result<Self, regex::Error> {
        let alternatives = patterns
            .iter()
            .map(|pattern| RegexBuilder::new(pattern).case_insensitive(true).build())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { alternatives })
    }

    pub fn attempt(&self, utterance: &str) -> Option<Match> {
        let utterance = utterance.trim();
        self.alternatives.iter().find_map(|regex| {
            let captures = regex.captures(utterance)?;
            let groups = captures
                .iter()
                .map(|group| group.map(|m| m.as_str().to_string()))
                .collect();
            Some(Match {
                text: captures
                    .get(0)
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_default(),
                detail: MatchDetail::Groups(groups),
            })
        })
    }
}
