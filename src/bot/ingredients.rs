//! Ingredient lookup by longest common substring
//!
//! Each ingredient line is scored by the length of the longest contiguous
//! run of characters it shares with the query. Contiguity matters: this is
//! substring, not subsequence, similarity. Both sides are lowercased before
//! scoring, so "Milk" and "milk" score the same.

use std::str::FromStr;

/// How to choose between ingredients with the same score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TieBreak {
    /// Earliest in recipe order
    #[default]
    First,
    /// Shortest line, then earliest
    Shortest,
}

impl FromStr for TieBreak {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "first" => Ok(TieBreak::First),
            "shortest" => Ok(TieBreak::Shortest),
            other => Err(format!("unknown tie break: {other}")),
        }
    }
}

/// Length of the longest common contiguous run of `a` and `b`
pub fn longest_common_substring(a: &[char], b: &[char]) -> usize {
    let mut best = 0;
    let mut previous = vec![0usize; b.len() + 1];
    let mut current = vec![0usize; b.len() + 1];
    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            current[j + 1] = if ca == cb { previous[j] + 1 } else { 0 };
            best = best.max(current[j + 1]);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    best
}

fn chars(text: &str) -> Vec<char> {
    text.to_lowercase().chars().collect()
}

/// Pick the ingredient line closest to `query`.
///
/// Returns `None` for an empty list or when the best score is below
/// `min_score`.
pub fn find_ingredient<'a>(
    ingredients: &'a [String],
    query: &str,
    tie_break: TieBreak,
    min_score: usize,
) -> Option<&'a str> {
    let query = chars(query);
    let mut best: Option<(&'a str, usize)> = None;

    for ingredient in ingredients {
        let score = longest_common_substring(&chars(ingredient), &query);
        let better = match best {
            None => true,
            Some((current, current_score)) => {
                score > current_score
                    || (score == current_score
                        && tie_break == TieBreak::Shortest
                        && ingredient.chars().count() < current.chars().count())
            }
        };
        if better {
            best = Some((ingredient, score));
        }
    }

    let (ingredient, score) = best?;
    tracing::debug!(ingredient, score, "Closest ingredient");
    (score >= min_score).then_some(ingredient)
}
