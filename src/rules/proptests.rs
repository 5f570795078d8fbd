//! Property-based tests for rule composition

use super::*;
use proptest::prelude::*;

const UTTERANCE: &str = "let's go";

/// A leaf that matches `UTTERANCE` when `hits` is true
fn leaf(index: usize, hits: bool) -> Rule<usize> {
    let pattern = if hits { r"\bgo\b" } else { r"\bnever-matches\b" };
    regex(&[pattern], index).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    // The first matching rule wins regardless of what later rules would do
    #[test]
    fn prop_first_match_picks_earliest_hit(
        hits in proptest::collection::vec(any::<bool>(), 0..12)
    ) {
        let tree = first_match(hits.iter().enumerate().map(|(i, &h)| leaf(i, h)));
        let state = ConversationState::default();
        let outcome = tree.attempt(&Turn::new(UTTERANCE, &state)).map(|o| o.handler);
        prop_assert_eq!(outcome, hits.iter().position(|&h| h));
    }

    // Wrapping in a passing filter or a singleton first_match changes nothing
    #[test]
    fn prop_transparent_wrappers(hits in proptest::collection::vec(any::<bool>(), 0..8)) {
        let state = ConversationState::default();
        let turn = Turn::new(UTTERANCE, &state);
        let bare = first_match(hits.iter().enumerate().map(|(i, &h)| leaf(i, h)));
        let wrapped = filter("always", |_| true, first_match([bare.clone()]));
        prop_assert_eq!(
            bare.attempt(&turn).map(|o| o.handler),
            wrapped.attempt(&turn).map(|o| o.handler)
        );
    }

    // A failing filter hides every handler underneath it
    #[test]
    fn prop_closed_filter_never_matches(hits in proptest::collection::vec(any::<bool>(), 0..8)) {
        let state = ConversationState::default();
        let tree = filter(
            "never",
            |_| false,
            first_match(hits.iter().enumerate().map(|(i, &h)| leaf(i, h))),
        );
        prop_assert!(tree.attempt(&Turn::new(UTTERANCE, &state)).is_none());
    }

    // best_match returns the highest score; ties resolve to the earliest candidate
    #[test]
    fn prop_best_match_is_max_with_stable_ties(
        scores in proptest::collection::vec(0u8..=10, 1..8)
    ) {
        let candidates: Vec<_> = (0..scores.len())
            .map(|i| intent(format!("intent{i}"), i))
            .collect();
        let intents: Vec<IntentScore> = scores
            .iter()
            .enumerate()
            .map(|(i, &s)| IntentScore::new(format!("intent{i}"), f64::from(s) / 10.0))
            .collect();
        let state = ConversationState::default();
        let outcome = best_match(candidates)
            .attempt(&Turn::new("x", &state).with_intents(&intents))
            .map(|o| o.handler);

        let max = scores.iter().copied().max().unwrap_or(0);
        let expected = if max >= 5 {
            scores.iter().position(|&s| s == max)
        } else {
            None
        };
        prop_assert_eq!(outcome, expected);
    }
}
