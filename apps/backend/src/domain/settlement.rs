//! Settlement: a pure function of final hands, pot, and goal suit.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::orders::PlayerId;
use crate::domain::rules::BONUS_PER_CARD;
use crate::domain::suits::{CardCounts, Suit};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundResults {
    pub goal_suit: Suit,
    /// Goal-suit cards held per player at the bell.
    pub counts: BTreeMap<PlayerId, u32>,
    /// `BONUS_PER_CARD` dollars per goal-suit card, paid from the pot.
    pub bonuses: BTreeMap<PlayerId, i64>,
    /// Holders of the maximum goal count, in join order. Empty when nobody
    /// holds the goal suit.
    pub winners: Vec<PlayerId>,
    /// Each winner's equal split of the post-bonus pot.
    pub share_each: i64,
    /// Pot remainder left unclaimed: the integer-division leftover, or the
    /// whole post-bonus pot when there are no winners.
    pub residue: i64,
}

/// Compute the payout without touching any state. `join_order` fixes the
/// reporting order of `winners`.
pub fn settle(
    hands: &BTreeMap<PlayerId, CardCounts>,
    join_order: &[PlayerId],
    pot: i64,
    goal_suit: Suit,
) -> RoundResults {
    let counts: BTreeMap<PlayerId, u32> = hands
        .iter()
        .map(|(id, hand)| (id.clone(), hand.get(goal_suit)))
        .collect();

    let bonuses: BTreeMap<PlayerId, i64> = counts
        .iter()
        .map(|(id, &count)| (id.clone(), BONUS_PER_CARD * count as i64))
        .collect();
    let total_bonus: i64 = bonuses.values().sum();
    let remainder = pot - total_bonus;

    let max_count = counts.values().copied().max().unwrap_or(0);
    let winners: Vec<PlayerId> = if max_count > 0 {
        join_order
            .iter()
            .filter(|id| counts.get(*id).copied() == Some(max_count))
            .cloned()
            .collect()
    } else {
        Vec::new()
    };

    let share_each = if winners.is_empty() {
        0
    } else {
        remainder / winners.len() as i64
    };
    let residue = remainder - share_each * winners.len() as i64;

    RoundResults {
        goal_suit,
        counts,
        bonuses,
        winners,
        share_each,
        residue,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::rules::POT_TOTAL;

    fn player(tag: &str) -> PlayerId {
        PlayerId(tag.to_string())
    }

    fn hands_with_goal(counts: &[(&str, u32)], goal: Suit) -> BTreeMap<PlayerId, CardCounts> {
        counts
            .iter()
            .map(|(tag, count)| {
                let mut hand = CardCounts::new();
                hand.add(goal, *count);
                (player(tag), hand)
            })
            .collect()
    }

    fn join_order(tags: &[&str]) -> Vec<PlayerId> {
        tags.iter().map(|t| player(t)).collect()
    }

    #[test]
    fn single_max_holder_takes_the_remainder() {
        // Spec scenario: counts A:4 B:3 C:2 D:1, pot 200.
        let hands = hands_with_goal(&[("a", 4), ("b", 3), ("c", 2), ("d", 1)], Suit::Hearts);
        let order = join_order(&["a", "b", "c", "d"]);
        let results = settle(&hands, &order, POT_TOTAL, Suit::Hearts);

        assert_eq!(results.bonuses[&player("a")], 40);
        assert_eq!(results.bonuses[&player("d")], 10);
        assert_eq!(results.winners, vec![player("a")]);
        assert_eq!(results.share_each, 100);
        assert_eq!(results.residue, 0);
    }

    #[test]
    fn ties_share_with_integer_division_residue() {
        // Bonuses total 90; 110 remain for three tied winners.
        let hands = hands_with_goal(&[("a", 3), ("b", 3), ("c", 3), ("d", 0)], Suit::Spades);
        let order = join_order(&["a", "b", "c", "d"]);
        let results = settle(&hands, &order, POT_TOTAL, Suit::Spades);

        assert_eq!(results.winners.len(), 3);
        assert_eq!(results.share_each, 36);
        assert_eq!(results.residue, 110 - 3 * 36);
    }

    #[test]
    fn no_goal_holders_means_no_winners() {
        let hands = hands_with_goal(&[("a", 0), ("b", 0), ("c", 0), ("d", 0)], Suit::Clubs);
        let order = join_order(&["a", "b", "c", "d"]);
        let results = settle(&hands, &order, POT_TOTAL, Suit::Clubs);

        assert!(results.winners.is_empty());
        assert_eq!(results.share_each, 0);
        assert_eq!(results.residue, POT_TOTAL);
    }

    #[test]
    fn winners_are_reported_in_join_order() {
        let hands = hands_with_goal(&[("z", 2), ("a", 2), ("m", 1), ("d", 0)], Suit::Hearts);
        let order = join_order(&["z", "a", "m", "d"]);
        let results = settle(&hands, &order, POT_TOTAL, Suit::Hearts);
        assert_eq!(results.winners, vec![player("z"), player("a")]);
    }

    #[test]
    fn settlement_is_pure() {
        let hands = hands_with_goal(&[("a", 2), ("b", 1)], Suit::Diamonds);
        let order = join_order(&["a", "b"]);
        let first = settle(&hands, &order, 100, Suit::Diamonds);
        let second = settle(&hands, &order, 100, Suit::Diamonds);
        assert_eq!(first, second);
    }
}
