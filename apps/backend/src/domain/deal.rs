//! Deterministic deal logic: suit counts, goal suit, and shuffled hands.
//!
//! The deal is a pure function of `(num_players, seed)`. Entropy enters once
//! at the engine boundary; everything below is reproducible, which is what
//! makes the property tests and the deal fingerprint meaningful.

use crate::domain::rules::DECK_SIZE;
use crate::domain::suits::{CardCounts, Suit};

/// A fully determined deal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deal {
    /// Deck composition: one suit with 12 cards, two with 10, one with 8.
    pub suit_counts: CardCounts,
    /// Companion of the 8-card suit, i.e. the 12-card suit.
    pub goal_suit: Suit,
    /// One hand per player, in join order.
    pub hands: Vec<CardCounts>,
}

/// SplitMix64: well-distributed 64-bit generator, fast and deterministic
/// given a seed.
struct SplitMix64 {
    state: u64,
}

impl SplitMix64 {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E3779B97F4A7C15);
        let mut z = self.state;
        z ^= z >> 30;
        z = z.wrapping_mul(0xBF58476D1CE4E5B9);
        z ^= z >> 27;
        z = z.wrapping_mul(0x94D049BB133111EB);
        z ^ (z >> 31)
    }

    fn next_range(&mut self, max: usize) -> usize {
        let m = max as u64;
        // Rejection sampling to avoid modulo bias.
        let limit = u64::MAX - (u64::MAX % m);
        loop {
            let x = self.next();
            if x < limit {
                return (x % m) as usize;
            }
        }
    }
}

fn shuffle(deck: &mut [Suit], rng: &mut SplitMix64) {
    for i in (1..deck.len()).rev() {
        let j = rng.next_range(i + 1);
        deck.swap(i, j);
    }
}

/// Produce a deal for `num_players` (4 or 5) from `seed`.
///
/// The 12-card suit is chosen uniformly; its companion gets 8 cards and the
/// two suits of the other color get 10 each. The goal suit is the 12-card
/// suit — the companion of the rare suit — so agents can only infer it by
/// watching the flow of cards.
pub fn deal(num_players: usize, seed: u64) -> Deal {
    debug_assert!(num_players == 4 || num_players == 5);
    let mut rng = SplitMix64::new(seed);

    let twelve = Suit::ALL[rng.next_range(Suit::ALL.len())];
    let eight = twelve.companion();

    let mut suit_counts = CardCounts::new();
    suit_counts.set(twelve, 12);
    suit_counts.set(eight, 8);
    for suit in Suit::ALL {
        if suit != twelve && suit != eight {
            suit_counts.set(suit, 10);
        }
    }

    let mut deck: Vec<Suit> = Vec::with_capacity(DECK_SIZE);
    for (suit, count) in suit_counts.iter() {
        deck.extend(std::iter::repeat(suit).take(count as usize));
    }
    shuffle(&mut deck, &mut rng);

    let mut hands = vec![CardCounts::new(); num_players];
    for (i, suit) in deck.into_iter().enumerate() {
        hands[i % num_players].add(suit, 1);
    }

    Deal {
        suit_counts,
        goal_suit: twelve,
        hands,
    }
}

/// Blake3 fingerprint over a canonical encoding of the deal. Carried by the
/// `round_started` event so an external log can verify which deal a round
/// played without the engine re-exposing hidden hands mid-round.
pub fn deal_fingerprint(deal: &Deal) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(b"figgie/deal/v1");
    hasher.update(&[deal.goal_suit.index() as u8]);
    for (_, count) in deal.suit_counts.iter() {
        hasher.update(&[count as u8]);
    }
    for hand in &deal.hands {
        for (_, count) in hand.iter() {
            hasher.update(&[count as u8]);
        }
    }
    hasher.finalize().to_hex().to_string()
}
