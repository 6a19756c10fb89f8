//! Suit identity, color, and the companion relation.

use std::fmt;
use std::str::FromStr;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::{DomainError, ErrorCode};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Suit {
    Spades,
    Clubs,
    Hearts,
    Diamonds,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Color {
    Black,
    Red,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Spades, Suit::Clubs, Suit::Hearts, Suit::Diamonds];

    pub fn color(self) -> Color {
        match self {
            Suit::Spades | Suit::Clubs => Color::Black,
            Suit::Hearts | Suit::Diamonds => Color::Red,
        }
    }

    /// The same-color other suit: spades↔clubs, hearts↔diamonds.
    pub fn companion(self) -> Suit {
        match self {
            Suit::Spades => Suit::Clubs,
            Suit::Clubs => Suit::Spades,
            Suit::Hearts => Suit::Diamonds,
            Suit::Diamonds => Suit::Hearts,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Suit::Spades => 0,
            Suit::Clubs => 1,
            Suit::Hearts => 2,
            Suit::Diamonds => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Suit::Spades => "spades",
            Suit::Clubs => "clubs",
            Suit::Hearts => "hearts",
            Suit::Diamonds => "diamonds",
        }
    }
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Suit {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "spades" => Ok(Suit::Spades),
            "clubs" => Ok(Suit::Clubs),
            "hearts" => Ok(Suit::Hearts),
            "diamonds" => Ok(Suit::Diamonds),
            _ => Err(DomainError::schema(ErrorCode::InvalidSuit, "Invalid suit")),
        }
    }
}

/// Per-suit non-negative counts: a hand, or the deck composition.
///
/// Serializes as a map keyed by suit name so it lands on the wire as
/// `{"spades": 3, "clubs": 0, ...}`.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct CardCounts([u32; 4]);

impl CardCounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, suit: Suit) -> u32 {
        self.0[suit.index()]
    }

    pub fn set(&mut self, suit: Suit, count: u32) {
        self.0[suit.index()] = count;
    }

    pub fn add(&mut self, suit: Suit, count: u32) {
        self.0[suit.index()] += count;
    }

    /// Removes one card; fails if none held.
    pub fn remove_one(&mut self, suit: Suit) -> Result<(), DomainError> {
        let slot = &mut self.0[suit.index()];
        if *slot == 0 {
            return Err(DomainError::invariant(format!(
                "removing a {suit} card from an empty hand"
            )));
        }
        *slot -= 1;
        Ok(())
    }

    pub fn total(&self) -> u32 {
        self.0.iter().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Suit, u32)> + '_ {
        Suit::ALL.iter().map(move |&s| (s, self.get(s)))
    }
}

impl Serialize for CardCounts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(4))?;
        for (suit, count) in self.iter() {
            map.serialize_entry(suit.as_str(), &count)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for CardCounts {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct CountsVisitor;

        impl<'de> Visitor<'de> for CountsVisitor {
            type Value = CardCounts;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of suit names to counts")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut counts = CardCounts::new();
                while let Some((suit, count)) = access.next_entry::<Suit, u32>()? {
                    counts.set(suit, count);
                }
                Ok(counts)
            }
        }

        deserializer.deserialize_map(CountsVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn companion_is_an_involution_and_preserves_color() {
        for suit in Suit::ALL {
            assert_eq!(suit.companion().companion(), suit);
            assert_eq!(suit.companion().color(), suit.color());
            assert_ne!(suit.companion(), suit);
        }
    }

    #[test]
    fn parses_wire_names() {
        assert_eq!("hearts".parse::<Suit>().unwrap(), Suit::Hearts);
        let err = "stars".parse::<Suit>().unwrap_err();
        assert_eq!(err.message(), "Invalid suit");
    }

    #[test]
    fn card_counts_serialize_as_a_suit_map() {
        let mut counts = CardCounts::new();
        counts.add(Suit::Spades, 2);
        counts.add(Suit::Diamonds, 1);
        let json = serde_json::to_value(counts).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"spades": 2, "clubs": 0, "hearts": 0, "diamonds": 1})
        );
        let back: CardCounts = serde_json::from_value(json).unwrap();
        assert_eq!(back, counts);
    }

    #[test]
    fn remove_one_underflow_is_an_invariant_error() {
        let mut counts = CardCounts::new();
        assert!(counts.remove_one(Suit::Clubs).is_err());
        counts.add(Suit::Clubs, 1);
        assert!(counts.remove_one(Suit::Clubs).is_ok());
        assert_eq!(counts.get(Suit::Clubs), 0);
    }
}
