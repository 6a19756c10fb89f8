//! Per-suit order book: at most one resting order per side.
//!
//! The book never decides admission on its own; `Round::place_order` runs
//! the full pipeline and uses these probes so the phase, funds, and holdings
//! checks stay next to the ledger they consult.

use serde::Serialize;

use crate::domain::orders::{Order, PlayerId, Side};

#[derive(Debug, Clone, Default, Serialize)]
pub struct Book {
    best_bid: Option<Order>,
    best_ask: Option<Order>,
}

/// Outcome of trying to rest an order on its side.
#[derive(Debug)]
pub enum RestOutcome {
    /// Order now rests; carries the displaced order if one was replaced.
    Rested(Option<Order>),
    /// Side occupied and the incoming order does not strictly improve it.
    NotImproving,
}

impl Book {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn best(&self, side: Side) -> Option<&Order> {
        match side {
            Side::Buy => self.best_bid.as_ref(),
            Side::Sell => self.best_ask.as_ref(),
        }
    }

    fn slot(&mut self, side: Side) -> &mut Option<Order> {
        match side {
            Side::Buy => &mut self.best_bid,
            Side::Sell => &mut self.best_ask,
        }
    }

    /// Would an incoming `(side, price)` order from `owner` match the
    /// owner's own resting order on the opposite side?
    pub fn self_cross(&self, owner: &PlayerId, side: Side, price: i64) -> bool {
        match self.best(side.opposite()) {
            Some(resting) if resting.owner == *owner => match side {
                Side::Buy => resting.price <= price,
                Side::Sell => resting.price >= price,
            },
            _ => false,
        }
    }

    /// The opposite-side resting order an incoming `(side, price)` order
    /// would strike, if any.
    pub fn crossing(&self, side: Side, price: i64) -> Option<&Order> {
        self.best(side.opposite()).filter(|resting| match side {
            Side::Buy => resting.price <= price,
            Side::Sell => resting.price >= price,
        })
    }

    /// Consumes and returns the opposite-side resting order struck by an
    /// incoming `(side, price)` order.
    pub fn take_crossing(&mut self, side: Side, price: i64) -> Option<Order> {
        if self.crossing(side, price).is_some() {
            self.slot(side.opposite()).take()
        } else {
            None
        }
    }

    pub fn has_resting(&self, owner: &PlayerId, side: Side) -> bool {
        matches!(self.best(side), Some(order) if order.owner == *owner)
    }

    /// Rests `order` on its side. An occupied side is displaced only by a
    /// strict improvement (higher bid / lower ask).
    pub fn rest(&mut self, order: Order) -> RestOutcome {
        let side = order.side;
        let slot = self.slot(side);
        match slot {
            None => {
                *slot = Some(order);
                RestOutcome::Rested(None)
            }
            Some(current) => {
                let improves = match side {
                    Side::Buy => order.price > current.price,
                    Side::Sell => order.price < current.price,
                };
                if improves {
                    let displaced = slot.replace(order);
                    RestOutcome::Rested(displaced)
                } else {
                    RestOutcome::NotImproving
                }
            }
        }
    }

    pub fn cancel(&mut self, side: Side) -> Option<Order> {
        self.slot(side).take()
    }

    pub fn clear(&mut self) {
        self.best_bid = None;
        self.best_ask = None;
    }

    pub fn orders(&self) -> impl Iterator<Item = &Order> {
        self.best_bid.iter().chain(self.best_ask.iter())
    }

    /// If both sides rest, the bid must sit strictly below the ask; crossed
    /// or equal prices must have matched at admission time.
    pub fn is_well_formed(&self) -> bool {
        match (&self.best_bid, &self.best_ask) {
            (Some(bid), Some(ask)) => bid.price < ask.price,
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::suits::Suit;

    fn order(owner: &str, side: Side, price: i64) -> Order {
        Order::new(PlayerId(owner.to_string()), side, Suit::Spades, price)
    }

    #[test]
    fn resting_on_an_empty_side_displaces_nothing() {
        let mut book = Book::new();
        match book.rest(order("a", Side::Buy, 5)) {
            RestOutcome::Rested(None) => {}
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(book.best(Side::Buy).unwrap().price, 5);
    }

    #[test]
    fn only_strict_improvements_displace() {
        let mut book = Book::new();
        book.rest(order("a", Side::Buy, 5));
        assert!(matches!(
            book.rest(order("b", Side::Buy, 5)),
            RestOutcome::NotImproving
        ));
        match book.rest(order("b", Side::Buy, 6)) {
            RestOutcome::Rested(Some(displaced)) => {
                assert_eq!(displaced.price, 5);
                assert_eq!(displaced.owner.as_str(), "a");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        // Ask side mirrors: lower is better.
        book.rest(order("a", Side::Sell, 9));
        assert!(matches!(
            book.rest(order("b", Side::Sell, 10)),
            RestOutcome::NotImproving
        ));
        assert!(matches!(
            book.rest(order("b", Side::Sell, 8)),
            RestOutcome::Rested(Some(_))
        ));
    }

    #[test]
    fn crossing_probes_respect_the_price_gate() {
        let mut book = Book::new();
        book.rest(order("a", Side::Sell, 7));
        assert!(book.crossing(Side::Buy, 6).is_none());
        assert_eq!(book.crossing(Side::Buy, 7).unwrap().price, 7);
        assert!(book.take_crossing(Side::Buy, 6).is_none());
        let struck = book.take_crossing(Side::Buy, 10).unwrap();
        assert_eq!(struck.price, 7);
        assert!(book.best(Side::Sell).is_none());
    }

    #[test]
    fn self_cross_detects_own_opposite_order() {
        let mut book = Book::new();
        book.rest(order("a", Side::Sell, 8));
        assert!(book.self_cross(&PlayerId("a".into()), Side::Buy, 8));
        assert!(!book.self_cross(&PlayerId("a".into()), Side::Buy, 7));
        assert!(!book.self_cross(&PlayerId("b".into()), Side::Buy, 8));
    }

    #[test]
    fn well_formedness_requires_bid_below_ask() {
        let mut book = Book::new();
        book.rest(order("a", Side::Buy, 4));
        book.rest(order("b", Side::Sell, 9));
        assert!(book.is_well_formed());
        book.clear();
        assert!(book.is_well_formed());
    }
}
