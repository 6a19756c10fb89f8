//! Proptest generators for domain property tests.

use proptest::prelude::*;

use crate::domain::orders::{Side, SideFilter, SuitFilter};
use crate::domain::suits::Suit;

pub fn suit() -> impl Strategy<Value = Suit> {
    prop::sample::select(Suit::ALL.to_vec())
}

pub fn side() -> impl Strategy<Value = Side> {
    prop_oneof![Just(Side::Buy), Just(Side::Sell)]
}

pub fn side_filter() -> impl Strategy<Value = SideFilter> {
    prop_oneof![
        Just(SideFilter::Both),
        Just(SideFilter::One(Side::Buy)),
        Just(SideFilter::One(Side::Sell)),
    ]
}

pub fn suit_filter() -> impl Strategy<Value = SuitFilter> {
    prop_oneof![
        Just(SuitFilter::All),
        suit().prop_map(SuitFilter::One),
    ]
}

/// One step of a random trading session.
#[derive(Debug, Clone)]
pub enum Op {
    Place {
        player: usize,
        side: Side,
        suit: Suit,
        price: i64,
    },
    Cancel {
        player: usize,
        sides: SideFilter,
        suits: SuitFilter,
        price: i64,
    },
    Advance {
        ms: u64,
    },
}

pub fn op(num_players: usize) -> impl Strategy<Value = Op> {
    let place = (
        0..num_players,
        side(),
        suit(),
        // Small prices collide often, which is where matching gets exercised.
        1..30i64,
    )
        .prop_map(|(player, side, suit, price)| Op::Place {
            player,
            side,
            suit,
            price,
        });
    let cancel = (
        0..num_players,
        side_filter(),
        suit_filter(),
        prop_oneof![Just(-1i64), 0..30i64],
    )
        .prop_map(|(player, sides, suits, price)| Op::Cancel {
            player,
            sides,
            suits,
            price,
        });
    let advance = (0..5_000u64).prop_map(|ms| Op::Advance { ms });

    prop_oneof![4 => place, 2 => cancel, 1 => advance]
}

pub fn ops(num_players: usize, max_len: usize) -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec(op(num_players), 1..max_len)
}
