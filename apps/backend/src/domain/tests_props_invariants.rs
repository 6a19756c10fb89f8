//! Property-based tests: the round invariants survive arbitrary action
//! sequences, and the documented round-trip laws hold.

use proptest::prelude::*;

use crate::domain::orders::{PlayerId, SideFilter, SuitFilter};
use crate::domain::round::{Phase, Round, RoundConfig};
use crate::domain::test_gens::{self, Op};

const NUM_PLAYERS: usize = 4;
const DURATION_MS: u64 = 240_000;

fn started_round(seed: u64) -> (Round, Vec<PlayerId>) {
    let mut round = Round::new(RoundConfig {
        num_players: NUM_PLAYERS,
        duration_ms: DURATION_MS,
    });
    let ids = (0..NUM_PLAYERS)
        .map(|i| round.join(&format!("player-{i}"), 0, seed).expect("join"))
        .collect();
    (round, ids)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Card conservation, money conservation, solvency, book wellformedness,
    /// and resting-order feasibility hold after every step of a random
    /// session, accepted or rejected — including across the deadline.
    #[test]
    fn random_sessions_preserve_all_invariants(
        seed in any::<u64>(),
        ops in test_gens::ops(NUM_PLAYERS, 60),
    ) {
        let (mut round, ids) = started_round(seed);
        let mut now: u64 = 0;
        let mut last_reported: Option<u64> = None;

        for op in ops {
            match op {
                Op::Place { player, side, suit, price } => {
                    let _ = round.place_order(&ids[player], side, suit, price);
                }
                Op::Cancel { player, sides, suits, price } => {
                    let _ = round.cancel_orders(&ids[player], sides, suits, price);
                }
                Op::Advance { ms } => {
                    now += ms;
                    round.tick(now);
                }
            }

            prop_assert!(round.verify_invariants().is_ok(),
                "invariants broken after {:?}", round.verify_invariants());

            // Reported time never increases within the trading phase.
            if round.phase() == Phase::Trading {
                let reported = round.time_left(now);
                if let (Some(prev), Some(cur)) = (last_reported, reported) {
                    prop_assert!(cur <= prev, "time_left went up: {prev} -> {cur}");
                }
                last_reported = reported;
            } else {
                prop_assert_eq!(round.time_left(now), None);
            }

            // Event buffer is bounded by what the engine would drain.
            round.drain_events();
        }
    }

    /// Placing an order and immediately canceling it restores the book.
    #[test]
    fn place_then_cancel_round_trips_the_book(
        seed in any::<u64>(),
        player in 0..NUM_PLAYERS,
        side in test_gens::side(),
        suit in test_gens::suit(),
        price in 1..50i64,
    ) {
        let (mut round, ids) = started_round(seed);
        let pid = &ids[player];
        let before = round.snapshot(pid, 0).expect("snapshot").market;

        if round.place_order(pid, side, suit, price).is_ok() {
            let canceled = round
                .cancel_orders(pid, SideFilter::One(side), SuitFilter::One(suit), -1)
                .expect("cancel");
            prop_assert_eq!(canceled.len(), 1);
        }

        let after = round.snapshot(pid, 0).expect("snapshot").market;
        prop_assert_eq!(before, after);
    }

    /// A full bulk cancel leaves the caller with zero resting orders, no
    /// matter what came before.
    #[test]
    fn full_cancel_leaves_no_resting_orders(
        seed in any::<u64>(),
        ops in test_gens::ops(NUM_PLAYERS, 40),
    ) {
        let (mut round, ids) = started_round(seed);
        for op in ops {
            match op {
                Op::Place { player, side, suit, price } => {
                    let _ = round.place_order(&ids[player], side, suit, price);
                }
                Op::Cancel { player, sides, suits, price } => {
                    let _ = round.cancel_orders(&ids[player], sides, suits, price);
                }
                // Keep the round in the trading phase for this law.
                Op::Advance { .. } => {}
            }
        }

        for pid in &ids {
            let _ = round.cancel_orders(pid, SideFilter::Both, SuitFilter::All, -1);
        }
        let market = round.snapshot(&ids[0], 0).expect("snapshot").market;
        for view in market.values() {
            prop_assert!(view.highest_bid.is_none());
            prop_assert!(view.lowest_ask.is_none());
        }
    }

    /// Money and cards reconcile exactly at settlement: every final balance
    /// equals the pre-ante snapshot minus the ante, plus trade flows, plus
    /// payouts; and bonuses + shares + residue exhaust the pot.
    #[test]
    fn settlement_reconciles_against_the_trade_log(
        seed in any::<u64>(),
        ops in test_gens::ops(NUM_PLAYERS, 60),
    ) {
        let (mut round, ids) = started_round(seed);
        for op in ops {
            match op {
                Op::Place { player, side, suit, price } => {
                    let _ = round.place_order(&ids[player], side, suit, price);
                }
                Op::Cancel { player, sides, suits, price } => {
                    let _ = round.cancel_orders(&ids[player], sides, suits, price);
                }
                Op::Advance { .. } => {}
            }
        }
        round.tick(DURATION_MS);
        prop_assert_eq!(round.phase(), Phase::Completed);

        let snapshot = round.snapshot(&ids[0], DURATION_MS).expect("snapshot");
        let results = snapshot.results.expect("results");
        let initial = snapshot.initial_balances.expect("initial balances");
        let ante = 200 / NUM_PLAYERS as i64;

        let paid_out: i64 = results.bonuses.values().sum::<i64>()
            + results.share_each * results.winners.len() as i64;
        prop_assert_eq!(paid_out + results.residue, 200);

        for pid in &ids {
            let mut expected = initial[pid] - ante;
            for trade in &snapshot.trades {
                if trade.buyer == *pid {
                    expected -= trade.price;
                }
                if trade.seller == *pid {
                    expected += trade.price;
                }
            }
            expected += results.bonuses[pid];
            if results.winners.contains(pid) {
                expected += results.share_each;
            }
            prop_assert_eq!(snapshot.balances[pid], expected);
        }
    }
}
