//! End-to-end round flow against the engine facade on a manual clock.

mod support;

use backend::domain::{OrderOutcome, Suit};
use backend::services::ActionOutcome;

/// Picks a suit the player holds at least one card of.
fn held_suit(engine: &backend::services::GameEngine, pid: &str) -> Suit {
    let snapshot = engine.state_for(pid).expect("state");
    let suit = snapshot
        .hand
        .iter()
        .find(|(_, count)| *count >= 1)
        .map(|(suit, _)| suit)
        .expect("a dealt hand holds at least one card");
    suit
}

#[test]
fn full_round_trades_and_settles() {
    let te = support::engine_with(4, 60_000);
    let ids = support::join_all(&te.engine, &["alice", "bob", "carol", "dave"]);
    let (alice, bob) = (&ids[0], &ids[1]);

    // Alice offers a card she actually holds; Bob lifts the offer.
    let suit = held_suit(&te.engine, alice);
    let outcome = te
        .engine
        .submit_action(&support::order(alice, "sell", suit.as_str(), 7))
        .expect("ask rests");
    assert!(matches!(
        outcome,
        ActionOutcome::Order(OrderOutcome::Rested(_))
    ));

    let outcome = te
        .engine
        .submit_action(&support::order(bob, "buy", suit.as_str(), 7))
        .expect("bid strikes");
    let trade = match outcome {
        ActionOutcome::Order(OrderOutcome::Traded(trade)) => trade,
        other => panic!("expected a strike, got {other:?}"),
    };
    assert_eq!(trade.seller.as_str(), alice);
    assert_eq!(trade.buyer.as_str(), bob);
    assert_eq!(trade.price, 7);

    let snapshot = te.engine.state_for(alice).expect("state");
    assert_eq!(snapshot.balances[&trade.seller], 307);
    assert_eq!(snapshot.balances[&trade.buyer], 293);
    assert_eq!(snapshot.trades.len(), 1);
    // The struck book is empty again.
    let market = &snapshot.market[&suit];
    assert!(market.highest_bid.is_none());
    assert!(market.lowest_ask.is_none());

    // S5: reported time scales 60 real seconds onto the 240 display range.
    te.clock.advance(15_000);
    assert_eq!(te.engine.state_for(alice).unwrap().time_left, Some(180));

    te.clock.advance(45_000);
    te.engine.poll_deadline();
    let snapshot = te.engine.state_for(alice).expect("state");
    assert_eq!(snapshot.state, "completed");
    assert_eq!(snapshot.time_left, None);

    // Reconcile every balance: pre-ante snapshot, minus ante, plus trade
    // flows, plus settlement payouts.
    let results = snapshot.results.as_ref().expect("results");
    let initial = snapshot.initial_balances.as_ref().expect("initial");
    let hands = snapshot.hands.as_ref().expect("hands");
    for pid in initial.keys() {
        let mut expected = initial[pid] - 50;
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
        assert_eq!(snapshot.balances[pid], expected);
        // Reported goal counts match the revealed hands.
        assert_eq!(results.counts[pid], hands[pid].get(results.goal_suit));
    }

    // Winners hold the maximum goal count and split the post-bonus pot.
    let max_count = results.counts.values().copied().max().unwrap();
    for pid in &results.winners {
        assert_eq!(results.counts[pid], max_count);
    }
    let total_bonus: i64 = results.bonuses.values().sum();
    assert_eq!(
        results.share_each * results.winners.len() as i64 + results.residue,
        200 - total_bonus
    );
    assert_eq!(snapshot.pot, 0);
}

#[test]
fn five_player_rounds_deal_eight_cards_each() {
    let te = support::engine_with(5, 240_000);
    let ids = support::join_all(&te.engine, &["a", "b", "c", "d", "e"]);

    let snapshot = te.engine.state_for(&ids[0]).expect("state");
    assert_eq!(snapshot.state, "trading");
    assert_eq!(snapshot.pot, 200);
    assert_eq!(snapshot.hand.total(), 8);
    // Ante is the pot split evenly: $40 a head.
    for balance in snapshot.balances.values() {
        assert_eq!(*balance, 310);
    }
}

#[test]
fn snapshots_are_monotone_in_time() {
    let te = support::engine_with(4, 60_000);
    let ids = support::join_all(&te.engine, &["a", "b", "c", "d"]);

    let mut last = u64::MAX;
    for _ in 0..10 {
        let snapshot = te.engine.state_for(&ids[0]).unwrap();
        match snapshot.time_left {
            Some(reported) => {
                assert!(reported <= last);
                last = reported;
            }
            None => {
                assert_eq!(snapshot.state, "completed");
                break;
            }
        }
        te.clock.advance(7_000);
    }
}
