//! Scenario tests for the round state machine.

use crate::domain::orders::{PlayerId, Side, SideFilter, SuitFilter};
use crate::domain::round::{OrderOutcome, Phase, Round, RoundConfig};
use crate::domain::suits::{CardCounts, Suit};
use crate::events::GameEvent;

const DURATION_MS: u64 = 240_000;

fn hand(spades: u32, clubs: u32, hearts: u32, diamonds: u32) -> CardCounts {
    let mut counts = CardCounts::new();
    counts.set(Suit::Spades, spades);
    counts.set(Suit::Clubs, clubs);
    counts.set(Suit::Hearts, hearts);
    counts.set(Suit::Diamonds, diamonds);
    counts
}

/// Four joined players, trading phase, a known hand per player:
/// everyone holds at least one card of every suit.
fn trading_round() -> (Round, Vec<PlayerId>) {
    let mut round = Round::new(RoundConfig {
        num_players: 4,
        duration_ms: DURATION_MS,
    });
    let ids: Vec<PlayerId> = ["alice", "bob", "carol", "dave"]
        .iter()
        .map(|name| round.join(name, 0, 42).expect("join"))
        .collect();
    assert_eq!(round.phase(), Phase::Trading);

    round.set_hands_for_test(&[
        (ids[0].clone(), hand(4, 2, 3, 1)),
        (ids[1].clone(), hand(2, 2, 3, 3)),
        (ids[2].clone(), hand(3, 3, 2, 2)),
        (ids[3].clone(), hand(1, 3, 2, 4)),
    ]);
    round.drain_events();
    (round, ids)
}

fn balance_of(round: &Round, pid: &PlayerId) -> i64 {
    round.ledger_for_test().player(pid).unwrap().balance
}

fn hand_of(round: &Round, pid: &PlayerId, suit: Suit) -> u32 {
    round.ledger_for_test().player(pid).unwrap().hand.get(suit)
}

#[test]
fn lobby_fills_then_rejects_joins() {
    let mut round = Round::new(RoundConfig {
        num_players: 4,
        duration_ms: DURATION_MS,
    });
    for name in ["a", "b", "c"] {
        round.join(name, 0, 7).unwrap();
        assert_eq!(round.phase(), Phase::Waiting);
    }
    round.join("d", 0, 7).unwrap();
    assert_eq!(round.phase(), Phase::Trading);
    assert_eq!(round.started_at(), Some(0));
    assert_eq!(round.deadline(), Some(DURATION_MS));

    let err = round.join("late", 1, 7).unwrap_err();
    assert_eq!(err.message(), "Cannot join right now");
}

#[test]
fn join_requires_a_name() {
    let mut round = Round::new(RoundConfig {
        num_players: 4,
        duration_ms: DURATION_MS,
    });
    assert_eq!(
        round.join("", 0, 7).unwrap_err().message(),
        "Name is required"
    );
    assert_eq!(
        round.join("   ", 0, 7).unwrap_err().message(),
        "Name is required"
    );
}

#[test]
fn lobby_fill_collects_antes_and_deals() {
    let mut round = Round::new(RoundConfig {
        num_players: 4,
        duration_ms: DURATION_MS,
    });
    let ids: Vec<PlayerId> = ["a", "b", "c", "d"]
        .iter()
        .map(|name| round.join(name, 0, 99).unwrap())
        .collect();

    let ledger = round.ledger_for_test();
    assert_eq!(ledger.pot(), 200);
    for pid in &ids {
        assert_eq!(ledger.player(pid).unwrap().balance, 300);
        assert_eq!(ledger.player(pid).unwrap().hand.total(), 10);
        assert_eq!(ledger.initial_balances()[pid], 350);
    }
    round.verify_invariants().unwrap();
}

#[test]
fn happy_path_match_at_resting_price() {
    // S1: A bids spades 10; B's incoming ask strikes it.
    let (mut round, ids) = trading_round();
    let (a, b) = (&ids[0], &ids[1]);

    let outcome = round.place_order(a, Side::Buy, Suit::Spades, 10).unwrap();
    assert!(matches!(outcome, OrderOutcome::Rested(_)));

    let outcome = round.place_order(b, Side::Sell, Suit::Spades, 10).unwrap();
    let trade = match outcome {
        OrderOutcome::Traded(trade) => trade,
        other => panic!("expected a strike, got {other:?}"),
    };
    assert_eq!(trade.buyer, *a);
    assert_eq!(trade.seller, *b);
    assert_eq!(trade.suit, Suit::Spades);
    assert_eq!(trade.price, 10);

    assert_eq!(balance_of(&round, a), 290);
    assert_eq!(balance_of(&round, b), 310);
    assert_eq!(hand_of(&round, a, Suit::Spades), 5);
    assert_eq!(hand_of(&round, b, Suit::Spades), 1);
    assert_eq!(round.ledger_for_test().trades().len(), 1);

    let snapshot = round.snapshot(a, 0).unwrap();
    let market = &snapshot.market[&Suit::Spades];
    assert!(market.highest_bid.is_none());
    assert!(market.lowest_ask.is_none());
    round.verify_invariants().unwrap();
}

#[test]
fn incoming_bid_strikes_at_the_resting_ask_price() {
    let (mut round, ids) = trading_round();
    let (a, b) = (&ids[0], &ids[1]);

    round.place_order(b, Side::Sell, Suit::Hearts, 6).unwrap();
    let outcome = round.place_order(a, Side::Buy, Suit::Hearts, 9).unwrap();
    match outcome {
        OrderOutcome::Traded(trade) => assert_eq!(trade.price, 6),
        other => panic!("expected a strike, got {other:?}"),
    }
}

#[test]
fn self_cross_is_rejected_and_leaves_the_book_alone() {
    // S2: A's resting ask cannot be struck by A's own bid.
    let (mut round, ids) = trading_round();
    let a = &ids[0];

    round.place_order(a, Side::Sell, Suit::Hearts, 8).unwrap();
    let err = round.place_order(a, Side::Buy, Suit::Hearts, 8).unwrap_err();
    assert_eq!(err.message(), "would strike with self");

    let snapshot = round.snapshot(a, 0).unwrap();
    let ask = snapshot.market[&Suit::Hearts].lowest_ask.as_ref().unwrap();
    assert_eq!(ask.price, 8);
    assert_eq!(ask.player_id, *a);

    // A non-crossing bid from the same owner is fine.
    round.place_order(a, Side::Buy, Suit::Hearts, 7).unwrap();
    round.verify_invariants().unwrap();
}

#[test]
fn non_improving_orders_are_rejected_and_improvements_displace() {
    // S3 on the clubs book.
    let (mut round, ids) = trading_round();
    let (a, b) = (&ids[0], &ids[1]);

    round.place_order(a, Side::Buy, Suit::Clubs, 5).unwrap();
    let err = round.place_order(b, Side::Buy, Suit::Clubs, 5).unwrap_err();
    assert_eq!(err.message(), "not improving");

    round.drain_events();
    round.place_order(b, Side::Buy, Suit::Clubs, 6).unwrap();

    let events = round.drain_events();
    let cancel = events
        .iter()
        .find(|e| matches!(e, GameEvent::Cancel { .. }))
        .expect("displacement emits a cancel");
    match cancel {
        GameEvent::Cancel {
            old_owner,
            old_price,
            new_owner,
            new_price,
            ..
        } => {
            assert_eq!(old_owner, a);
            assert_eq!(*old_price, 5);
            assert_eq!(new_owner.as_ref(), Some(b));
            assert_eq!(*new_price, Some(6));
        }
        _ => unreachable!(),
    }

    let snapshot = round.snapshot(a, 0).unwrap();
    let bid = snapshot.market[&Suit::Clubs].highest_bid.as_ref().unwrap();
    assert_eq!(bid.player_id, *b);
    assert_eq!(bid.price, 6);
}

#[test]
fn duplicate_resting_order_is_rejected_even_at_a_better_price() {
    let (mut round, ids) = trading_round();
    let a = &ids[0];

    round.place_order(a, Side::Buy, Suit::Clubs, 5).unwrap();
    assert_eq!(
        round
            .place_order(a, Side::Buy, Suit::Clubs, 5)
            .unwrap_err()
            .message(),
        "duplicate order"
    );
    assert_eq!(
        round
            .place_order(a, Side::Buy, Suit::Clubs, 6)
            .unwrap_err()
            .message(),
        "duplicate order"
    );
}

#[test]
fn funds_and_holdings_gate_resting_orders() {
    let (mut round, ids) = trading_round();
    let a = &ids[0];

    // Post-ante balance is 300.
    assert_eq!(
        round
            .place_order(a, Side::Buy, Suit::Spades, 301)
            .unwrap_err()
            .message(),
        "Insufficient funds"
    );
    round.place_order(a, Side::Buy, Suit::Spades, 300).unwrap();

    // Give D zero hearts and have them try to sell one.
    let d = &ids[3];
    round.set_hands_for_test(&[(d.clone(), hand(1, 3, 0, 6))]);
    assert_eq!(
        round
            .place_order(d, Side::Sell, Suit::Hearts, 5)
            .unwrap_err()
            .message(),
        "Not enough cards"
    );
}

#[test]
fn zero_or_negative_prices_are_schema_errors() {
    let (mut round, ids) = trading_round();
    for bad in [0, -3] {
        let err = round
            .place_order(&ids[0], Side::Buy, Suit::Spades, bad)
            .unwrap_err();
        assert_eq!(err.message(), "Price must be a positive integer");
    }
}

#[test]
fn bulk_cancel_sweeps_every_resting_order() {
    // S4: buy spades 12, buy clubs 4, sell diamonds 9, then cancel all.
    let (mut round, ids) = trading_round();
    let a = &ids[0];

    round.place_order(a, Side::Buy, Suit::Spades, 12).unwrap();
    round.place_order(a, Side::Buy, Suit::Clubs, 4).unwrap();
    round.place_order(a, Side::Sell, Suit::Diamonds, 9).unwrap();

    let canceled = round
        .cancel_orders(a, SideFilter::Both, SuitFilter::All, -1)
        .unwrap();
    assert_eq!(canceled.len(), 3);

    let snapshot = round.snapshot(a, 0).unwrap();
    for suit in Suit::ALL {
        assert!(snapshot.market[&suit].highest_bid.is_none());
        assert!(snapshot.market[&suit].lowest_ask.is_none());
    }
    round.verify_invariants().unwrap();
}

#[test]
fn cancel_thresholds_cut_bids_high_and_asks_low() {
    let (mut round, ids) = trading_round();
    let a = &ids[0];

    round.place_order(a, Side::Buy, Suit::Spades, 12).unwrap();
    round.place_order(a, Side::Buy, Suit::Clubs, 4).unwrap();
    round.place_order(a, Side::Sell, Suit::Diamonds, 9).unwrap();

    // Bids at or above 10: only the spades bid.
    let canceled = round
        .cancel_orders(a, SideFilter::One(Side::Buy), SuitFilter::All, 10)
        .unwrap();
    assert_eq!(canceled.len(), 1);
    let snapshot = round.snapshot(a, 0).unwrap();
    assert!(snapshot.market[&Suit::Spades].highest_bid.is_none());
    assert!(snapshot.market[&Suit::Clubs].highest_bid.is_some());

    // Asks at or below 9: the diamonds ask.
    let canceled = round
        .cancel_orders(
            a,
            SideFilter::One(Side::Sell),
            SuitFilter::One(Suit::Diamonds),
            9,
        )
        .unwrap();
    assert_eq!(canceled.len(), 1);

    // Thresholds below every resting price touch nothing on the buy side.
    let canceled = round
        .cancel_orders(a, SideFilter::One(Side::Buy), SuitFilter::All, 100)
        .unwrap();
    assert!(canceled.is_empty());
}

#[test]
fn cancel_ignores_other_players_orders() {
    let (mut round, ids) = trading_round();
    round.place_order(&ids[0], Side::Buy, Suit::Spades, 8).unwrap();
    let canceled = round
        .cancel_orders(&ids[1], SideFilter::Both, SuitFilter::All, -1)
        .unwrap();
    assert!(canceled.is_empty());
    assert!(round
        .snapshot(&ids[0], 0)
        .unwrap()
        .market[&Suit::Spades]
        .highest_bid
        .is_some());
}

#[test]
fn cancel_threshold_below_minus_one_is_a_schema_error() {
    let (mut round, ids) = trading_round();
    let err = round
        .cancel_orders(&ids[0], SideFilter::Both, SuitFilter::All, -2)
        .unwrap_err();
    assert_eq!(err.message(), "Price must be a non-negative integer or -1");
}

#[test]
fn trades_cull_bids_the_buyer_can_no_longer_fund() {
    let (mut round, ids) = trading_round();
    let (a, b) = (&ids[0], &ids[1]);

    // B commits the entire balance to a spades bid, then spends on hearts.
    round.place_order(b, Side::Buy, Suit::Spades, 300).unwrap();
    round.place_order(a, Side::Sell, Suit::Hearts, 5).unwrap();
    round.drain_events();

    let outcome = round.place_order(b, Side::Buy, Suit::Hearts, 5).unwrap();
    assert!(matches!(outcome, OrderOutcome::Traded(_)));
    assert_eq!(balance_of(&round, b), 295);

    let snapshot = round.snapshot(b, 0).unwrap();
    assert!(snapshot.market[&Suit::Spades].highest_bid.is_none());
    let events = round.drain_events();
    assert!(events.iter().any(|e| matches!(
        e,
        GameEvent::Cancel {
            new_owner: None,
            old_price: 300,
            ..
        }
    )));
    round.verify_invariants().unwrap();
}

#[test]
fn trades_cull_asks_the_seller_can_no_longer_deliver() {
    let (mut round, ids) = trading_round();
    let (a, b, d) = (&ids[0], &ids[1], &ids[3]);

    // A holds exactly one diamond: posts a high ask, then sells that
    // diamond into B's resting bid instead.
    round.place_order(a, Side::Sell, Suit::Diamonds, 20).unwrap();
    round.place_order(b, Side::Buy, Suit::Diamonds, 4).unwrap();
    round.drain_events();

    let outcome = round.place_order(a, Side::Sell, Suit::Diamonds, 4).unwrap();
    assert!(matches!(outcome, OrderOutcome::Traded(_)));
    assert_eq!(hand_of(&round, a, Suit::Diamonds), 0);

    // The stale ask at 20 is undeliverable now and must be gone.
    let snapshot = round.snapshot(d, 0).unwrap();
    assert!(snapshot.market[&Suit::Diamonds].lowest_ask.is_none());
    let events = round.drain_events();
    assert!(events.iter().any(|e| matches!(
        e,
        GameEvent::Cancel {
            new_owner: None,
            old_price: 20,
            ..
        }
    )));
    round.verify_invariants().unwrap();
}

#[test]
fn time_left_renormalizes_onto_the_display_scale() {
    let mut round = Round::new(RoundConfig {
        num_players: 4,
        duration_ms: 60_000,
    });
    for name in ["a", "b", "c", "d"] {
        round.join(name, 0, 5).unwrap();
    }

    assert_eq!(round.time_left(0), Some(240));
    assert_eq!(round.time_left(15_000), Some(180));
    assert_eq!(round.time_left(30_000), Some(120));
    // One real millisecond left still reports a nonzero tick.
    assert_eq!(round.time_left(59_999), Some(1));

    assert!(round.tick(60_000));
    assert_eq!(round.phase(), Phase::Completed);
    assert_eq!(round.time_left(60_000), None);
}

#[test]
fn actions_after_the_deadline_are_rejected() {
    let (mut round, ids) = trading_round();
    round.tick(DURATION_MS);
    assert_eq!(round.phase(), Phase::Completed);
    let err = round
        .place_order(&ids[0], Side::Buy, Suit::Spades, 5)
        .unwrap_err();
    assert_eq!(err.message(), "Trading not active");
    let err = round
        .cancel_orders(&ids[0], SideFilter::Both, SuitFilter::All, -1)
        .unwrap_err();
    assert_eq!(err.message(), "Trading not active");
}

#[test]
fn settlement_pays_bonuses_and_the_max_holder() {
    // S6: goal hearts, counts A:4 B:3 C:2 D:1, pot 200, no trades.
    let (mut round, ids) = trading_round();
    round.set_goal_for_test(Suit::Hearts);
    round.set_hands_for_test(&[
        (ids[0].clone(), hand(3, 2, 4, 1)),
        (ids[1].clone(), hand(2, 2, 3, 3)),
        (ids[2].clone(), hand(3, 3, 2, 2)),
        (ids[3].clone(), hand(2, 3, 1, 4)),
    ]);

    round.tick(DURATION_MS);
    assert_eq!(round.phase(), Phase::Completed);

    let snapshot = round.snapshot(&ids[0], DURATION_MS).unwrap();
    let results = snapshot.results.as_ref().unwrap();
    assert_eq!(results.goal_suit, Suit::Hearts);
    assert_eq!(results.bonuses[&ids[0]], 40);
    assert_eq!(results.bonuses[&ids[3]], 10);
    assert_eq!(results.winners, vec![ids[0].clone()]);
    assert_eq!(results.share_each, 100);
    assert_eq!(results.residue, 0);

    assert_eq!(snapshot.balances[&ids[0]], 300 + 40 + 100);
    assert_eq!(snapshot.balances[&ids[1]], 300 + 30);
    assert_eq!(snapshot.balances[&ids[2]], 300 + 20);
    assert_eq!(snapshot.balances[&ids[3]], 300 + 10);
    assert_eq!(snapshot.pot, 0);
    assert_eq!(snapshot.initial_balances.as_ref().unwrap()[&ids[0]], 350);
    assert!(snapshot.hands.is_some());
    assert_eq!(snapshot.time_left, None);
}

#[test]
fn completion_clears_the_books_silently() {
    let (mut round, ids) = trading_round();
    round.place_order(&ids[0], Side::Buy, Suit::Spades, 9).unwrap();
    round.place_order(&ids[1], Side::Sell, Suit::Clubs, 11).unwrap();
    round.drain_events();

    round.tick(DURATION_MS);
    let events = round.drain_events();
    // Completion emits round_completed only; dead books emit no cancels.
    assert_eq!(events.len(), 1);
    assert!(matches!(events[0], GameEvent::RoundCompleted { .. }));

    let snapshot = round.snapshot(&ids[0], DURATION_MS).unwrap();
    for suit in Suit::ALL {
        assert!(snapshot.market[&suit].highest_bid.is_none());
        assert!(snapshot.market[&suit].lowest_ask.is_none());
    }
}

#[test]
fn first_join_after_completion_resets_the_round() {
    let (mut round, ids) = trading_round();
    let old_round_id = round.round_id().to_string();
    round.tick(DURATION_MS);
    assert_eq!(round.phase(), Phase::Completed);

    let fresh = round.join("eve", DURATION_MS + 1, 11).unwrap();
    assert_eq!(round.phase(), Phase::Waiting);
    assert_ne!(round.round_id(), old_round_id);
    assert_eq!(round.ledger_for_test().len(), 1);
    assert!(round.ensure_player(&fresh).is_ok());
    assert!(round.ensure_player(&ids[0]).is_err());
}

#[test]
fn faulted_rounds_refuse_everything() {
    let (mut round, ids) = trading_round();
    round.fault("test fault");
    assert_eq!(round.phase(), Phase::Faulted);

    assert!(round.join("x", 0, 1).is_err());
    assert!(round.snapshot(&ids[0], 0).is_err());
    assert!(round
        .place_order(&ids[0], Side::Buy, Suit::Spades, 5)
        .is_err());
    let events = round.drain_events();
    assert!(matches!(events.last(), Some(GameEvent::Fault { .. })));
}
