//! The round state machine: lobby, books, ledger, timer, settlement.
//!
//! Every mutation happens through `&mut self` under the engine's exclusive
//! lock, which is what serializes concurrent client requests into the total
//! order reflected in the trade log and the event stream. Events produced by
//! a mutation are buffered here and drained by the engine after the mutation
//! commits.

use serde::Serialize;
use uuid::Uuid;

use crate::domain::book::{Book, RestOutcome};
use crate::domain::deal::{deal, deal_fingerprint};
use crate::domain::ledger::Ledger;
use crate::domain::orders::{Order, OrderId, PlayerId, Side, SideFilter, SuitFilter, Trade};
use crate::domain::rules::{ante_for, TIME_SCALE};
use crate::domain::settlement::{settle, RoundResults};
use crate::domain::snapshot::{MarketView, QuoteView, StateSnapshot};
use crate::domain::suits::{CardCounts, Suit};
use crate::errors::{DomainError, ErrorCode};
use crate::events::{GameEvent, PlayerInfo};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Waiting,
    Trading,
    Completed,
    /// Terminal state entered on an invariant violation. Refuses everything.
    Faulted,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Waiting => "waiting",
            Phase::Trading => "trading",
            Phase::Completed => "completed",
            Phase::Faulted => "faulted",
        }
    }
}

#[derive(Debug, Clone)]
pub struct RoundConfig {
    /// Lobby size that triggers the deal (4 or 5).
    pub num_players: usize,
    /// Real trading duration in milliseconds.
    pub duration_ms: u64,
}

/// Result of an accepted order submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderOutcome {
    Rested(OrderId),
    Traded(Trade),
}

#[derive(Debug)]
pub struct Round {
    round_id: String,
    config: RoundConfig,
    phase: Phase,
    ledger: Ledger,
    books: [Book; 4],
    goal_suit: Option<Suit>,
    suit_counts: Option<CardCounts>,
    started_at: Option<u64>,
    deadline: Option<u64>,
    results: Option<RoundResults>,
    /// Pending events, drained by the engine after each mutation.
    events: Vec<GameEvent>,
}

impl Round {
    pub fn new(config: RoundConfig) -> Self {
        Self {
            round_id: Uuid::new_v4().simple().to_string(),
            config,
            phase: Phase::Waiting,
            ledger: Ledger::new(),
            books: [Book::new(), Book::new(), Book::new(), Book::new()],
            goal_suit: None,
            suit_counts: None,
            started_at: None,
            deadline: None,
            results: None,
            events: Vec::new(),
        }
    }

    pub fn round_id(&self) -> &str {
        &self.round_id
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn started_at(&self) -> Option<u64> {
        self.started_at
    }

    pub fn deadline(&self) -> Option<u64> {
        self.deadline
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    fn book(&self, suit: Suit) -> &Book {
        &self.books[suit.index()]
    }

    fn book_mut(&mut self, suit: Suit) -> &mut Book {
        &mut self.books[suit.index()]
    }

    pub(crate) fn ensure_player(&self, pid: &PlayerId) -> Result<(), DomainError> {
        if self.ledger.contains(pid) {
            Ok(())
        } else {
            Err(DomainError::identity(
                ErrorCode::InvalidPlayerId,
                "Invalid player_id",
            ))
        }
    }

    pub(crate) fn ensure_trading(&self) -> Result<(), DomainError> {
        match self.phase {
            Phase::Trading => Ok(()),
            Phase::Faulted => Err(DomainError::phase(
                ErrorCode::RoundFaulted,
                "Round is unavailable",
            )),
            _ => Err(DomainError::phase(
                ErrorCode::TradingNotActive,
                "Trading not active",
            )),
        }
    }

    /// Enters the terminal faulted state: resting orders are dead, further
    /// operations are refused, and the failure is reported to the sink.
    pub fn fault(&mut self, detail: impl Into<String>) {
        let detail = detail.into();
        tracing::error!(round = %self.round_id, detail = %detail, "round faulted");
        for book in &mut self.books {
            book.clear();
        }
        self.phase = Phase::Faulted;
        self.events.push(GameEvent::Fault {
            round_id: self.round_id.clone(),
            detail,
        });
    }

    // ---------------------------------------------------------------------
    // Lobby
    // ---------------------------------------------------------------------

    /// Adds a player in the waiting phase. The first join after a completed
    /// round resets the lobby; the join that fills the lobby deals the cards
    /// and starts trading, using `seed` as the round's entropy.
    pub fn join(&mut self, name: &str, now_ms: u64, seed: u64) -> Result<PlayerId, DomainError> {
        if name.trim().is_empty() {
            return Err(DomainError::schema(
                ErrorCode::NameRequired,
                "Name is required",
            ));
        }
        if self.phase == Phase::Faulted {
            return Err(DomainError::phase(
                ErrorCode::RoundFaulted,
                "Round is unavailable",
            ));
        }
        if self.phase == Phase::Completed {
            self.reset();
        }
        if self.phase != Phase::Waiting {
            return Err(DomainError::phase(
                ErrorCode::CannotJoinNow,
                "Cannot join right now",
            ));
        }
        if self.ledger.len() >= self.config.num_players {
            return Err(DomainError::phase(ErrorCode::GameFull, "Game is full"));
        }

        let pid = self.ledger.add_player(name);
        tracing::info!(round = %self.round_id, player = %pid, name, "player joined");

        if self.ledger.len() == self.config.num_players {
            self.start_trading(now_ms, seed)?;
        }
        Ok(pid)
    }

    fn reset(&mut self) {
        let config = self.config.clone();
        let events = std::mem::take(&mut self.events);
        *self = Round::new(config);
        self.events = events;
        tracing::info!(round = %self.round_id, "lobby reset to waiting");
    }

    fn start_trading(&mut self, now_ms: u64, seed: u64) -> Result<(), DomainError> {
        let dealt = deal(self.config.num_players, seed);
        self.ledger.install_deal(&dealt.hands)?;
        self.ledger.ante_all(ante_for(self.config.num_players))?;

        self.goal_suit = Some(dealt.goal_suit);
        self.suit_counts = Some(dealt.suit_counts);
        self.started_at = Some(now_ms);
        self.deadline = Some(now_ms + self.config.duration_ms);
        self.phase = Phase::Trading;

        let players: Vec<PlayerInfo> = self
            .ledger
            .players()
            .map(|p| PlayerInfo {
                id: p.id.clone(),
                name: p.name.clone(),
            })
            .collect();
        self.events.push(GameEvent::RoundStarted {
            round_id: self.round_id.clone(),
            players,
            initial_balances: self.ledger.initial_balances().clone(),
            hands: self.ledger.initial_hands().clone(),
            suit_counts: dealt.suit_counts,
            goal_suit: dealt.goal_suit,
            deal_fingerprint: deal_fingerprint(&dealt),
            ante: ante_for(self.config.num_players),
            pot: self.ledger.pot(),
            duration_ms: self.config.duration_ms,
        });
        tracing::info!(
            round = %self.round_id,
            goal_suit = %dealt.goal_suit,
            pot = self.ledger.pot(),
            "trading started"
        );
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Timer
    // ---------------------------------------------------------------------

    /// Lazy expiry: completes the round if the deadline has passed. Runs
    /// before every guarded operation so in-flight actions after the bell
    /// are rejected rather than racing the transition.
    pub fn tick(&mut self, now_ms: u64) -> bool {
        if self.phase == Phase::Trading {
            if let Some(deadline) = self.deadline {
                if now_ms >= deadline {
                    self.complete();
                    return true;
                }
            }
        }
        false
    }

    /// Remaining time renormalized onto `[0, TIME_SCALE]`; `None` outside
    /// the trading phase.
    pub fn time_left(&self, now_ms: u64) -> Option<u64> {
        if self.phase != Phase::Trading {
            return None;
        }
        let deadline = self.deadline?;
        let duration = self.config.duration_ms.max(1) as u128;
        let remaining = deadline.saturating_sub(now_ms) as u128;
        let scaled = (TIME_SCALE as u128 * remaining + duration - 1) / duration;
        Some(scaled as u64)
    }

    fn complete(&mut self) {
        for book in &mut self.books {
            book.clear();
        }
        let Some(goal_suit) = self.goal_suit else {
            self.fault("completing a round with no goal suit");
            return;
        };

        let results = settle(
            &self.ledger.hands(),
            &self.ledger.join_order(),
            self.ledger.pot(),
            goal_suit,
        );
        for (pid, bonus) in results.bonuses.clone() {
            if let Err(err) = self.ledger.pay_from_pot(&pid, bonus) {
                self.fault(err.message().to_string());
                return;
            }
        }
        for pid in results.winners.clone() {
            if let Err(err) = self.ledger.pay_from_pot(&pid, results.share_each) {
                self.fault(err.message().to_string());
                return;
            }
        }
        let residue = self.ledger.drain_pot();
        debug_assert_eq!(residue, results.residue);

        self.results = Some(results.clone());
        self.phase = Phase::Completed;
        self.events.push(GameEvent::RoundCompleted {
            round_id: self.round_id.clone(),
            results,
            final_balances: self.ledger.balances(),
            hands: self.ledger.hands(),
        });
        tracing::info!(round = %self.round_id, "round completed");
    }

    // ---------------------------------------------------------------------
    // Orders
    // ---------------------------------------------------------------------

    /// Admission pipeline: self-cross, match at the resting price, duplicate,
    /// funds/holdings, then rest-or-improve.
    pub fn place_order(
        &mut self,
        pid: &PlayerId,
        side: Side,
        suit: Suit,
        price: i64,
    ) -> Result<OrderOutcome, DomainError> {
        self.ensure_player(pid)?;
        self.ensure_trading()?;
        if price <= 0 {
            return Err(DomainError::schema(
                ErrorCode::InvalidPrice,
                "Price must be a positive integer",
            ));
        }

        if self.book(suit).self_cross(pid, side, price) {
            return Err(DomainError::business(
                ErrorCode::WouldStrikeSelf,
                "would strike with self",
            ));
        }

        if let Some(resting) = self.book(suit).crossing(side, price).cloned() {
            return self.execute_trade(pid, side, suit, resting);
        }

        if self.book(suit).has_resting(pid, side) {
            return Err(DomainError::business(
                ErrorCode::DuplicateOrder,
                "duplicate order",
            ));
        }

        match side {
            Side::Buy => {
                if !self.ledger.can_fund(pid, price) {
                    return Err(DomainError::business(
                        ErrorCode::InsufficientFunds,
                        "Insufficient funds",
                    ));
                }
            }
            Side::Sell => {
                if !self.ledger.can_deliver(pid, suit) {
                    return Err(DomainError::business(
                        ErrorCode::NoHoldings,
                        "Not enough cards",
                    ));
                }
            }
        }

        let order = Order::new(pid.clone(), side, suit, price);
        let order_id = order.order_id.clone();
        match self.book_mut(suit).rest(order) {
            RestOutcome::Rested(displaced) => {
                if let Some(old) = displaced {
                    self.events.push(GameEvent::Cancel {
                        order_id: old.order_id,
                        side: old.side,
                        suit: old.suit,
                        old_owner: old.owner,
                        old_price: old.price,
                        new_owner: Some(pid.clone()),
                        new_price: Some(price),
                    });
                }
                self.events.push(GameEvent::OrderRested {
                    order_id: order_id.clone(),
                    owner: pid.clone(),
                    side,
                    suit,
                    price,
                });
                Ok(OrderOutcome::Rested(order_id))
            }
            RestOutcome::NotImproving => Err(DomainError::business(
                ErrorCode::NotImproving,
                "not improving",
            )),
        }
    }

    /// Strikes the incoming `(side, price)` order against `resting` at the
    /// resting order's price (price-time priority: the resting order came
    /// first).
    fn execute_trade(
        &mut self,
        pid: &PlayerId,
        side: Side,
        suit: Suit,
        resting: Order,
    ) -> Result<OrderOutcome, DomainError> {
        let (buyer, seller) = match side {
            Side::Buy => (pid.clone(), resting.owner.clone()),
            Side::Sell => (resting.owner.clone(), pid.clone()),
        };
        // Feasibility at the execution price. Resting orders are kept
        // feasible by the post-trade cull, so this guards the incoming side.
        if !self.ledger.can_fund(&buyer, resting.price) {
            return Err(DomainError::business(
                ErrorCode::InsufficientFunds,
                "Insufficient funds",
            ));
        }
        if !self.ledger.can_deliver(&seller, suit) {
            return Err(DomainError::business(
                ErrorCode::NoHoldings,
                "Not enough cards",
            ));
        }

        let struck = self
            .book_mut(suit)
            .take_crossing(side, resting.price)
            .ok_or_else(|| DomainError::invariant("crossing order vanished mid-admission"))?;
        let trade = self
            .ledger
            .transfer(&buyer, &seller, suit, struck.price)?;
        self.events.push(GameEvent::Transaction {
            buyer: trade.buyer.clone(),
            seller: trade.seller.clone(),
            suit,
            price: trade.price,
        });
        tracing::debug!(
            round = %self.round_id,
            buyer = %trade.buyer,
            seller = %trade.seller,
            suit = %suit,
            price = trade.price,
            "strike"
        );

        self.cull_infeasible(&[buyer, seller]);
        Ok(OrderOutcome::Traded(trade))
    }

    /// Cancels any resting order of `parties` that the last trade made
    /// infeasible: bids their balance no longer covers, asks for suits they
    /// no longer hold.
    fn cull_infeasible(&mut self, parties: &[PlayerId]) {
        for suit in Suit::ALL {
            for side in [Side::Buy, Side::Sell] {
                let Some(order) = self.book(suit).best(side).cloned() else {
                    continue;
                };
                if !parties.contains(&order.owner) {
                    continue;
                }
                let feasible = match side {
                    Side::Buy => self.ledger.can_fund(&order.owner, order.price),
                    Side::Sell => self.ledger.can_deliver(&order.owner, suit),
                };
                if !feasible {
                    self.book_mut(suit).cancel(side);
                    self.events.push(GameEvent::Cancel {
                        order_id: order.order_id,
                        side,
                        suit,
                        old_owner: order.owner,
                        old_price: order.price,
                        new_owner: None,
                        new_price: None,
                    });
                }
            }
        }
    }

    /// Bulk cancel over selected sides × suits. An order is canceled iff the
    /// threshold is `-1`, or it is a bid at or above the threshold, or an
    /// ask at or below it. Only the caller's orders are touched.
    pub fn cancel_orders(
        &mut self,
        pid: &PlayerId,
        sides: SideFilter,
        suits: SuitFilter,
        price: i64,
    ) -> Result<Vec<OrderId>, DomainError> {
        self.ensure_player(pid)?;
        self.ensure_trading()?;
        if price < -1 {
            return Err(DomainError::schema(
                ErrorCode::InvalidCancelPrice,
                "Price must be a non-negative integer or -1",
            ));
        }

        let mut canceled = Vec::new();
        for suit in suits.suits() {
            for &side in sides.sides() {
                let Some(order) = self.book(suit).best(side).cloned() else {
                    continue;
                };
                if order.owner != *pid {
                    continue;
                }
                let selected = price == -1
                    || match side {
                        Side::Buy => order.price >= price,
                        Side::Sell => order.price <= price,
                    };
                if selected {
                    self.book_mut(suit).cancel(side);
                    canceled.push(order.order_id.clone());
                    self.events.push(GameEvent::Cancel {
                        order_id: order.order_id,
                        side,
                        suit,
                        old_owner: order.owner,
                        old_price: order.price,
                        new_owner: None,
                        new_price: None,
                    });
                }
            }
        }
        Ok(canceled)
    }

    // ---------------------------------------------------------------------
    // Snapshots
    // ---------------------------------------------------------------------

    /// Deep-copied view for `pid`. The completed phase additionally reveals
    /// results, all hands, and the pre-ante balances.
    pub fn snapshot(&self, pid: &PlayerId, now_ms: u64) -> Result<StateSnapshot, DomainError> {
        if self.phase == Phase::Faulted {
            return Err(DomainError::phase(
                ErrorCode::RoundFaulted,
                "Round is unavailable",
            ));
        }
        let player = self.ledger.player(pid).ok_or_else(|| {
            DomainError::identity(ErrorCode::InvalidPlayerId, "Invalid or missing player_id")
        })?;

        let market = Suit::ALL
            .iter()
            .map(|&suit| {
                let book = self.book(suit);
                (
                    suit,
                    MarketView {
                        highest_bid: book.best(Side::Buy).map(QuoteView::from),
                        lowest_ask: book.best(Side::Sell).map(QuoteView::from),
                    },
                )
            })
            .collect();

        let completed = self.phase == Phase::Completed;
        Ok(StateSnapshot {
            state: self.phase.as_str().to_string(),
            time_left: self.time_left(now_ms),
            pot: self.ledger.pot(),
            hand: player.hand,
            market,
            balances: self.ledger.balances(),
            trades: self.ledger.trades().to_vec(),
            results: completed.then(|| self.results.clone()).flatten(),
            hands: completed.then(|| self.ledger.hands()),
            initial_balances: completed.then(|| self.ledger.initial_balances().clone()),
        })
    }

    // ---------------------------------------------------------------------
    // Invariants
    // ---------------------------------------------------------------------

    /// Full structural check: conservation, solvency, book wellformedness,
    /// and feasibility of every resting order. Cheap enough for debug builds
    /// to run after each mutation; property tests run it unconditionally.
    pub fn verify_invariants(&self) -> Result<(), DomainError> {
        match self.phase {
            Phase::Trading => {
                self.ledger.verify_conservation()?;
                for suit in Suit::ALL {
                    let book = self.book(suit);
                    if !book.is_well_formed() {
                        return Err(DomainError::invariant(format!(
                            "{suit} book holds a crossed or locked market"
                        )));
                    }
                    for order in book.orders() {
                        if order.suit != suit {
                            return Err(DomainError::invariant(format!(
                                "{} order filed under the {suit} book",
                                order.suit
                            )));
                        }
                        if !self.ledger.contains(&order.owner) {
                            return Err(DomainError::invariant(format!(
                                "resting order owned by unknown player {}",
                                order.owner
                            )));
                        }
                        let feasible = match order.side {
                            Side::Buy => self.ledger.can_fund(&order.owner, order.price),
                            Side::Sell => self.ledger.can_deliver(&order.owner, suit),
                        };
                        if !feasible {
                            return Err(DomainError::invariant(format!(
                                "infeasible resting {} on {suit} by {}",
                                order.side, order.owner
                            )));
                        }
                    }
                }
            }
            Phase::Waiting | Phase::Completed | Phase::Faulted => {
                for suit in Suit::ALL {
                    if self.book(suit).orders().next().is_some() {
                        return Err(DomainError::invariant(format!(
                            "{suit} book not empty outside trading"
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Test scaffolding
    // ---------------------------------------------------------------------

    #[cfg(test)]
    pub(crate) fn set_hands_for_test(&mut self, hands: &[(PlayerId, CardCounts)]) {
        self.ledger.set_hands_for_test(hands);
    }

    #[cfg(test)]
    pub(crate) fn set_goal_for_test(&mut self, goal_suit: Suit) {
        self.goal_suit = Some(goal_suit);
    }

    #[cfg(test)]
    pub(crate) fn ledger_for_test(&self) -> &Ledger {
        &self.ledger
    }
}
