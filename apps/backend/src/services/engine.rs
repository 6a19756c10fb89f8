//! The engine facade: the only way in or out of the round.
//!
//! Every operation takes the round's write lock — reads included, because a
//! read may perform the lazy deadline transition. The lock is never held
//! across an await point; sinks are non-blocking by contract, so events are
//! flushed before the lock drops and the stream order equals the mutation
//! order.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use serde::Deserialize;

use crate::config::GameConfig;
use crate::domain::{
    OrderId, OrderOutcome, PlayerId, Round, RoundConfig, Side, SideFilter, StateSnapshot, Suit,
    SuitFilter,
};
use crate::errors::{DomainError, ErrorCode};
use crate::events::EventSink;
use crate::infra::Clock;

/// Raw `/action` body. Fields stay optional so each absence maps to the
/// exact wire error instead of a generic deserialization failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActionRequest {
    pub player_id: Option<String>,
    pub action_type: Option<String>,
    pub order_type: Option<String>,
    pub suit: Option<String>,
    /// Kept as raw JSON so a float or string price is rejected with the
    /// price message, not a schema failure.
    pub price: Option<serde_json::Value>,
}

/// Result of an accepted `/action`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Order(OrderOutcome),
    Canceled(Vec<OrderId>),
}

pub struct GameEngine {
    round: RwLock<Round>,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn EventSink>,
}

impl GameEngine {
    pub fn new(config: &GameConfig, clock: Arc<dyn Clock>, sink: Arc<dyn EventSink>) -> Self {
        let round_config = RoundConfig {
            num_players: config.num_players,
            duration_ms: config.duration_ms,
        };
        Self {
            round: RwLock::new(Round::new(round_config)),
            clock,
            sink,
        }
    }

    /// Serialized access: lazy expiry, the mutation, a debug-build invariant
    /// sweep, then the event flush — all under one write guard.
    fn with_round<T>(
        &self,
        f: impl FnOnce(&mut Round, u64) -> Result<T, DomainError>,
    ) -> Result<T, DomainError> {
        let now = self.clock.now_ms();
        let mut round = self
            .round
            .write()
            .map_err(|_| DomainError::invariant("round lock poisoned"))?;
        round.tick(now);

        #[allow(unused_mut)]
        let mut result = f(&mut round, now);
        #[cfg(debug_assertions)]
        if result.is_ok() {
            if let Err(violation) = round.verify_invariants() {
                round.fault(violation.message().to_string());
                result = Err(violation);
            }
        }

        for event in round.drain_events() {
            self.sink.emit(&event);
        }
        result
    }

    pub fn join(&self, name: &str) -> Result<PlayerId, DomainError> {
        // Entropy is drawn at the boundary; everything below is
        // deterministic in the seed.
        let seed: u64 = rand::random();
        self.with_round(|round, now| round.join(name, now, seed))
    }

    pub fn state_for(&self, player_id: &str) -> Result<StateSnapshot, DomainError> {
        let pid = PlayerId(player_id.to_string());
        self.with_round(|round, now| round.snapshot(&pid, now))
    }

    pub fn submit_action(&self, request: &ActionRequest) -> Result<ActionOutcome, DomainError> {
        let pid = match request.player_id.as_deref() {
            Some(raw) if !raw.is_empty() => PlayerId(raw.to_string()),
            _ => {
                return Err(DomainError::identity(
                    ErrorCode::InvalidPlayerId,
                    "Invalid player_id",
                ))
            }
        };

        self.with_round(|round, _now| {
            round.ensure_player(&pid)?;
            round.ensure_trading()?;

            match request.action_type.as_deref() {
                Some("order") => {
                    let side: Side = request
                        .order_type
                        .as_deref()
                        .unwrap_or_default()
                        .parse()?;
                    let suit: Suit = request.suit.as_deref().unwrap_or_default().parse()?;
                    let price = integer_price(request.price.as_ref()).ok_or_else(|| {
                        DomainError::schema(
                            ErrorCode::InvalidPrice,
                            "Price must be a positive integer",
                        )
                    })?;
                    round
                        .place_order(&pid, side, suit, price)
                        .map(ActionOutcome::Order)
                }
                Some("cancel") => {
                    let sides: SideFilter = request
                        .order_type
                        .as_deref()
                        .unwrap_or_default()
                        .parse()?;
                    let suits: SuitFilter = request.suit.as_deref().unwrap_or_default().parse()?;
                    let price = integer_price(request.price.as_ref()).ok_or_else(|| {
                        DomainError::schema(
                            ErrorCode::InvalidCancelPrice,
                            "Price must be a non-negative integer or -1",
                        )
                    })?;
                    round
                        .cancel_orders(&pid, sides, suits, price)
                        .map(ActionOutcome::Canceled)
                }
                _ => Err(DomainError::schema(
                    ErrorCode::InvalidActionType,
                    "Invalid action type",
                )),
            }
        })
    }

    /// Completes the round if the deadline has passed. Invoked by the
    /// watcher; every client call performs the same check on entry.
    pub fn poll_deadline(&self) {
        let _ = self.with_round(|_, _| Ok::<(), DomainError>(()));
    }

    pub fn deadline_ms(&self) -> Option<u64> {
        self.round.read().ok().and_then(|round| round.deadline())
    }

    /// Current phase name for liveness reporting.
    pub fn phase_name(&self) -> &'static str {
        self.round
            .read()
            .map(|round| round.phase().as_str())
            .unwrap_or("unknown")
    }

    /// Background loop that sleeps in bounded steps toward the current
    /// deadline so rounds complete without client traffic. Real time only;
    /// tests drive `poll_deadline` with a manual clock instead.
    pub async fn run_deadline_watcher(self: Arc<Self>) {
        const MAX_STEP_MS: u64 = 250;
        loop {
            self.poll_deadline();
            let now = self.clock.now_ms();
            let step = match self.deadline_ms() {
                Some(deadline) if deadline > now => (deadline - now).min(MAX_STEP_MS),
                _ => MAX_STEP_MS,
            };
            tokio::time::sleep(Duration::from_millis(step)).await;
        }
    }
}

fn integer_price(raw: Option<&serde_json::Value>) -> Option<i64> {
    raw.and_then(|value| value.as_i64())
}
