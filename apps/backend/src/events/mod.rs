//! Structured engine events and the sink seam.
//!
//! The engine emits one event per state-visible mutation; the sink decides
//! where they go. Sinks must not block: they are invoked inside the round's
//! critical section so the stream order equals the mutation order.
//! Delivery is at-least-once; sinks need not be idempotent.

use std::collections::BTreeMap;
use std::sync::Mutex;

use serde::Serialize;

use crate::domain::orders::{OrderId, PlayerId, Side, Trade};
use crate::domain::settlement::RoundResults;
use crate::domain::suits::{CardCounts, Suit};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerInfo {
    pub id: PlayerId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GameEvent {
    /// The lobby filled and trading began. Carries the entire deal so the
    /// stream alone can reconstruct the round.
    RoundStarted {
        round_id: String,
        players: Vec<PlayerInfo>,
        initial_balances: BTreeMap<PlayerId, i64>,
        hands: BTreeMap<PlayerId, CardCounts>,
        suit_counts: CardCounts,
        goal_suit: Suit,
        deal_fingerprint: String,
        ante: i64,
        pot: i64,
        duration_ms: u64,
    },
    OrderRested {
        order_id: OrderId,
        owner: PlayerId,
        side: Side,
        suit: Suit,
        price: i64,
    },
    /// A resting order left the book without trading: explicit cancel, bulk
    /// cancel, infeasibility cull, or displacement by a better order (then
    /// `new_owner`/`new_price` name the replacement).
    Cancel {
        order_id: OrderId,
        side: Side,
        suit: Suit,
        old_owner: PlayerId,
        old_price: i64,
        #[serde(skip_serializing_if = "Option::is_none")]
        new_owner: Option<PlayerId>,
        #[serde(skip_serializing_if = "Option::is_none")]
        new_price: Option<i64>,
    },
    Transaction {
        buyer: PlayerId,
        seller: PlayerId,
        suit: Suit,
        price: i64,
    },
    RoundCompleted {
        round_id: String,
        results: RoundResults,
        final_balances: BTreeMap<PlayerId, i64>,
        hands: BTreeMap<PlayerId, CardCounts>,
    },
    /// An invariant violation faulted the round. Terminal.
    Fault { round_id: String, detail: String },
}

impl GameEvent {
    pub fn name(&self) -> &'static str {
        match self {
            GameEvent::RoundStarted { .. } => "round_started",
            GameEvent::OrderRested { .. } => "order_rested",
            GameEvent::Cancel { .. } => "cancel",
            GameEvent::Transaction { .. } => "transaction",
            GameEvent::RoundCompleted { .. } => "round_completed",
            GameEvent::Fault { .. } => "fault",
        }
    }
}

/// Where engine events go. Implementations must be non-blocking.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &GameEvent);
}

/// Production sink: one structured log record per event.
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: &GameEvent) {
        match serde_json::to_string(event) {
            Ok(payload) => {
                tracing::info!(event = event.name(), payload = %payload, "game event")
            }
            Err(err) => tracing::error!(event = event.name(), error = %err, "unserializable event"),
        }
    }
}

/// Test sink: buffers everything for later assertions.
#[derive(Default)]
pub struct MemorySink {
    events: Mutex<Vec<GameEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<GameEvent> {
        self.events.lock().expect("sink lock").clone()
    }

    pub fn take(&self) -> Vec<GameEvent> {
        std::mem::take(&mut *self.events.lock().expect("sink lock"))
    }
}

impl EventSink for MemorySink {
    fn emit(&self, event: &GameEvent) {
        self.events.lock().expect("sink lock").push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_tag_themselves_on_the_wire() {
        let event = GameEvent::Transaction {
            buyer: PlayerId("b".into()),
            seller: PlayerId("s".into()),
            suit: Suit::Hearts,
            price: 7,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "transaction");
        assert_eq!(json["price"], 7);
        assert_eq!(event.name(), "transaction");
    }

    #[test]
    fn cancel_omits_replacement_when_none() {
        let event = GameEvent::Cancel {
            order_id: OrderId("o1".into()),
            side: Side::Buy,
            suit: Suit::Clubs,
            old_owner: PlayerId("a".into()),
            old_price: 5,
            new_owner: None,
            new_price: None,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert!(json.get("new_owner").is_none());
    }

    #[test]
    fn memory_sink_preserves_order() {
        let sink = MemorySink::new();
        for price in 1..=3 {
            sink.emit(&GameEvent::Transaction {
                buyer: PlayerId("b".into()),
                seller: PlayerId("s".into()),
                suit: Suit::Spades,
                price,
            });
        }
        let prices: Vec<i64> = sink
            .events()
            .iter()
            .map(|e| match e {
                GameEvent::Transaction { price, .. } => *price,
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(prices, vec![1, 2, 3]);
    }
}
