//! Public snapshot API: the `/state` response body.
//!
//! Snapshots are deep copies; callers never hold references into engine
//! state, so there is no tearing and no way to mutate the round from
//! outside the lock.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::domain::orders::{Order, PlayerId, Trade};
use crate::domain::settlement::RoundResults;
use crate::domain::suits::{CardCounts, Suit};

/// One side of a quoted market: the resting order's owner and price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuoteView {
    pub player_id: PlayerId,
    pub price: i64,
}

impl From<&Order> for QuoteView {
    fn from(order: &Order) -> Self {
        Self {
            player_id: order.owner.clone(),
            price: order.price,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarketView {
    pub highest_bid: Option<QuoteView>,
    pub lowest_ask: Option<QuoteView>,
}

/// The full per-player view of the round.
#[derive(Debug, Clone, Serialize)]
pub struct StateSnapshot {
    /// `"waiting" | "trading" | "completed"` (or `"faulted"`).
    pub state: String,
    /// Normalized to `[0, 240]` during trading, absent otherwise.
    pub time_left: Option<u64>,
    pub pot: i64,
    /// The requesting player's hand.
    pub hand: CardCounts,
    pub market: BTreeMap<Suit, MarketView>,
    pub balances: BTreeMap<PlayerId, i64>,
    pub trades: Vec<Trade>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<RoundResults>,
    /// All hands, revealed once the round completes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hands: Option<BTreeMap<PlayerId, CardCounts>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_balances: Option<BTreeMap<PlayerId, i64>>,
}
