//! Order, trade, and identifier types shared across the books and ledger.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::suits::Suit;
use crate::errors::{DomainError, ErrorCode};

/// Opaque per-round player handle. Treated as an unforgeable capability:
/// whoever presents it acts as that player.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique within a round.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl OrderId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Side::Buy => "buy",
            Side::Sell => "sell",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Side {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "buy" => Ok(Side::Buy),
            "sell" => Ok(Side::Sell),
            _ => Err(DomainError::schema(
                ErrorCode::InvalidOrderType,
                "Invalid order_type",
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Order {
    pub order_id: OrderId,
    pub owner: PlayerId,
    pub side: Side,
    pub suit: Suit,
    pub price: i64,
}

impl Order {
    pub fn new(owner: PlayerId, side: Side, suit: Suit, price: i64) -> Self {
        Self {
            order_id: OrderId::generate(),
            owner,
            side,
            suit,
            price,
        }
    }
}

/// An executed strike. Append-only log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    pub buyer: PlayerId,
    pub seller: PlayerId,
    pub suit: Suit,
    pub price: i64,
}

/// Which sides a cancel request targets.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SideFilter {
    One(Side),
    Both,
}

impl SideFilter {
    pub fn sides(self) -> &'static [Side] {
        match self {
            SideFilter::One(Side::Buy) => &[Side::Buy],
            SideFilter::One(Side::Sell) => &[Side::Sell],
            SideFilter::Both => &[Side::Buy, Side::Sell],
        }
    }
}

impl FromStr for SideFilter {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "both" => Ok(SideFilter::Both),
            other => other.parse::<Side>().map(SideFilter::One),
        }
    }
}

/// Which suits a cancel request targets.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SuitFilter {
    One(Suit),
    All,
}

impl SuitFilter {
    pub fn suits(self) -> Vec<Suit> {
        match self {
            SuitFilter::One(suit) => vec![suit],
            SuitFilter::All => Suit::ALL.to_vec(),
        }
    }
}

impl FromStr for SuitFilter {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(SuitFilter::All),
            other => other.parse::<Suit>().map(SuitFilter::One),
        }
    }
}
