//! Error codes for the Figgie backend API.
//!
//! This module defines all error codes used throughout the application.
//! Add new codes here; never pass ad-hoc strings as error codes.
//!
//! All error codes are SCREAMING_SNAKE_CASE. The code travels in logs and
//! events; the client-facing body carries only the human-readable message.

use core::fmt;

/// Centralized error codes for the Figgie backend API.
///
/// This enum ensures type safety and prevents the use of ad-hoc error codes.
/// Each variant maps to a canonical SCREAMING_SNAKE_CASE string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Lobby
    /// Join request without a name
    NameRequired,
    /// Join while a round is in progress
    CannotJoinNow,
    /// Lobby already holds the configured player count
    GameFull,

    // Identity
    /// Unknown or missing player id
    InvalidPlayerId,

    // Phase
    /// Order or cancel outside the trading phase
    TradingNotActive,
    /// Round entered the faulted terminal state
    RoundFaulted,

    // Request validation
    /// action_type other than order/cancel
    InvalidActionType,
    /// order_type other than buy/sell (or both, for cancels)
    InvalidOrderType,
    /// Unknown suit name
    InvalidSuit,
    /// Order price missing, non-integer, or not positive
    InvalidPrice,
    /// Cancel threshold below -1 or non-integer
    InvalidCancelPrice,
    /// Malformed request body
    BadRequest,

    // Business rules
    /// Second resting order on the same (side, suit)
    DuplicateOrder,
    /// Order would match the submitter's own resting order
    WouldStrikeSelf,
    /// Bid exceeds the player's balance
    InsufficientFunds,
    /// Ask without a card of that suit
    NoHoldings,
    /// Order does not strictly improve the occupied side
    NotImproving,

    // System
    /// Engine invariant violation
    InvariantViolation,
    /// Configuration error
    ConfigError,
    /// Internal server error
    Internal,
}

impl ErrorCode {
    /// Returns the canonical SCREAMING_SNAKE_CASE string for this error code.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NameRequired => "NAME_REQUIRED",
            Self::CannotJoinNow => "CANNOT_JOIN_NOW",
            Self::GameFull => "GAME_FULL",
            Self::InvalidPlayerId => "INVALID_PLAYER_ID",
            Self::TradingNotActive => "TRADING_NOT_ACTIVE",
            Self::RoundFaulted => "ROUND_FAULTED",
            Self::InvalidActionType => "INVALID_ACTION_TYPE",
            Self::InvalidOrderType => "INVALID_ORDER_TYPE",
            Self::InvalidSuit => "INVALID_SUIT",
            Self::InvalidPrice => "INVALID_PRICE",
            Self::InvalidCancelPrice => "INVALID_CANCEL_PRICE",
            Self::BadRequest => "BAD_REQUEST",
            Self::DuplicateOrder => "DUPLICATE_ORDER",
            Self::WouldStrikeSelf => "WOULD_STRIKE_SELF",
            Self::InsufficientFunds => "INSUFFICIENT_FUNDS",
            Self::NoHoldings => "NO_HOLDINGS",
            Self::NotImproving => "NOT_IMPROVING",
            Self::InvariantViolation => "INVARIANT_VIOLATION",
            Self::ConfigError => "CONFIG_ERROR",
            Self::Internal => "INTERNAL",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_code_strings_are_canonical() {
        assert_eq!(ErrorCode::NameRequired.as_str(), "NAME_REQUIRED");
        assert_eq!(ErrorCode::CannotJoinNow.as_str(), "CANNOT_JOIN_NOW");
        assert_eq!(ErrorCode::GameFull.as_str(), "GAME_FULL");
        assert_eq!(ErrorCode::InvalidPlayerId.as_str(), "INVALID_PLAYER_ID");
        assert_eq!(ErrorCode::TradingNotActive.as_str(), "TRADING_NOT_ACTIVE");
        assert_eq!(ErrorCode::DuplicateOrder.as_str(), "DUPLICATE_ORDER");
        assert_eq!(ErrorCode::WouldStrikeSelf.as_str(), "WOULD_STRIKE_SELF");
        assert_eq!(ErrorCode::NotImproving.as_str(), "NOT_IMPROVING");
        assert_eq!(
            ErrorCode::InvariantViolation.as_str(),
            "INVARIANT_VIOLATION"
        );
    }

    #[test]
    fn display_matches_as_str() {
        assert_eq!(
            format!("{}", ErrorCode::InsufficientFunds),
            "INSUFFICIENT_FUNDS"
        );
        assert_eq!(format!("{}", ErrorCode::NoHoldings), "NO_HOLDINGS");
    }
}
