//! Domain-level error type used across the engine and its services.
//!
//! This error type is HTTP-agnostic. Handlers return
//! `Result<T, crate::error::AppError>` and convert from `DomainError`
//! using the provided `From<DomainError> for AppError` implementation.

use std::error::Error;
use std::fmt::{Display, Formatter, Result as FmtResult};

use super::error_code::ErrorCode;

/// Central domain error type.
///
/// The message is the exact string surfaced to clients; the code is the
/// stable machine-readable tag carried in logs and events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Missing field, wrong type, unknown suit/order_type/action_type
    Schema(ErrorCode, String),
    /// Unknown or malformed player id
    Identity(ErrorCode, String),
    /// Operation not admissible in the current phase
    Phase(ErrorCode, String),
    /// Business rule rejection (duplicate, self-cross, funds, holdings, ...)
    Business(ErrorCode, String),
    /// Engine invariant violation; must never reach clients verbatim
    Invariant(String),
}

impl Display for DomainError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            DomainError::Schema(code, d) => write!(f, "schema {code}: {d}"),
            DomainError::Identity(code, d) => write!(f, "identity {code}: {d}"),
            DomainError::Phase(code, d) => write!(f, "phase {code}: {d}"),
            DomainError::Business(code, d) => write!(f, "business {code}: {d}"),
            DomainError::Invariant(d) => write!(f, "invariant violated: {d}"),
        }
    }
}

impl Error for DomainError {}

impl DomainError {
    pub fn schema(code: ErrorCode, detail: impl Into<String>) -> Self {
        Self::Schema(code, detail.into())
    }
    pub fn identity(code: ErrorCode, detail: impl Into<String>) -> Self {
        Self::Identity(code, detail.into())
    }
    pub fn phase(code: ErrorCode, detail: impl Into<String>) -> Self {
        Self::Phase(code, detail.into())
    }
    pub fn business(code: ErrorCode, detail: impl Into<String>) -> Self {
        Self::Business(code, detail.into())
    }
    pub fn invariant(detail: impl Into<String>) -> Self {
        Self::Invariant(detail.into())
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            DomainError::Schema(code, _)
            | DomainError::Identity(code, _)
            | DomainError::Phase(code, _)
            | DomainError::Business(code, _) => *code,
            DomainError::Invariant(_) => ErrorCode::InvariantViolation,
        }
    }

    /// The client-facing message.
    pub fn message(&self) -> &str {
        match self {
            DomainError::Schema(_, d)
            | DomainError::Identity(_, d)
            | DomainError::Phase(_, d)
            | DomainError::Business(_, d)
            | DomainError::Invariant(d) => d,
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, DomainError::Invariant(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_and_message_round_trip() {
        let err = DomainError::business(ErrorCode::DuplicateOrder, "duplicate order");
        assert_eq!(err.code(), ErrorCode::DuplicateOrder);
        assert_eq!(err.message(), "duplicate order");
        assert!(!err.is_fatal());
    }

    #[test]
    fn invariant_errors_are_fatal() {
        let err = DomainError::invariant("card conservation broken");
        assert_eq!(err.code(), ErrorCode::InvariantViolation);
        assert!(err.is_fatal());
    }
}
