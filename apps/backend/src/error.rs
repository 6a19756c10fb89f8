use actix_web::error::ResponseError;
use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use serde::Serialize;
use thiserror::Error;

use crate::errors::{DomainError, ErrorCode};

/// Wire shape for every error response: `{"error": "<message>"}`.
#[derive(Serialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Error, Debug)]
pub enum AppError {
    /// Client-facing rejection; always HTTP 400.
    #[error("{detail}")]
    Rejected { code: ErrorCode, detail: String },
    /// Internal failure; the detail never reaches the client.
    #[error("internal error: {detail}")]
    Internal { detail: String },
    #[error("configuration error: {detail}")]
    Config { detail: String },
}

impl AppError {
    pub fn rejected(code: ErrorCode, detail: impl Into<String>) -> Self {
        Self::Rejected {
            code,
            detail: detail.into(),
        }
    }

    pub fn bad_request(code: ErrorCode, detail: impl Into<String>) -> Self {
        Self::rejected(code, detail)
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self::Internal {
            detail: detail.into(),
        }
    }

    pub fn config(detail: impl Into<String>) -> Self {
        Self::Config {
            detail: detail.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Rejected { code, .. } => *code,
            AppError::Internal { .. } => ErrorCode::Internal,
            AppError::Config { .. } => ErrorCode::ConfigError,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Rejected { .. } => StatusCode::BAD_REQUEST,
            AppError::Internal { .. } | AppError::Config { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// The message serialized into the `error` field.
    fn client_message(&self) -> String {
        match self {
            AppError::Rejected { detail, .. } => detail.clone(),
            // Internal details stay in the logs.
            AppError::Internal { .. } | AppError::Config { .. } => {
                "Internal server error".to_string()
            }
        }
    }
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Invariant(detail) => AppError::internal(detail),
            other => AppError::rejected(other.code(), other.message().to_string()),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        self.status()
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(code = %self.code(), error = %self, "request failed");
        }
        HttpResponse::build(status)
            .insert_header(("x-trace-id", crate::trace_ctx::trace_id()))
            .json(ErrorBody {
                error: self.client_message(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejections_map_to_400() {
        let err: AppError =
            DomainError::business(ErrorCode::NotImproving, "not improving").into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), ErrorCode::NotImproving);
        assert_eq!(err.client_message(), "not improving");
    }

    #[test]
    fn invariant_violations_map_to_500_and_hide_detail() {
        let err: AppError = DomainError::invariant("pot drifted by 3").into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.client_message(), "Internal server error");
    }
}
