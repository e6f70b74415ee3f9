use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

/// Caller-facing failure categories. Each maps to one stable code and status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ValidationFailed,
    NotFound,
    ProviderUnavailable,
    ProviderMalformed,
    LedgerWriteFailed,
    BatchInsertFailed,
    CacheWriteFailed,
    StoreUnavailable,
}

impl ErrorKind {
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::ValidationFailed => "validation_failed",
            ErrorKind::NotFound => "not_found",
            ErrorKind::ProviderUnavailable => "provider_unavailable",
            ErrorKind::ProviderMalformed => "provider_malformed",
            ErrorKind::LedgerWriteFailed => "ledger_write_failed",
            ErrorKind::BatchInsertFailed => "batch_insert_failed",
            ErrorKind::CacheWriteFailed => "cache_write_failed",
            ErrorKind::StoreUnavailable => "store_unavailable",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ErrorKind::ValidationFailed => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::ProviderUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::ProviderMalformed => StatusCode::BAD_GATEWAY,
            ErrorKind::LedgerWriteFailed => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::BatchInsertFailed => StatusCode::INSUFFICIENT_STORAGE,
            ErrorKind::CacheWriteFailed => StatusCode::FAILED_DEPENDENCY,
            ErrorKind::StoreUnavailable => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    /// Whether the caller can reasonably retry the same request later.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorKind::ProviderUnavailable
                | ErrorKind::StoreUnavailable
                | ErrorKind::CacheWriteFailed
                | ErrorKind::BatchInsertFailed
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("position {0} not found")]
    PositionNotFound(Uuid),

    #[error("quote for {symbol} unavailable: {reason}")]
    QuoteUnavailable { symbol: String, reason: String },

    #[error("quote for {symbol} is malformed: {value:?}")]
    QuoteMalformed { symbol: String, value: String },

    #[error("history for {symbol} unavailable: {reason}")]
    HistoryUnavailable { symbol: String, reason: String },

    #[error("history for {0} is empty")]
    HistoryEmpty(String),

    #[error("history for {symbol} could not be decoded: {reason}")]
    HistoryUndecodable { symbol: String, reason: String },

    #[error("history for {symbol} is malformed at {date}: {reason}")]
    HistoryMalformed {
        symbol: String,
        date: String,
        reason: String,
    },

    #[error("ledger write failed: {0}")]
    LedgerWriteFailed(#[source] sqlx::Error),

    #[error("batch {batch} of {symbol} history failed after {committed} rows committed: {source}")]
    BatchInsertFailed {
        symbol: String,
        batch: usize,
        committed: usize,
        #[source]
        source: anyhow::Error,
    },

    #[error("cache write for {key} failed: {reason}")]
    CacheWriteFailed { key: String, reason: String },

    #[error("store unavailable during {operation}: {reason}")]
    StoreUnavailable {
        operation: &'static str,
        reason: String,
    },
}

impl TrackerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TrackerError::Validation(_) => ErrorKind::ValidationFailed,
            TrackerError::PositionNotFound(_) => ErrorKind::NotFound,
            TrackerError::QuoteUnavailable { .. } | TrackerError::HistoryUnavailable { .. } => {
                ErrorKind::ProviderUnavailable
            }
            TrackerError::QuoteMalformed { .. }
            | TrackerError::HistoryEmpty(_)
            | TrackerError::HistoryUndecodable { .. }
            | TrackerError::HistoryMalformed { .. } => ErrorKind::ProviderMalformed,
            TrackerError::LedgerWriteFailed(_) => ErrorKind::LedgerWriteFailed,
            TrackerError::BatchInsertFailed { .. } => ErrorKind::BatchInsertFailed,
            TrackerError::CacheWriteFailed { .. } => ErrorKind::CacheWriteFailed,
            TrackerError::StoreUnavailable { .. } => ErrorKind::StoreUnavailable,
        }
    }

    pub fn store_unavailable(operation: &'static str, reason: impl ToString) -> Self {
        TrackerError::StoreUnavailable {
            operation,
            reason: reason.to_string(),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    code: &'static str,
    error: String,
}

impl IntoResponse for TrackerError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        let message = match kind {
            ErrorKind::LedgerWriteFailed
            | ErrorKind::BatchInsertFailed
            | ErrorKind::StoreUnavailable => {
                tracing::error!(error = ?self, code = kind.code(), "Request failed");
                "Internal storage error".to_string()
            }
            _ => self.to_string(),
        };

        (
            kind.status(),
            Json(ErrorBody {
                success: false,
                code: kind.code(),
                error: message,
            }),
        )
            .into_response()
    }
}
