//! API error types and responses.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use kassa_core::KassaError;
use kassa_store::StoreError;

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A required field was absent.
    #[error("missing required field: {0}")]
    MissingField(String),

    /// An amount was zero, negative or out of range.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// A currency code was not USD, SUM or KGS.
    #[error("invalid currency: {0}")]
    InvalidCurrency(String),

    /// No exchange rate has been set yet.
    #[error("no exchange rate available")]
    NoRateAvailable,

    /// An exchange rate was not strictly positive.
    #[error("invalid exchange rate: {0}")]
    InvalidRate(String),

    /// Bad request - malformed body or query.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// The debt is already fully paid.
    #[error("debt already settled: {0}")]
    DebtAlreadySettled(String),

    /// Conflict - a unique key is already taken.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

impl ApiError {
    /// Status code and machine-readable code for this error.
    #[must_use]
    pub const fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::MissingField(_) => (StatusCode::BAD_REQUEST, "missing_field"),
            Self::InvalidAmount(_) => (StatusCode::BAD_REQUEST, "invalid_amount"),
            Self::InvalidCurrency(_) => (StatusCode::BAD_REQUEST, "invalid_currency"),
            Self::NoRateAvailable => (StatusCode::BAD_REQUEST, "no_rate_available"),
            Self::InvalidRate(_) => (StatusCode::BAD_REQUEST, "invalid_rate"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            Self::DebtAlreadySettled(_) => (StatusCode::CONFLICT, "debt_already_settled"),
            Self::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let message = if let Self::Internal(msg) = &self {
            tracing::error!(error = %msg, "Internal server error");
            "An internal error occurred".to_string()
        } else {
            self.to_string()
        };

        let body = ErrorResponse {
            error: ErrorBody { code, message },
        };

        (status, axum::Json(body)).into_response()
    }
}

impl From<KassaError> for ApiError {
    fn from(err: KassaError) -> Self {
        match err {
            KassaError::MissingField(field) => Self::MissingField(field.to_string()),
            KassaError::InvalidAmount(msg) => Self::InvalidAmount(msg),
            KassaError::InvalidCurrency(code) => Self::InvalidCurrency(code),
            KassaError::NoRateAvailable => Self::NoRateAvailable,
            KassaError::InvalidRate(rate) => Self::InvalidRate(rate.to_string()),
            KassaError::NotFound { entity, id } => Self::NotFound(format!("{entity} {id}")),
            KassaError::DebtAlreadySettled { debt_id } => {
                Self::DebtAlreadySettled(debt_id.to_string())
            }
            KassaError::InvalidId(e) => Self::BadRequest(e.to_string()),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate { entity, key } => Self::Conflict(format!("{entity} {key}")),
            StoreError::Database(msg) | StoreError::Serialization(msg) => Self::Internal(msg),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}
