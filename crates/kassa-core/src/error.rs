//! Error types for kassa.

use rust_decimal::Decimal;

use crate::ids::{DebtId, IdError};

/// Result type for kassa domain operations.
pub type Result<T> = std::result::Result<T, KassaError>;

/// Errors raised by the reconciliation rules.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum KassaError {
    /// A required input field was absent.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// The amount is not a strictly positive number.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// The currency code is not one of USD, SUM or KGS.
    #[error("invalid currency: {0}")]
    InvalidCurrency(String),

    /// No exchange-rate snapshot has been configured.
    #[error("no exchange rate available")]
    NoRateAvailable,

    /// An exchange rate was zero or negative.
    #[error("exchange rate must be positive, got {0}")]
    InvalidRate(Decimal),

    /// A debt, client or partner could not be resolved.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of entity that was looked up.
        entity: &'static str,
        /// The identifier or lookup key.
        id: String,
    },

    /// A payment was attempted on a debt that is already paid.
    #[error("debt already settled: {debt_id}")]
    DebtAlreadySettled {
        /// The settled debt.
        debt_id: DebtId,
    },

    /// Invalid identifier.
    #[error("invalid identifier: {0}")]
    InvalidId(#[from] IdError),
}

impl KassaError {
    /// Shorthand for a [`KassaError::NotFound`].
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}
