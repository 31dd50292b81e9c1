//! Payment requests against debts.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::currency::Currency;
use crate::debt::{Debt, DebtPayment, DebtStatus};
use crate::error::{KassaError, Result};
use crate::ids::{DebtId, PartnerId, StoreId};

/// How a payment names the debt it settles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DebtRef {
    /// A debt by its identifier.
    ById(DebtId),
    /// The pending debt of the client with this phone number.
    ByClientPhone(String),
}

impl DebtRef {
    /// Anything that parses as a debt id is one; everything else is a phone.
    ///
    /// # Errors
    ///
    /// Returns `MissingField` for a blank reference.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(KassaError::MissingField("id"));
        }
        Ok(raw
            .parse::<DebtId>()
            .map_or_else(|_| Self::ByClientPhone(raw.to_string()), Self::ById))
    }
}

impl fmt::Display for DebtRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ById(id) => write!(f, "debt {id}"),
            Self::ByClientPhone(phone) => write!(f, "client phone {phone}"),
        }
    }
}

/// Body of a debt payment.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaymentRequest {
    /// Amount in `currency`.
    pub amount: Option<Decimal>,
    /// Currency code: USD, SUM or KGS.
    pub currency: Option<String>,
    /// Free-form payment tag.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Point of sale taking the payment.
    pub store_id: Option<StoreId>,
}

/// A payment request with its required fields present.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidPayment {
    /// Amount in `currency`.
    pub amount: Decimal,
    /// Currency code, not yet parsed.
    pub currency: String,
    /// Free-form payment tag.
    pub kind: Option<String>,
    /// Point of sale taking the payment.
    pub store_id: StoreId,
}

impl PaymentRequest {
    /// Check that every required field is present.
    ///
    /// # Errors
    ///
    /// Returns `MissingField` for an absent store, amount or currency.
    pub fn validate(self) -> Result<ValidPayment> {
        let store_id = self.store_id.ok_or(KassaError::MissingField("storeId"))?;
        let amount = self.amount.ok_or(KassaError::MissingField("amount"))?;
        let currency = self.currency.ok_or(KassaError::MissingField("currency"))?;
        Ok(ValidPayment {
            amount,
            currency,
            kind: self.kind,
            store_id,
        })
    }
}

/// Body of a partner payment.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PartnerPaymentRequest {
    /// Partner being paid.
    pub partner_id: Option<PartnerId>,
    /// Amount paid.
    pub amount: Option<Decimal>,
    /// Payment method (cash, card, bank, ...).
    pub method: Option<String>,
    /// Free-form note.
    pub note: Option<String>,
    /// Payment currency; the partner's own currency when absent.
    pub currency: Option<Currency>,
}

/// A partner payment with its required fields present.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidPartnerPayment {
    /// Partner being paid.
    pub partner_id: PartnerId,
    /// Amount paid, strictly positive.
    pub amount: Decimal,
    /// Payment method.
    pub method: String,
    /// Free-form note.
    pub note: Option<String>,
    /// Explicit payment currency.
    pub currency: Option<Currency>,
}

impl PartnerPaymentRequest {
    /// Check required fields and the amount sign.
    ///
    /// # Errors
    ///
    /// - `MissingField` for an absent partner, amount or method.
    /// - `InvalidAmount` if the amount is not strictly positive.
    pub fn validate(self) -> Result<ValidPartnerPayment> {
        let partner_id = self.partner_id.ok_or(KassaError::MissingField("partnerId"))?;
        let amount = self.amount.ok_or(KassaError::MissingField("amount"))?;
        let method = self
            .method
            .filter(|m| !m.trim().is_empty())
            .ok_or(KassaError::MissingField("method"))?;
        if amount <= Decimal::ZERO {
            return Err(KassaError::InvalidAmount(format!(
                "payment must be positive, got {amount}"
            )));
        }
        Ok(ValidPartnerPayment {
            partner_id,
            amount,
            method,
            note: self.note,
            currency: self.currency,
        })
    }
}

/// State of a debt after a payment.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSummary {
    /// Debt that was paid.
    pub debt_id: DebtId,
    /// Remaining balance in USD.
    pub remaining_amount: Decimal,
    /// Original obligation in USD.
    pub total_amount: Decimal,
    /// Status after the payment.
    pub status: DebtStatus,
    /// Full payment history.
    pub payment_history: Vec<DebtPayment>,
    /// When the debt was last changed.
    pub updated_at: DateTime<Utc>,
}

impl From<&Debt> for PaymentSummary {
    fn from(debt: &Debt) -> Self {
        Self {
            debt_id: debt.id,
            remaining_amount: debt.remaining_amount(),
            total_amount: debt.total_amount,
            status: debt.status(),
            payment_history: debt.payment_history().entries().to_vec(),
            updated_at: debt.updated_at,
        }
    }
}
