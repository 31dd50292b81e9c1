//! Partner (supplier) balances.
//!
//! A partner's ledger is signed: inventory intake is recorded as a negative
//! charge and payments to the partner as positive entries. `remaining_debt`
//! is derived from `total_debt` and `paid_amount` and is recomputed by every
//! mutator and on deserialization; it cannot be set directly.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::currency::Currency;
use crate::error::{KassaError, Result};
use crate::ids::{PartnerId, ProductId};
use crate::ledger::{checked_add, Ledger, LedgerEntry};
use crate::product::Stock;

/// Ledger method for inventory intake charges.
pub const INTAKE_METHOD: &str = "debt";

/// Default note on intake charges.
pub const INTAKE_NOTE: &str = "intake";

/// A payment to, or an intake charge from, a partner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartnerEntry {
    /// Positive for payments, negative for intake charges.
    pub amount: Decimal,
    /// Currency of the entry.
    pub currency: Currency,
    /// Payment method, or [`INTAKE_METHOD`].
    pub method: String,
    /// When the entry was recorded.
    pub date: DateTime<Utc>,
    /// Free-form note.
    #[serde(default)]
    pub note: String,
}

impl LedgerEntry for PartnerEntry {
    fn amount(&self) -> Decimal {
        self.amount
    }

    fn currency(&self) -> Currency {
        self.currency
    }
}

/// A supplier with a running balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "PartnerRecord")]
pub struct Partner {
    /// Partner identifier.
    pub id: PartnerId,
    /// Product name this partner record was opened for.
    pub name: String,
    /// Display name of the supplier.
    pub name_partner: String,
    /// Supplier phone or contract number.
    pub partner_number: String,
    /// Supplier address.
    pub partner_address: String,
    /// Preferred settlement currency.
    pub currency: Option<Currency>,
    /// Product this partner supplies.
    pub product_id: Option<ProductId>,
    /// Quantities received from this partner so far.
    #[serde(default)]
    pub stock: Stock,
    total_debt: Decimal,
    paid_amount: Decimal,
    remaining_debt: Decimal,
    payment_history: Ledger<PartnerEntry>,
    /// When the partner was created.
    pub created_at: DateTime<Utc>,
    /// When the partner was last changed.
    pub updated_at: DateTime<Utc>,
}

/// Stored shape of a partner; `remaining_debt` is ignored on load.
#[derive(Deserialize)]
struct PartnerRecord {
    id: PartnerId,
    #[serde(default)]
    name: String,
    #[serde(default)]
    name_partner: String,
    #[serde(default)]
    partner_number: String,
    #[serde(default)]
    partner_address: String,
    #[serde(default)]
    currency: Option<Currency>,
    #[serde(default)]
    product_id: Option<ProductId>,
    #[serde(default)]
    stock: Stock,
    #[serde(default)]
    total_debt: Decimal,
    #[serde(default)]
    paid_amount: Decimal,
    #[serde(default)]
    payment_history: Ledger<PartnerEntry>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PartnerRecord> for Partner {
    fn from(record: PartnerRecord) -> Self {
        let mut partner = Self {
            id: record.id,
            name: record.name,
            name_partner: record.name_partner,
            partner_number: record.partner_number,
            partner_address: record.partner_address,
            currency: record.currency,
            product_id: record.product_id,
            stock: record.stock,
            total_debt: record.total_debt,
            paid_amount: record.paid_amount,
            remaining_debt: Decimal::ZERO,
            payment_history: record.payment_history,
            created_at: record.created_at,
            updated_at: record.updated_at,
        };
        partner.recompute();
        partner
    }
}

impl Partner {
    /// Create a partner with a zero balance.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: PartnerId::generate(),
            name: name.into(),
            name_partner: String::new(),
            partner_number: String::new(),
            partner_address: String::new(),
            currency: None,
            product_id: None,
            stock: Stock::default(),
            total_debt: Decimal::ZERO,
            paid_amount: Decimal::ZERO,
            remaining_debt: Decimal::ZERO,
            payment_history: Ledger::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Total charged by the partner so far.
    #[must_use]
    pub const fn total_debt(&self) -> Decimal {
        self.total_debt
    }

    /// Total paid to the partner so far.
    #[must_use]
    pub const fn paid_amount(&self) -> Decimal {
        self.paid_amount
    }

    /// `max(total_debt - paid_amount, 0)`.
    #[must_use]
    pub const fn remaining_debt(&self) -> Decimal {
        self.remaining_debt
    }

    /// Amount paid beyond `total_debt`, zero unless overpaid.
    #[must_use]
    pub fn credit_balance(&self) -> Decimal {
        (self.paid_amount - self.total_debt).max(Decimal::ZERO)
    }

    /// Signed ledger, oldest first.
    #[must_use]
    pub const fn payment_history(&self) -> &Ledger<PartnerEntry> {
        &self.payment_history
    }

    /// Pay down the partner balance.
    ///
    /// The currency falls back to the partner's own currency, then USD.
    /// Overpayment is accepted; the surplus shows up as
    /// [`Partner::credit_balance`]. Returns the recorded entry.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` if `amount` is not strictly positive or the paid
    ///   total would overflow.
    /// - `MissingField` if `method` is blank.
    pub fn pay(
        &mut self,
        amount: Decimal,
        method: &str,
        note: Option<String>,
        currency: Option<Currency>,
    ) -> Result<PartnerEntry> {
        if amount <= Decimal::ZERO {
            return Err(KassaError::InvalidAmount(format!(
                "payment must be positive, got {amount}"
            )));
        }
        if method.trim().is_empty() {
            return Err(KassaError::MissingField("method"));
        }
        let paid_amount = checked_add(self.paid_amount, amount)?;

        let now = Utc::now();
        let entry = PartnerEntry {
            amount,
            currency: currency.or(self.currency).unwrap_or_default(),
            method: method.to_string(),
            date: now,
            note: note.unwrap_or_default(),
        };
        self.payment_history.append(entry.clone());
        self.paid_amount = paid_amount;
        self.updated_at = now;
        self.recompute();

        Ok(entry)
    }

    /// Charge the partner for `quantity` units bought at `purchase_price`.
    ///
    /// Returns the charge added to `total_debt`. A zero charge records
    /// nothing.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAmount` if the price or quantity is negative, or if
    /// the charge or the new `total_debt` overflows.
    pub fn record_intake(
        &mut self,
        purchase_price: Decimal,
        quantity: Decimal,
        note: Option<String>,
    ) -> Result<Decimal> {
        if purchase_price < Decimal::ZERO || quantity < Decimal::ZERO {
            return Err(KassaError::InvalidAmount(format!(
                "intake of {quantity} at {purchase_price} is negative"
            )));
        }
        let charge = purchase_price
            .checked_mul(quantity)
            .ok_or_else(|| KassaError::InvalidAmount("intake charge overflows".into()))?;
        if charge.is_zero() {
            return Ok(charge);
        }
        let total_debt = checked_add(self.total_debt, charge)?;

        let now = Utc::now();
        self.total_debt = total_debt;
        self.payment_history.append(PartnerEntry {
            amount: -charge,
            currency: self.currency.unwrap_or_default(),
            method: INTAKE_METHOD.to_string(),
            date: now,
            note: note.unwrap_or_else(|| INTAKE_NOTE.to_string()),
        });
        self.updated_at = now;
        self.recompute();

        Ok(charge)
    }

    fn recompute(&mut self) {
        self.remaining_debt = (self.total_debt - self.paid_amount).max(Decimal::ZERO);
    }
}
