//! Client debts.
//!
//! A [`Debt`] is a client's outstanding obligation for a bundle of line items.
//! It starts `pending`, is paid down by [`Debt::apply_payment`] and becomes
//! `paid` once the remaining amount reaches zero. A paid debt is terminal.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::currency::{self, Currency, ExchangeRate};
use crate::error::{KassaError, Result};
use crate::ids::{ClientId, DebtId, PartnerId, ProductId, PromoId, StoreId, WarehouseId};
use crate::ledger::{checked_add, Ledger, LedgerEntry};
use crate::sale::Sale;

/// Payment tag used when the caller does not provide one.
pub const DEFAULT_PAYMENT_TYPE: &str = "cash";

fn default_payment_type() -> String {
    DEFAULT_PAYMENT_TYPE.to_string()
}

/// Lifecycle state of a debt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebtStatus {
    /// Still has a remaining balance.
    #[default]
    Pending,
    /// Fully paid; no further mutation is allowed.
    Paid,
}

/// How the goods behind a debt were sold.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Paid in cash.
    Cash,
    /// Paid by card.
    Card,
    /// Sold on credit.
    #[default]
    Credit,
}

/// One product line of a debt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    /// Product sold.
    pub product_id: ProductId,
    /// Warehouse the goods left from.
    pub warehouse_id: WarehouseId,
    /// Quantity sold, in `unit`.
    pub quantity: Decimal,
    /// Unit of measure (piece, box, kg, ...).
    pub unit: String,
    /// Unit price.
    pub selling_price: Decimal,
    /// Line total.
    pub total_amount: Decimal,
    /// Currency of the prices.
    pub currency: Currency,
    /// Promo code applied to the line.
    #[serde(default)]
    pub promo_id: Option<PromoId>,
}

/// A payment recorded against a debt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebtPayment {
    /// Amount in `currency`.
    pub amount: Decimal,
    /// Currency the payment was taken in.
    pub currency: Currency,
    /// When the payment was taken.
    pub date: DateTime<Utc>,
    /// Free-form payment tag (cash, card, ...).
    #[serde(rename = "type", default = "default_payment_type")]
    pub kind: String,
    /// Point of sale that took the payment.
    pub store_id: StoreId,
}

impl LedgerEntry for DebtPayment {
    fn amount(&self) -> Decimal {
        self.amount
    }

    fn currency(&self) -> Currency {
        self.currency
    }
}

/// A payment supplied when the debt is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitialPayment {
    /// Amount in `currency`.
    pub amount: Decimal,
    /// Payment currency.
    #[serde(default)]
    pub currency: Currency,
    /// Defaults to the creation time.
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    /// Free-form payment tag.
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

/// Input for [`Debt::create`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDebt {
    /// Client owing the debt.
    #[serde(default)]
    pub client_id: Option<ClientId>,
    /// Partner the goods came from.
    #[serde(default)]
    pub partner_id: Option<PartnerId>,
    /// Line items.
    #[serde(default)]
    pub products: Vec<LineItem>,
    /// Original obligation in USD.
    #[serde(default)]
    pub total_amount: Decimal,
    /// Payments made up front.
    #[serde(default)]
    pub payment_history: Vec<InitialPayment>,
    /// Point of sale creating the debt.
    #[serde(default)]
    pub store_id: Option<StoreId>,
    /// When the debt falls due.
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    /// Sale method, `credit` unless stated.
    #[serde(default)]
    pub payment_method: PaymentMethod,
}

/// Result of applying one payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentApplied {
    /// The payment converted to USD.
    pub converted: Decimal,
    /// Whether this payment settled the debt.
    pub settled: bool,
}

/// A client's outstanding obligation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Debt {
    /// Debt identifier.
    pub id: DebtId,
    /// Client owing the debt.
    pub client_id: Option<ClientId>,
    /// Partner the goods came from.
    pub partner_id: Option<PartnerId>,
    /// Point of sale that created the debt.
    pub store_id: StoreId,
    /// Line items, in order.
    pub products: Vec<LineItem>,
    /// Original obligation in USD.
    pub total_amount: Decimal,
    remaining_amount: Decimal,
    status: DebtStatus,
    /// When the debt falls due.
    pub due_date: NaiveDate,
    payment_history: Ledger<DebtPayment>,
    /// Sale method.
    #[serde(default)]
    pub payment_method: PaymentMethod,
    /// When the debt was created.
    pub created_at: DateTime<Utc>,
    /// When the debt was last changed.
    pub updated_at: DateTime<Utc>,
}

impl Debt {
    /// Create a debt, applying any up-front payments.
    ///
    /// Initial payments are converted to USD like later payments, so a
    /// SUM or KGS initial payment requires a rate snapshot.
    ///
    /// # Errors
    ///
    /// - `MissingField` if `store_id` or `due_date` is absent.
    /// - `InvalidAmount` for a negative total, a non-positive payment or
    ///   payments whose sum overflows.
    /// - `NoRateAvailable` for a local-currency payment without `rate`.
    pub fn create(input: NewDebt, rate: Option<&ExchangeRate>) -> Result<Self> {
        let store_id = input.store_id.ok_or(KassaError::MissingField("storeId"))?;
        let due_date = input.due_date.ok_or(KassaError::MissingField("dueDate"))?;

        if input.total_amount < Decimal::ZERO {
            return Err(KassaError::InvalidAmount(format!(
                "total amount must not be negative, got {}",
                input.total_amount
            )));
        }

        let now = Utc::now();
        let mut history = Ledger::new();
        let mut paid = Decimal::ZERO;
        for payment in input.payment_history {
            ensure_positive(payment.amount)?;
            paid = checked_add(
                paid,
                currency::to_usd(payment.amount, payment.currency, rate)?,
            )?;
            history.append(DebtPayment {
                amount: payment.amount,
                currency: payment.currency,
                date: payment.date.unwrap_or(now),
                kind: payment.kind.unwrap_or_else(default_payment_type),
                store_id,
            });
        }
        // Settlement needs the per-currency breakdown.
        history.totals()?;

        let remaining = (input.total_amount - paid).max(Decimal::ZERO);
        let status = if remaining <= Decimal::ZERO {
            DebtStatus::Paid
        } else {
            DebtStatus::Pending
        };

        Ok(Self {
            id: DebtId::generate(),
            client_id: input.client_id,
            partner_id: input.partner_id,
            store_id,
            products: input.products,
            total_amount: input.total_amount,
            remaining_amount: remaining,
            status,
            due_date,
            payment_history: history,
            payment_method: input.payment_method,
            created_at: now,
            updated_at: now,
        })
    }

    /// Remaining balance in USD.
    #[must_use]
    pub const fn remaining_amount(&self) -> Decimal {
        self.remaining_amount
    }

    /// Current status.
    #[must_use]
    pub const fn status(&self) -> DebtStatus {
        self.status
    }

    /// Whether the debt is fully paid.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.status == DebtStatus::Paid
    }

    /// Payment history, oldest first.
    #[must_use]
    pub const fn payment_history(&self) -> &Ledger<DebtPayment> {
        &self.payment_history
    }

    /// Record a payment and reduce the remaining balance.
    ///
    /// All validation happens before anything is mutated, so on error the
    /// debt is unchanged.
    ///
    /// # Errors
    ///
    /// - `DebtAlreadySettled` if the debt is already paid.
    /// - `InvalidAmount` if `amount` is not strictly positive, or if the
    ///   history's total in `currency` would overflow.
    /// - `NoRateAvailable` if `rate` is `None`.
    /// - `InvalidCurrency` if `currency` is not a supported code.
    pub fn apply_payment(
        &mut self,
        amount: Decimal,
        currency: &str,
        kind: Option<String>,
        store_id: StoreId,
        rate: Option<&ExchangeRate>,
    ) -> Result<PaymentApplied> {
        if self.is_settled() {
            return Err(KassaError::DebtAlreadySettled { debt_id: self.id });
        }
        ensure_positive(amount)?;
        let converted = currency::to_base_currency(amount, currency, rate)?;
        let currency: Currency = currency.parse()?;
        checked_add(self.payment_history.sum_in(currency)?, amount)?;

        let now = Utc::now();
        self.payment_history.append(DebtPayment {
            amount,
            currency,
            date: now,
            kind: kind.unwrap_or_else(default_payment_type),
            store_id,
        });
        self.remaining_amount = (self.remaining_amount - converted).max(Decimal::ZERO);
        self.updated_at = now;

        let settled = self.remaining_amount <= Decimal::ZERO;
        if settled {
            self.status = DebtStatus::Paid;
            self.remaining_amount = Decimal::ZERO;
        }

        Ok(PaymentApplied { converted, settled })
    }

    /// Build one sale per line item for a paid debt.
    ///
    /// The sale's store is the one that took the final payment. Returns an
    /// empty list while the debt is still pending.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAmount` if the payment breakdown overflows.
    pub fn materialize_sales(&self, client_address: Option<&str>) -> Result<Vec<Sale>> {
        if !self.is_settled() {
            return Ok(Vec::new());
        }
        let store_id = self
            .payment_history
            .last()
            .map_or(self.store_id, |p| p.store_id);
        let breakdown = self.payment_history.totals()?;

        Ok(self
            .products
            .iter()
            .map(|item| Sale::from_line_item(self, item, store_id, breakdown, client_address))
            .collect())
    }

    /// Payments recorded on the given calendar day, as seen from `offset`.
    pub fn payments_on(
        &self,
        day: NaiveDate,
        offset: chrono::FixedOffset,
    ) -> impl Iterator<Item = &DebtPayment> {
        self.payment_history
            .iter()
            .filter(move |p| p.date.with_timezone(&offset).date_naive() == day)
    }
}

fn ensure_positive(amount: Decimal) -> Result<()> {
    if amount > Decimal::ZERO {
        Ok(())
    } else {
        Err(KassaError::InvalidAmount(format!(
            "amount must be positive, got {amount}"
        )))
    }
}
