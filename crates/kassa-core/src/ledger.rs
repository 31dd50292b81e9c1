//! Append-only payment ledger.
//!
//! Debts and partners both keep their payment history in a [`Ledger`]. Entries
//! can only be appended; nothing reorders or removes them. Remaining balances
//! are computed by the owner of the ledger, not here.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::currency::Currency;
use crate::error::{KassaError, Result};

/// A single immutable ledger record.
pub trait LedgerEntry {
    /// Signed amount in the entry's own currency.
    fn amount(&self) -> Decimal;

    /// Currency the amount is expressed in.
    fn currency(&self) -> Currency;
}

/// Ordered, append-only sequence of ledger entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ledger<E> {
    entries: Vec<E>,
}

impl<E> Default for Ledger<E> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<E> Ledger<E> {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry at the end of the ledger.
    pub fn append(&mut self, entry: E) {
        self.entries.push(entry);
    }

    /// All entries, oldest first.
    #[must_use]
    pub fn entries(&self) -> &[E] {
        &self.entries
    }

    /// Iterate entries, oldest first.
    pub fn iter(&self) -> std::slice::Iter<'_, E> {
        self.entries.iter()
    }

    /// Most recent entry.
    #[must_use]
    pub fn last(&self) -> Option<&E> {
        self.entries.last()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the ledger has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<E: LedgerEntry> Ledger<E> {
    /// Raw sum of the entries recorded in `currency`, without conversion.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAmount` if the sum does not fit in a `Decimal`.
    pub fn sum_in(&self, currency: Currency) -> Result<Decimal> {
        self.entries
            .iter()
            .filter(|e| e.currency() == currency)
            .try_fold(Decimal::ZERO, |total, e| checked_add(total, e.amount()))
    }

    /// Per-currency raw totals of the whole ledger.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAmount` if any bucket overflows.
    pub fn totals(&self) -> Result<CurrencyTotals> {
        Ok(CurrencyTotals {
            usd: self.sum_in(Currency::Usd)?,
            sum: self.sum_in(Currency::Sum)?,
            kgs: self.sum_in(Currency::Kgs)?,
        })
    }
}

/// `total + amount`, or `InvalidAmount` when the result overflows.
pub(crate) fn checked_add(total: Decimal, amount: Decimal) -> Result<Decimal> {
    total
        .checked_add(amount)
        .ok_or_else(|| KassaError::InvalidAmount(format!("{total} + {amount} overflows")))
}

impl<E> FromIterator<E> for Ledger<E> {
    fn from_iter<I: IntoIterator<Item = E>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<'a, E> IntoIterator for &'a Ledger<E> {
    type Item = &'a E;
    type IntoIter = std::slice::Iter<'a, E>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Amounts broken down by payment currency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyTotals {
    /// Total taken in USD.
    pub usd: Decimal,
    /// Total taken in SUM.
    pub sum: Decimal,
    /// Total taken in KGS.
    pub kgs: Decimal,
}

impl CurrencyTotals {
    /// Add `amount` to the bucket for `currency`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAmount` if the bucket overflows; it is left unchanged.
    pub fn add(&mut self, currency: Currency, amount: Decimal) -> Result<()> {
        let bucket = match currency {
            Currency::Usd => &mut self.usd,
            Currency::Sum => &mut self.sum,
            Currency::Kgs => &mut self.kgs,
        };
        *bucket = checked_add(*bucket, amount)?;
        Ok(())
    }

    /// The bucket for `currency`.
    #[must_use]
    pub const fn get(&self, currency: Currency) -> Decimal {
        match currency {
            Currency::Usd => self.usd,
            Currency::Sum => self.sum,
            Currency::Kgs => self.kgs,
        }
    }

    /// Keyed by currency code, for report output.
    #[must_use]
    pub fn by_code(&self) -> BTreeMap<&'static str, Decimal> {
        Currency::ALL
            .into_iter()
            .map(|c| (c.code(), self.get(c)))
            .collect()
    }
}
