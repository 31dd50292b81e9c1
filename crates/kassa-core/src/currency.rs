//! Currencies and conversion to the USD base.
//!
//! Every balance in kassa is kept in USD. Payments can be taken in USD, SUM or
//! KGS and are converted with the active [`ExchangeRate`] snapshot, which the
//! caller passes in explicitly.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{KassaError, Result};

/// Accepted payment currencies.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// US dollar, the base currency.
    #[default]
    Usd,
    /// Uzbek sum.
    Sum,
    /// Kyrgyz som.
    Kgs,
}

impl Currency {
    /// All supported currencies, base first.
    pub const ALL: [Self; 3] = [Self::Usd, Self::Sum, Self::Kgs];

    /// The currency code as it appears on the wire.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Usd => "USD",
            Self::Sum => "SUM",
            Self::Kgs => "KGS",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = KassaError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "USD" => Ok(Self::Usd),
            "SUM" => Ok(Self::Sum),
            "KGS" => Ok(Self::Kgs),
            other => Err(KassaError::InvalidCurrency(other.to_string())),
        }
    }
}

/// Exchange-rate snapshot: local currency units per one USD.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRate {
    /// SUM per USD.
    pub rate: Decimal,
    /// KGS per USD.
    pub kyg: Decimal,
    /// When the snapshot was last set.
    pub updated_at: DateTime<Utc>,
}

impl ExchangeRate {
    /// Create a snapshot, rejecting non-positive rates.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRate` if either rate is zero or negative.
    pub fn new(rate: Decimal, kyg: Decimal) -> Result<Self> {
        for value in [rate, kyg] {
            if value <= Decimal::ZERO {
                return Err(KassaError::InvalidRate(value));
            }
        }
        Ok(Self {
            rate,
            kyg,
            updated_at: Utc::now(),
        })
    }

    /// Convert `amount` in `currency` to USD.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRate` if the divisor is not positive, or `InvalidAmount`
    /// if the division overflows.
    pub fn to_usd(&self, amount: Decimal, currency: Currency) -> Result<Decimal> {
        let divisor = match currency {
            Currency::Usd => return Ok(amount),
            Currency::Sum => self.rate,
            Currency::Kgs => self.kyg,
        };
        if divisor <= Decimal::ZERO {
            return Err(KassaError::InvalidRate(divisor));
        }
        amount
            .checked_div(divisor)
            .ok_or_else(|| KassaError::InvalidAmount(format!("{amount} {currency} overflows")))
    }
}

/// Convert an amount given by currency code to USD.
///
/// # Errors
///
/// - `NoRateAvailable` if `snapshot` is `None`.
/// - `InvalidCurrency` if `currency` is not USD, SUM or KGS.
pub fn to_base_currency(
    amount: Decimal,
    currency: &str,
    snapshot: Option<&ExchangeRate>,
) -> Result<Decimal> {
    let snapshot = snapshot.ok_or(KassaError::NoRateAvailable)?;
    let currency: Currency = currency.parse()?;
    snapshot.to_usd(amount, currency)
}

/// Convert a typed amount to USD, only requiring a snapshot for local currencies.
///
/// # Errors
///
/// Returns `NoRateAvailable` for SUM or KGS without a snapshot.
pub fn to_usd(
    amount: Decimal,
    currency: Currency,
    snapshot: Option<&ExchangeRate>,
) -> Result<Decimal> {
    match (currency, snapshot) {
        (Currency::Usd, _) => Ok(amount),
        (_, Some(rate)) => rate.to_usd(amount, currency),
        (_, None) => Err(KassaError::NoRateAvailable),
    }
}
