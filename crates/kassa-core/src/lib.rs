//! Core types and reconciliation rules for kassa.
//!
//! This crate holds the domain model of the kassa back office and the rules
//! that keep balances consistent. It performs no I/O.
//!
//! - **Identifiers**: `DebtId`, `ClientId`, `PartnerId`, `ProductId`, `SaleId`, ...
//! - **Currency**: `Currency`, `ExchangeRate`, `to_base_currency`
//! - **Ledger**: `Ledger`, `LedgerEntry`, `CurrencyTotals`
//! - **Debts**: `Debt`, `DebtPayment`, `NewDebt`, `DebtRef`, `PaymentSummary`
//! - **Partners**: `Partner`, `PartnerEntry`
//! - **Inventory**: `Product`, `ProductIntake`, `receive_intake`
//! - **Directory**: `Client`, `StoreLocation`
//!
//! # Money
//!
//! Amounts are `rust_decimal::Decimal`. Debt balances are kept in USD; payments
//! keep the currency they were taken in and are converted with the active
//! exchange-rate snapshot when applied.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod currency;
pub mod debt;
pub mod directory;
pub mod error;
pub mod ids;
pub mod ledger;
pub mod partner;
pub mod product;
pub mod sale;
pub mod settlement;

pub use currency::{to_base_currency, to_usd, Currency, ExchangeRate};
pub use debt::{
    Debt, DebtPayment, DebtStatus, InitialPayment, LineItem, NewDebt, PaymentApplied,
    PaymentMethod, DEFAULT_PAYMENT_TYPE,
};
pub use directory::{Client, StoreLocation};
pub use error::{KassaError, Result};
pub use ids::{
    ClientId, DebtId, IdError, PartnerId, ProductId, PromoId, SaleId, StoreId, WarehouseId,
};
pub use ledger::{CurrencyTotals, Ledger, LedgerEntry};
pub use partner::{Partner, PartnerEntry, INTAKE_METHOD, INTAKE_NOTE};
pub use product::{
    receive_intake, IntakeOutcome, Product, ProductIdentity, ProductIntake, Stock,
};
pub use sale::{Sale, UNKNOWN_ADDRESS};
pub use settlement::{
    DebtRef, PartnerPaymentRequest, PaymentRequest, PaymentSummary, ValidPartnerPayment,
    ValidPayment,
};
