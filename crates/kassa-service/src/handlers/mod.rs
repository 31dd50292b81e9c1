//! API handlers.

pub mod debts;
pub mod directory;
pub mod health;
pub mod partners;
pub mod products;
pub mod rates;
pub mod reports;
