//! Kassa HTTP API Service.
//!
//! This crate provides the HTTP API of the kassa back office:
//!
//! - Client debts: creation, partial payments and settlement into sales
//! - Partner (supplier) balances and payments
//! - Product intake
//! - Daily payment views per point of sale
//!
//! # Consistency
//!
//! Every write goes through the [`Engine`], which serializes changes per
//! debt, partner and product and persists each change with one atomic store
//! write.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Handlers are async for the router

pub mod config;
pub mod engine;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod locks;
pub mod routes;
pub mod state;

pub use config::ServiceConfig;
pub use engine::Engine;
pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
