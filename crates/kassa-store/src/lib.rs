//! Storage layer for kassa.
//!
//! This crate persists debts, sales, partners, products, clients, points of
//! sale and the active exchange rate. Two backends implement [`Store`]:
//!
//! - [`MemoryStore`]: process-local tables behind one lock, used by default
//!   and in tests
//! - `RocksStore`: `RocksDB` with CBOR values and one column family per table,
//!   enabled with the `rocksdb-backend` feature
//!
//! # Atomicity
//!
//! Writes that touch more than one record go through a compound operation
//! ([`Store::settle_debt`], [`Store::put_intake`]) so that either all of
//! them land or none do. Serializing read-modify-write cycles on the same
//! record is the caller's job.
//!
//! # Example
//!
//! ```
//! use kassa_store::{MemoryStore, Store};
//! use kassa_core::StoreLocation;
//!
//! let store = MemoryStore::new();
//! let location = StoreLocation::new("Chorsu market").unwrap();
//! store.put_store_location(&location).unwrap();
//!
//! let found = store.get_store_location(&location.id).unwrap();
//! assert_eq!(found.map(|s| s.name), Some("Chorsu market".to_string()));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod keys;
pub mod memory;
#[cfg(feature = "rocksdb-backend")]
pub mod rocks;
pub mod schema;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
#[cfg(feature = "rocksdb-backend")]
pub use rocks::RocksStore;

use kassa_core::{
    Client, ClientId, Debt, DebtId, ExchangeRate, Partner, PartnerId, Product, ProductId,
    ProductIdentity, Sale, StoreId, StoreLocation,
};

/// The storage trait defining all database operations.
///
/// This trait abstracts the storage layer, allowing for different implementations
/// (e.g., `RocksDB`, in-memory for testing).
pub trait Store: Send + Sync {
    // =========================================================================
    // Exchange Rate
    // =========================================================================

    /// Get the active exchange-rate snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_rate(&self) -> Result<Option<ExchangeRate>>;

    /// Replace the active exchange-rate snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_rate(&self, rate: &ExchangeRate) -> Result<()>;

    // =========================================================================
    // Directory
    // =========================================================================

    /// Insert or update a client.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Duplicate` if another client has the same phone.
    fn put_client(&self, client: &Client) -> Result<()>;

    /// Get a client by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_client(&self, client_id: &ClientId) -> Result<Option<Client>>;

    /// Get a client by phone number.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_client_by_phone(&self, phone: &str) -> Result<Option<Client>>;

    /// Insert or update a point of sale.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_store_location(&self, location: &StoreLocation) -> Result<()>;

    /// Get a point of sale by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_store_location(&self, store_id: &StoreId) -> Result<Option<StoreLocation>>;

    // =========================================================================
    // Products & Partners
    // =========================================================================

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_product(&self, product_id: &ProductId) -> Result<Option<Product>>;

    /// Find the product with the given identity.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn find_product(&self, identity: &ProductIdentity) -> Result<Option<Product>>;

    /// Insert or update a partner.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_partner(&self, partner: &Partner) -> Result<()>;

    /// Get a partner by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_partner(&self, partner_id: &PartnerId) -> Result<Option<Partner>>;

    /// Get the partner linked to a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn find_partner_by_product(&self, product_id: &ProductId) -> Result<Option<Partner>>;

    // =========================================================================
    // Debts & Sales
    // =========================================================================

    /// Insert or update a debt.
    ///
    /// This also maintains the client index.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_debt(&self, debt: &Debt) -> Result<()>;

    /// Get a debt by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_debt(&self, debt_id: &DebtId) -> Result<Option<Debt>>;

    /// List all debts, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_debts(&self) -> Result<Vec<Debt>>;

    /// List the debts of a client, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_debts_by_client(&self, client_id: &ClientId) -> Result<Vec<Debt>>;

    /// The oldest pending debt of a client.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn find_pending_debt_by_client(&self, client_id: &ClientId) -> Result<Option<Debt>> {
        Ok(self
            .list_debts_by_client(client_id)?
            .into_iter()
            .filter(|d| !d.is_settled())
            .min_by_key(|d| d.created_at))
    }

    /// List the sales made at a point of sale, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_sales_by_store(&self, store_id: &StoreId) -> Result<Vec<Sale>>;

    /// List the sales settled from a debt.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_sales_by_debt(&self, debt_id: &DebtId) -> Result<Vec<Sale>>;

    // =========================================================================
    // Compound Operations
    // =========================================================================

    /// Write a debt together with the sales its settlement produced.
    ///
    /// Either the debt and every sale are written, or nothing is.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn settle_debt(&self, debt: &Debt, sales: &[Sale]) -> Result<()>;

    /// Write a received product together with the partner it is owed to.
    ///
    /// Either both are written, or nothing is.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_intake(&self, product: &Product, partner: Option<&Partner>) -> Result<()>;
}
