//! In-memory storage implementation.
//!
//! All tables live behind a single `RwLock`, so every trait method, compound
//! operations included, is applied atomically.

use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use kassa_core::{
    Client, ClientId, Debt, DebtId, ExchangeRate, Partner, PartnerId, Product, ProductId,
    ProductIdentity, Sale, SaleId, StoreId, StoreLocation,
};

use crate::error::{Result, StoreError};
use crate::Store;

#[derive(Default)]
struct Tables {
    rate: Option<ExchangeRate>,
    clients: HashMap<ClientId, Client>,
    clients_by_phone: HashMap<String, ClientId>,
    stores: HashMap<StoreId, StoreLocation>,
    products: HashMap<ProductId, Product>,
    partners: HashMap<PartnerId, Partner>,
    partners_by_product: HashMap<ProductId, PartnerId>,
    debts: HashMap<DebtId, Debt>,
    sales: BTreeMap<SaleId, Sale>,
}

impl Tables {
    fn insert_partner(&mut self, partner: &Partner) {
        if let Some(product_id) = partner.product_id {
            self.partners_by_product.insert(product_id, partner.id);
        }
        self.partners.insert(partner.id, partner.clone());
    }
}

/// Process-local storage for tests and single-node deployments without a disk.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|e| StoreError::Database(e.to_string()))
    }
}

fn newest_first(mut debts: Vec<Debt>) -> Vec<Debt> {
    debts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    debts
}

impl Store for MemoryStore {
    // =========================================================================
    // Exchange Rate
    // =========================================================================

    fn get_rate(&self) -> Result<Option<ExchangeRate>> {
        Ok(self.read()?.rate.clone())
    }

    fn put_rate(&self, rate: &ExchangeRate) -> Result<()> {
        self.write()?.rate = Some(rate.clone());
        Ok(())
    }

    // =========================================================================
    // Directory
    // =========================================================================

    fn put_client(&self, client: &Client) -> Result<()> {
        let mut tables = self.write()?;
        if let Some(owner) = tables.clients_by_phone.get(&client.phone) {
            if *owner != client.id {
                return Err(StoreError::Duplicate {
                    entity: "client phone",
                    key: client.phone.clone(),
                });
            }
        }
        if let Some(previous) = tables.clients.get(&client.id).map(|c| c.phone.clone()) {
            tables.clients_by_phone.remove(&previous);
        }
        tables
            .clients_by_phone
            .insert(client.phone.clone(), client.id);
        tables.clients.insert(client.id, client.clone());
        Ok(())
    }

    fn get_client(&self, client_id: &ClientId) -> Result<Option<Client>> {
        Ok(self.read()?.clients.get(client_id).cloned())
    }

    fn get_client_by_phone(&self, phone: &str) -> Result<Option<Client>> {
        let tables = self.read()?;
        Ok(tables
            .clients_by_phone
            .get(phone)
            .and_then(|id| tables.clients.get(id))
            .cloned())
    }

    fn put_store_location(&self, location: &StoreLocation) -> Result<()> {
        self.write()?.stores.insert(location.id, location.clone());
        Ok(())
    }

    fn get_store_location(&self, store_id: &StoreId) -> Result<Option<StoreLocation>> {
        Ok(self.read()?.stores.get(store_id).cloned())
    }

    // =========================================================================
    // Products & Partners
    // =========================================================================

    fn get_product(&self, product_id: &ProductId) -> Result<Option<Product>> {
        Ok(self.read()?.products.get(product_id).cloned())
    }

    fn find_product(&self, identity: &ProductIdentity) -> Result<Option<Product>> {
        Ok(self
            .read()?
            .products
            .values()
            .find(|p| p.identity() == *identity)
            .cloned())
    }

    fn put_partner(&self, partner: &Partner) -> Result<()> {
        self.write()?.insert_partner(partner);
        Ok(())
    }

    fn get_partner(&self, partner_id: &PartnerId) -> Result<Option<Partner>> {
        Ok(self.read()?.partners.get(partner_id).cloned())
    }

    fn find_partner_by_product(&self, product_id: &ProductId) -> Result<Option<Partner>> {
        let tables = self.read()?;
        Ok(tables
            .partners_by_product
            .get(product_id)
            .and_then(|id| tables.partners.get(id))
            .cloned())
    }

    // =========================================================================
    // Debts & Sales
    // =========================================================================

    fn put_debt(&self, debt: &Debt) -> Result<()> {
        self.write()?.debts.insert(debt.id, debt.clone());
        Ok(())
    }

    fn get_debt(&self, debt_id: &DebtId) -> Result<Option<Debt>> {
        Ok(self.read()?.debts.get(debt_id).cloned())
    }

    fn list_debts(&self) -> Result<Vec<Debt>> {
        Ok(newest_first(self.read()?.debts.values().cloned().collect()))
    }

    fn list_debts_by_client(&self, client_id: &ClientId) -> Result<Vec<Debt>> {
        Ok(newest_first(
            self.read()?
                .debts
                .values()
                .filter(|d| d.client_id.as_ref() == Some(client_id))
                .cloned()
                .collect(),
        ))
    }

    fn list_sales_by_store(&self, store_id: &StoreId) -> Result<Vec<Sale>> {
        Ok(self
            .read()?
            .sales
            .values()
            .filter(|s| s.store_id == *store_id)
            .cloned()
            .collect())
    }

    fn list_sales_by_debt(&self, debt_id: &DebtId) -> Result<Vec<Sale>> {
        Ok(self
            .read()?
            .sales
            .values()
            .filter(|s| s.debt_id == *debt_id)
            .cloned()
            .collect())
    }

    // =========================================================================
    // Compound Operations
    // =========================================================================

    fn settle_debt(&self, debt: &Debt, sales: &[Sale]) -> Result<()> {
        let mut tables = self.write()?;
        tables.debts.insert(debt.id, debt.clone());
        for sale in sales {
            tables.sales.insert(sale.id, sale.clone());
        }
        Ok(())
    }

    fn put_intake(&self, product: &Product, partner: Option<&Partner>) -> Result<()> {
        let mut tables = self.write()?;
        tables.products.insert(product.id, product.clone());
        if let Some(partner) = partner {
            tables.insert_partner(partner);
        }
        Ok(())
    }
}
