//! `RocksDB` storage implementation.
//!
//! This module provides the `RocksStore` implementation of the `Store` trait.

use std::path::Path;
use std::sync::Arc;

use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, Direction, IteratorMode,
    MultiThreaded, Options, WriteBatch,
};

use kassa_core::{
    Client, ClientId, Debt, DebtId, ExchangeRate, Partner, PartnerId, Product, ProductId,
    ProductIdentity, Sale, SaleId, StoreId, StoreLocation,
};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::schema::{all_column_families, cf};
use crate::Store;

/// RocksDB-backed storage implementation.
pub struct RocksStore {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
}

impl RocksStore {
    /// Open or create a `RocksDB` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = DBWithThreadMode::open_cf_descriptors(&opts, path.as_ref(), cf_descriptors)
            .map_err(|e| StoreError::Database(e.to_string()))?;
        tracing::info!(path = %path.as_ref().display(), "Opened RocksDB store");

        Ok(Self { db: Arc::new(db) })
    }

    /// Get a column family handle.
    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }

    /// Serialize a value using CBOR.
    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize a value from CBOR.
    fn deserialize<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
        ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    fn get_value<T: serde::de::DeserializeOwned>(
        &self,
        cf_name: &str,
        key: &[u8],
    ) -> Result<Option<T>> {
        let cf = self.cf(cf_name)?;
        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn put_value<T: serde::Serialize>(&self, cf_name: &str, key: &[u8], value: &T) -> Result<()> {
        let cf = self.cf(cf_name)?;
        let value = Self::serialize(value)?;
        self.db
            .put_cf(&cf, key, value)
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    /// Deserialize every value of a column family.
    fn scan<T: serde::de::DeserializeOwned>(&self, cf_name: &str) -> Result<Vec<T>> {
        let cf = self.cf(cf_name)?;
        self.db
            .iterator_cf(&cf, IteratorMode::Start)
            .map(|item| {
                let (_, value) = item.map_err(|e| StoreError::Database(e.to_string()))?;
                Self::deserialize(&value)
            })
            .collect()
    }

    /// Record ids of an index, in key order, for keys starting with `owner`.
    fn index_records(&self, cf_name: &str, owner: &[u8; 16]) -> Result<Vec<[u8; 16]>> {
        let cf = self.cf(cf_name)?;
        let mut records = Vec::new();
        for item in self
            .db
            .iterator_cf(&cf, IteratorMode::From(owner.as_slice(), Direction::Forward))
        {
            let (key, _) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            if !key.starts_with(owner.as_slice()) {
                break;
            }
            let record = keys::record_part(&key)
                .ok_or_else(|| StoreError::Database("malformed index key".into()))?;
            records.push(record);
        }
        Ok(records)
    }

    fn sales_by_index(&self, cf_name: &str, owner: &[u8; 16]) -> Result<Vec<Sale>> {
        let mut sales = Vec::new();
        for record in self.index_records(cf_name, owner)? {
            let sale_id = SaleId::from_bytes(record);
            if let Some(sale) = self.get_value(cf::SALES, &sale_id.to_bytes())? {
                sales.push(sale);
            }
        }
        Ok(sales)
    }

    /// Add a debt and its client index entry to a batch.
    fn batch_debt(&self, batch: &mut WriteBatch, debt: &Debt) -> Result<()> {
        let cf_debts = self.cf(cf::DEBTS)?;
        batch.put_cf(&cf_debts, debt.id.as_bytes(), Self::serialize(debt)?);
        if let Some(client_id) = &debt.client_id {
            let cf_by_client = self.cf(cf::DEBTS_BY_CLIENT)?;
            batch.put_cf(&cf_by_client, keys::client_debt_key(client_id, &debt.id), []);
        }
        Ok(())
    }

    /// Add a partner and its product index entry to a batch.
    fn batch_partner(&self, batch: &mut WriteBatch, partner: &Partner) -> Result<()> {
        let cf_partners = self.cf(cf::PARTNERS)?;
        batch.put_cf(&cf_partners, partner.id.as_bytes(), Self::serialize(partner)?);
        if let Some(product_id) = &partner.product_id {
            let cf_by_product = self.cf(cf::PARTNERS_BY_PRODUCT)?;
            batch.put_cf(&cf_by_product, product_id.as_bytes(), partner.id.as_bytes());
        }
        Ok(())
    }

    fn write(&self, batch: WriteBatch) -> Result<()> {
        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))
    }
}

fn newest_first(mut debts: Vec<Debt>) -> Vec<Debt> {
    debts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    debts
}

impl Store for RocksStore {
    // =========================================================================
    // Exchange Rate
    // =========================================================================

    fn get_rate(&self) -> Result<Option<ExchangeRate>> {
        self.get_value(cf::SETTINGS, keys::EXCHANGE_RATE_KEY)
    }

    fn put_rate(&self, rate: &ExchangeRate) -> Result<()> {
        self.put_value(cf::SETTINGS, keys::EXCHANGE_RATE_KEY, rate)
    }

    // =========================================================================
    // Directory
    // =========================================================================

    fn put_client(&self, client: &Client) -> Result<()> {
        let cf_clients = self.cf(cf::CLIENTS)?;
        let cf_by_phone = self.cf(cf::CLIENTS_BY_PHONE)?;
        let phone_key = keys::phone_key(&client.phone);

        let owner = self
            .db
            .get_cf(&cf_by_phone, &phone_key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .and_then(|value| keys::id_bytes(&value))
            .map(ClientId::from_bytes);
        if owner.is_some_and(|id| id != client.id) {
            return Err(StoreError::Duplicate {
                entity: "client phone",
                key: client.phone.clone(),
            });
        }

        let mut batch = WriteBatch::default();
        if let Some(previous) = self.get_client(&client.id)? {
            if previous.phone != client.phone {
                batch.delete_cf(&cf_by_phone, keys::phone_key(&previous.phone));
            }
        }
        batch.put_cf(&cf_clients, client.id.as_bytes(), Self::serialize(client)?);
        batch.put_cf(&cf_by_phone, &phone_key, client.id.as_bytes());
        self.write(batch)
    }

    fn get_client(&self, client_id: &ClientId) -> Result<Option<Client>> {
        self.get_value(cf::CLIENTS, client_id.as_bytes())
    }

    fn get_client_by_phone(&self, phone: &str) -> Result<Option<Client>> {
        let cf_by_phone = self.cf(cf::CLIENTS_BY_PHONE)?;
        let owner = self
            .db
            .get_cf(&cf_by_phone, keys::phone_key(phone))
            .map_err(|e| StoreError::Database(e.to_string()))?
            .and_then(|value| keys::id_bytes(&value))
            .map(ClientId::from_bytes);

        match owner {
            Some(client_id) => self.get_client(&client_id),
            None => Ok(None),
        }
    }

    fn put_store_location(&self, location: &StoreLocation) -> Result<()> {
        self.put_value(cf::STORES, location.id.as_bytes(), location)
    }

    fn get_store_location(&self, store_id: &StoreId) -> Result<Option<StoreLocation>> {
        self.get_value(cf::STORES, store_id.as_bytes())
    }

    // =========================================================================
    // Products & Partners
    // =========================================================================

    fn get_product(&self, product_id: &ProductId) -> Result<Option<Product>> {
        self.get_value(cf::PRODUCTS, product_id.as_bytes())
    }

    fn find_product(&self, identity: &ProductIdentity) -> Result<Option<Product>> {
        Ok(self
            .scan::<Product>(cf::PRODUCTS)?
            .into_iter()
            .find(|p| p.identity() == *identity))
    }

    fn put_partner(&self, partner: &Partner) -> Result<()> {
        let mut batch = WriteBatch::default();
        self.batch_partner(&mut batch, partner)?;
        self.write(batch)
    }

    fn get_partner(&self, partner_id: &PartnerId) -> Result<Option<Partner>> {
        self.get_value(cf::PARTNERS, partner_id.as_bytes())
    }

    fn find_partner_by_product(&self, product_id: &ProductId) -> Result<Option<Partner>> {
        let cf_by_product = self.cf(cf::PARTNERS_BY_PRODUCT)?;
        let owner = self
            .db
            .get_cf(&cf_by_product, product_id.as_bytes())
            .map_err(|e| StoreError::Database(e.to_string()))?
            .and_then(|value| keys::id_bytes(&value))
            .map(PartnerId::from_bytes);

        match owner {
            Some(partner_id) => self.get_partner(&partner_id),
            None => Ok(None),
        }
    }

    // =========================================================================
    // Debts & Sales
    // =========================================================================

    fn put_debt(&self, debt: &Debt) -> Result<()> {
        let mut batch = WriteBatch::default();
        self.batch_debt(&mut batch, debt)?;
        self.write(batch)
    }

    fn get_debt(&self, debt_id: &DebtId) -> Result<Option<Debt>> {
        self.get_value(cf::DEBTS, debt_id.as_bytes())
    }

    fn list_debts(&self) -> Result<Vec<Debt>> {
        Ok(newest_first(self.scan(cf::DEBTS)?))
    }

    fn list_debts_by_client(&self, client_id: &ClientId) -> Result<Vec<Debt>> {
        let mut debts = Vec::new();
        for record in self.index_records(cf::DEBTS_BY_CLIENT, client_id.as_bytes())? {
            if let Some(debt) = self.get_debt(&DebtId::from_bytes(record))? {
                debts.push(debt);
            }
        }
        Ok(newest_first(debts))
    }

    fn list_sales_by_store(&self, store_id: &StoreId) -> Result<Vec<Sale>> {
        self.sales_by_index(cf::SALES_BY_STORE, store_id.as_bytes())
    }

    fn list_sales_by_debt(&self, debt_id: &DebtId) -> Result<Vec<Sale>> {
        self.sales_by_index(cf::SALES_BY_DEBT, debt_id.as_bytes())
    }

    // =========================================================================
    // Compound Operations
    // =========================================================================

    fn settle_debt(&self, debt: &Debt, sales: &[Sale]) -> Result<()> {
        let cf_sales = self.cf(cf::SALES)?;
        let cf_by_store = self.cf(cf::SALES_BY_STORE)?;
        let cf_by_debt = self.cf(cf::SALES_BY_DEBT)?;

        let mut batch = WriteBatch::default();
        self.batch_debt(&mut batch, debt)?;
        for sale in sales {
            batch.put_cf(&cf_sales, sale.id.to_bytes(), Self::serialize(sale)?);
            batch.put_cf(&cf_by_store, keys::store_sale_key(&sale.store_id, &sale.id), []);
            batch.put_cf(&cf_by_debt, keys::debt_sale_key(&sale.debt_id, &sale.id), []);
        }
        self.write(batch)
    }

    fn put_intake(&self, product: &Product, partner: Option<&Partner>) -> Result<()> {
        let cf_products = self.cf(cf::PRODUCTS)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_products, product.id.as_bytes(), Self::serialize(product)?);
        if let Some(partner) = partner {
            self.batch_partner(&mut batch, partner)?;
        }
        self.write(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use kassa_core::{Currency, LineItem, NewDebt, WarehouseId};
    use rust_decimal_macros::dec;
    use tempfile::TempDir;

    fn create_test_store() -> (RocksStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = RocksStore::open(dir.path()).unwrap();
        (store, dir)
    }

    fn two_line_debt(client_id: ClientId) -> Debt {
        let line = || LineItem {
            product_id: ProductId::generate(),
            warehouse_id: WarehouseId::generate(),
            quantity: dec!(2),
            unit: "box".into(),
            selling_price: dec!(25),
            total_amount: dec!(50),
            currency: Currency::Usd,
            promo_id: None,
        };
        let input = NewDebt {
            client_id: Some(client_id),
            products: vec![line(), line()],
            total_amount: dec!(100),
            store_id: Some(StoreId::generate()),
            due_date: NaiveDate::from_ymd_opt(2030, 3, 1),
            ..NewDebt::default()
        };
        Debt::create(input, None).unwrap()
    }

    #[test]
    fn debt_roundtrip_keeps_private_state() {
        let (store, _dir) = create_test_store();
        let rate = ExchangeRate::new(dec!(12500), dec!(87.5)).unwrap();
        let mut debt = two_line_debt(ClientId::generate());
        let store_id = debt.store_id;
        debt.apply_payment(dec!(250000), "SUM", None, store_id, Some(&rate))
            .unwrap();
        store.put_debt(&debt).unwrap();

        let loaded = store.get_debt(&debt.id).unwrap().unwrap();
        assert_eq!(loaded, debt);
        assert_eq!(loaded.remaining_amount(), dec!(80));
    }

    #[test]
    fn settlement_writes_debt_and_sales_together() {
        let (store, _dir) = create_test_store();
        let rate = ExchangeRate::new(dec!(12500), dec!(87.5)).unwrap();
        let client_id = ClientId::generate();
        let mut debt = two_line_debt(client_id);
        store.put_debt(&debt).unwrap();

        let till = StoreId::generate();
        debt.apply_payment(dec!(100), "USD", None, till, Some(&rate))
            .unwrap();
        let sales = debt.materialize_sales(None).unwrap();
        store.settle_debt(&debt, &sales).unwrap();

        assert!(store.get_debt(&debt.id).unwrap().unwrap().is_settled());
        assert_eq!(store.list_sales_by_debt(&debt.id).unwrap().len(), 2);
        assert_eq!(store.list_sales_by_store(&till).unwrap().len(), 2);
        assert!(store.find_pending_debt_by_client(&client_id).unwrap().is_none());
    }

    #[test]
    fn client_phone_index() {
        let (store, _dir) = create_test_store();
        let client = Client::new("Aziz", "+998901234567", Some("Chilonzor".into())).unwrap();
        store.put_client(&client).unwrap();

        let found = store.get_client_by_phone("+998901234567").unwrap().unwrap();
        assert_eq!(found, client);

        let imposter = Client::new("Other", "+998901234567", None).unwrap();
        assert!(matches!(
            store.put_client(&imposter),
            Err(StoreError::Duplicate { .. })
        ));
    }

    #[test]
    fn partner_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let mut partner = Partner::new("Tea set");
        partner.record_intake(dec!(5), dec!(10), None).unwrap();
        partner.pay(dec!(20), "cash", None, None).unwrap();
        {
            let store = RocksStore::open(dir.path()).unwrap();
            store.put_partner(&partner).unwrap();
        }

        let store = RocksStore::open(dir.path()).unwrap();
        let loaded = store.get_partner(&partner.id).unwrap().unwrap();
        assert_eq!(loaded.remaining_debt(), dec!(30));
        assert_eq!(loaded.payment_history().len(), 2);
    }
}
