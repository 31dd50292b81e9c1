//! Common test utilities for kassa integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::http::StatusCode;
use axum::Router;
use axum_test::TestServer;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use kassa_core::{
    Client, ClientId, Debt, DebtId, ExchangeRate, Partner, PartnerId, Product, ProductId,
    ProductIdentity, Sale, StoreId, StoreLocation,
};
use kassa_service::{create_router, AppState, ServiceConfig};
use kassa_store::{MemoryStore, Store, StoreError};

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// The backing store, for assertions on persisted state.
    pub store: Arc<MemoryStore>,
    /// The store the service sees; writes can be made to fail.
    pub faults: Arc<FaultyStore>,
}

impl TestHarness {
    /// Create a new test harness with an empty in-memory store.
    pub fn new() -> Self {
        Self::with_config(ServiceConfig {
            listen_addr: "127.0.0.1:0".into(),
            ..ServiceConfig::default()
        })
    }

    /// Create a harness with a custom configuration.
    pub fn with_config(config: ServiceConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        let faults = Arc::new(FaultyStore::new(store.clone()));
        let state = AppState::new(faults.clone(), config);
        let router: Router = create_router(state);

        let server = TestServer::new(router).expect("Failed to create test server");

        Self {
            server,
            store,
            faults,
        }
    }

    /// Set the exchange rate.
    pub async fn set_rate(&self, rate: u32, kyg: u32) {
        self.server
            .put("/v1/rate")
            .json(&json!({ "rate": rate, "kyg": kyg }))
            .await
            .assert_status_ok();
    }

    /// Register a point of sale and return its id.
    pub async fn register_store(&self, name: &str) -> String {
        let response = self
            .server
            .post("/v1/stores")
            .json(&json!({ "name": name }))
            .await;
        response.assert_status(StatusCode::CREATED);
        id_of(&response.json::<Value>())
    }

    /// Register a client and return its id.
    pub async fn register_client(&self, name: &str, phone: &str, address: Option<&str>) -> String {
        let response = self
            .server
            .post("/v1/clients")
            .json(&json!({ "name": name, "phone": phone, "address": address }))
            .await;
        response.assert_status(StatusCode::CREATED);
        id_of(&response.json::<Value>())
    }

    /// Create a pending debt with `lines` line items and return its id.
    pub async fn create_debt(
        &self,
        client_id: Option<&str>,
        store_id: &str,
        total: u32,
        lines: usize,
    ) -> String {
        let response = self
            .server
            .post("/v1/debts")
            .json(&debt_body(client_id, store_id, total, lines))
            .await;
        response.assert_status(StatusCode::CREATED);
        id_of(&response.json::<Value>()["debt"])
    }

    /// Pay a debt by id or phone.
    pub async fn pay(&self, reference: &str, body: Value) -> axum_test::TestResponse {
        self.server
            .put(&format!("/v1/debts/pay/{reference}"))
            .json(&body)
            .await
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// A [`Store`] that passes everything through to a [`MemoryStore`] until
/// [`FaultyStore::fail_writes`] is called; from then on debt, partner and
/// intake writes fail with [`StoreError::Database`].
pub struct FaultyStore {
    inner: Arc<MemoryStore>,
    failing: AtomicBool,
}

impl FaultyStore {
    /// Wrap `inner` with writes enabled.
    pub fn new(inner: Arc<MemoryStore>) -> Self {
        Self {
            inner,
            failing: AtomicBool::new(false),
        }
    }

    /// Make every later debt, partner and intake write fail.
    pub fn fail_writes(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    fn check(&self) -> kassa_store::Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(StoreError::Database("disk full".into()))
        } else {
            Ok(())
        }
    }
}

impl Store for FaultyStore {
    fn get_rate(&self) -> kassa_store::Result<Option<ExchangeRate>> {
        self.inner.get_rate()
    }

    fn put_rate(&self, rate: &ExchangeRate) -> kassa_store::Result<()> {
        self.inner.put_rate(rate)
    }

    fn put_client(&self, client: &Client) -> kassa_store::Result<()> {
        self.inner.put_client(client)
    }

    fn get_client(&self, client_id: &ClientId) -> kassa_store::Result<Option<Client>> {
        self.inner.get_client(client_id)
    }

    fn get_client_by_phone(&self, phone: &str) -> kassa_store::Result<Option<Client>> {
        self.inner.get_client_by_phone(phone)
    }

    fn put_store_location(&self, location: &StoreLocation) -> kassa_store::Result<()> {
        self.inner.put_store_location(location)
    }

    fn get_store_location(
        &self,
        store_id: &StoreId,
    ) -> kassa_store::Result<Option<StoreLocation>> {
        self.inner.get_store_location(store_id)
    }

    fn get_product(&self, product_id: &ProductId) -> kassa_store::Result<Option<Product>> {
        self.inner.get_product(product_id)
    }

    fn find_product(&self, identity: &ProductIdentity) -> kassa_store::Result<Option<Product>> {
        self.inner.find_product(identity)
    }

    fn put_partner(&self, partner: &Partner) -> kassa_store::Result<()> {
        self.check()?;
        self.inner.put_partner(partner)
    }

    fn get_partner(&self, partner_id: &PartnerId) -> kassa_store::Result<Option<Partner>> {
        self.inner.get_partner(partner_id)
    }

    fn find_partner_by_product(
        &self,
        product_id: &ProductId,
    ) -> kassa_store::Result<Option<Partner>> {
        self.inner.find_partner_by_product(product_id)
    }

    fn put_debt(&self, debt: &Debt) -> kassa_store::Result<()> {
        self.check()?;
        self.inner.put_debt(debt)
    }

    fn get_debt(&self, debt_id: &DebtId) -> kassa_store::Result<Option<Debt>> {
        self.inner.get_debt(debt_id)
    }

    fn list_debts(&self) -> kassa_store::Result<Vec<Debt>> {
        self.inner.list_debts()
    }

    fn list_debts_by_client(&self, client_id: &ClientId) -> kassa_store::Result<Vec<Debt>> {
        self.inner.list_debts_by_client(client_id)
    }

    fn list_sales_by_store(&self, store_id: &StoreId) -> kassa_store::Result<Vec<Sale>> {
        self.inner.list_sales_by_store(store_id)
    }

    fn list_sales_by_debt(&self, debt_id: &DebtId) -> kassa_store::Result<Vec<Sale>> {
        self.inner.list_sales_by_debt(debt_id)
    }

    fn settle_debt(&self, debt: &Debt, sales: &[Sale]) -> kassa_store::Result<()> {
        self.check()?;
        self.inner.settle_debt(debt, sales)
    }

    fn put_intake(&self, product: &Product, partner: Option<&Partner>) -> kassa_store::Result<()> {
        self.check()?;
        self.inner.put_intake(product, partner)
    }
}

/// A debt request body with `lines` equal line items adding up to `total`.
pub fn debt_body(client_id: Option<&str>, store_id: &str, total: u32, lines: usize) -> Value {
    let count = u32::try_from(lines).expect("line count").max(1);
    let line_total = total / count;
    let products: Vec<Value> = (0..lines)
        .map(|_| {
            json!({
                "productId": uuid(),
                "warehouseId": uuid(),
                "quantity": 1,
                "unit": "piece",
                "sellingPrice": line_total,
                "totalAmount": line_total,
                "currency": "USD"
            })
        })
        .collect();

    json!({
        "clientId": client_id,
        "products": products,
        "totalAmount": total,
        "storeId": store_id,
        "dueDate": "2030-01-31"
    })
}

/// A USD payment body.
pub fn usd(amount: u32, store_id: &str) -> Value {
    json!({ "amount": amount, "currency": "USD", "storeId": store_id })
}

/// A fresh random identifier string.
pub fn uuid() -> String {
    kassa_core::ProductId::generate().to_string()
}

/// The `id` field of a JSON object.
pub fn id_of(value: &Value) -> String {
    value["id"].as_str().expect("id field").to_string()
}

/// Parse a decimal serialized as a JSON string.
pub fn decimal(value: &Value) -> Decimal {
    value
        .as_str()
        .unwrap_or_else(|| panic!("expected decimal string, got {value}"))
        .parse()
        .expect("valid decimal")
}
