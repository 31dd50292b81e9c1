//! Debt handlers.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use kassa_core::{
    ClientId, Currency, Debt, DebtId, DebtPayment, DebtRef, DebtStatus, KassaError, LineItem,
    NewDebt, PaymentMethod, PaymentRequest, PaymentSummary, Product, ProductId, StoreId,
    StoreLocation,
};
use kassa_store::Store;

use crate::error::ApiError;
use crate::extract::Json;
use crate::state::AppState;

/// Create debt response.
#[derive(Debug, Serialize)]
pub struct CreateDebtResponse {
    /// Confirmation message.
    pub message: &'static str,
    /// The stored debt.
    pub debt: Debt,
}

/// Create a debt.
pub async fn create_debt(
    State(state): State<Arc<AppState>>,
    Json(input): Json<NewDebt>,
) -> Result<(StatusCode, Json<CreateDebtResponse>), ApiError> {
    let debt = state.engine.create_debt(input)?;

    Ok((
        StatusCode::CREATED,
        Json(CreateDebtResponse {
            message: "Debt created",
            debt,
        }),
    ))
}

/// Pay debt response.
#[derive(Debug, Serialize)]
pub struct PayDebtResponse {
    /// Confirmation message.
    pub message: &'static str,
    /// Debt state after the payment.
    #[serde(flatten)]
    pub summary: PaymentSummary,
}

/// Pay a debt, addressed by debt id or by the client's phone number.
pub async fn pay_debt(
    State(state): State<Arc<AppState>>,
    Path(reference): Path<String>,
    Json(request): Json<PaymentRequest>,
) -> Result<Json<PayDebtResponse>, ApiError> {
    let reference = DebtRef::parse(&reference)?;
    let summary = state.engine.pay_debt(&reference, request).await?;

    Ok(Json(PayDebtResponse {
        message: "Payment recorded",
        summary,
    }))
}

// ============================================================================
// Client debts
// ============================================================================

/// A line item with its product resolved.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemView {
    /// The line as stored.
    #[serde(flatten)]
    pub item: LineItem,
    /// The product, if it still exists.
    pub product: Option<Product>,
}

/// A payment with its point of sale resolved.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentView {
    /// The payment as stored.
    #[serde(flatten)]
    pub payment: DebtPayment,
    /// The point of sale, if registered.
    pub store: Option<StoreLocation>,
}

/// A debt with products and stores resolved.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebtView {
    /// Debt identifier.
    pub id: DebtId,
    /// Client owing the debt.
    pub client_id: Option<ClientId>,
    /// Point of sale that created the debt.
    pub store_id: StoreId,
    /// Line items.
    pub products: Vec<LineItemView>,
    /// Original obligation in USD.
    pub total_amount: Decimal,
    /// Remaining balance in USD.
    pub remaining_amount: Decimal,
    /// Lifecycle state.
    pub status: DebtStatus,
    /// When the debt falls due.
    pub due_date: NaiveDate,
    /// Payments, oldest first.
    pub payment_history: Vec<PaymentView>,
    /// Sale method.
    pub payment_method: PaymentMethod,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last change.
    pub updated_at: DateTime<Utc>,
}

/// Memoized product and store lookups for one response.
struct Resolver<'a> {
    store: &'a dyn Store,
    products: HashMap<ProductId, Option<Product>>,
    stores: HashMap<StoreId, Option<StoreLocation>>,
}

impl<'a> Resolver<'a> {
    fn new(store: &'a dyn Store) -> Self {
        Self {
            store,
            products: HashMap::new(),
            stores: HashMap::new(),
        }
    }

    fn product(&mut self, id: ProductId) -> Result<Option<Product>, ApiError> {
        if let Some(cached) = self.products.get(&id) {
            return Ok(cached.clone());
        }
        let product = self.store.get_product(&id)?;
        self.products.insert(id, product.clone());
        Ok(product)
    }

    fn store_location(&mut self, id: StoreId) -> Result<Option<StoreLocation>, ApiError> {
        if let Some(cached) = self.stores.get(&id) {
            return Ok(cached.clone());
        }
        let location = self.store.get_store_location(&id)?;
        self.stores.insert(id, location.clone());
        Ok(location)
    }

    fn debt(&mut self, debt: &Debt) -> Result<DebtView, ApiError> {
        let products = debt
            .products
            .iter()
            .map(|item| {
                Ok(LineItemView {
                    product: self.product(item.product_id)?,
                    item: item.clone(),
                })
            })
            .collect::<Result<_, ApiError>>()?;
        let payment_history = debt
            .payment_history()
            .iter()
            .map(|payment| {
                Ok(PaymentView {
                    store: self.store_location(payment.store_id)?,
                    payment: payment.clone(),
                })
            })
            .collect::<Result<_, ApiError>>()?;

        Ok(DebtView {
            id: debt.id,
            client_id: debt.client_id,
            store_id: debt.store_id,
            products,
            total_amount: debt.total_amount,
            remaining_amount: debt.remaining_amount(),
            status: debt.status(),
            due_date: debt.due_date,
            payment_history,
            payment_method: debt.payment_method,
            created_at: debt.created_at,
            updated_at: debt.updated_at,
        })
    }
}

/// List a client's debts, newest first.
pub async fn list_client_debts(
    State(state): State<Arc<AppState>>,
    Path(client_id): Path<String>,
) -> Result<Json<Vec<DebtView>>, ApiError> {
    let client_id: ClientId = client_id.parse().map_err(KassaError::from)?;
    let debts = state.store.list_debts_by_client(&client_id)?;
    tracing::debug!(client_id = %client_id, count = debts.len(), "Listing client debts");

    let mut resolver = Resolver::new(state.store.as_ref());
    let views = debts
        .iter()
        .map(|debt| resolver.debt(debt))
        .collect::<Result<_, _>>()?;

    Ok(Json(views))
}

// ============================================================================
// Debtors
// ============================================================================

/// Client contact on a debtor row.
#[derive(Debug, Clone, Serialize)]
pub struct DebtorClient {
    /// Client name.
    pub name: String,
    /// Client phone.
    pub phone: String,
    /// Client address.
    pub address: Option<String>,
}

/// Partner identity on a debtor row.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebtorPartner {
    /// Supplier display name.
    pub name_partner: String,
    /// Supplier phone or contract number.
    pub partner_number: String,
}

/// Product details on a debtor row.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebtorProduct {
    /// Product name.
    pub name: String,
    /// Product code.
    pub code: String,
    /// Size or model.
    pub size: String,
    /// Unit of measure.
    pub unit: String,
    /// Catalogue selling price.
    pub selling_price: Decimal,
    /// Purchase price.
    pub purchase_price: Decimal,
    /// Price currency.
    pub currency: Currency,
}

impl From<Product> for DebtorProduct {
    fn from(product: Product) -> Self {
        Self {
            name: product.name,
            code: product.code,
            size: product.size,
            unit: product.unit,
            selling_price: product.selling_price,
            purchase_price: product.purchase_price,
            currency: product.currency,
        }
    }
}

/// One line item of a pending debt.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebtorRow {
    /// `<debtId>_<productId>`.
    pub id: String,
    /// Debt the line belongs to.
    pub debt_id: DebtId,
    /// Client owing the debt.
    pub client: Option<DebtorClient>,
    /// Partner the goods came from.
    pub partner: Option<DebtorPartner>,
    /// Product sold.
    pub product: Option<DebtorProduct>,
    /// Quantity sold.
    pub quantity: Decimal,
    /// Unit of measure.
    pub unit: String,
    /// Unit price.
    pub selling_price: Decimal,
    /// Line total.
    pub total_amount: Decimal,
    /// Line currency.
    pub currency: Currency,
    /// Remaining balance of the whole debt, in USD.
    pub remaining_amount: Decimal,
    /// When the debt was created.
    pub created_at: DateTime<Utc>,
    /// When the debt falls due.
    pub due_date: NaiveDate,
}

/// List pending debts, one row per line item, newest debt first.
pub async fn list_debtors(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<DebtorRow>>, ApiError> {
    let store = state.store.as_ref();
    let mut rows = Vec::new();

    for debt in store.list_debts()? {
        if debt.status() != DebtStatus::Pending {
            continue;
        }

        let client = match &debt.client_id {
            Some(id) => store.get_client(id)?.map(|c| DebtorClient {
                name: c.name,
                phone: c.phone,
                address: c.address,
            }),
            None => None,
        };
        let partner = match &debt.partner_id {
            Some(id) => store.get_partner(id)?.map(|p| DebtorPartner {
                name_partner: p.name_partner,
                partner_number: p.partner_number,
            }),
            None => None,
        };

        for item in &debt.products {
            let product = store.get_product(&item.product_id)?.map(DebtorProduct::from);
            rows.push(DebtorRow {
                id: format!("{}_{}", debt.id, item.product_id),
                debt_id: debt.id,
                client: client.clone(),
                partner: partner.clone(),
                product,
                quantity: item.quantity,
                unit: item.unit.clone(),
                selling_price: item.selling_price,
                total_amount: item.total_amount,
                currency: item.currency,
                remaining_amount: debt.remaining_amount(),
                created_at: debt.created_at,
                due_date: debt.due_date,
            });
        }
    }

    tracing::debug!(rows = rows.len(), "Listing debtors");
    Ok(Json(rows))
}
