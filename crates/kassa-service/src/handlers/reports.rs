//! Daily payment views for a point of sale.
//!
//! Calendar days are evaluated in the configured report offset, not in UTC.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::State;
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use kassa_core::{
    Client, ClientId, Currency, CurrencyTotals, Debt, DebtId, KassaError, Sale, StoreId,
};
use kassa_store::Store;

use crate::error::ApiError;
use crate::extract::{Json, Query};
use crate::state::AppState;

/// Date format of the daily payments query.
const DAILY_DATE_FORMAT: &str = "%d-%m-%Y";

/// Date format of the daily report query.
const REPORT_DATE_FORMAT: &str = "%Y-%m-%d";

/// Timestamp format of a daily payment row.
const ROW_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Daily query parameters.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DailyQuery {
    /// The calendar day.
    pub date: Option<String>,
    /// Point of sale.
    pub store_id: Option<StoreId>,
}

impl DailyQuery {
    fn resolve(self, format: &str) -> Result<(NaiveDate, StoreId), ApiError> {
        let date = self.date.ok_or(KassaError::MissingField("date"))?;
        let store_id = self.store_id.ok_or(KassaError::MissingField("storeId"))?;
        let day = NaiveDate::parse_from_str(date.trim(), format)
            .map_err(|e| ApiError::BadRequest(format!("invalid date {date:?}: {e}")))?;
        Ok((day, store_id))
    }
}

fn same_day(at: DateTime<Utc>, day: NaiveDate, offset: FixedOffset) -> bool {
    at.with_timezone(&offset).date_naive() == day
}

// ============================================================================
// Daily payments
// ============================================================================

/// One payment taken at the store on the requested day.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyPaymentRow {
    /// Debt the payment was applied to.
    pub debtor_id: DebtId,
    /// Client owing the debt.
    pub client: Option<Client>,
    /// Amount in `currency`.
    pub amount: Decimal,
    /// Payment currency.
    pub currency: Currency,
    /// Local time of the payment.
    pub date: String,
    /// Name of the debt's first product.
    pub product: Option<String>,
}

/// Payments taken at a store on one day (`date` is DD-MM-YYYY).
pub async fn daily_payments(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DailyQuery>,
) -> Result<Json<Vec<DailyPaymentRow>>, ApiError> {
    let (day, store_id) = query.resolve(DAILY_DATE_FORMAT)?;
    let offset = state.config.report_offset();
    let store = state.store.as_ref();

    let mut rows = Vec::new();
    for debt in store.list_debts()? {
        let mut payments = debt
            .payments_on(day, offset)
            .filter(|p| p.store_id == store_id)
            .peekable();
        if payments.peek().is_none() {
            continue;
        }

        let client = lookup_client(store, debt.client_id.as_ref())?;
        let product = match debt.products.first() {
            Some(item) => store.get_product(&item.product_id)?.map(|p| p.name),
            None => None,
        };

        for payment in payments {
            rows.push(DailyPaymentRow {
                debtor_id: debt.id,
                client: client.clone(),
                amount: payment.amount,
                currency: payment.currency,
                date: payment
                    .date
                    .with_timezone(&offset)
                    .format(ROW_TIME_FORMAT)
                    .to_string(),
                product: product.clone(),
            });
        }
    }

    tracing::debug!(store_id = %store_id, %day, rows = rows.len(), "Daily payments");
    Ok(Json(rows))
}

fn lookup_client(store: &dyn Store, id: Option<&ClientId>) -> Result<Option<Client>, ApiError> {
    match id {
        Some(id) => Ok(store.get_client(id)?),
        None => Ok(None),
    }
}

// ============================================================================
// Daily report
// ============================================================================

/// USD figures of the day.
#[derive(Debug, Serialize)]
pub struct ReportSummary {
    /// Sales priced in USD.
    #[serde(rename = "totalSalesUSD")]
    pub total_sales_usd: Decimal,
    /// Debts opened, in USD.
    #[serde(rename = "totalDebtsUSD")]
    pub total_debts_usd: Decimal,
    /// Payments taken in USD.
    #[serde(rename = "totalPaymentsUSD")]
    pub total_payments_usd: Decimal,
}

/// Per-currency totals of the day.
#[derive(Debug, Serialize)]
pub struct ReportTotals {
    /// Sales by price currency.
    pub sales: BTreeMap<&'static str, Decimal>,
    /// Debts opened; debt totals are USD.
    pub debts: BTreeMap<&'static str, Decimal>,
    /// Payments by payment currency.
    pub payments: BTreeMap<&'static str, Decimal>,
}

/// A payment line of the report.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportPayment {
    /// Debt the payment was applied to.
    pub debt_id: DebtId,
    /// Client owing the debt.
    pub client_id: Option<ClientId>,
    /// Amount in `currency`.
    pub amount: Decimal,
    /// Payment currency.
    pub currency: Currency,
    /// When the payment was taken.
    pub date: DateTime<Utc>,
}

/// Records behind the report.
#[derive(Debug, Serialize)]
pub struct ReportDetails {
    /// Sales made that day.
    pub sales: Vec<Sale>,
    /// Debts opened that day.
    pub debts: Vec<Debt>,
    /// Payments taken that day.
    pub payments: Vec<ReportPayment>,
}

/// Daily report response.
#[derive(Debug, Serialize)]
pub struct DailyReport {
    /// The reported day.
    pub date: NaiveDate,
    /// Point of sale.
    #[serde(rename = "storeId")]
    pub store_id: StoreId,
    /// USD figures.
    pub summary: ReportSummary,
    /// Per-currency figures.
    pub totals: ReportTotals,
    /// The underlying records.
    pub details: ReportDetails,
}

/// Sales, debts and payments of a store on one day (`date` is YYYY-MM-DD).
pub async fn daily_report(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DailyQuery>,
) -> Result<Json<DailyReport>, ApiError> {
    let (day, store_id) = query.resolve(REPORT_DATE_FORMAT)?;
    let offset = state.config.report_offset();
    let store = state.store.as_ref();

    let sales: Vec<Sale> = store
        .list_sales_by_store(&store_id)?
        .into_iter()
        .filter(|sale| same_day(sale.created_at, day, offset))
        .collect();

    let mut debts = Vec::new();
    let mut payments = Vec::new();
    for debt in store.list_debts()? {
        payments.extend(
            debt.payments_on(day, offset)
                .filter(|p| p.store_id == store_id)
                .map(|p| ReportPayment {
                    debt_id: debt.id,
                    client_id: debt.client_id,
                    amount: p.amount,
                    currency: p.currency,
                    date: p.date,
                }),
        );
        if debt.store_id == store_id && same_day(debt.created_at, day, offset) {
            debts.push(debt);
        }
    }

    let mut sale_totals = CurrencyTotals::default();
    for sale in &sales {
        sale_totals.add(sale.currency, sale.total_amount)?;
    }
    let mut debt_totals = CurrencyTotals::default();
    for debt in &debts {
        debt_totals.add(Currency::Usd, debt.total_amount)?;
    }
    let mut payment_totals = CurrencyTotals::default();
    for payment in &payments {
        payment_totals.add(payment.currency, payment.amount)?;
    }

    tracing::debug!(
        store_id = %store_id,
        %day,
        sales = sales.len(),
        debts = debts.len(),
        payments = payments.len(),
        "Daily report"
    );

    Ok(Json(DailyReport {
        date: day,
        store_id,
        summary: ReportSummary {
            total_sales_usd: sale_totals.usd,
            total_debts_usd: debt_totals.usd,
            total_payments_usd: payment_totals.usd,
        },
        totals: ReportTotals {
            sales: sale_totals.by_code(),
            debts: debt_totals.by_code(),
            payments: payment_totals.by_code(),
        },
        details: ReportDetails {
            sales,
            debts,
            payments,
        },
    }))
}
