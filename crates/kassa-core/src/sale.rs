//! Sale records derived from settled debts.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::currency::Currency;
use crate::debt::{Debt, LineItem, PaymentMethod};
use crate::ids::{ClientId, DebtId, PartnerId, ProductId, PromoId, SaleId, StoreId, WarehouseId};
use crate::ledger::CurrencyTotals;

/// Address recorded on a sale when the client has none.
pub const UNKNOWN_ADDRESS: &str = "unknown";

/// One sold line item, materialized when its debt is settled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    /// Sale identifier (time-ordered).
    pub id: SaleId,
    /// Debt this sale was settled from.
    pub debt_id: DebtId,
    /// Buying client.
    pub client_id: Option<ClientId>,
    /// Supplying partner.
    pub partner_id: Option<PartnerId>,
    /// Product sold.
    pub product_id: ProductId,
    /// Warehouse the goods left from.
    pub warehouse_id: WarehouseId,
    /// Point of sale that took the settling payment.
    pub store_id: StoreId,
    /// Quantity sold.
    pub quantity: Decimal,
    /// Unit of measure.
    pub unit: String,
    /// Unit price.
    pub selling_price: Decimal,
    /// Line total.
    pub total_amount: Decimal,
    /// Currency of the prices.
    pub currency: Currency,
    /// Promo applied to the line.
    pub promo_id: Option<PromoId>,
    /// Client shipping address, or [`UNKNOWN_ADDRESS`].
    pub client_address: String,
    /// Always `credit` for debt settlements.
    pub payment_method: PaymentMethod,
    /// Discount applied at settlement.
    pub discount: Decimal,
    /// Raw per-currency totals of the debt's payment history.
    pub payment: CurrencyTotals,
    /// When the sale was created.
    pub created_at: DateTime<Utc>,
}

impl Sale {
    /// Build the sale for one line item of a paid debt.
    #[must_use]
    pub fn from_line_item(
        debt: &Debt,
        item: &LineItem,
        store_id: StoreId,
        payment: CurrencyTotals,
        client_address: Option<&str>,
    ) -> Self {
        Self {
            id: SaleId::generate(),
            debt_id: debt.id,
            client_id: debt.client_id,
            partner_id: debt.partner_id,
            product_id: item.product_id,
            warehouse_id: item.warehouse_id,
            store_id,
            quantity: item.quantity,
            unit: item.unit.clone(),
            selling_price: item.selling_price,
            total_amount: item.total_amount,
            currency: item.currency,
            promo_id: item.promo_id,
            client_address: client_address
                .filter(|a| !a.trim().is_empty())
                .unwrap_or(UNKNOWN_ADDRESS)
                .to_string(),
            payment_method: PaymentMethod::Credit,
            discount: Decimal::ZERO,
            payment,
            created_at: Utc::now(),
        }
    }
}
