//! Column families used by the `RocksDB` backend.

/// Column family names for the `RocksDB` database.
pub mod cf {
    /// Debt records, keyed by `debt_id`.
    pub const DEBTS: &str = "debts";

    /// Index: debts by client, keyed by `client_id || debt_id`.
    /// Value is empty (index only).
    pub const DEBTS_BY_CLIENT: &str = "debts_by_client";

    /// Sale records, keyed by `sale_id` (ULID).
    pub const SALES: &str = "sales";

    /// Index: sales by point of sale, keyed by `store_id || sale_id`.
    pub const SALES_BY_STORE: &str = "sales_by_store";

    /// Index: sales by debt, keyed by `debt_id || sale_id`.
    pub const SALES_BY_DEBT: &str = "sales_by_debt";

    /// Partner records, keyed by `partner_id`.
    pub const PARTNERS: &str = "partners";

    /// Index: the partner supplying a product, keyed by `product_id`.
    /// Value is the `partner_id`.
    pub const PARTNERS_BY_PRODUCT: &str = "partners_by_product";

    /// Product records, keyed by `product_id`.
    pub const PRODUCTS: &str = "products";

    /// Client records, keyed by `client_id`.
    pub const CLIENTS: &str = "clients";

    /// Unique index: client by phone. Value is the `client_id`.
    pub const CLIENTS_BY_PHONE: &str = "clients_by_phone";

    /// Points of sale, keyed by `store_id`.
    pub const STORES: &str = "stores";

    /// Singleton settings such as the active exchange rate.
    pub const SETTINGS: &str = "settings";
}

/// Returns all column family names for database initialization.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![
        cf::DEBTS,
        cf::DEBTS_BY_CLIENT,
        cf::SALES,
        cf::SALES_BY_STORE,
        cf::SALES_BY_DEBT,
        cf::PARTNERS,
        cf::PARTNERS_BY_PRODUCT,
        cf::PRODUCTS,
        cf::CLIENTS,
        cf::CLIENTS_BY_PHONE,
        cf::STORES,
        cf::SETTINGS,
    ]
}
