//! Key encoding utilities for `RocksDB`.
//!
//! Primary keys are the 16 raw bytes of the record id. Index keys are
//! `owner_id (16 bytes) || record_id (16 bytes)` with an empty value, so a
//! prefix scan on the owner lists its records.

use kassa_core::{ClientId, DebtId, SaleId, StoreId};

/// Key of the active exchange rate in the settings column family.
pub const EXCHANGE_RATE_KEY: &[u8] = b"exchange_rate";

/// Create a two-part index key.
#[must_use]
pub fn index_key(owner: &[u8; 16], record: &[u8; 16]) -> Vec<u8> {
    let mut key = Vec::with_capacity(32);
    key.extend_from_slice(owner);
    key.extend_from_slice(record);
    key
}

/// Create a client-debt index key.
#[must_use]
pub fn client_debt_key(client_id: &ClientId, debt_id: &DebtId) -> Vec<u8> {
    index_key(client_id.as_bytes(), debt_id.as_bytes())
}

/// Create a store-sale index key.
///
/// Since ULIDs are time-ordered, sales for a store will be sorted by time.
#[must_use]
pub fn store_sale_key(store_id: &StoreId, sale_id: &SaleId) -> Vec<u8> {
    index_key(store_id.as_bytes(), &sale_id.to_bytes())
}

/// Create a debt-sale index key.
#[must_use]
pub fn debt_sale_key(debt_id: &DebtId, sale_id: &SaleId) -> Vec<u8> {
    index_key(debt_id.as_bytes(), &sale_id.to_bytes())
}

/// Key of the phone uniqueness index.
#[must_use]
pub fn phone_key(phone: &str) -> Vec<u8> {
    phone.as_bytes().to_vec()
}

/// The record half of an index key, or `None` for a malformed key.
#[must_use]
pub fn record_part(key: &[u8]) -> Option<[u8; 16]> {
    key.get(16..32)?.try_into().ok()
}

/// Decode a 16-byte id stored as a value.
#[must_use]
pub fn id_bytes(value: &[u8]) -> Option<[u8; 16]> {
    value.try_into().ok()
}
