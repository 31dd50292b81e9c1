//! Clients and points of sale.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{KassaError, Result};
use crate::ids::{ClientId, StoreId};

/// A buying client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    /// Client identifier.
    pub id: ClientId,
    /// Full name.
    pub name: String,
    /// Phone number, unique across clients.
    pub phone: String,
    /// Shipping address.
    #[serde(default)]
    pub address: Option<String>,
    /// When the client was registered.
    pub created_at: DateTime<Utc>,
}

impl Client {
    /// Register a client.
    ///
    /// # Errors
    ///
    /// Returns `MissingField` if `name` or `phone` is blank.
    pub fn new(name: &str, phone: &str, address: Option<String>) -> Result<Self> {
        let name = name.trim();
        let phone = phone.trim();
        if name.is_empty() {
            return Err(KassaError::MissingField("name"));
        }
        if phone.is_empty() {
            return Err(KassaError::MissingField("phone"));
        }
        Ok(Self {
            id: ClientId::generate(),
            name: name.to_string(),
            phone: phone.to_string(),
            address: address.filter(|a| !a.trim().is_empty()),
            created_at: Utc::now(),
        })
    }
}

/// A point of sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreLocation {
    /// Store identifier.
    pub id: StoreId,
    /// Display name.
    pub name: String,
    /// When the store was registered.
    pub created_at: DateTime<Utc>,
}

impl StoreLocation {
    /// Register a point of sale.
    ///
    /// # Errors
    ///
    /// Returns `MissingField` if `name` is blank.
    pub fn new(name: &str) -> Result<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(KassaError::MissingField("name"));
        }
        Ok(Self {
            id: StoreId::generate(),
            name: name.to_string(),
            created_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_fields_are_trimmed() {
        let client = Client::new(" Aziz ", " +998901234567 ", Some("  ".into())).unwrap();
        assert_eq!(client.name, "Aziz");
        assert_eq!(client.phone, "+998901234567");
        assert_eq!(client.address, None);
    }

    #[test]
    fn blank_fields_are_rejected() {
        assert_eq!(
            Client::new("Aziz", "", None),
            Err(KassaError::MissingField("phone"))
        );
        assert_eq!(StoreLocation::new(" "), Err(KassaError::MissingField("name")));
    }
}
