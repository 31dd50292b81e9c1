//! Products and inventory intake.
//!
//! Receiving goods either tops up an existing product with the same identity
//! or creates a new product together with a partner record that owes for it.
//! Either way the partner is charged `purchase_price * quantity`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::currency::Currency;
use crate::error::{KassaError, Result};
use crate::ids::{ProductId, WarehouseId};
use crate::ledger::checked_add;
use crate::partner::Partner;

/// Note used on intake charges for products without a batch.
const NO_BATCH: &str = "no batch";

/// Quantities held or received, in each unit of measure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stock {
    /// Individual pieces.
    #[serde(default)]
    pub quantity: Decimal,
    /// Boxes.
    #[serde(default)]
    pub box_quantity: Decimal,
    /// Packages.
    #[serde(default)]
    pub package_quantity: Decimal,
    /// Weight in kilograms.
    #[serde(default)]
    pub total_kg: Decimal,
}

impl Stock {
    /// These quantities plus another batch.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAmount` if any quantity overflows.
    pub fn plus(&self, other: &Self) -> Result<Self> {
        Ok(Self {
            quantity: checked_add(self.quantity, other.quantity)?,
            box_quantity: checked_add(self.box_quantity, other.box_quantity)?,
            package_quantity: checked_add(self.package_quantity, other.package_quantity)?,
            total_kg: checked_add(self.total_kg, other.total_kg)?,
        })
    }
}

/// A request to receive goods from a partner.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductIntake {
    /// Product name.
    pub name: String,
    /// Supplier display name.
    pub name_partner: String,
    /// Supplier phone or contract number.
    pub partner_number: String,
    /// Supplier address.
    pub partner_address: String,
    /// Price currency, USD when absent.
    pub currency: Option<Currency>,
    /// Unit purchase price, zero when absent.
    pub purchase_price: Option<Decimal>,
    /// Unit selling price, zero when absent.
    pub selling_price: Option<Decimal>,
    /// Receiving warehouse.
    pub warehouse_id: Option<WarehouseId>,
    /// Product category.
    pub category: String,
    /// Size label.
    pub size: String,
    /// Product code.
    pub code: String,
    /// Batch label.
    pub part: String,
    /// Unit of measure, `piece` when absent.
    pub unit: Option<String>,
    /// Pieces received.
    pub quantity: Option<Decimal>,
    /// Boxes received.
    pub box_quantity: Option<Decimal>,
    /// Packages received.
    pub package_quantity: Option<Decimal>,
    /// Kilograms received.
    pub total_kg: Option<Decimal>,
}

impl ProductIntake {
    /// Check the request and normalize missing numbers to zero.
    ///
    /// # Errors
    ///
    /// - `MissingField` if `name` is blank.
    /// - `InvalidAmount` for a negative price or quantity.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(KassaError::MissingField("name"));
        }
        let stock = self.stock();
        let amounts = [
            ("purchasePrice", self.purchase_price()),
            ("sellingPrice", self.selling_price.unwrap_or_default()),
            ("quantity", stock.quantity),
            ("boxQuantity", stock.box_quantity),
            ("packageQuantity", stock.package_quantity),
            ("totalKg", stock.total_kg),
        ];
        for (field, value) in amounts {
            if value < Decimal::ZERO {
                return Err(KassaError::InvalidAmount(format!(
                    "{field} must not be negative, got {value}"
                )));
            }
        }
        Ok(())
    }

    /// Quantities received, missing values as zero.
    #[must_use]
    pub fn stock(&self) -> Stock {
        Stock {
            quantity: self.quantity.unwrap_or_default(),
            box_quantity: self.box_quantity.unwrap_or_default(),
            package_quantity: self.package_quantity.unwrap_or_default(),
            total_kg: self.total_kg.unwrap_or_default(),
        }
    }

    /// Unit purchase price, zero when absent.
    #[must_use]
    pub fn purchase_price(&self) -> Decimal {
        self.purchase_price.unwrap_or_default()
    }

    /// The identity an existing product must match to be topped up.
    #[must_use]
    pub fn identity(&self) -> ProductIdentity {
        ProductIdentity {
            name: self.name.clone(),
            name_partner: self.name_partner.clone(),
            partner_number: self.partner_number.clone(),
            partner_address: self.partner_address.clone(),
            currency: self.currency.unwrap_or_default(),
            purchase_price: self.purchase_price().normalize(),
            warehouse_id: self.warehouse_id,
            category: self.category.clone(),
            size: self.size.clone(),
            code: self.code.clone(),
            part: self.part.clone(),
        }
    }
}

/// Fields that make two intakes the same product.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProductIdentity {
    name: String,
    name_partner: String,
    partner_number: String,
    partner_address: String,
    currency: Currency,
    purchase_price: Decimal,
    warehouse_id: Option<WarehouseId>,
    category: String,
    size: String,
    code: String,
    part: String,
}

/// A stocked product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Product identifier.
    pub id: ProductId,
    /// Product name.
    pub name: String,
    /// Product category.
    #[serde(default)]
    pub category: String,
    /// Product code.
    #[serde(default)]
    pub code: String,
    /// Size label.
    #[serde(default)]
    pub size: String,
    /// Batch label.
    #[serde(default)]
    pub part: String,
    /// Unit of measure.
    pub unit: String,
    /// Warehouse holding the product.
    #[serde(default)]
    pub warehouse_id: Option<WarehouseId>,
    /// Price currency.
    pub currency: Currency,
    /// Unit purchase price.
    pub purchase_price: Decimal,
    /// Unit selling price.
    pub selling_price: Decimal,
    /// Quantities on hand.
    #[serde(flatten)]
    pub stock: Stock,
    /// Supplier display name.
    #[serde(default)]
    pub name_partner: String,
    /// Supplier phone or contract number.
    #[serde(default)]
    pub partner_number: String,
    /// Supplier address.
    #[serde(default)]
    pub partner_address: String,
    /// When the product was created.
    pub created_at: DateTime<Utc>,
    /// When the product was last changed.
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Create a product from a validated intake.
    #[must_use]
    pub fn from_intake(intake: &ProductIntake) -> Self {
        let now = Utc::now();
        Self {
            id: ProductId::generate(),
            name: intake.name.clone(),
            category: intake.category.clone(),
            code: intake.code.clone(),
            size: intake.size.clone(),
            part: intake.part.clone(),
            unit: intake.unit.clone().unwrap_or_else(|| "piece".to_string()),
            warehouse_id: intake.warehouse_id,
            currency: intake.currency.unwrap_or_default(),
            purchase_price: intake.purchase_price(),
            selling_price: intake.selling_price.unwrap_or_default(),
            stock: intake.stock(),
            name_partner: intake.name_partner.clone(),
            partner_number: intake.partner_number.clone(),
            partner_address: intake.partner_address.clone(),
            created_at: now,
            updated_at: now,
        }
    }

    /// This product's identity.
    #[must_use]
    pub fn identity(&self) -> ProductIdentity {
        ProductIdentity {
            name: self.name.clone(),
            name_partner: self.name_partner.clone(),
            partner_number: self.partner_number.clone(),
            partner_address: self.partner_address.clone(),
            currency: self.currency,
            purchase_price: self.purchase_price.normalize(),
            warehouse_id: self.warehouse_id,
            category: self.category.clone(),
            size: self.size.clone(),
            code: self.code.clone(),
            part: self.part.clone(),
        }
    }

    /// Note attached to the partner's intake charge.
    #[must_use]
    pub fn intake_note(&self) -> String {
        let part = if self.part.trim().is_empty() {
            NO_BATCH
        } else {
            self.part.as_str()
        };
        format!("{} ({part}) intake", self.name)
    }

    /// Open a partner record that supplies this product.
    #[must_use]
    pub fn open_partner(&self) -> Partner {
        let mut partner = Partner::new(self.name.clone());
        partner.name_partner.clone_from(&self.name_partner);
        partner.partner_number.clone_from(&self.partner_number);
        partner.partner_address.clone_from(&self.partner_address);
        partner.currency = Some(self.currency);
        partner.product_id = Some(self.id);
        partner
    }
}

/// Result of [`receive_intake`].
#[derive(Debug, Clone, PartialEq)]
pub enum IntakeOutcome {
    /// A new product and its partner were created.
    Created {
        /// The new product.
        product: Product,
        /// The partner owing for it.
        partner: Partner,
    },
    /// An existing product was topped up.
    Merged {
        /// The updated product.
        product: Product,
        /// The linked partner, if the product has one.
        partner: Option<Partner>,
    },
}

impl IntakeOutcome {
    /// The product after intake.
    #[must_use]
    pub const fn product(&self) -> &Product {
        match self {
            Self::Created { product, .. } | Self::Merged { product, .. } => product,
        }
    }

    /// The partner after intake, if any.
    #[must_use]
    pub const fn partner(&self) -> Option<&Partner> {
        match self {
            Self::Created { partner, .. } => Some(partner),
            Self::Merged { partner, .. } => partner.as_ref(),
        }
    }
}

/// Apply an intake to the matching product and its partner, if they exist.
///
/// `existing` must already match `intake.identity()`.
///
/// # Errors
///
/// Returns the validation errors of [`ProductIntake::validate`], and
/// `InvalidAmount` if the merged stock or the partner charge overflows.
pub fn receive_intake(
    intake: &ProductIntake,
    existing: Option<(Product, Option<Partner>)>,
) -> Result<IntakeOutcome> {
    intake.validate()?;
    let stock = intake.stock();
    let price = intake.purchase_price();

    match existing {
        Some((mut product, partner)) => {
            product.stock = product.stock.plus(&stock)?;
            product.updated_at = Utc::now();
            let partner = partner
                .map(|mut partner| {
                    partner.stock = partner.stock.plus(&stock)?;
                    partner
                        .record_intake(price, stock.quantity, Some(product.intake_note()))
                        .map(|_| partner)
                })
                .transpose()?;
            Ok(IntakeOutcome::Merged { product, partner })
        }
        None => {
            let product = Product::from_intake(intake);
            let mut partner = product.open_partner();
            partner.stock = stock;
            partner.record_intake(price, stock.quantity, Some(product.intake_note()))?;
            Ok(IntakeOutcome::Created { product, partner })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partner::INTAKE_METHOD;
    use rust_decimal_macros::dec;

    fn intake() -> ProductIntake {
        ProductIntake {
            name: "Tea set".into(),
            name_partner: "Oriental Ceramics".into(),
            partner_number: "+998901112233".into(),
            currency: Some(Currency::Usd),
            purchase_price: Some(dec!(5)),
            selling_price: Some(dec!(8)),
            category: "kitchen".into(),
            part: "A1".into(),
            quantity: Some(dec!(10)),
            box_quantity: Some(dec!(2)),
            ..ProductIntake::default()
        }
    }

    #[test]
    fn new_intake_creates_product_and_partner() {
        let outcome = receive_intake(&intake(), None).unwrap();
        let IntakeOutcome::Created { product, partner } = outcome else {
            panic!("expected a new product");
        };

        assert_eq!(product.stock.quantity, dec!(10));
        assert_eq!(product.stock.package_quantity, Decimal::ZERO);
        assert_eq!(product.unit, "piece");
        assert_eq!(partner.product_id, Some(product.id));
        assert_eq!(partner.total_debt(), dec!(50));
        assert_eq!(partner.remaining_debt(), dec!(50));

        let entry = &partner.payment_history().entries()[0];
        assert_eq!(entry.amount, dec!(-50));
        assert_eq!(entry.method, INTAKE_METHOD);
        assert_eq!(entry.note, "Tea set (A1) intake");
    }

    #[test]
    fn repeat_intake_merges_quantities_and_charges() {
        let IntakeOutcome::Created { product, partner } =
            receive_intake(&intake(), None).unwrap()
        else {
            panic!("expected a new product");
        };
        assert_eq!(product.identity(), intake().identity());

        let outcome = receive_intake(&intake(), Some((product, Some(partner)))).unwrap();
        let product = outcome.product();
        let partner = outcome.partner().unwrap();
        assert!(matches!(outcome, IntakeOutcome::Merged { .. }));
        assert_eq!(product.stock.quantity, dec!(20));
        assert_eq!(product.stock.box_quantity, dec!(4));
        assert_eq!(partner.stock.quantity, dec!(20));
        assert_eq!(partner.total_debt(), dec!(100));
        assert_eq!(partner.payment_history().len(), 2);
    }

    #[test]
    fn merge_without_partner_only_updates_product() {
        let product = Product::from_intake(&intake());
        let outcome = receive_intake(&intake(), Some((product, None))).unwrap();
        assert!(outcome.partner().is_none());
        assert_eq!(outcome.product().stock.quantity, dec!(20));
    }

    #[test]
    fn free_goods_create_no_charge() {
        let mut free = intake();
        free.purchase_price = None;
        let outcome = receive_intake(&free, None).unwrap();
        let partner = outcome.partner().unwrap();
        assert_eq!(partner.total_debt(), Decimal::ZERO);
        assert!(partner.payment_history().is_empty());
    }

    #[test]
    fn identity_ignores_price_scale() {
        let mut a = intake();
        a.purchase_price = Some(dec!(5.00));
        assert_eq!(a.identity(), intake().identity());

        let mut b = intake();
        b.part = "B2".into();
        assert_ne!(b.identity(), intake().identity());
    }

    #[test]
    fn invalid_intake_is_rejected() {
        let mut unnamed = intake();
        unnamed.name = "  ".into();
        assert_eq!(
            receive_intake(&unnamed, None),
            Err(KassaError::MissingField("name"))
        );

        let mut negative = intake();
        negative.quantity = Some(dec!(-1));
        assert!(matches!(
            receive_intake(&negative, None),
            Err(KassaError::InvalidAmount(_))
        ));
    }

    #[test]
    fn overflowing_stock_is_rejected() {
        let mut product = Product::from_intake(&intake());
        product.stock.quantity = Decimal::MAX;

        assert!(matches!(
            receive_intake(&intake(), Some((product, None))),
            Err(KassaError::InvalidAmount(_))
        ));
    }

    #[test]
    fn note_without_batch() {
        let mut input = intake();
        input.part = String::new();
        assert_eq!(
            Product::from_intake(&input).intake_note(),
            "Tea set (no batch) intake"
        );
    }
}
