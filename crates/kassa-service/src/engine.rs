//! Settlement engine.
//!
//! Wraps the domain rules of `kassa-core` with persistence. Each mutating
//! operation takes the lock for the record it changes, reloads the record,
//! applies the change in memory and persists it with a single store write,
//! so a failure at any step leaves stored state unchanged.

use std::sync::Arc;

use kassa_core::{
    receive_intake, Client, Debt, DebtId, DebtRef, ExchangeRate, IntakeOutcome, KassaError,
    NewDebt, Partner, PartnerId, PartnerPaymentRequest, PaymentRequest, PaymentSummary,
    ProductIdentity, ProductIntake, StoreLocation,
};
use kassa_store::Store;
use rust_decimal::Decimal;
use tokio::sync::OwnedMutexGuard;

use crate::error::ApiError;
use crate::locks::KeyedLocks;

/// Serialized access to debts, partners and products.
pub struct Engine {
    store: Arc<dyn Store>,
    debts: KeyedLocks<DebtId>,
    partners: KeyedLocks<PartnerId>,
    intakes: KeyedLocks<ProductIdentity>,
    phones: KeyedLocks<String>,
}

impl Engine {
    /// Create an engine over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            debts: KeyedLocks::new(),
            partners: KeyedLocks::new(),
            intakes: KeyedLocks::new(),
            phones: KeyedLocks::new(),
        }
    }

    /// The active exchange-rate snapshot, if one has been set.
    pub fn rate(&self) -> Result<Option<ExchangeRate>, ApiError> {
        Ok(self.store.get_rate()?)
    }

    /// Replace the active exchange rate.
    pub fn set_rate(&self, rate: Decimal, kyg: Decimal) -> Result<ExchangeRate, ApiError> {
        let snapshot = ExchangeRate::new(rate, kyg)?;
        self.store.put_rate(&snapshot)?;
        tracing::info!(rate = %snapshot.rate, kyg = %snapshot.kyg, "Exchange rate updated");
        Ok(snapshot)
    }

    // =========================================================================
    // Debts
    // =========================================================================

    /// Create a debt, settling it at once if the up-front payments cover it.
    pub fn create_debt(&self, input: NewDebt) -> Result<Debt, ApiError> {
        let rate = self.store.get_rate()?;
        let debt = Debt::create(input, rate.as_ref())?;

        if debt.is_settled() {
            let address = self.client_address(&debt)?;
            let sales = debt.materialize_sales(address.as_deref())?;
            self.store.settle_debt(&debt, &sales)?;
            tracing::info!(
                debt_id = %debt.id,
                total = %debt.total_amount,
                sales = sales.len(),
                "Debt created already paid"
            );
        } else {
            self.store.put_debt(&debt)?;
            tracing::info!(
                debt_id = %debt.id,
                total = %debt.total_amount,
                remaining = %debt.remaining_amount(),
                "Debt created"
            );
        }

        Ok(debt)
    }

    /// Apply a payment to the referenced debt.
    ///
    /// When the payment settles the debt, its sales are written in the same
    /// store operation as the debt itself.
    pub async fn pay_debt(
        &self,
        reference: &DebtRef,
        request: PaymentRequest,
    ) -> Result<PaymentSummary, ApiError> {
        let payment = request.validate()?;
        let (_guard, mut debt) = self.lock_debt(reference).await?;
        let rate = self.store.get_rate()?;

        let applied = debt.apply_payment(
            payment.amount,
            &payment.currency,
            payment.kind,
            payment.store_id,
            rate.as_ref(),
        )?;

        if applied.settled {
            let address = self.client_address(&debt)?;
            let sales = debt.materialize_sales(address.as_deref())?;
            self.store.settle_debt(&debt, &sales)?;
            tracing::info!(
                debt_id = %debt.id,
                amount = %payment.amount,
                currency = %payment.currency,
                sales = sales.len(),
                "Debt settled"
            );
        } else {
            self.store.put_debt(&debt)?;
            tracing::info!(
                debt_id = %debt.id,
                amount = %payment.amount,
                currency = %payment.currency,
                converted = %applied.converted,
                remaining = %debt.remaining_amount(),
                "Debt payment recorded"
            );
        }

        Ok(PaymentSummary::from(&debt))
    }

    /// Lock the referenced debt and load it under the lock.
    ///
    /// A phone reference is resolved again if the debt it named was settled
    /// while waiting, so the payment lands on the client's next pending debt.
    async fn lock_debt(
        &self,
        reference: &DebtRef,
    ) -> Result<(OwnedMutexGuard<()>, Debt), ApiError> {
        loop {
            let debt_id = self.resolve_debt(reference)?;
            let guard = self.debts.lock(&debt_id).await;
            let debt = self
                .store
                .get_debt(&debt_id)?
                .ok_or_else(|| KassaError::not_found("debt", debt_id))?;

            if debt.is_settled() && matches!(reference, DebtRef::ByClientPhone(_)) {
                tracing::debug!(debt_id = %debt_id, "Debt settled while waiting, resolving again");
                continue;
            }
            return Ok((guard, debt));
        }
    }

    fn resolve_debt(&self, reference: &DebtRef) -> Result<DebtId, ApiError> {
        match reference {
            DebtRef::ById(id) => Ok(*id),
            DebtRef::ByClientPhone(phone) => {
                let client = self
                    .store
                    .get_client_by_phone(phone)?
                    .ok_or_else(|| KassaError::not_found("client", phone))?;
                let debt = self
                    .store
                    .find_pending_debt_by_client(&client.id)?
                    .ok_or_else(|| KassaError::not_found("pending debt for client", phone))?;
                tracing::debug!(phone = %phone, debt_id = %debt.id, "Resolved debt by phone");
                Ok(debt.id)
            }
        }
    }

    fn client_address(&self, debt: &Debt) -> Result<Option<String>, ApiError> {
        let Some(client_id) = &debt.client_id else {
            return Ok(None);
        };
        Ok(self
            .store
            .get_client(client_id)?
            .and_then(|client| client.address))
    }

    // =========================================================================
    // Partners
    // =========================================================================

    /// Record a payment to a partner.
    pub async fn pay_partner(&self, request: PartnerPaymentRequest) -> Result<Partner, ApiError> {
        let payment = request.validate()?;

        let _guard = self.partners.lock(&payment.partner_id).await;
        let mut partner = self
            .store
            .get_partner(&payment.partner_id)?
            .ok_or_else(|| KassaError::not_found("partner", payment.partner_id))?;

        let entry = partner
            .pay(
                payment.amount,
                &payment.method,
                payment.note,
                payment.currency,
            )?;
        self.store.put_partner(&partner)?;

        tracing::info!(
            partner_id = %partner.id,
            amount = %entry.amount,
            currency = %entry.currency,
            remaining = %partner.remaining_debt(),
            "Partner payment recorded"
        );
        if partner.credit_balance() > Decimal::ZERO {
            tracing::warn!(
                partner_id = %partner.id,
                credit = %partner.credit_balance(),
                "Partner overpaid"
            );
        }

        Ok(partner)
    }

    // =========================================================================
    // Inventory
    // =========================================================================

    /// Receive goods: top up the matching product or create a new one, and
    /// charge the partner that supplied them.
    pub async fn receive(&self, intake: ProductIntake) -> Result<IntakeOutcome, ApiError> {
        intake.validate()?;
        let identity = intake.identity();

        let _guard = self.intakes.lock(&identity).await;
        let existing = match self.store.find_product(&identity)? {
            Some(product) => {
                let partner = self.store.find_partner_by_product(&product.id)?;
                Some((product, partner))
            }
            None => None,
        };

        // Payments to this partner must not interleave with the intake charge.
        let _partner_guard = match existing.as_ref().and_then(|(_, p)| p.as_ref()) {
            Some(partner) => Some(self.partners.lock(&partner.id).await),
            None => None,
        };
        let existing = match existing {
            Some((product, Some(partner))) => {
                let fresh = self.store.get_partner(&partner.id)?;
                Some((product, fresh))
            }
            other => other,
        };

        let outcome = receive_intake(&intake, existing)?;
        self.store.put_intake(outcome.product(), outcome.partner())?;

        let product = outcome.product();
        match &outcome {
            IntakeOutcome::Created { partner, .. } => tracing::info!(
                product_id = %product.id,
                partner_id = %partner.id,
                debt = %partner.total_debt(),
                "Product and partner created"
            ),
            IntakeOutcome::Merged { .. } => tracing::info!(
                product_id = %product.id,
                quantity = %product.stock.quantity,
                "Product intake merged"
            ),
        }

        Ok(outcome)
    }

    // =========================================================================
    // Directory
    // =========================================================================

    /// Register a client; phone numbers are unique.
    pub async fn register_client(
        &self,
        name: &str,
        phone: &str,
        address: Option<String>,
    ) -> Result<Client, ApiError> {
        let client = Client::new(name, phone, address)?;

        let _guard = self.phones.lock(&client.phone).await;
        if self.store.get_client_by_phone(&client.phone)?.is_some() {
            return Err(ApiError::Conflict(format!(
                "client phone {} already registered",
                client.phone
            )));
        }
        self.store.put_client(&client)?;

        tracing::info!(client_id = %client.id, "Client registered");
        Ok(client)
    }

    /// Register a point of sale.
    pub fn register_store(&self, name: &str) -> Result<StoreLocation, ApiError> {
        let location = StoreLocation::new(name)?;
        self.store.put_store_location(&location)?;
        tracing::info!(store_id = %location.id, name = %location.name, "Store registered");
        Ok(location)
    }
}
