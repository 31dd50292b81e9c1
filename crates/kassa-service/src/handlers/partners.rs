//! Partner balance handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use rust_decimal::Decimal;
use serde::Serialize;

use kassa_core::{KassaError, Partner, PartnerId, PartnerPaymentRequest};

use crate::error::ApiError;
use crate::extract::Json;
use crate::state::AppState;

/// Partner balance response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerResponse {
    /// Confirmation message, on writes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    /// The partner and its ledger.
    pub partner: Partner,
    /// Amount paid beyond the total debt.
    pub credit_balance: Decimal,
}

impl PartnerResponse {
    fn new(partner: Partner, message: Option<&'static str>) -> Self {
        Self {
            message,
            credit_balance: partner.credit_balance(),
            partner,
        }
    }
}

/// Record a payment to a partner.
pub async fn pay_partner(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PartnerPaymentRequest>,
) -> Result<Json<PartnerResponse>, ApiError> {
    let partner = state.engine.pay_partner(request).await?;
    Ok(Json(PartnerResponse::new(partner, Some("Partner payment recorded"))))
}

/// Get a partner with its balance.
pub async fn get_partner(
    State(state): State<Arc<AppState>>,
    Path(partner_id): Path<String>,
) -> Result<Json<PartnerResponse>, ApiError> {
    let partner_id: PartnerId = partner_id.parse().map_err(KassaError::from)?;
    let partner = state
        .store
        .get_partner(&partner_id)?
        .ok_or_else(|| KassaError::not_found("partner", partner_id))?;

    Ok(Json(PartnerResponse::new(partner, None)))
}
