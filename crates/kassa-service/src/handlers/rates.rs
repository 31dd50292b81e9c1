//! Exchange rate handlers.

use std::sync::Arc;

use axum::extract::State;
use rust_decimal::Decimal;
use serde::Deserialize;

use kassa_core::{ExchangeRate, KassaError};

use crate::error::ApiError;
use crate::extract::Json;
use crate::state::AppState;

/// Set rate request.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SetRateRequest {
    /// SUM per USD.
    pub rate: Option<Decimal>,
    /// KGS per USD.
    pub kyg: Option<Decimal>,
}

/// Replace the active exchange rate.
pub async fn set_rate(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SetRateRequest>,
) -> Result<Json<ExchangeRate>, ApiError> {
    let rate = request.rate.ok_or(KassaError::MissingField("rate"))?;
    let kyg = request.kyg.ok_or(KassaError::MissingField("kyg"))?;
    Ok(Json(state.engine.set_rate(rate, kyg)?))
}

/// Get the active exchange rate.
pub async fn get_rate(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ExchangeRate>, ApiError> {
    state
        .engine
        .rate()?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("exchange rate not set".into()))
}
