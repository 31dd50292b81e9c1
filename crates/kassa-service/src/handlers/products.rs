//! Product intake handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use serde::Serialize;

use kassa_core::{IntakeOutcome, Partner, Product, ProductIntake};

use crate::error::ApiError;
use crate::extract::Json;
use crate::state::AppState;

/// Intake response.
#[derive(Debug, Serialize)]
pub struct IntakeResponse {
    /// What happened.
    pub message: &'static str,
    /// The product after intake.
    pub product: Product,
    /// The partner charged for the goods, if the product has one.
    pub partner: Option<Partner>,
}

/// Receive goods into stock.
///
/// Returns `201 Created` for a new product, `200 OK` when an existing product
/// was topped up.
pub async fn receive_intake(
    State(state): State<Arc<AppState>>,
    Json(intake): Json<ProductIntake>,
) -> Result<(StatusCode, Json<IntakeResponse>), ApiError> {
    let (status, response) = match state.engine.receive(intake).await? {
        IntakeOutcome::Created { product, partner } => (
            StatusCode::CREATED,
            IntakeResponse {
                message: "Product created",
                product,
                partner: Some(partner),
            },
        ),
        IntakeOutcome::Merged { product, partner } => (
            StatusCode::OK,
            IntakeResponse {
                message: "Product stock updated",
                product,
                partner,
            },
        ),
    };

    Ok((status, Json(response)))
}
