//! Client and point-of-sale registration.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;

use kassa_core::{Client, StoreLocation};

use crate::error::ApiError;
use crate::extract::Json;
use crate::state::AppState;

/// Register client request.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterClientRequest {
    /// Client name.
    pub name: String,
    /// Phone number, unique across clients.
    pub phone: String,
    /// Delivery address.
    pub address: Option<String>,
}

/// Register a client.
pub async fn register_client(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterClientRequest>,
) -> Result<(StatusCode, Json<Client>), ApiError> {
    let client = state
        .engine
        .register_client(&request.name, &request.phone, request.address)
        .await?;
    Ok((StatusCode::CREATED, Json(client)))
}

/// Register store request.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterStoreRequest {
    /// Display name.
    pub name: String,
}

/// Register a point of sale.
pub async fn register_store(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterStoreRequest>,
) -> Result<(StatusCode, Json<StoreLocation>), ApiError> {
    let location = state.engine.register_store(&request.name)?;
    Ok((StatusCode::CREATED, Json(location)))
}
