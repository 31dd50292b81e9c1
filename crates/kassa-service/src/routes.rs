//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post, put};
use axum::Router;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{debts, directory, health, partners, products, rates, reports};
use crate::state::AppState;

/// Maximum concurrent requests for API endpoints.
const API_MAX_CONCURRENT_REQUESTS: usize = 64;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /health` - Health check
///
/// ## Debts
/// - `POST /v1/debts` - Create a debt
/// - `PUT /v1/debts/pay/:id_or_phone` - Pay a debt
/// - `GET /v1/debts/client/:client_id` - Debts of a client
/// - `GET /v1/debts/debtors` - Pending debts, one row per line item
/// - `GET /v1/debts/daily?date=DD-MM-YYYY&storeId=` - Payments taken at a store
/// - `GET /v1/debts/daily/report?date=YYYY-MM-DD&storeId=` - Daily totals
///
/// ## Partners
/// - `POST /v1/partners/pay` - Pay a partner
/// - `GET /v1/partners/:id` - Partner balance
///
/// ## Inventory and reference data
/// - `POST /v1/products/intake` - Receive goods
/// - `PUT /v1/rate`, `GET /v1/rate` - Exchange rate
/// - `POST /v1/clients` - Register a client
/// - `POST /v1/stores` - Register a point of sale
pub fn create_router(state: AppState) -> Router {
    // Extract config values before moving state
    let cors_origins = state.config.cors_origins.clone();
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout_seconds = state.config.request_timeout_seconds;

    let cors = build_cors_layer(&cors_origins);

    let state = Arc::new(state);

    let api_routes = Router::new()
        // Debts
        .route("/debts", post(debts::create_debt))
        .route("/debts/pay/:reference", put(debts::pay_debt))
        .route("/debts/client/:client_id", get(debts::list_client_debts))
        .route("/debts/debtors", get(debts::list_debtors))
        .route("/debts/daily", get(reports::daily_payments))
        .route("/debts/daily/report", get(reports::daily_report))
        // Partners
        .route("/partners/pay", post(partners::pay_partner))
        .route("/partners/:partner_id", get(partners::get_partner))
        // Inventory
        .route("/products/intake", post(products::receive_intake))
        // Reference data
        .route("/rate", get(rates::get_rate).put(rates::set_rate))
        .route("/clients", post(directory::register_client))
        .route("/stores", post(directory::register_store))
        .layer(ConcurrencyLimitLayer::new(API_MAX_CONCURRENT_REQUESTS));

    Router::new()
        // Health (public, no rate limit)
        .route("/health", get(health::health))
        .nest("/v1", api_routes)
        // Global middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            request_timeout_seconds,
        )))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.iter().any(|o| o == "*") {
        cors.allow_origin(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        cors.allow_origin(origins)
    }
}
