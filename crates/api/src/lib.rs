//! Payment Gateway API
//!
//! REST surface for the payment gateway: transaction creation (direct and
//! wallet-backed), payment registration and lookup, fee quotes, and bill
//! emails.

pub mod error;
pub mod state;

pub mod routes {
    pub mod fees;
    pub mod payments;
    pub mod transactions;
}

pub use error::ApiError;
pub use state::AppState;

use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use tracing::info;

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

/// Build the API router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/v1/transactions",
            post(routes::transactions::create_transaction).get(routes::transactions::list_transactions),
        )
        .route(
            "/api/v1/transactions/generate-wallet",
            post(routes::transactions::generate_wallet),
        )
        .route(
            "/api/v1/transactions/last/:payment_id",
            get(routes::transactions::get_last_transaction),
        )
        .route(
            "/api/v1/transactions/by-payment/:payment_id",
            get(routes::transactions::get_by_payment),
        )
        .route(
            "/api/v1/transactions/:tx_hash",
            get(routes::transactions::get_transaction),
        )
        .route("/api/v1/fees/recommended", get(routes::fees::get_recommended))
        .route("/api/v1/payments", post(routes::payments::create_payment))
        .route("/api/v1/payments/:id", get(routes::payments::get_payment))
        .route("/api/v1/payments/:id/bill", post(routes::payments::send_bill))
        .route("/health", get(health))
        .with_state(state)
}

/// Start serving the API on the given address.
pub async fn start_server(state: AppState, addr: SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("API server listening on {}", addr);
    axum::serve(listener, build_router(state)).await?;
    Ok(())
}

async fn health() -> &'static str {
    "ok"
}
