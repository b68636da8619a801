//! Payment management endpoints

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use chrono::{DateTime, Utc};
use paygate_storage::NewPayment;
use paygate_types::{
    Currency, Payment, PaymentId, PaymentStatus, StoreId, StoreWallet,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{error::ApiError, state::AppState, ApiResult};

/// Request to register a payment for the store identified by the
/// `x-api-key` header
#[derive(Debug, Serialize, Deserialize)]
pub struct CreatePaymentRequest {
    pub amount: Decimal,
    pub currency: Currency,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Reduced view of a store inside payment details
#[derive(Debug, Serialize, Deserialize)]
pub struct StoreDetails {
    pub id: StoreId,
    pub wallets: Vec<StoreWallet>,
}

/// Payment details exposed to payers
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDetails {
    pub id: PaymentId,
    pub datetime: DateTime<Utc>,
    pub amount: Decimal,
    pub status: PaymentStatus,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub comment: Option<String>,
    pub store: StoreDetails,
}

impl From<Payment> for PaymentDetails {
    fn from(payment: Payment) -> Self {
        PaymentDetails {
            id: payment.id,
            datetime: payment.datetime,
            amount: payment.amount,
            status: payment.status,
            kind: payment.kind,
            comment: payment.comment,
            store: StoreDetails {
                id: payment.store.id,
                wallets: payment.store.wallets,
            },
        }
    }
}

/// Request to email a bill for a payment
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendBillRequest {
    pub email: String,
    pub bill_url: String,
}

fn api_key(headers: &HeaderMap) -> Result<&str, ApiError> {
    headers
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("API key not found".to_string()))
}

/// POST /api/v1/payments - Register a payment for a store
pub async fn create_payment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CreatePaymentRequest>,
) -> ApiResult<Json<Payment>> {
    let api_key = api_key(&headers)?;

    let store = state
        .store
        .find_store_by_api_key(api_key)
        .await?
        .ok_or_else(|| ApiError::BadRequest("store not found".to_string()))?;

    let payment = state
        .store
        .create_payment(NewPayment {
            amount: payload.amount,
            currency: payload.currency,
            kind: payload.kind,
            comment: payload.comment,
            store,
        })
        .await?;

    Ok(Json(payment))
}

/// GET /api/v1/payments/{id} - Payment details for payers
pub async fn get_payment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<PaymentDetails>> {
    let payment = state
        .store
        .find_payment(PaymentId(id))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("payment not found: {}", id)))?;

    Ok(Json(PaymentDetails::from(payment)))
}

/// POST /api/v1/payments/{id}/bill - Email a bill for a payment
pub async fn send_bill(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<SendBillRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    state
        .workflow
        .send_payment_bill(PaymentId(id), payload.email, payload.bill_url)
        .await?;

    Ok(Json(serde_json::json!({ "sent": true })))
}
