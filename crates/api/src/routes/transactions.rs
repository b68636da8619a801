//! Transaction management endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use paygate_engine::CreateTransactionInput;
use paygate_types::{
    CreatedTransaction, PaymentId, PaymentSummary, StoreWallet, Transaction, TransactionId,
    TransactionStatus, TxHash, WalletTransaction,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{error::ApiError, state::AppState, ApiResult};

/// Query parameters for listing transactions
#[derive(Debug, Deserialize)]
pub struct ListTransactionsQuery {
    /// Maximum number of transactions to return (default: 100)
    #[serde(default)]
    pub limit: Option<usize>,
    /// Number of transactions to skip (default: 0)
    #[serde(default)]
    pub offset: Option<usize>,
}

/// Payment reference inside a creation request
#[derive(Debug, Serialize, Deserialize)]
pub struct PaymentRef {
    pub id: Option<i64>,
}

/// Request to create a transaction from caller-supplied hash data
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionRequest {
    pub payment: Option<PaymentRef>,
    pub tx_hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Request to create a transaction with a freshly generated wallet
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateWalletRequest {
    pub payment_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Read-side transaction view. The generated wallet is collapsed to its
/// public address; private key material never leaves storage.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionView {
    pub id: TransactionId,
    pub tx_hash: Option<TxHash>,
    pub sender: Option<String>,
    pub email: Option<String>,
    pub amount: Decimal,
    pub status: TransactionStatus,
    pub updated: DateTime<Utc>,
    pub payment: PaymentSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wallet_for_transaction: Option<String>,
    /// The store wallet receiving this payment's currency, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receiver: Option<StoreWallet>,
}

impl From<Transaction> for TransactionView {
    fn from(tx: Transaction) -> Self {
        let receiver = tx.payment.store.wallet_for(tx.payment.currency).cloned();
        TransactionView {
            id: tx.id,
            tx_hash: tx.tx_hash,
            sender: tx.sender,
            email: tx.email,
            amount: tx.amount,
            status: tx.status,
            updated: tx.updated,
            payment: PaymentSummary::from(&tx.payment),
            wallet_for_transaction: tx.wallet.map(|w| w.public_key),
            receiver,
        }
    }
}

/// Last-transaction lookup response
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastTransactionResponse {
    pub tx_hash: Option<TxHash>,
    pub status: TransactionStatus,
}

/// List of transactions response
#[derive(Debug, Serialize, Deserialize)]
pub struct ListTransactionsResponse {
    pub transactions: Vec<TransactionView>,
    pub total: usize,
}

/// POST /api/v1/transactions - Create a new transaction for a payment
pub async fn create_transaction(
    State(state): State<AppState>,
    Json(payload): Json<CreateTransactionRequest>,
) -> ApiResult<Json<CreatedTransaction>> {
    let payment_id = payload
        .payment
        .and_then(|p| p.id)
        .ok_or_else(|| {
            ApiError::BadRequest("cannot create transaction without payment ID".to_string())
        })?;

    if payload.tx_hash.is_empty() {
        return Err(ApiError::BadRequest(
            "transaction hash is required".to_string(),
        ));
    }

    let created = state
        .workflow
        .create_transaction(CreateTransactionInput {
            payment_id: PaymentId(payment_id),
            tx_hash: TxHash::from(payload.tx_hash),
            sender: payload.sender,
            email: payload.email,
        })
        .await?;

    Ok(Json(created))
}

/// POST /api/v1/transactions/generate-wallet - Create a transaction with
/// a freshly generated receiving wallet
pub async fn generate_wallet(
    State(state): State<AppState>,
    Json(payload): Json<GenerateWalletRequest>,
) -> ApiResult<Json<WalletTransaction>> {
    let created = state
        .workflow
        .create_transaction_with_wallet(PaymentId(payload.payment_id), payload.email)
        .await?;

    Ok(Json(created))
}

/// GET /api/v1/transactions/{tx_hash} - Get transaction by hash
pub async fn get_transaction(
    State(state): State<AppState>,
    Path(tx_hash): Path<String>,
) -> ApiResult<Json<TransactionView>> {
    let tx_hash = TxHash::from(tx_hash);

    let tx = state
        .store
        .find_transaction_by_hash(&tx_hash)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Transaction not found: {}", tx_hash)))?;

    Ok(Json(TransactionView::from(tx)))
}

/// GET /api/v1/transactions/last/{payment_id} - Last transaction for a
/// payment
pub async fn get_last_transaction(
    State(state): State<AppState>,
    Path(payment_id): Path<i64>,
) -> ApiResult<Json<LastTransactionResponse>> {
    let tx = state
        .store
        .find_transaction_by_payment(PaymentId(payment_id))
        .await?
        .ok_or_else(|| {
            ApiError::NotFound(format!(
                "This payment does not have such a transaction: {}",
                payment_id
            ))
        })?;

    Ok(Json(LastTransactionResponse {
        tx_hash: tx.tx_hash,
        status: tx.status,
    }))
}

/// GET /api/v1/transactions/by-payment/{payment_id} - Wallet-backed
/// transaction for a payment, wallet collapsed to its address
pub async fn get_by_payment(
    State(state): State<AppState>,
    Path(payment_id): Path<i64>,
) -> ApiResult<Json<TransactionView>> {
    let tx = state
        .store
        .find_transaction_by_payment(PaymentId(payment_id))
        .await?
        .ok_or_else(|| {
            ApiError::NotFound(format!("Transaction not exist for payment {}", payment_id))
        })?;

    Ok(Json(TransactionView::from(tx)))
}

/// GET /api/v1/transactions - List all transactions
pub async fn list_transactions(
    State(state): State<AppState>,
    Query(query): Query<ListTransactionsQuery>,
) -> ApiResult<Json<ListTransactionsResponse>> {
    let transactions = state
        .store
        .list_transactions(query.limit, query.offset)
        .await?;

    let views: Vec<TransactionView> = transactions.into_iter().map(TransactionView::from).collect();
    let total = views.len();

    Ok(Json(ListTransactionsResponse {
        transactions: views,
        total,
    }))
}
