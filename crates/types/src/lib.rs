use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a payment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PaymentId(pub i64);

impl fmt::Display for PaymentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for PaymentId {
    fn from(id: i64) -> Self {
        PaymentId(id)
    }
}

/// Unique identifier for a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionId(pub i64);

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for TransactionId {
    fn from(id: i64) -> Self {
        TransactionId(id)
    }
}

/// Unique identifier for a merchant store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StoreId(pub i64);

impl fmt::Display for StoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for StoreId {
    fn from(id: i64) -> Self {
        StoreId(id)
    }
}

/// External blockchain transaction hash
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxHash(pub String);

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for TxHash {
    fn from(s: String) -> Self {
        TxHash(s)
    }
}

impl From<&str> for TxHash {
    fn from(s: &str) -> Self {
        TxHash(s.to_string())
    }
}

/// Currencies a payment can be denominated in.
///
/// Wallet generation is supported for Bitcoin and Doge only; everything
/// else is rejected with [`Error::UnsupportedCurrency`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Currency {
    Bitcoin,
    Doge,
    Ethereum,
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Currency::Bitcoin => write!(f, "Bitcoin"),
            Currency::Doge => write!(f, "Doge"),
            Currency::Ethereum => write!(f, "Ethereum"),
        }
    }
}

/// Payment lifecycle status.
///
/// A payment starts at `Not_paid` when the store-facing create API
/// registers it and moves to `Paid` through an external settlement path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    #[serde(rename = "Not_paid")]
    NotPaid,
    Paid,
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentStatus::NotPaid => write!(f, "Not_paid"),
            PaymentStatus::Paid => write!(f, "Paid"),
        }
    }
}

/// Transaction lifecycle status. Every transaction is created as
/// `processing`; a separate confirmation watcher moves it onward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Processing,
    Confirmed,
    Failed,
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionStatus::Processing => write!(f, "processing"),
            TransactionStatus::Confirmed => write!(f, "confirmed"),
            TransactionStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Currency-specific receiving wallet registered on a store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreWallet {
    pub currency: Currency,
    /// The store's receiving address for this currency
    pub value: String,
}

/// Merchant store owning payments and currency-specific wallets
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Store {
    pub id: StoreId,
    pub name: String,
    /// API key used by the store-facing payment creation endpoint.
    /// Never serialized into responses.
    #[serde(skip_serializing, default)]
    pub api_key: String,
    pub wallets: Vec<StoreWallet>,
}

impl Store {
    /// The store's receiving wallet for the given currency, if registered.
    pub fn wallet_for(&self, currency: Currency) -> Option<&StoreWallet> {
        self.wallets.iter().find(|w| w.currency == currency)
    }
}

/// A merchant-initiated request for funds, tracked to completion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub amount: Decimal,
    pub currency: Currency,
    pub status: PaymentStatus,
    /// Optional classification. `None` combined with `status == Paid`
    /// means the payment was fully completed via an external settlement.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub cancelled: bool,
    pub datetime: DateTime<Utc>,
    pub comment: Option<String>,
    pub store: Store,
}

impl Payment {
    /// Terminal "already completed via external settlement" state.
    pub fn is_settled_externally(&self) -> bool {
        self.kind.is_none() && self.status == PaymentStatus::Paid
    }

    /// Whether the payment still accepts new transactions.
    pub fn accepts_transactions(&self) -> bool {
        !self.cancelled && !self.is_settled_externally()
    }
}

/// Fee estimate for a settlement transaction, in the smallest currency
/// unit, derived from oracle rates scaled by an estimated size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeBreakdown {
    pub economy_fee: u64,
    pub average_fee: u64,
    pub fastest_fee: u64,
}

/// Receiving wallet generated by the engine for a single transaction.
///
/// The private key is persisted for future settlement signing but must
/// never leave the storage layer; it is excluded from `Debug` output and
/// from every API response shape.
#[derive(Clone, Serialize, Deserialize)]
pub struct GeneratedWallet {
    pub public_key: String,
    pub private_key: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub fee_estimate: Option<FeeBreakdown>,
}

impl fmt::Debug for GeneratedWallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratedWallet")
            .field("public_key", &self.public_key)
            .field("private_key", &"<redacted>")
            .field("fee_estimate", &self.fee_estimate)
            .finish()
    }
}

/// One attempt to settle a payment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    /// Unique across all transactions when present; absent for
    /// wallet-backed transactions until funds arrive on-chain.
    pub tx_hash: Option<TxHash>,
    pub payment: Payment,
    /// Snapshot of the payment amount at creation time, not live-linked.
    pub amount: Decimal,
    pub status: TransactionStatus,
    pub sender: Option<String>,
    pub email: Option<String>,
    pub wallet: Option<GeneratedWallet>,
    pub updated: DateTime<Utc>,
}

/// Reduced view of a store inside trimmed responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreRef {
    pub id: StoreId,
}

/// Reduced view of a payment exposed to transaction-creation callers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentSummary {
    pub id: PaymentId,
    pub datetime: DateTime<Utc>,
    pub status: PaymentStatus,
    pub store: StoreRef,
}

impl From<&Payment> for PaymentSummary {
    fn from(payment: &Payment) -> Self {
        PaymentSummary {
            id: payment.id,
            datetime: payment.datetime,
            status: payment.status,
            store: StoreRef {
                id: payment.store.id,
            },
        }
    }
}

/// Trimmed projection returned by direct transaction creation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedTransaction {
    pub id: TransactionId,
    pub email: Option<String>,
    pub tx_hash: Option<TxHash>,
    pub sender: Option<String>,
    pub amount: Decimal,
    pub status: TransactionStatus,
    pub payment: PaymentSummary,
}

/// Projection returned by wallet-backed creation: the full transaction
/// record with the generated wallet collapsed to its public address.
/// Private key and fee breakdown stay in storage only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletTransaction {
    pub id: TransactionId,
    pub tx_hash: Option<TxHash>,
    pub sender: Option<String>,
    pub email: Option<String>,
    pub amount: Decimal,
    pub status: TransactionStatus,
    pub updated: DateTime<Utc>,
    pub payment: Payment,
    /// Public receiving address of the generated wallet
    pub wallet_for_transaction: String,
}

/// PostgreSQL configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostgresConfig {
    pub url: String,
    pub max_connections: u32,
    pub connect_timeout_secs: u64,
}

/// Fee oracle configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeOracleConfig {
    /// Base URL of a mempool-compatible fee estimation API
    pub base_url: String,
    /// Hard timeout for oracle requests
    pub timeout_secs: u64,
}

impl Default for FeeOracleConfig {
    fn default() -> Self {
        Self {
            base_url: "https://mempool.space/api".to_string(),
            timeout_secs: 10,
        }
    }
}

/// SMTP mailer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailerConfig {
    pub relay: String,
    pub username: String,
    pub password: String,
    /// Sender address for outgoing receipts and bills
    pub from: String,
}

/// Result type for gateway operations
pub type Result<T> = std::result::Result<T, Error>;

/// Domain error taxonomy, surfaced upward as request-rejection reasons.
/// Mapping to transport status codes belongs to the API layer.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("transaction already exists: {0}")]
    DuplicateTransaction(TxHash),

    #[error("payment {0} not found")]
    PaymentNotFound(PaymentId),

    #[error("payment {0} already completed")]
    PaymentAlreadyCompleted(PaymentId),

    #[error("payment {0} already cancelled")]
    PaymentCancelled(PaymentId),

    #[error("currency not supported for wallet generation: {0}")]
    UnsupportedCurrency(Currency),

    #[error("store not found")]
    StoreNotFound,

    #[error("fee oracle unavailable: {0}")]
    FeeOracleUnavailable(String),

    #[error("notification failed: {0}")]
    Notification(String),

    #[error("storage error: {0}")]
    Storage(String),
}
