pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PostgresStorage;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use paygate_types::{
    Currency, GeneratedWallet, Payment, PaymentId, PaymentStatus, Result, Store, Transaction,
    TransactionStatus, TxHash,
};
use rust_decimal::Decimal;

/// Input record for payment creation. The owning store is resolved by the
/// caller (via API key); status and datetime are set by the backend.
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub amount: Decimal,
    pub currency: Currency,
    pub kind: Option<String>,
    pub comment: Option<String>,
    pub store: Store,
}

/// Input record for transaction creation. A single atomic write: either
/// the full row is persisted or nothing is.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub tx_hash: Option<TxHash>,
    pub payment: Payment,
    pub amount: Decimal,
    pub status: TransactionStatus,
    pub sender: Option<String>,
    pub email: Option<String>,
    pub wallet: Option<GeneratedWallet>,
    pub updated: DateTime<Utc>,
}

/// Persistence port for the gateway.
///
/// `create_transaction` is the only write the workflow engine performs and
/// must enforce tx-hash uniqueness at the storage layer (not just by a
/// prior existence check), returning
/// [`paygate_types::Error::DuplicateTransaction`] when a concurrent insert
/// wins the race.
#[async_trait]
pub trait GatewayStore: Send + Sync {
    async fn find_payment(&self, id: PaymentId) -> Result<Option<Payment>>;

    async fn create_payment(&self, new: NewPayment) -> Result<Payment>;

    async fn set_payment_status(&self, id: PaymentId, status: PaymentStatus) -> Result<()>;

    async fn cancel_payment(&self, id: PaymentId) -> Result<()>;

    async fn find_store_by_api_key(&self, api_key: &str) -> Result<Option<Store>>;

    async fn create_transaction(&self, new: NewTransaction) -> Result<Transaction>;

    async fn find_transaction_by_hash(&self, tx_hash: &TxHash) -> Result<Option<Transaction>>;

    /// Latest transaction attached to a payment, if any.
    async fn find_transaction_by_payment(
        &self,
        payment_id: PaymentId,
    ) -> Result<Option<Transaction>>;

    async fn list_transactions(
        &self,
        limit: Option<usize>,
        offset: Option<usize>,
    ) -> Result<Vec<Transaction>>;

    async fn count_transactions_for_payment(&self, payment_id: PaymentId) -> Result<u64>;
}
