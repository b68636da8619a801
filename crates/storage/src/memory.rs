//! In-memory backend.
//!
//! Backs the engine's integration tests and small deployments without a
//! database. All state lives behind one `RwLock`, so the duplicate-hash
//! check and the insert happen under a single write guard and the
//! uniqueness invariant holds under concurrent creation, mirroring the
//! unique index the PostgreSQL backend relies on.

use crate::{GatewayStore, NewPayment, NewTransaction};
use async_trait::async_trait;
use chrono::Utc;
use paygate_types::{
    Error, Payment, PaymentId, PaymentStatus, Result, Store, Transaction, TransactionId, TxHash,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct Inner {
    payments: HashMap<i64, Payment>,
    transactions: Vec<Transaction>,
    stores: HashMap<i64, Store>,
    next_payment_id: i64,
    next_transaction_id: i64,
}

/// Thread-safe in-memory store for payments and transactions.
#[derive(Default, Clone)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStore {
    /// Creates a new, empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store record (test setup; stores are created out-of-band in
    /// production).
    pub async fn insert_store(&self, store: Store) {
        let mut inner = self.inner.write().await;
        inner.stores.insert(store.id.0, store);
    }

    /// Seed a payment record with caller-chosen id and state (test setup).
    pub async fn insert_payment(&self, payment: Payment) {
        let mut inner = self.inner.write().await;
        inner.next_payment_id = inner.next_payment_id.max(payment.id.0);
        inner.payments.insert(payment.id.0, payment);
    }
}

#[async_trait]
impl GatewayStore for MemoryStore {
    async fn find_payment(&self, id: PaymentId) -> Result<Option<Payment>> {
        let inner = self.inner.read().await;
        Ok(inner.payments.get(&id.0).cloned())
    }

    async fn create_payment(&self, new: NewPayment) -> Result<Payment> {
        let mut inner = self.inner.write().await;
        inner.next_payment_id += 1;
        let payment = Payment {
            id: PaymentId(inner.next_payment_id),
            amount: new.amount,
            currency: new.currency,
            status: PaymentStatus::NotPaid,
            kind: new.kind,
            cancelled: false,
            datetime: Utc::now(),
            comment: new.comment,
            store: new.store,
        };
        inner.payments.insert(payment.id.0, payment.clone());
        Ok(payment)
    }

    async fn set_payment_status(&self, id: PaymentId, status: PaymentStatus) -> Result<()> {
        let mut inner = self.inner.write().await;
        match inner.payments.get_mut(&id.0) {
            Some(payment) => {
                payment.status = status;
                Ok(())
            }
            None => Err(Error::PaymentNotFound(id)),
        }
    }

    async fn cancel_payment(&self, id: PaymentId) -> Result<()> {
        let mut inner = self.inner.write().await;
        match inner.payments.get_mut(&id.0) {
            Some(payment) => {
                payment.cancelled = true;
                Ok(())
            }
            None => Err(Error::PaymentNotFound(id)),
        }
    }

    async fn find_store_by_api_key(&self, api_key: &str) -> Result<Option<Store>> {
        let inner = self.inner.read().await;
        Ok(inner.stores.values().find(|s| s.api_key == api_key).cloned())
    }

    async fn create_transaction(&self, new: NewTransaction) -> Result<Transaction> {
        let mut inner = self.inner.write().await;

        // check-then-insert under one write guard
        if let Some(hash) = &new.tx_hash {
            if inner
                .transactions
                .iter()
                .any(|t| t.tx_hash.as_ref() == Some(hash))
            {
                return Err(Error::DuplicateTransaction(hash.clone()));
            }
        }

        inner.next_transaction_id += 1;
        let transaction = Transaction {
            id: TransactionId(inner.next_transaction_id),
            tx_hash: new.tx_hash,
            payment: new.payment,
            amount: new.amount,
            status: new.status,
            sender: new.sender,
            email: new.email,
            wallet: new.wallet,
            updated: new.updated,
        };
        inner.transactions.push(transaction.clone());
        Ok(transaction)
    }

    async fn find_transaction_by_hash(&self, tx_hash: &TxHash) -> Result<Option<Transaction>> {
        let inner = self.inner.read().await;
        Ok(inner
            .transactions
            .iter()
            .find(|t| t.tx_hash.as_ref() == Some(tx_hash))
            .cloned())
    }

    async fn find_transaction_by_payment(
        &self,
        payment_id: PaymentId,
    ) -> Result<Option<Transaction>> {
        let inner = self.inner.read().await;
        Ok(inner
            .transactions
            .iter()
            .rev()
            .find(|t| t.payment.id == payment_id)
            .cloned())
    }

    async fn list_transactions(
        &self,
        limit: Option<usize>,
        offset: Option<usize>,
    ) -> Result<Vec<Transaction>> {
        let inner = self.inner.read().await;
        Ok(inner
            .transactions
            .iter()
            .rev()
            .skip(offset.unwrap_or(0))
            .take(limit.unwrap_or(100))
            .cloned()
            .collect())
    }

    async fn count_transactions_for_payment(&self, payment_id: PaymentId) -> Result<u64> {
        let inner = self.inner.read().await;
        Ok(inner
            .transactions
            .iter()
            .filter(|t| t.payment.id == payment_id)
            .count() as u64)
    }
}
