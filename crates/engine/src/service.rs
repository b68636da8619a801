//! Transaction creation workflow.
//!
//! Two entry operations: direct creation with a caller-supplied
//! transaction hash, and creation with a freshly generated receiving
//! wallet. Both consult the payment store for gating, persist exactly one
//! row, and shape a trimmed response for the API layer.

use crate::config::WorkflowConfig;
use crate::fees::FeeEstimator;
use crate::notify::{MailMessage, MailTemplate, Notifier};
use chrono::Utc;
use paygate_storage::{GatewayStore, NewTransaction};
use paygate_types::{
    CreatedTransaction, Currency, Error, FeeBreakdown, GeneratedWallet, Payment, PaymentId,
    PaymentSummary, Result, Transaction, TransactionStatus, TxHash, WalletTransaction,
};
use paygate_wallet::{generate_keypair, KeyNetwork, QUOTE_TX_VSIZE, SETTLEMENT_TX_VSIZE};
use std::sync::Arc;
use tracing::{info, warn};

/// Input for direct transaction creation.
#[derive(Debug, Clone)]
pub struct CreateTransactionInput {
    pub payment_id: PaymentId,
    pub tx_hash: TxHash,
    pub sender: Option<String>,
    pub email: Option<String>,
}

/// The transaction workflow engine.
pub struct TransactionWorkflow {
    store: Arc<dyn GatewayStore>,
    fees: Arc<dyn FeeEstimator>,
    notifier: Arc<dyn Notifier>,
    config: WorkflowConfig,
}

impl TransactionWorkflow {
    pub fn new(
        store: Arc<dyn GatewayStore>,
        fees: Arc<dyn FeeEstimator>,
        notifier: Arc<dyn Notifier>,
        config: WorkflowConfig,
    ) -> Self {
        Self {
            store,
            fees,
            notifier,
            config,
        }
    }

    /// Create a transaction for a payment from caller-supplied hash data.
    ///
    /// The pre-check on the hash gives a clean rejection on the common
    /// path; the storage layer's unique index is what actually guarantees
    /// at most one transaction per hash under concurrent requests.
    pub async fn create_transaction(
        &self,
        input: CreateTransactionInput,
    ) -> Result<CreatedTransaction> {
        if self
            .store
            .find_transaction_by_hash(&input.tx_hash)
            .await?
            .is_some()
        {
            return Err(Error::DuplicateTransaction(input.tx_hash));
        }

        let payment = self.resolve_open_payment(input.payment_id).await?;

        let created = self
            .store
            .create_transaction(NewTransaction {
                tx_hash: Some(input.tx_hash),
                amount: payment.amount,
                payment,
                status: TransactionStatus::Processing,
                sender: input.sender,
                email: input.email,
                wallet: None,
                updated: Utc::now(),
            })
            .await?;

        info!(
            "Transaction {} created for payment {}",
            created.id, created.payment.id
        );

        // Best-effort receipt, only after the row is safely persisted.
        self.send_receipt(&created).await;

        Ok(CreatedTransaction {
            id: created.id,
            email: created.email,
            tx_hash: created.tx_hash,
            sender: created.sender,
            amount: created.amount,
            status: created.status,
            payment: PaymentSummary::from(&created.payment),
        })
    }

    /// Create a transaction backed by a freshly generated receiving
    /// wallet for the payment's currency.
    ///
    /// The response collapses the wallet to its public address; the
    /// private key and fee breakdown are persisted but never echoed.
    pub async fn create_transaction_with_wallet(
        &self,
        payment_id: PaymentId,
        email: Option<String>,
    ) -> Result<WalletTransaction> {
        let payment = self.resolve_open_payment(payment_id).await?;

        let network = KeyNetwork::for_currency(payment.currency, self.config.bitcoin_testnet)
            .ok_or(Error::UnsupportedCurrency(payment.currency))?;

        let keypair = generate_keypair(network);

        let fee_estimate = self.settlement_fee_estimate(payment.currency).await;

        // The store wallet is where generated funds are ultimately
        // directed; its absence is a merchant configuration problem, not
        // a reason to refuse the payer.
        if payment.store.wallet_for(payment.currency).is_none() {
            warn!(
                "Store {} has no {} wallet to receive settlement of payment {}",
                payment.store.id, payment.currency, payment.id
            );
        }

        let wallet = GeneratedWallet {
            public_key: keypair.address.clone(),
            private_key: keypair.wif.clone(),
            fee_estimate,
        };

        let created = self
            .store
            .create_transaction(NewTransaction {
                tx_hash: None,
                amount: payment.amount,
                payment,
                status: TransactionStatus::Processing,
                sender: Some(email.clone().unwrap_or_default()),
                email,
                wallet: Some(wallet),
                updated: Utc::now(),
            })
            .await?;

        info!(
            "Wallet-backed transaction {} created for payment {}",
            created.id, created.payment.id
        );

        Ok(WalletTransaction {
            id: created.id,
            tx_hash: created.tx_hash,
            sender: created.sender,
            email: created.email,
            amount: created.amount,
            status: created.status,
            updated: created.updated,
            payment: created.payment,
            wallet_for_transaction: keypair.address,
        })
    }

    /// Current fee quote for a typical settlement transaction
    /// (one input, payment output plus change).
    pub async fn recommended_fee_quote(&self) -> Result<FeeBreakdown> {
        let rates = self
            .fees
            .recommended()
            .await
            .map_err(|e| Error::FeeOracleUnavailable(e.to_string()))?;

        Ok(rates.for_vsize(QUOTE_TX_VSIZE))
    }

    /// Email a bill for an open payment. Unlike transaction receipts this
    /// is the operation the caller asked for, so failures propagate.
    pub async fn send_payment_bill(
        &self,
        payment_id: PaymentId,
        email: String,
        bill_url: String,
    ) -> Result<()> {
        let payment = self
            .store
            .find_payment(payment_id)
            .await?
            .ok_or(Error::PaymentNotFound(payment_id))?;

        let mail = MailMessage {
            to: email.clone(),
            subject: format!("Payment to store {}", payment.store.name),
            template: MailTemplate::PaymentBill {
                email,
                bill_url,
                store: payment.store.name.clone(),
                comment: payment.comment.clone(),
                amount: payment.amount,
            },
        };

        self.notifier
            .send(mail)
            .await
            .map_err(|e| Error::Notification(e.to_string()))
    }

    /// Resolve a payment and apply the gating invariant: cancelled
    /// payments and payments completed via external settlement accept no
    /// new transactions.
    async fn resolve_open_payment(&self, payment_id: PaymentId) -> Result<Payment> {
        let payment = self
            .store
            .find_payment(payment_id)
            .await?
            .ok_or(Error::PaymentNotFound(payment_id))?;

        if payment.is_settled_externally() {
            return Err(Error::PaymentAlreadyCompleted(payment.id));
        }
        if payment.cancelled {
            return Err(Error::PaymentCancelled(payment.id));
        }

        Ok(payment)
    }

    /// Fee estimate for settling into the generated wallet. Only Bitcoin
    /// has an oracle; a failing oracle degrades to no estimate rather
    /// than failing the creation.
    async fn settlement_fee_estimate(&self, currency: Currency) -> Option<FeeBreakdown> {
        if currency != Currency::Bitcoin || !self.config.estimate_fees {
            return None;
        }

        match self.fees.recommended().await {
            Ok(rates) => Some(rates.for_vsize(SETTLEMENT_TX_VSIZE)),
            Err(e) => {
                warn!(
                    "Fee oracle unavailable, creating transaction without fee estimate: {}",
                    e
                );
                None
            }
        }
    }

    /// Best-effort receipt email. Errors are logged and discarded; a
    /// failed notification never affects the created transaction.
    async fn send_receipt(&self, transaction: &Transaction) {
        let Some(to) = transaction.email.clone() else {
            return;
        };

        let mail = MailMessage {
            to,
            subject: format!("Payment to store {}", transaction.payment.store.name),
            template: MailTemplate::TransactionReceipt {
                email: transaction.email.clone().unwrap_or_default(),
                store: transaction.payment.store.name.clone(),
                status: transaction.status,
            },
        };

        if let Err(e) = self.notifier.send(mail).await {
            warn!(
                "Receipt notification for transaction {} failed: {}",
                transaction.id, e
            );
        }
    }
}
