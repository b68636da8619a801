//! End-to-end workflow tests against the in-memory store.

use async_trait::async_trait;
use chrono::Utc;
use paygate_engine::{
    CreateTransactionInput, FeeEstimator, MailMessage, Notifier, NotifyError, TransactionWorkflow,
    WorkflowConfig,
};
use paygate_storage::{GatewayStore, MemoryStore};
use paygate_types::{
    Currency, Error, Payment, PaymentId, PaymentStatus, Store, StoreId, StoreWallet,
    TransactionStatus, TxHash,
};
use paygate_wallet::{OracleError, RecommendedFees};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use tokio::sync::Mutex;

struct FixedFees;

#[async_trait]
impl FeeEstimator for FixedFees {
    async fn recommended(&self) -> Result<RecommendedFees, OracleError> {
        Ok(RecommendedFees {
            fastest_fee: 21.0,
            half_hour_fee: 16.0,
            hour_fee: 12.0,
            economy_fee: 6.0,
            minimum_fee: 3.0,
        })
    }
}

struct FailingFees;

#[async_trait]
impl FeeEstimator for FailingFees {
    async fn recommended(&self) -> Result<RecommendedFees, OracleError> {
        Err(OracleError::ApiRequest("connection refused".to_string()))
    }
}

#[derive(Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<MailMessage>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, mail: MailMessage) -> Result<(), NotifyError> {
        self.sent.lock().await.push(mail);
        Ok(())
    }
}

struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn send(&self, _mail: MailMessage) -> Result<(), NotifyError> {
        Err(NotifyError::Transport("relay unreachable".to_string()))
    }
}

fn store_with_bitcoin_wallet() -> Store {
    Store {
        id: StoreId(10),
        name: "demo-store".to_string(),
        api_key: "key-10".to_string(),
        wallets: vec![StoreWallet {
            currency: Currency::Bitcoin,
            value: "1BvBMSEYstWetqTFn5Au4m4GFg7xJaNVN2".to_string(),
        }],
    }
}

fn payment(id: i64, currency: Currency, amount: Decimal) -> Payment {
    Payment {
        id: PaymentId(id),
        amount,
        currency,
        status: PaymentStatus::NotPaid,
        kind: Some("invoice".to_string()),
        cancelled: false,
        datetime: Utc::now(),
        comment: None,
        store: store_with_bitcoin_wallet(),
    }
}

struct Harness {
    db: MemoryStore,
    notifier: Arc<RecordingNotifier>,
    workflow: TransactionWorkflow,
}

fn harness() -> Harness {
    let db = MemoryStore::new();
    let notifier = Arc::new(RecordingNotifier::default());
    let workflow = TransactionWorkflow::new(
        Arc::new(db.clone()),
        Arc::new(FixedFees),
        notifier.clone(),
        WorkflowConfig::default(),
    );
    Harness {
        db,
        notifier,
        workflow,
    }
}

fn input(payment_id: i64, tx_hash: &str) -> CreateTransactionInput {
    CreateTransactionInput {
        payment_id: PaymentId(payment_id),
        tx_hash: TxHash::from(tx_hash),
        sender: Some("customer".to_string()),
        email: Some("customer@example.com".to_string()),
    }
}

#[tokio::test]
async fn create_transaction_snapshots_payment_amount() {
    let h = harness();
    h.db.insert_payment(payment(1, Currency::Bitcoin, dec!(0.01))).await;

    let created = h.workflow.create_transaction(input(1, "abc")).await.unwrap();

    assert_eq!(created.status, TransactionStatus::Processing);
    assert_eq!(created.amount, dec!(0.01));
    assert_eq!(created.tx_hash, Some(TxHash::from("abc")));
    assert_eq!(created.payment.id, PaymentId(1));
    assert_eq!(created.payment.store.id, StoreId(10));
}

#[tokio::test]
async fn create_transaction_sends_receipt_after_persist() {
    let h = harness();
    h.db.insert_payment(payment(1, Currency::Bitcoin, dec!(0.01))).await;

    h.workflow.create_transaction(input(1, "abc")).await.unwrap();

    let sent = h.notifier.sent.lock().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "customer@example.com");
    assert_eq!(sent[0].subject, "Payment to store demo-store");
    assert_eq!(sent[0].template.template_id(), "create-transaction");
}

#[tokio::test]
async fn duplicate_tx_hash_rejected() {
    let h = harness();
    h.db.insert_payment(payment(3, Currency::Bitcoin, dec!(0.5))).await;

    h.workflow.create_transaction(input(3, "abc")).await.unwrap();
    let err = h.workflow.create_transaction(input(3, "abc")).await.unwrap_err();

    assert!(matches!(err, Error::DuplicateTransaction(_)));
    assert_eq!(
        h.db.count_transactions_for_payment(PaymentId(3)).await.unwrap(),
        1
    );
}

#[tokio::test]
async fn retries_with_fresh_hashes_are_allowed() {
    let h = harness();
    h.db.insert_payment(payment(1, Currency::Bitcoin, dec!(0.01))).await;

    h.workflow.create_transaction(input(1, "first")).await.unwrap();
    h.workflow.create_transaction(input(1, "second")).await.unwrap();

    assert_eq!(
        h.db.count_transactions_for_payment(PaymentId(1)).await.unwrap(),
        2
    );
}

#[tokio::test]
async fn missing_payment_rejected() {
    let h = harness();

    let err = h.workflow.create_transaction(input(99, "abc")).await.unwrap_err();
    assert!(matches!(err, Error::PaymentNotFound(PaymentId(99))));

    let err = h
        .workflow
        .create_transaction_with_wallet(PaymentId(99), None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::PaymentNotFound(PaymentId(99))));
}

#[tokio::test]
async fn externally_settled_payment_rejected() {
    let h = harness();
    let mut p = payment(4, Currency::Bitcoin, dec!(1));
    p.kind = None;
    p.status = PaymentStatus::Paid;
    h.db.insert_payment(p).await;

    let err = h.workflow.create_transaction(input(4, "abc")).await.unwrap_err();
    assert!(matches!(err, Error::PaymentAlreadyCompleted(PaymentId(4))));

    // a Paid payment with a type is still open
    let mut typed = payment(5, Currency::Bitcoin, dec!(1));
    typed.status = PaymentStatus::Paid;
    h.db.insert_payment(typed).await;
    assert!(h.workflow.create_transaction(input(5, "def")).await.is_ok());
}

#[tokio::test]
async fn cancelled_payment_rejects_both_paths() {
    let h = harness();
    let mut p = payment(2, Currency::Bitcoin, dec!(0.2));
    p.cancelled = true;
    h.db.insert_payment(p).await;

    let err = h.workflow.create_transaction(input(2, "abc")).await.unwrap_err();
    assert!(matches!(err, Error::PaymentCancelled(PaymentId(2))));

    let err = h
        .workflow
        .create_transaction_with_wallet(PaymentId(2), None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::PaymentCancelled(PaymentId(2))));

    assert_eq!(
        h.db.count_transactions_for_payment(PaymentId(2)).await.unwrap(),
        0
    );
}

#[tokio::test]
async fn unsupported_currency_persists_nothing() {
    let h = harness();
    h.db.insert_payment(payment(6, Currency::Ethereum, dec!(1))).await;

    let err = h
        .workflow
        .create_transaction_with_wallet(PaymentId(6), None)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::UnsupportedCurrency(Currency::Ethereum)));
    assert_eq!(
        h.db.count_transactions_for_payment(PaymentId(6)).await.unwrap(),
        0
    );
}

#[tokio::test]
async fn wallet_generation_for_bitcoin_payment() {
    let h = harness();
    h.db.insert_payment(payment(1, Currency::Bitcoin, dec!(0.01))).await;

    let result = h
        .workflow
        .create_transaction_with_wallet(PaymentId(1), Some("payer@example.com".to_string()))
        .await
        .unwrap();

    assert!(!result.wallet_for_transaction.is_empty());
    assert!(result.wallet_for_transaction.starts_with('1'));
    assert_eq!(result.status, TransactionStatus::Processing);
    assert_eq!(result.amount, dec!(0.01));
    assert_eq!(result.sender.as_deref(), Some("payer@example.com"));

    // persisted row keeps the full wallet record
    let persisted = h
        .db
        .find_transaction_by_payment(PaymentId(1))
        .await
        .unwrap()
        .unwrap();
    let wallet = persisted.wallet.unwrap();
    assert_eq!(wallet.public_key, result.wallet_for_transaction);
    assert!(!wallet.private_key.is_empty());
    let fees = wallet.fee_estimate.unwrap();
    // 192 vB at the fixed rates
    assert_eq!(fees.economy_fee, 1152);
    assert_eq!(fees.average_fee, 2304);
    assert_eq!(fees.fastest_fee, 4032);
}

#[tokio::test]
async fn wallet_response_never_contains_private_key() {
    let h = harness();
    h.db.insert_payment(payment(1, Currency::Bitcoin, dec!(0.01))).await;

    let result = h
        .workflow
        .create_transaction_with_wallet(PaymentId(1), None)
        .await
        .unwrap();

    let json = serde_json::to_string(&result).unwrap();
    assert!(json.contains("walletForTransaction"));
    assert!(!json.contains("privateKey"));
    assert!(!json.contains("fee_estimate"));
}

#[tokio::test]
async fn wallet_generation_for_doge_payment() {
    let h = harness();
    h.db.insert_payment(payment(8, Currency::Doge, dec!(120))).await;

    let result = h
        .workflow
        .create_transaction_with_wallet(PaymentId(8), None)
        .await
        .unwrap();

    assert!(result.wallet_for_transaction.starts_with('D'));
    // Doge has no fee oracle
    let persisted = h
        .db
        .find_transaction_by_payment(PaymentId(8))
        .await
        .unwrap()
        .unwrap();
    assert!(persisted.wallet.unwrap().fee_estimate.is_none());
    // sender defaults to empty when no email was supplied
    assert_eq!(persisted.sender.as_deref(), Some(""));
}

#[tokio::test]
async fn generated_wallets_never_repeat() {
    let h = harness();
    h.db.insert_payment(payment(1, Currency::Bitcoin, dec!(0.01))).await;

    let first = h
        .workflow
        .create_transaction_with_wallet(PaymentId(1), None)
        .await
        .unwrap();
    let second = h
        .workflow
        .create_transaction_with_wallet(PaymentId(1), None)
        .await
        .unwrap();

    assert_ne!(first.wallet_for_transaction, second.wallet_for_transaction);
}

#[tokio::test]
async fn fee_oracle_outage_degrades_to_no_estimate() {
    let db = MemoryStore::new();
    db.insert_payment(payment(1, Currency::Bitcoin, dec!(0.01))).await;
    let workflow = TransactionWorkflow::new(
        Arc::new(db.clone()),
        Arc::new(FailingFees),
        Arc::new(RecordingNotifier::default()),
        WorkflowConfig::default(),
    );

    let result = workflow
        .create_transaction_with_wallet(PaymentId(1), None)
        .await
        .unwrap();
    assert!(!result.wallet_for_transaction.is_empty());

    let persisted = db
        .find_transaction_by_payment(PaymentId(1))
        .await
        .unwrap()
        .unwrap();
    assert!(persisted.wallet.unwrap().fee_estimate.is_none());
}

#[tokio::test]
async fn notification_failure_does_not_fail_creation() {
    let db = MemoryStore::new();
    db.insert_payment(payment(1, Currency::Bitcoin, dec!(0.01))).await;
    let workflow = TransactionWorkflow::new(
        Arc::new(db.clone()),
        Arc::new(FixedFees),
        Arc::new(FailingNotifier),
        WorkflowConfig::default(),
    );

    let created = workflow.create_transaction(input(1, "abc")).await.unwrap();
    assert_eq!(created.status, TransactionStatus::Processing);
    assert_eq!(
        db.count_transactions_for_payment(PaymentId(1)).await.unwrap(),
        1
    );
}

#[tokio::test]
async fn testnet_config_changes_address_network() {
    let db = MemoryStore::new();
    db.insert_payment(payment(1, Currency::Bitcoin, dec!(0.01))).await;
    let workflow = TransactionWorkflow::new(
        Arc::new(db),
        Arc::new(FixedFees),
        Arc::new(RecordingNotifier::default()),
        WorkflowConfig {
            bitcoin_testnet: true,
            ..WorkflowConfig::default()
        },
    );

    let result = workflow
        .create_transaction_with_wallet(PaymentId(1), None)
        .await
        .unwrap();
    assert!(
        result.wallet_for_transaction.starts_with('m')
            || result.wallet_for_transaction.starts_with('n')
    );
}

#[tokio::test]
async fn missing_store_wallet_only_warns() {
    let h = harness();
    let mut p = payment(9, Currency::Doge, dec!(50));
    p.store.wallets.clear();
    h.db.insert_payment(p).await;

    assert!(h
        .workflow
        .create_transaction_with_wallet(PaymentId(9), None)
        .await
        .is_ok());
}

#[tokio::test]
async fn fee_quote_uses_quote_sizing() {
    let h = harness();
    let quote = h.workflow.recommended_fee_quote().await.unwrap();
    // 226 vB at the fixed rates
    assert_eq!(quote.economy_fee, 1356);
    assert_eq!(quote.average_fee, 2712);
    assert_eq!(quote.fastest_fee, 4746);
}

#[tokio::test]
async fn fee_quote_surfaces_oracle_outage() {
    let workflow = TransactionWorkflow::new(
        Arc::new(MemoryStore::new()),
        Arc::new(FailingFees),
        Arc::new(RecordingNotifier::default()),
        WorkflowConfig::default(),
    );

    let err = workflow.recommended_fee_quote().await.unwrap_err();
    assert!(matches!(err, Error::FeeOracleUnavailable(_)));
}

#[tokio::test]
async fn payment_bill_propagates_notifier_failure() {
    let db = MemoryStore::new();
    db.insert_payment(payment(1, Currency::Bitcoin, dec!(0.01))).await;
    let workflow = TransactionWorkflow::new(
        Arc::new(db),
        Arc::new(FixedFees),
        Arc::new(FailingNotifier),
        WorkflowConfig::default(),
    );

    let err = workflow
        .send_payment_bill(
            PaymentId(1),
            "customer@example.com".to_string(),
            "https://pay.example/bill/1".to_string(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Notification(_)));
}

#[tokio::test]
async fn payment_bill_includes_payment_context() {
    let h = harness();
    let mut p = payment(1, Currency::Bitcoin, dec!(0.25));
    p.comment = Some("two coffees".to_string());
    h.db.insert_payment(p).await;

    h.workflow
        .send_payment_bill(
            PaymentId(1),
            "customer@example.com".to_string(),
            "https://pay.example/bill/1".to_string(),
        )
        .await
        .unwrap();

    let sent = h.notifier.sent.lock().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].template.template_id(), "send-mail-bill");
}
