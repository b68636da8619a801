use crate::{GatewayStore, NewPayment, NewTransaction};
use async_trait::async_trait;
use deadpool_postgres::{Config, ManagerConfig, Pool, RecyclingMethod, Runtime};
use paygate_types::{
    Currency, Error, GeneratedWallet, Payment, PaymentId, PaymentStatus, PostgresConfig, Result,
    Store, StoreId, StoreWallet, Transaction, TransactionId, TransactionStatus, TxHash,
};
use rust_decimal::Decimal;
use tokio_postgres::error::SqlState;
use tokio_postgres::NoTls;
use tracing::info;

pub struct PostgresStorage {
    pool: Pool,
}

impl PostgresStorage {
    pub async fn new(config: &PostgresConfig) -> Result<Self> {
        let pg_config: tokio_postgres::Config = config
            .url
            .parse()
            .map_err(|e| Error::Storage(format!("Invalid connection string: {}", e)))?;

        let mut cfg = Config::new();
        cfg.host = pg_config.get_hosts().first().and_then(|h| match h {
            tokio_postgres::config::Host::Tcp(s) => Some(s.clone()),
            #[allow(unreachable_patterns)]
            _ => None, // Unix sockets or other host types not supported for deadpool
        });
        cfg.port = pg_config.get_ports().first().copied();
        cfg.dbname = pg_config.get_dbname().map(|s| s.to_string());
        cfg.user = pg_config.get_user().map(|s| s.to_string());
        cfg.password = pg_config
            .get_password()
            .map(|p| String::from_utf8_lossy(p).to_string());

        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });

        let pool = cfg
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| Error::Storage(format!("Failed to create pool: {}", e)))?;

        let storage = Self { pool };

        info!("PostgreSQL storage initialized successfully");

        Ok(storage)
    }

    async fn client(&self) -> Result<deadpool_postgres::Object> {
        self.pool
            .get()
            .await
            .map_err(|e| Error::Storage(format!("Failed to get client: {}", e)))
    }

    async fn load_store(
        &self,
        client: &deadpool_postgres::Object,
        store_id: i64,
    ) -> Result<Store> {
        let row = client
            .query_one(
                "SELECT id, name, api_key FROM stores WHERE id = $1",
                &[&store_id],
            )
            .await
            .map_err(|e| Error::Storage(format!("Failed to load store: {}", e)))?;

        let wallets = self.load_store_wallets(client, store_id).await?;

        Ok(Store {
            id: StoreId(row.get(0)),
            name: row.get(1),
            api_key: row.get(2),
            wallets,
        })
    }

    async fn load_store_wallets(
        &self,
        client: &deadpool_postgres::Object,
        store_id: i64,
    ) -> Result<Vec<StoreWallet>> {
        let rows = client
            .query(
                "SELECT currency, value FROM store_wallets WHERE store_id = $1",
                &[&store_id],
            )
            .await
            .map_err(|e| Error::Storage(format!("Failed to load store wallets: {}", e)))?;

        rows.into_iter()
            .map(|row| {
                let currency = parse_currency(row.get(0))?;
                Ok(StoreWallet {
                    currency,
                    value: row.get(1),
                })
            })
            .collect()
    }

    async fn load_payment(
        &self,
        client: &deadpool_postgres::Object,
        payment_id: i64,
    ) -> Result<Option<Payment>> {
        let row = client
            .query_opt(
                r#"
                SELECT id, amount, currency, status, kind, cancelled, datetime, comment, store_id
                FROM payments
                WHERE id = $1
                "#,
                &[&payment_id],
            )
            .await
            .map_err(|e| Error::Storage(format!("Failed to get payment: {}", e)))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let store = self.load_store(client, row.get(8)).await?;

        Ok(Some(Payment {
            id: PaymentId(row.get(0)),
            amount: row.get::<_, Decimal>(1),
            currency: parse_currency(row.get(2))?,
            status: parse_payment_status(row.get(3)),
            kind: row.get(4),
            cancelled: row.get(5),
            datetime: row.get(6),
            comment: row.get(7),
            store,
        }))
    }

    async fn transaction_from_row(
        &self,
        client: &deadpool_postgres::Object,
        row: tokio_postgres::Row,
    ) -> Result<Transaction> {
        let payment_id: i64 = row.get(2);
        let payment = self
            .load_payment(client, payment_id)
            .await?
            .ok_or_else(|| {
                Error::Storage(format!("Transaction references missing payment {}", payment_id))
            })?;

        let wallet = row
            .get::<_, Option<serde_json::Value>>(7)
            .map(serde_json::from_value::<GeneratedWallet>)
            .transpose()
            .map_err(|e| Error::Storage(format!("Invalid wallet record: {}", e)))?;

        Ok(Transaction {
            id: TransactionId(row.get(0)),
            tx_hash: row.get::<_, Option<String>>(1).map(TxHash),
            payment,
            amount: row.get::<_, Decimal>(3),
            status: parse_transaction_status(row.get(4)),
            sender: row.get(5),
            email: row.get(6),
            wallet,
            updated: row.get(8),
        })
    }
}

#[async_trait]
impl GatewayStore for PostgresStorage {
    async fn find_payment(&self, id: PaymentId) -> Result<Option<Payment>> {
        let client = self.client().await?;
        self.load_payment(&client, id.0).await
    }

    async fn create_payment(&self, new: NewPayment) -> Result<Payment> {
        let client = self.client().await?;

        let row = client
            .query_one(
                r#"
                INSERT INTO payments (amount, currency, status, kind, cancelled, datetime, comment, store_id)
                VALUES ($1, $2, 'Not_paid', $3, FALSE, NOW(), $4, $5)
                RETURNING id, datetime
                "#,
                &[
                    &new.amount,
                    &new.currency.to_string(),
                    &new.kind,
                    &new.comment,
                    &new.store.id.0,
                ],
            )
            .await
            .map_err(|e| Error::Storage(format!("Failed to create payment: {}", e)))?;

        let id: i64 = row.get(0);
        info!("Created payment: id={} store={}", id, new.store.id);

        Ok(Payment {
            id: PaymentId(id),
            amount: new.amount,
            currency: new.currency,
            status: PaymentStatus::NotPaid,
            kind: new.kind,
            cancelled: false,
            datetime: row.get(1),
            comment: new.comment,
            store: new.store,
        })
    }

    async fn set_payment_status(&self, id: PaymentId, status: PaymentStatus) -> Result<()> {
        let client = self.client().await?;

        let updated = client
            .execute(
                "UPDATE payments SET status = $1 WHERE id = $2",
                &[&status.to_string(), &id.0],
            )
            .await
            .map_err(|e| Error::Storage(format!("Failed to update payment status: {}", e)))?;

        if updated == 0 {
            return Err(Error::PaymentNotFound(id));
        }
        Ok(())
    }

    async fn cancel_payment(&self, id: PaymentId) -> Result<()> {
        let client = self.client().await?;

        let updated = client
            .execute("UPDATE payments SET cancelled = TRUE WHERE id = $1", &[&id.0])
            .await
            .map_err(|e| Error::Storage(format!("Failed to cancel payment: {}", e)))?;

        if updated == 0 {
            return Err(Error::PaymentNotFound(id));
        }
        info!("Cancelled payment: id={}", id);
        Ok(())
    }

    async fn find_store_by_api_key(&self, api_key: &str) -> Result<Option<Store>> {
        let client = self.client().await?;

        let row = client
            .query_opt(
                "SELECT id, name, api_key FROM stores WHERE api_key = $1",
                &[&api_key],
            )
            .await
            .map_err(|e| Error::Storage(format!("Failed to get store: {}", e)))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let store_id: i64 = row.get(0);
        let wallets = self.load_store_wallets(&client, store_id).await?;

        Ok(Some(Store {
            id: StoreId(store_id),
            name: row.get(1),
            api_key: row.get(2),
            wallets,
        }))
    }

    async fn create_transaction(&self, new: NewTransaction) -> Result<Transaction> {
        let client = self.client().await?;

        let wallet_json = new
            .wallet
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| Error::Storage(format!("Failed to encode wallet: {}", e)))?;

        // The partial unique index on tx_hash is the authoritative
        // duplicate guard; a concurrent insert loses here, not at the
        // engine's pre-check.
        let row = client
            .query_one(
                r#"
                INSERT INTO transactions (tx_hash, payment_id, amount, status, sender, email, wallet, updated)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                RETURNING id
                "#,
                &[
                    &new.tx_hash.as_ref().map(|h| h.0.as_str()),
                    &new.payment.id.0,
                    &new.amount,
                    &new.status.to_string(),
                    &new.sender,
                    &new.email,
                    &wallet_json,
                    &new.updated,
                ],
            )
            .await
            .map_err(|e| match (&new.tx_hash, e.as_db_error()) {
                (Some(hash), Some(db)) if db.code() == &SqlState::UNIQUE_VIOLATION => {
                    Error::DuplicateTransaction(hash.clone())
                }
                _ => Error::Storage(format!("Failed to create transaction: {}", e)),
            })?;

        let id: i64 = row.get(0);
        info!(
            "Created transaction: id={} payment={} tx_hash={:?}",
            id, new.payment.id, new.tx_hash
        );

        Ok(Transaction {
            id: TransactionId(id),
            tx_hash: new.tx_hash,
            payment: new.payment,
            amount: new.amount,
            status: new.status,
            sender: new.sender,
            email: new.email,
            wallet: new.wallet,
            updated: new.updated,
        })
    }

    async fn find_transaction_by_hash(&self, tx_hash: &TxHash) -> Result<Option<Transaction>> {
        let client = self.client().await?;

        let row = client
            .query_opt(
                r#"
                SELECT id, tx_hash, payment_id, amount, status, sender, email, wallet, updated
                FROM transactions
                WHERE tx_hash = $1
                "#,
                &[&tx_hash.0],
            )
            .await
            .map_err(|e| Error::Storage(format!("Failed to get transaction: {}", e)))?;

        match row {
            Some(row) => Ok(Some(self.transaction_from_row(&client, row).await?)),
            None => Ok(None),
        }
    }

    async fn find_transaction_by_payment(
        &self,
        payment_id: PaymentId,
    ) -> Result<Option<Transaction>> {
        let client = self.client().await?;

        let row = client
            .query_opt(
                r#"
                SELECT id, tx_hash, payment_id, amount, status, sender, email, wallet, updated
                FROM transactions
                WHERE payment_id = $1
                ORDER BY id DESC
                LIMIT 1
                "#,
                &[&payment_id.0],
            )
            .await
            .map_err(|e| Error::Storage(format!("Failed to get transaction: {}", e)))?;

        match row {
            Some(row) => Ok(Some(self.transaction_from_row(&client, row).await?)),
            None => Ok(None),
        }
    }

    async fn list_transactions(
        &self,
        limit: Option<usize>,
        offset: Option<usize>,
    ) -> Result<Vec<Transaction>> {
        let client = self.client().await?;

        let limit_val = limit.unwrap_or(100) as i64;
        let offset_val = offset.unwrap_or(0) as i64;

        let rows = client
            .query(
                r#"
                SELECT id, tx_hash, payment_id, amount, status, sender, email, wallet, updated
                FROM transactions
                ORDER BY id DESC
                LIMIT $1 OFFSET $2
                "#,
                &[&limit_val, &offset_val],
            )
            .await
            .map_err(|e| Error::Storage(format!("Failed to query transactions: {}", e)))?;

        let mut transactions = Vec::with_capacity(rows.len());
        for row in rows {
            transactions.push(self.transaction_from_row(&client, row).await?);
        }

        info!(
            "Listed {} transactions (limit: {}, offset: {})",
            transactions.len(),
            limit_val,
            offset_val
        );

        Ok(transactions)
    }

    async fn count_transactions_for_payment(&self, payment_id: PaymentId) -> Result<u64> {
        let client = self.client().await?;

        let row = client
            .query_one(
                "SELECT COUNT(*) FROM transactions WHERE payment_id = $1",
                &[&payment_id.0],
            )
            .await
            .map_err(|e| Error::Storage(format!("Failed to count transactions: {}", e)))?;

        Ok(row.get::<_, i64>(0) as u64)
    }
}

fn parse_currency(s: String) -> Result<Currency> {
    match s.as_str() {
        "Bitcoin" => Ok(Currency::Bitcoin),
        "Doge" => Ok(Currency::Doge),
        "Ethereum" => Ok(Currency::Ethereum),
        other => Err(Error::Storage(format!("Unknown currency: {}", other))),
    }
}

fn parse_payment_status(s: String) -> PaymentStatus {
    match s.as_str() {
        "Paid" => PaymentStatus::Paid,
        _ => PaymentStatus::NotPaid,
    }
}

fn parse_transaction_status(s: String) -> TransactionStatus {
    match s.as_str() {
        "processing" => TransactionStatus::Processing,
        "confirmed" => TransactionStatus::Confirmed,
        _ => TransactionStatus::Failed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_currency() {
        assert_eq!(parse_currency("Bitcoin".to_string()).unwrap(), Currency::Bitcoin);
        assert_eq!(parse_currency("Doge".to_string()).unwrap(), Currency::Doge);
        assert!(parse_currency("Monero".to_string()).is_err());
    }

    #[test]
    fn test_parse_statuses() {
        assert_eq!(parse_payment_status("Paid".to_string()), PaymentStatus::Paid);
        assert_eq!(
            parse_payment_status("Not_paid".to_string()),
            PaymentStatus::NotPaid
        );
        assert_eq!(
            parse_transaction_status("processing".to_string()),
            TransactionStatus::Processing
        );
        assert_eq!(
            parse_transaction_status("garbage".to_string()),
            TransactionStatus::Failed
        );
    }
}
