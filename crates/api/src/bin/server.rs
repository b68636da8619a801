//! Payment Gateway API Server
//!
//! Serves the REST endpoints for payment registration, transaction
//! creation, wallet generation and fee quotes.

use anyhow::Result;
use paygate_api::{start_server, AppState};
use paygate_engine::{NoopNotifier, Notifier, SmtpNotifier, TransactionWorkflow, WorkflowConfig};
use paygate_storage::{GatewayStore, PostgresStorage};
use paygate_types::{FeeOracleConfig, MailerConfig, PostgresConfig};
use paygate_wallet::FeeOracle;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing/logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("Starting Payment Gateway API Server");

    // Load configuration from environment
    let config = load_config()?;

    // Initialize PostgreSQL storage
    info!(
        "Connecting to PostgreSQL at {}",
        mask_password(&config.postgres_config.url)
    );
    let storage = Arc::new(PostgresStorage::new(&config.postgres_config).await?);
    info!("PostgreSQL storage initialized");

    // Initialize fee oracle
    info!("Fee oracle endpoint: {}", config.fee_oracle.base_url);
    let fee_oracle = Arc::new(FeeOracle::new(&config.fee_oracle)?);

    // Initialize the notifier; without SMTP configuration receipts are
    // silently dropped
    let notifier: Arc<dyn Notifier> = match &config.mailer {
        Some(mailer) => {
            info!("SMTP notifier enabled via {}", mailer.relay);
            Arc::new(SmtpNotifier::new(mailer)?)
        }
        None => {
            warn!("SMTP not configured - transaction receipts disabled");
            Arc::new(NoopNotifier)
        }
    };

    // Assemble the workflow engine
    let store: Arc<dyn GatewayStore> = storage;
    let workflow = Arc::new(TransactionWorkflow::new(
        Arc::clone(&store),
        fee_oracle,
        notifier,
        config.workflow.clone(),
    ));

    let state = AppState::new(store, workflow);

    // Parse listen address
    let addr: SocketAddr = config.listen_addr.parse()?;

    info!("Server configuration:");
    info!("  Listen Address: {}", addr);
    info!("  Bitcoin testnet: {}", config.workflow.bitcoin_testnet);
    info!("  Fee estimation: {}", config.workflow.estimate_fees);

    // Start the API server in a separate task
    let server_handle = tokio::spawn(async move {
        if let Err(e) = start_server(state, addr).await {
            error!("Server error: {}", e);
        }
    });

    // Wait for shutdown signal
    info!("Server running. Press Ctrl+C to shutdown.");
    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Shutdown signal received");
        }
        Err(err) => {
            error!("Unable to listen for shutdown signal: {}", err);
        }
    }

    server_handle.abort();
    info!("Shutdown complete");
    Ok(())
}

#[derive(Debug)]
struct Config {
    listen_addr: String,
    postgres_config: PostgresConfig,
    fee_oracle: FeeOracleConfig,
    mailer: Option<MailerConfig>,
    workflow: WorkflowConfig,
}

fn load_config() -> Result<Config> {
    let listen_addr =
        std::env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

    let postgres_url = std::env::var("POSTGRES_URL")
        .map_err(|_| anyhow::anyhow!("POSTGRES_URL environment variable is required"))?;

    let postgres_config = PostgresConfig {
        url: postgres_url,
        max_connections: 10,
        connect_timeout_secs: 30,
    };

    let fee_oracle_defaults = FeeOracleConfig::default();
    let fee_oracle = FeeOracleConfig {
        base_url: std::env::var("FEE_ORACLE_URL")
            .unwrap_or(fee_oracle_defaults.base_url),
        timeout_secs: std::env::var("FEE_ORACLE_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(fee_oracle_defaults.timeout_secs),
    };

    // All four SMTP variables are required to enable the mailer
    let mailer = match (
        std::env::var("SMTP_RELAY"),
        std::env::var("SMTP_USERNAME"),
        std::env::var("SMTP_PASSWORD"),
        std::env::var("MAILER_EMAIL"),
    ) {
        (Ok(relay), Ok(username), Ok(password), Ok(from)) => Some(MailerConfig {
            relay,
            username,
            password,
            from,
        }),
        _ => None,
    };

    let bitcoin_network =
        std::env::var("BITCOIN_NETWORK").unwrap_or_else(|_| "mainnet".to_string());

    let estimate_fees = std::env::var("ESTIMATE_FEES")
        .unwrap_or_else(|_| "true".to_string())
        .parse::<bool>()
        .unwrap_or(true);

    let workflow = WorkflowConfig {
        bitcoin_testnet: matches!(bitcoin_network.to_lowercase().as_str(), "testnet" | "test"),
        estimate_fees,
    };

    Ok(Config {
        listen_addr,
        postgres_config,
        fee_oracle,
        mailer,
        workflow,
    })
}

fn mask_password(url: &str) -> String {
    if let Some(at_pos) = url.rfind('@') {
        if let Some(colon_pos) = url[..at_pos].rfind(':') {
            let mut masked = url.to_string();
            masked.replace_range(colon_pos + 1..at_pos, "****");
            return masked;
        }
    }
    url.to_string()
}
