//! Shared application state for the API server

use paygate_engine::TransactionWorkflow;
use paygate_storage::GatewayStore;
use std::sync::Arc;

/// Shared application state passed to all handlers
#[derive(Clone)]
pub struct AppState {
    /// Persistence backend for payments and transactions
    pub store: Arc<dyn GatewayStore>,
    /// Transaction creation workflow engine
    pub workflow: Arc<TransactionWorkflow>,
}

impl AppState {
    /// Create new application state
    pub fn new(store: Arc<dyn GatewayStore>, workflow: Arc<TransactionWorkflow>) -> Self {
        Self { store, workflow }
    }
}
