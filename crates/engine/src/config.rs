//! Configuration for the transaction workflow engine

use serde::{Deserialize, Serialize};

/// Configuration for the transaction workflow engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Generate Bitcoin receiving addresses on the test network
    pub bitcoin_testnet: bool,

    /// Compute fee estimates for Bitcoin wallet-backed transactions.
    /// When disabled (or when the oracle is unreachable) transactions are
    /// created without fee data.
    pub estimate_fees: bool,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            bitcoin_testnet: false,
            estimate_fees: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = WorkflowConfig::default();
        assert!(!config.bitcoin_testnet);
        assert!(config.estimate_fees);
    }
}
