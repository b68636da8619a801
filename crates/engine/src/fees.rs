//! Fee estimation seam.
//!
//! The workflow engine consumes fee rates through this trait so the
//! oracle can be swapped out in tests; production wires in
//! [`paygate_wallet::FeeOracle`].

use async_trait::async_trait;
use paygate_wallet::{FeeOracle, OracleError, RecommendedFees};

/// Source of recommended network fee rates.
#[async_trait]
pub trait FeeEstimator: Send + Sync {
    async fn recommended(&self) -> Result<RecommendedFees, OracleError>;
}

#[async_trait]
impl FeeEstimator for FeeOracle {
    async fn recommended(&self) -> Result<RecommendedFees, OracleError> {
        self.recommended_fees().await
    }
}
