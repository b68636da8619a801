//! Wallet primitives for the payment gateway.
//!
//! This crate provides:
//! - Fresh receiving key pairs for wallet-backed transactions
//!   (Bitcoin mainnet/testnet and Dogecoin address formats)
//! - A fee oracle client (mempool.space compatible)
//! - Deterministic transaction size estimation for fee scaling
//!
//! Key generation is pure: a strong random key pair per call, no shared
//! network default, no external state. The fee oracle is the only
//! component that talks to the network and it carries a hard timeout so
//! a slow upstream can never stall transaction creation.

pub mod keys;
pub mod oracle;
pub mod types;

pub use keys::{generate_keypair, GeneratedKeypair, KeyNetwork};
pub use oracle::{FeeOracle, OracleError};
pub use types::{estimate_p2pkh_vsize, RecommendedFees, QUOTE_TX_VSIZE, SETTLEMENT_TX_VSIZE};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_exports() {
        let _ = KeyNetwork::Bitcoin;
        let _ = SETTLEMENT_TX_VSIZE;
    }
}
