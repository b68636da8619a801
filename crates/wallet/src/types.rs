//! Fee oracle response types and transaction size estimation.

use paygate_types::FeeBreakdown;
use serde::{Deserialize, Serialize};

/// Recommended fee rates in sat/vB, as served by mempool-compatible
/// fee estimation APIs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendedFees {
    pub fastest_fee: f64,
    pub half_hour_fee: f64,
    pub hour_fee: f64,
    pub economy_fee: f64,
    pub minimum_fee: f64,
}

impl RecommendedFees {
    /// Scale the rate tiers by an estimated transaction size, yielding
    /// absolute fees in sats. The "average" tier maps to the hour rate.
    pub fn for_vsize(&self, vsize: u64) -> FeeBreakdown {
        let scale = |rate: f64| (rate * vsize as f64).ceil() as u64;
        FeeBreakdown {
            economy_fee: scale(self.economy_fee),
            average_fee: scale(self.hour_fee),
            fastest_fee: scale(self.fastest_fee),
        }
    }
}

/// Virtual size of a legacy P2PKH transaction with the given input and
/// output counts: 10 bytes of overhead, 148 per input, 34 per output.
pub const fn estimate_p2pkh_vsize(inputs: u64, outputs: u64) -> u64 {
    10 + 148 * inputs + 34 * outputs
}

/// Size used when estimating fees for a wallet-backed settlement:
/// one input, one output to the store wallet.
pub const SETTLEMENT_TX_VSIZE: u64 = estimate_p2pkh_vsize(1, 1);

/// Size used by the public fee-quote endpoint: one input, payment output
/// plus change.
pub const QUOTE_TX_VSIZE: u64 = estimate_p2pkh_vsize(1, 2);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vsize_estimates() {
        assert_eq!(SETTLEMENT_TX_VSIZE, 192);
        assert_eq!(QUOTE_TX_VSIZE, 226);
        assert_eq!(estimate_p2pkh_vsize(2, 2), 374);
    }

    #[test]
    fn test_fee_scaling_rounds_up() {
        let fees = RecommendedFees {
            fastest_fee: 12.0,
            half_hour_fee: 8.0,
            hour_fee: 5.5,
            economy_fee: 1.0,
            minimum_fee: 1.0,
        };
        let breakdown = fees.for_vsize(192);
        assert_eq!(breakdown.economy_fee, 192);
        assert_eq!(breakdown.average_fee, 1056);
        assert_eq!(breakdown.fastest_fee, 2304);
    }

    #[test]
    fn test_parses_mempool_response_shape() {
        let json = r#"{
            "fastestFee": 21,
            "halfHourFee": 16,
            "hourFee": 12,
            "economyFee": 6,
            "minimumFee": 3
        }"#;
        let fees: RecommendedFees = serde_json::from_str(json).unwrap();
        assert_eq!(fees.fastest_fee, 21.0);
        assert_eq!(fees.economy_fee, 6.0);
    }
}
