//! # Shared Identifiers & Common Types
//!
//! Strata identifies everything external by opaque string addresses (the
//! execution environment hands us authenticated caller identities; we never
//! parse them) and everything monetary by `u64` smallest-unit amounts.
//! Domains — independent execution contexts, what bridges call "chains" —
//! are `u32` identifiers where zero is reserved as invalid.

use serde::{Deserialize, Serialize};

/// A monetary amount in smallest-unit denomination. The protocol never
/// divides amounts for display; decimals are a front-end concern.
pub type Amount = u64;

/// An execution domain ("chain") identifier. Zero is not a valid domain.
pub type ChainId = u32;

/// An authenticated identity in the execution environment: an account,
/// an adapter, a bridge endpoint. Opaque to the core.
pub type Address = String;

/// Identifies one asset accepted by a vault.
pub type AssetId = String;

/// Identifies one yield strategy behind an adapter.
pub type StrategyId = String;

/// Annualized yield expressed in basis points (1 bp = 0.01%).
pub type BasisPoints = u32;

/// Returns `true` if an address/identifier is usable — non-empty after
/// trimming. The environment guarantees authenticated identities are
/// well-formed; this catches the "forgot to fill in the field" class.
pub fn is_valid_id(id: &str) -> bool {
    !id.trim().is_empty()
}

/// Point-in-time risk report from a yield protocol, as surfaced by its
/// adapter. All three figures are basis points so they compose with the
/// rest of the protocol's integer arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskMetrics {
    /// Pool utilization (borrowed / supplied).
    pub utilization_bps: BasisPoints,
    /// Estimated liquidation risk of the position.
    pub liquidation_risk_bps: BasisPoints,
    /// Observed deviation between the protocol's oracle and spot.
    pub oracle_deviation_bps: BasisPoints,
}

impl RiskMetrics {
    /// A zeroed report. Useful as the "nothing to report" default for
    /// protocols that expose no risk telemetry.
    pub fn zero() -> Self {
        Self {
            utilization_bps: 0,
            liquidation_risk_bps: 0,
            oracle_deviation_bps: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_ids() {
        assert!(is_valid_id("0xabc123"));
        assert!(is_valid_id("strategy-aave-v3"));
        assert!(!is_valid_id(""));
        assert!(!is_valid_id("   "));
    }

    #[test]
    fn risk_metrics_zero() {
        let m = RiskMetrics::zero();
        assert_eq!(m.utilization_bps, 0);
        assert_eq!(m.liquidation_risk_bps, 0);
        assert_eq!(m.oracle_deviation_bps, 0);
    }

    #[test]
    fn risk_metrics_serialization_roundtrip() {
        let m = RiskMetrics {
            utilization_bps: 7200,
            liquidation_risk_bps: 310,
            oracle_deviation_bps: 12,
        };
        let json = serde_json::to_string(&m).expect("serialize");
        let back: RiskMetrics = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(m, back);
    }
}
