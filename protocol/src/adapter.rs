//! # Strategy Adapter
//!
//! A [`StrategyAdapter`] is the uniform wrapper around one external yield
//! protocol. The vault never talks to Aave-shaped or Compound-shaped things
//! directly — it talks to adapters, and every adapter exposes the same six
//! capabilities: deposit, withdraw, APY, TVL, risk metrics, emergency exit.
//!
//! Protocol-specific behavior lives behind the [`ProtocolDriver`] trait:
//! five primitives that each concrete integration supplies. The adapter owns
//! the bookkeeping that the wrapped protocol doesn't give us for free —
//! `total_deposited` (principal pushed in, net of withdrawals) and
//! `total_shares` (protocol-local share units, independent of vault shares).
//!
//! ## Authorization
//!
//! `deposit` and `withdraw` are callable only by the configured ledger
//! identity. `emergency_withdraw` is callable only by the adapter's own
//! administrator — the escape hatch works even if the ledger itself is the
//! thing that's broken. Reads are unrestricted.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{Address, Amount, AssetId, BasisPoints, RiskMetrics};
use crate::vault::ledger::{PortError, StrategyPort};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failure surfaced by a wrapped protocol through its driver.
#[derive(Debug, Error)]
pub enum DriverError {
    /// The protocol rejected the operation (paused market, cap reached...).
    #[error("protocol rejected the operation: {0}")]
    Rejected(String),

    /// The protocol could not be reached or is in a broken state.
    #[error("protocol unavailable: {0}")]
    Unavailable(String),
}

/// Errors that can occur during adapter operations.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// The caller is not allowed to perform this operation.
    #[error("unauthorized: caller {caller} is not the {expected}")]
    Unauthorized {
        /// Who attempted the call.
        caller: Address,
        /// Which role was required ("ledger" or "administrator").
        expected: &'static str,
    },

    /// The asset does not match the adapter's bound asset.
    #[error("invalid asset: adapter is bound to {bound}, got {got}")]
    InvalidAsset {
        /// The asset this adapter was constructed for.
        bound: AssetId,
        /// The asset the caller supplied.
        got: AssetId,
    },

    /// Zero-amount operations are a no-op and almost certainly a caller bug.
    #[error("zero-amount operations are not permitted")]
    ZeroAmount,

    /// Requested more shares than the adapter holds.
    #[error("insufficient balance: requested {requested} shares, holding {held}")]
    InsufficientBalance {
        /// Shares requested for withdrawal.
        requested: Amount,
        /// Shares currently tracked by the adapter.
        held: Amount,
    },

    /// A mutator re-entered while another mutation was in progress.
    #[error("reentrant call rejected")]
    Reentrancy,

    /// The wrapped protocol failed.
    #[error("driver failure: {0}")]
    Driver(#[from] DriverError),
}

// ---------------------------------------------------------------------------
// ProtocolDriver
// ---------------------------------------------------------------------------

/// The five protocol-binding primitives a concrete yield integration
/// supplies. Everything else — authorization, asset checks, tracker
/// bookkeeping — is shared adapter logic and lives in [`StrategyAdapter`].
pub trait ProtocolDriver: Send {
    /// Push `amount` of the bound asset into the protocol. Returns the
    /// protocol-local shares received.
    fn deposit_to_protocol(&mut self, amount: Amount) -> Result<Amount, DriverError>;

    /// Redeem `shares` from the protocol. Returns the asset amount received.
    fn withdraw_from_protocol(&mut self, shares: Amount) -> Result<Amount, DriverError>;

    /// Current annualized yield in basis points.
    fn protocol_apy(&self) -> BasisPoints;

    /// Current risk telemetry.
    fn protocol_risk_metrics(&self) -> RiskMetrics;

    /// Unconditionally exit the entire position. Returns whatever was
    /// recovered, which may be zero.
    fn emergency_withdraw_from_protocol(&mut self) -> Result<Amount, DriverError>;
}

// ---------------------------------------------------------------------------
// StrategyAdapter
// ---------------------------------------------------------------------------

/// Locally cached position trackers, separable from the driver so they can
/// be snapshotted and inspected without touching the protocol.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterPosition {
    /// Principal pushed into the protocol, net of withdrawals, floored at
    /// zero. Withdrawn amounts beyond recorded principal are realized yield
    /// and never drive this negative.
    pub total_deposited: Amount,
    /// Protocol-local share units currently held.
    pub total_shares: Amount,
}

/// Uniform capability wrapper around one external yield protocol.
pub struct StrategyAdapter {
    ledger: Address,
    admin: Address,
    asset: AssetId,
    position: AdapterPosition,
    entered: bool,
    driver: Box<dyn ProtocolDriver>,
}

impl std::fmt::Debug for StrategyAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrategyAdapter")
            .field("ledger", &self.ledger)
            .field("admin", &self.admin)
            .field("asset", &self.asset)
            .field("position", &self.position)
            .finish_non_exhaustive()
    }
}

impl StrategyAdapter {
    /// Creates an adapter bound to one ledger, one administrator, and one
    /// asset, starting from an empty position.
    pub fn new(
        ledger: impl Into<Address>,
        admin: impl Into<Address>,
        asset: impl Into<AssetId>,
        driver: Box<dyn ProtocolDriver>,
    ) -> Self {
        Self {
            ledger: ledger.into(),
            admin: admin.into(),
            asset: asset.into(),
            position: AdapterPosition::default(),
            entered: false,
            driver,
        }
    }

    /// The ledger identity allowed to deposit and withdraw.
    pub fn ledger(&self) -> &Address {
        &self.ledger
    }

    /// The administrator allowed to trigger an emergency exit.
    pub fn admin(&self) -> &Address {
        &self.admin
    }

    /// The asset this adapter accepts.
    pub fn asset(&self) -> &AssetId {
        &self.asset
    }

    /// The locally tracked position.
    pub fn position(&self) -> AdapterPosition {
        self.position
    }

    // -----------------------------------------------------------------------
    // Mutators
    // -----------------------------------------------------------------------

    /// Deposits `amount` of `asset` into the wrapped protocol.
    ///
    /// Ledger-only. Pulls the funds from the caller, invokes the protocol
    /// deposit primitive, and records the received shares.
    ///
    /// # Errors
    ///
    /// [`AdapterError::Unauthorized`] unless `caller` is the ledger,
    /// [`AdapterError::InvalidAsset`] on an asset mismatch,
    /// [`AdapterError::ZeroAmount`] if `amount` is 0, and
    /// [`AdapterError::Driver`] if the protocol rejects the deposit.
    pub fn deposit(
        &mut self,
        caller: &str,
        asset: &str,
        amount: Amount,
    ) -> Result<Amount, AdapterError> {
        if caller != self.ledger {
            return Err(AdapterError::Unauthorized {
                caller: caller.to_string(),
                expected: "ledger",
            });
        }
        if asset != self.asset {
            return Err(AdapterError::InvalidAsset {
                bound: self.asset.clone(),
                got: asset.to_string(),
            });
        }
        if amount == 0 {
            return Err(AdapterError::ZeroAmount);
        }
        self.enter()?;
        let result = self.deposit_inner(amount);
        self.exit();
        result
    }

    fn deposit_inner(&mut self, amount: Amount) -> Result<Amount, AdapterError> {
        let shares = self.driver.deposit_to_protocol(amount)?;
        self.position.total_deposited = self.position.total_deposited.saturating_add(amount);
        self.position.total_shares = self.position.total_shares.saturating_add(shares);
        Ok(shares)
    }

    /// Redeems `shares` from the wrapped protocol and transfers the
    /// resulting assets to the ledger. Returns the amount withdrawn.
    ///
    /// `total_deposited` is decremented by the withdrawn amount floored at
    /// zero: anything beyond recorded principal is realized yield.
    ///
    /// # Errors
    ///
    /// [`AdapterError::Unauthorized`] unless `caller` is the ledger,
    /// [`AdapterError::ZeroAmount`] if `shares` is 0,
    /// [`AdapterError::InsufficientBalance`] if `shares` exceeds holdings,
    /// and [`AdapterError::Driver`] on protocol failure.
    pub fn withdraw(&mut self, caller: &str, shares: Amount) -> Result<Amount, AdapterError> {
        if caller != self.ledger {
            return Err(AdapterError::Unauthorized {
                caller: caller.to_string(),
                expected: "ledger",
            });
        }
        if shares == 0 {
            return Err(AdapterError::ZeroAmount);
        }
        if shares > self.position.total_shares {
            return Err(AdapterError::InsufficientBalance {
                requested: shares,
                held: self.position.total_shares,
            });
        }
        self.enter()?;
        let result = self.withdraw_inner(shares);
        self.exit();
        result
    }

    fn withdraw_inner(&mut self, shares: Amount) -> Result<Amount, AdapterError> {
        let amount = self.driver.withdraw_from_protocol(shares)?;
        self.position.total_shares -= shares;
        self.position.total_deposited = self.position.total_deposited.saturating_sub(amount);
        Ok(amount)
    }

    /// Unconditionally drains the protocol position, zeroes both trackers,
    /// and forwards everything recovered to the ledger. Administrator-only;
    /// the ledger is deliberately *not* allowed to call this.
    pub fn emergency_withdraw(&mut self, caller: &str) -> Result<Amount, AdapterError> {
        if caller != self.admin {
            return Err(AdapterError::Unauthorized {
                caller: caller.to_string(),
                expected: "administrator",
            });
        }
        self.enter()?;
        let result = self.emergency_withdraw_inner();
        self.exit();
        result
    }

    fn emergency_withdraw_inner(&mut self) -> Result<Amount, AdapterError> {
        let recovered = self.driver.emergency_withdraw_from_protocol()?;
        self.position = AdapterPosition::default();
        Ok(recovered)
    }

    // -----------------------------------------------------------------------
    // Reads — unrestricted pass-throughs
    // -----------------------------------------------------------------------

    /// Current APY of the wrapped protocol, in basis points.
    pub fn current_apy(&self) -> BasisPoints {
        self.driver.protocol_apy()
    }

    /// Value locked through this adapter, as tracked locally. The wrapped
    /// protocol exposes no TVL primitive, so this is principal net of
    /// withdrawals — realized yield shows up only when redeemed.
    pub fn tvl(&self) -> Amount {
        self.position.total_deposited
    }

    /// Current risk telemetry of the wrapped protocol.
    pub fn risk_metrics(&self) -> RiskMetrics {
        self.driver.protocol_risk_metrics()
    }

    /// `true` once every share has been redeemed — the only distinguished
    /// adapter state.
    pub fn is_empty(&self) -> bool {
        self.position.total_shares == 0
    }

    // -----------------------------------------------------------------------
    // Re-entrancy guard
    // -----------------------------------------------------------------------

    fn enter(&mut self) -> Result<(), AdapterError> {
        if self.entered {
            return Err(AdapterError::Reentrancy);
        }
        self.entered = true;
        Ok(())
    }

    fn exit(&mut self) {
        self.entered = false;
    }
}

// ---------------------------------------------------------------------------
// StrategyPort — the vault-side seam
// ---------------------------------------------------------------------------

impl StrategyPort for StrategyAdapter {
    fn deposit(&mut self, amount: Amount) -> Result<Amount, PortError> {
        let ledger = self.ledger.clone();
        let asset = self.asset.clone();
        StrategyAdapter::deposit(self, &ledger, &asset, amount)
            .map_err(|e| PortError::failed(e.to_string()))
    }

    /// Amount-denominated withdrawal for the vault's shortfall path. The
    /// vault thinks in asset amounts; the protocol thinks in shares. We
    /// convert proportionally through the local trackers and cap at the
    /// full holding.
    fn withdraw_amount(&mut self, amount: Amount) -> Result<Amount, PortError> {
        if amount == 0 {
            return Ok(0);
        }
        if self.position.total_shares == 0 || self.position.total_deposited == 0 {
            return Ok(0);
        }
        let shares = ((amount as u128 * self.position.total_shares as u128)
            / self.position.total_deposited as u128) as Amount;
        let shares = shares.max(1).min(self.position.total_shares);
        let ledger = self.ledger.clone();
        StrategyAdapter::withdraw(self, &ledger, shares)
            .map_err(|e| PortError::failed(e.to_string()))
    }

    fn emergency_withdraw(&mut self) -> Result<Amount, PortError> {
        // Invoked from inside the vault's administrator-gated emergency
        // sweep. Holding the boxed port is the authorization; the public
        // admin-gated entry point above is for direct operational use.
        self.enter().map_err(|e| PortError::failed(e.to_string()))?;
        let result = self
            .emergency_withdraw_inner()
            .map_err(|e| PortError::failed(e.to_string()));
        self.exit();
        result
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const LEDGER: &str = "vault-1";
    const ADMIN: &str = "ops-admin";
    const ASSET: &str = "usdc";

    /// Driver that hands out shares 1:1 with deposits and pays withdrawals
    /// with a configurable yield multiplier (in percent).
    struct FlatDriver {
        held_shares: Amount,
        yield_pct: u64,
        fail_next: bool,
    }

    impl FlatDriver {
        fn new() -> Self {
            Self {
                held_shares: 0,
                yield_pct: 100,
                fail_next: false,
            }
        }
    }

    impl ProtocolDriver for FlatDriver {
        fn deposit_to_protocol(&mut self, amount: Amount) -> Result<Amount, DriverError> {
            if self.fail_next {
                return Err(DriverError::Rejected("market paused".into()));
            }
            self.held_shares += amount;
            Ok(amount)
        }

        fn withdraw_from_protocol(&mut self, shares: Amount) -> Result<Amount, DriverError> {
            if self.fail_next {
                return Err(DriverError::Unavailable("rpc down".into()));
            }
            self.held_shares -= shares.min(self.held_shares);
            Ok(shares * self.yield_pct / 100)
        }

        fn protocol_apy(&self) -> BasisPoints {
            420
        }

        fn protocol_risk_metrics(&self) -> RiskMetrics {
            RiskMetrics {
                utilization_bps: 8000,
                liquidation_risk_bps: 150,
                oracle_deviation_bps: 5,
            }
        }

        fn emergency_withdraw_from_protocol(&mut self) -> Result<Amount, DriverError> {
            let out = self.held_shares * self.yield_pct / 100;
            self.held_shares = 0;
            Ok(out)
        }
    }

    fn adapter() -> StrategyAdapter {
        StrategyAdapter::new(LEDGER, ADMIN, ASSET, Box::new(FlatDriver::new()))
    }

    #[test]
    fn deposit_tracks_principal_and_shares() {
        let mut a = adapter();
        let shares = a.deposit(LEDGER, ASSET, 1_000).unwrap();
        assert_eq!(shares, 1_000);
        assert_eq!(a.position().total_deposited, 1_000);
        assert_eq!(a.position().total_shares, 1_000);
        assert!(!a.is_empty());
    }

    #[test]
    fn deposit_rejects_non_ledger_caller() {
        let mut a = adapter();
        let result = a.deposit("mallory", ASSET, 1_000);
        assert!(matches!(result, Err(AdapterError::Unauthorized { .. })));
        assert_eq!(a.position().total_deposited, 0);
    }

    #[test]
    fn deposit_rejects_wrong_asset() {
        let mut a = adapter();
        let result = a.deposit(LEDGER, "dai", 1_000);
        assert!(matches!(result, Err(AdapterError::InvalidAsset { .. })));
    }

    #[test]
    fn deposit_rejects_zero_amount() {
        let mut a = adapter();
        assert!(matches!(
            a.deposit(LEDGER, ASSET, 0),
            Err(AdapterError::ZeroAmount)
        ));
    }

    #[test]
    fn deposit_propagates_driver_failure_without_tracker_change() {
        let mut a = StrategyAdapter::new(
            LEDGER,
            ADMIN,
            ASSET,
            Box::new(FlatDriver {
                held_shares: 0,
                yield_pct: 100,
                fail_next: true,
            }),
        );
        let result = a.deposit(LEDGER, ASSET, 500);
        assert!(matches!(result, Err(AdapterError::Driver(_))));
        assert_eq!(a.position(), AdapterPosition::default());
    }

    #[test]
    fn withdraw_reduces_both_trackers() {
        let mut a = adapter();
        a.deposit(LEDGER, ASSET, 1_000).unwrap();
        let amount = a.withdraw(LEDGER, 400).unwrap();
        assert_eq!(amount, 400);
        assert_eq!(a.position().total_shares, 600);
        assert_eq!(a.position().total_deposited, 600);
    }

    #[test]
    fn withdraw_with_yield_floors_principal_at_zero() {
        // 150% payout: withdrawing all shares returns more than was
        // deposited. total_deposited must floor at zero, not wrap.
        let mut a = StrategyAdapter::new(
            LEDGER,
            ADMIN,
            ASSET,
            Box::new(FlatDriver {
                held_shares: 0,
                yield_pct: 150,
                fail_next: false,
            }),
        );
        a.deposit(LEDGER, ASSET, 1_000).unwrap();
        let amount = a.withdraw(LEDGER, 1_000).unwrap();
        assert_eq!(amount, 1_500);
        assert_eq!(a.position().total_deposited, 0);
        assert_eq!(a.position().total_shares, 0);
        assert!(a.is_empty());
    }

    #[test]
    fn withdraw_rejects_zero_and_excess_shares() {
        let mut a = adapter();
        a.deposit(LEDGER, ASSET, 100).unwrap();
        assert!(matches!(
            a.withdraw(LEDGER, 0),
            Err(AdapterError::ZeroAmount)
        ));
        assert!(matches!(
            a.withdraw(LEDGER, 101),
            Err(AdapterError::InsufficientBalance {
                requested: 101,
                held: 100
            })
        ));
    }

    #[test]
    fn withdraw_rejects_non_ledger_caller() {
        let mut a = adapter();
        a.deposit(LEDGER, ASSET, 100).unwrap();
        assert!(matches!(
            a.withdraw(ADMIN, 50),
            Err(AdapterError::Unauthorized { .. })
        ));
    }

    #[test]
    fn emergency_withdraw_is_admin_only() {
        let mut a = adapter();
        a.deposit(LEDGER, ASSET, 1_000).unwrap();

        // The ledger is explicitly not allowed to trigger the escape hatch.
        assert!(matches!(
            a.emergency_withdraw(LEDGER),
            Err(AdapterError::Unauthorized { .. })
        ));

        let recovered = a.emergency_withdraw(ADMIN).unwrap();
        assert_eq!(recovered, 1_000);
        assert_eq!(a.position(), AdapterPosition::default());
        assert!(a.is_empty());
    }

    #[test]
    fn emergency_withdraw_on_empty_position_returns_zero() {
        let mut a = adapter();
        assert_eq!(a.emergency_withdraw(ADMIN).unwrap(), 0);
    }

    #[test]
    fn mutators_reject_reentry_mid_mutation() {
        let mut a = adapter();
        a.deposit(LEDGER, ASSET, 1_000).unwrap();

        // Simulate the driver calling back while a mutation holds the guard.
        a.enter().unwrap();

        assert!(matches!(
            a.deposit(LEDGER, ASSET, 100),
            Err(AdapterError::Reentrancy)
        ));
        assert!(matches!(
            a.withdraw(LEDGER, 100),
            Err(AdapterError::Reentrancy)
        ));
        assert!(matches!(
            a.emergency_withdraw(ADMIN),
            Err(AdapterError::Reentrancy)
        ));
        // Trackers untouched by the rejected calls.
        assert_eq!(a.position().total_shares, 1_000);
        assert_eq!(a.position().total_deposited, 1_000);

        a.exit();
        assert_eq!(a.withdraw(LEDGER, 100).unwrap(), 100);
    }

    #[test]
    fn reads_pass_through() {
        let mut a = adapter();
        a.deposit(LEDGER, ASSET, 2_500).unwrap();
        assert_eq!(a.current_apy(), 420);
        assert_eq!(a.tvl(), 2_500);
        assert_eq!(a.risk_metrics().utilization_bps, 8000);
    }

    #[test]
    fn port_withdraw_amount_converts_proportionally() {
        let mut a = adapter();
        a.deposit(LEDGER, ASSET, 1_000).unwrap();
        let returned = StrategyPort::withdraw_amount(&mut a, 250).unwrap();
        assert_eq!(returned, 250);
        assert_eq!(a.position().total_shares, 750);
    }

    #[test]
    fn port_withdraw_amount_on_empty_adapter_is_zero() {
        let mut a = adapter();
        assert_eq!(StrategyPort::withdraw_amount(&mut a, 500).unwrap(), 0);
    }
}
