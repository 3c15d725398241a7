//! # The Vault Entity
//!
//! Owns pooled-asset custody and every piece of share and allocation state.
//! Deposits mint shares against total assets under management; withdrawals
//! burn shares and, when idle custody runs short, claw funds back out of
//! strategies in registration order. The administrator can deploy capital
//! into adapters, pause user flows, sweep stray tokens, and unwind the whole
//! book in an emergency.
//!
//! ## Accounting model
//!
//! `total_assets_under_management = idle custody + Σ recorded allocations`.
//! The recorded allocation for a strategy is the running total pushed in,
//! decremented on withdrawal and emergency exit — it is the vault's *belief*
//! about deployed capital, not a live protocol query. The shortfall path
//! debits the requested amount while crediting only what the adapter
//! actually returned, so belief and truth can diverge under partial adapter
//! failure. The divergence is deliberate and observable by comparing
//! allocations against adapter TVL.
//!
//! ## Failure policy
//!
//! `allocate` propagates adapter failure — the whole allocation fails.
//! The shortfall walk and the emergency sweep tolerate and skip failing
//! adapters: one broken integration must never freeze user withdrawals or
//! the unwind.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{MAX_ACTIVE_STRATEGIES, SHARE_PRICE_PRECISION};
use crate::events::{AuditEventKind, EventLog};
use crate::types::{is_valid_id, Address, Amount, AssetId, StrategyId};
use crate::vault::shares::{ShareError, ShareLedger};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failure crossing the vault↔adapter seam. Carries the adapter's own
/// message; the vault decides per call site whether to propagate or skip.
#[derive(Debug, Error)]
#[error("strategy port failure: {0}")]
pub struct PortError(pub String);

impl PortError {
    /// Convenience constructor used by port implementations.
    pub fn failed(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Errors that can occur during vault operations.
#[derive(Debug, Error)]
pub enum VaultError {
    /// Deposits are only accepted in registered assets.
    #[error("unsupported asset: {asset}")]
    UnsupportedAsset {
        /// The asset the caller tried to deposit.
        asset: AssetId,
    },

    /// Zero amounts and empty identifiers are caller bugs, not requests.
    #[error("invalid amount or identifier")]
    InvalidAmount,

    /// The caller is not the vault administrator.
    #[error("unauthorized: caller {caller} is not the administrator")]
    Unauthorized {
        /// Who attempted the call.
        caller: Address,
    },

    /// User flows are gated while paused.
    #[error("vault is paused")]
    Paused,

    /// `pause` on an already-paused vault.
    #[error("vault is already paused")]
    AlreadyPaused,

    /// `unpause` on a running vault.
    #[error("vault is not paused")]
    NotPaused,

    /// Share-table failure (insufficient shares, supply overflow).
    #[error(transparent)]
    Shares(#[from] ShareError),

    /// The strategy cap has been reached; no new strategy may activate.
    #[error("strategy capacity exceeded: cap is {cap}")]
    CapacityExceeded {
        /// The configured maximum.
        cap: usize,
    },

    /// No adapter is registered under this strategy id.
    #[error("unknown strategy: {strategy}")]
    UnknownStrategy {
        /// The id the caller supplied.
        strategy: StrategyId,
    },

    /// An adapter is already registered under this strategy id.
    #[error("strategy already registered: {strategy}")]
    StrategyAlreadyRegistered {
        /// The id the caller supplied.
        strategy: StrategyId,
    },

    /// Idle custody cannot cover the requested allocation.
    #[error("insufficient idle custody: available {available}, requested {requested}")]
    InsufficientIdle {
        /// Idle custody balance.
        available: Amount,
        /// Amount requested for deployment.
        requested: Amount,
    },

    /// Sweeping a pooled asset would corrupt share accounting.
    #[error("cannot sweep pooled asset: {asset}")]
    CannotSweepPooledAsset {
        /// The supported asset the caller tried to sweep.
        asset: AssetId,
    },

    /// No stray balance recorded for this asset.
    #[error("nothing to sweep for asset: {asset}")]
    NothingToSweep {
        /// The asset the caller tried to sweep.
        asset: AssetId,
    },

    /// A mutator re-entered while another mutation was in progress.
    #[error("reentrant call rejected")]
    Reentrancy,

    /// An adapter failure that this call site propagates.
    #[error(transparent)]
    Strategy(#[from] PortError),
}

// ---------------------------------------------------------------------------
// StrategyPort — the seam to an adapter
// ---------------------------------------------------------------------------

/// The vault-side view of one strategy adapter. Holding a boxed port *is*
/// the ledger capability: the vault is the only component that ever owns
/// one, which is what makes `emergency_withdraw` callable here despite the
/// adapter's public method being admin-gated.
pub trait StrategyPort: Send {
    /// Push `amount` into the strategy. The port is bound to one strategy
    /// and one asset; which asset moves is the adapter's configuration,
    /// not a per-call choice. Returns adapter-local shares (the vault
    /// records amounts, not these shares).
    fn deposit(&mut self, amount: Amount) -> Result<Amount, PortError>;

    /// Pull up to `amount` back out. Returns the amount actually recovered,
    /// which may be less than requested.
    fn withdraw_amount(&mut self, amount: Amount) -> Result<Amount, PortError>;

    /// Drain the strategy entirely. Returns whatever was recovered.
    fn emergency_withdraw(&mut self) -> Result<Amount, PortError>;
}

// ---------------------------------------------------------------------------
// Vault
// ---------------------------------------------------------------------------

/// The serializable accounting state of a vault: everything that must
/// survive a restart. Live wiring (adapter ports) and the in-memory audit
/// buffer are deliberately absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultSnapshot {
    /// The vault's own identity.
    pub address: Address,
    /// The administrator identity.
    pub admin: Address,
    /// Assets accepted by `deposit`.
    pub supported_assets: BTreeSet<AssetId>,
    /// The full share table.
    pub shares: ShareLedger,
    /// Idle custody balance.
    pub idle: Amount,
    /// Strategies in activation order.
    pub active_strategies: Vec<StrategyId>,
    /// Recorded amount deployed per strategy.
    pub allocations: HashMap<StrategyId, Amount>,
    /// Stray token balances awaiting sweep.
    pub stray: BTreeMap<AssetId, Amount>,
    /// Whether user flows were gated at capture time.
    pub paused: bool,
}

/// The custodial share ledger.
pub struct Vault {
    /// The vault's own identity — the "ledger address" adapters authorize.
    address: Address,
    /// The single designated administrator.
    admin: Address,
    /// Assets accepted by `deposit`.
    supported_assets: BTreeSet<AssetId>,
    /// Per-account share balances and total supply.
    shares: ShareLedger,
    /// Pooled custody balance not deployed to any strategy.
    idle: Amount,
    /// Strategies in activation (first-allocation) order. Capped.
    active_strategies: Vec<StrategyId>,
    /// Recorded amount deployed per strategy. Never negative.
    allocations: HashMap<StrategyId, Amount>,
    /// Registered adapter ports, keyed by strategy id.
    ports: HashMap<StrategyId, Box<dyn StrategyPort>>,
    /// Balances of tokens that arrived outside `deposit`, per asset.
    stray: BTreeMap<AssetId, Amount>,
    /// Gates deposit/withdraw/allocate. Emergency exit is exempt.
    paused: bool,
    /// Re-entrancy in-progress flag.
    entered: bool,
    /// Audit trail.
    events: EventLog,
}

impl std::fmt::Debug for Vault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vault")
            .field("address", &self.address)
            .field("admin", &self.admin)
            .field("total_shares", &self.shares.total())
            .field("idle", &self.idle)
            .field("active_strategies", &self.active_strategies)
            .field("paused", &self.paused)
            .finish_non_exhaustive()
    }
}

impl Vault {
    /// Creates an empty, unpaused vault.
    pub fn new(address: impl Into<Address>, admin: impl Into<Address>) -> Self {
        Self {
            address: address.into(),
            admin: admin.into(),
            supported_assets: BTreeSet::new(),
            shares: ShareLedger::new(),
            idle: 0,
            active_strategies: Vec::new(),
            allocations: HashMap::new(),
            ports: HashMap::new(),
            stray: BTreeMap::new(),
            paused: false,
            entered: false,
            events: EventLog::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// The vault's own identity.
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// The administrator identity.
    pub fn admin(&self) -> &Address {
        &self.admin
    }

    /// Shares held by `account`.
    pub fn balance_of(&self, account: &str) -> Amount {
        self.shares.balance_of(account)
    }

    /// Total share supply.
    pub fn total_shares(&self) -> Amount {
        self.shares.total()
    }

    /// Idle custody balance.
    pub fn idle_balance(&self) -> Amount {
        self.idle
    }

    /// Recorded allocation for a strategy (zero if never allocated).
    pub fn allocation_of(&self, strategy: &str) -> Amount {
        self.allocations.get(strategy).copied().unwrap_or(0)
    }

    /// Strategies in activation order.
    pub fn active_strategies(&self) -> &[StrategyId] {
        &self.active_strategies
    }

    /// `true` while user flows are gated.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// `true` if deposits in `asset` are accepted.
    pub fn is_asset_supported(&self, asset: &str) -> bool {
        self.supported_assets.contains(asset)
    }

    /// Idle custody plus every recorded allocation.
    pub fn total_assets_under_management(&self) -> Amount {
        let deployed: u128 = self.allocations.values().map(|a| *a as u128).sum();
        (self.idle as u128 + deployed) as Amount
    }

    /// Assets per share, scaled by [`SHARE_PRICE_PRECISION`]. Defined as
    /// exactly `SHARE_PRICE_PRECISION` for an empty vault.
    pub fn share_price(&self) -> u128 {
        let total = self.shares.total();
        if total == 0 {
            return SHARE_PRICE_PRECISION;
        }
        self.total_assets_under_management() as u128 * SHARE_PRICE_PRECISION / total as u128
    }

    /// Underlying share table (read-only).
    pub fn share_ledger(&self) -> &ShareLedger {
        &self.shares
    }

    /// Stray balance recorded for `asset`.
    pub fn stray_balance(&self, asset: &str) -> Amount {
        self.stray.get(asset).copied().unwrap_or(0)
    }

    /// Removes and returns all audit records, oldest first.
    pub fn drain_events(&mut self) -> Vec<crate::events::AuditEvent> {
        self.events.drain()
    }

    /// Audit records appended so far.
    pub fn events(&self) -> &[crate::events::AuditEvent] {
        self.events.records()
    }

    // -----------------------------------------------------------------------
    // Administration
    // -----------------------------------------------------------------------

    /// Registers `asset` as depositable. Administrator-only. Idempotent.
    pub fn add_supported_asset(&mut self, caller: &str, asset: &str) -> Result<(), VaultError> {
        self.require_admin(caller)?;
        if !is_valid_id(asset) {
            return Err(VaultError::InvalidAmount);
        }
        if self.supported_assets.insert(asset.to_string()) {
            self.events.record(AuditEventKind::AssetSupported {
                asset: asset.to_string(),
            });
        }
        Ok(())
    }

    /// Removes `asset` from the depositable set. Administrator-only.
    /// Existing custody is unaffected — only new deposits are refused.
    pub fn remove_supported_asset(&mut self, caller: &str, asset: &str) -> Result<(), VaultError> {
        self.require_admin(caller)?;
        if self.supported_assets.remove(asset) {
            self.events.record(AuditEventKind::AssetRemoved {
                asset: asset.to_string(),
            });
        }
        Ok(())
    }

    /// Registers an adapter port under `strategy`. Administrator-only.
    /// Registration is wiring, not activation — the strategy enters the
    /// active set on its first successful allocation.
    pub fn register_strategy(
        &mut self,
        caller: &str,
        strategy: &str,
        port: Box<dyn StrategyPort>,
    ) -> Result<(), VaultError> {
        self.require_admin(caller)?;
        if !is_valid_id(strategy) {
            return Err(VaultError::InvalidAmount);
        }
        if self.ports.contains_key(strategy) {
            return Err(VaultError::StrategyAlreadyRegistered {
                strategy: strategy.to_string(),
            });
        }
        self.ports.insert(strategy.to_string(), port);
        Ok(())
    }

    /// Gates deposit/withdraw/allocate. Administrator-only.
    pub fn pause(&mut self, caller: &str) -> Result<(), VaultError> {
        self.require_admin(caller)?;
        if self.paused {
            return Err(VaultError::AlreadyPaused);
        }
        self.paused = true;
        self.events.record(AuditEventKind::Paused);
        Ok(())
    }

    /// Restores user flows. Administrator-only.
    pub fn unpause(&mut self, caller: &str) -> Result<(), VaultError> {
        self.require_admin(caller)?;
        if !self.paused {
            return Err(VaultError::NotPaused);
        }
        self.paused = false;
        self.events.record(AuditEventKind::Unpaused);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // User Flows
    // -----------------------------------------------------------------------

    /// Deposits `amount` of `asset`, minting shares to `caller`.
    ///
    /// The first depositor bootstraps at 1:1; afterwards shares are
    /// `amount * total_shares / total_assets`, floored. Ratio-preserving:
    /// the share price before and after is identical within rounding.
    ///
    /// # Errors
    ///
    /// [`VaultError::UnsupportedAsset`], [`VaultError::InvalidAmount`] on
    /// zero, [`VaultError::Paused`] while paused.
    pub fn deposit(&mut self, caller: &str, asset: &str, amount: Amount) -> Result<Amount, VaultError> {
        if !self.supported_assets.contains(asset) {
            return Err(VaultError::UnsupportedAsset {
                asset: asset.to_string(),
            });
        }
        if amount == 0 || !is_valid_id(caller) {
            return Err(VaultError::InvalidAmount);
        }
        if self.paused {
            return Err(VaultError::Paused);
        }
        self.enter()?;
        let result = self.deposit_inner(caller, asset, amount);
        self.exit();
        result
    }

    fn deposit_inner(&mut self, caller: &str, asset: &str, amount: Amount) -> Result<Amount, VaultError> {
        let total = self.shares.total();
        let minted = if total == 0 {
            amount
        } else {
            // Floor division; the value a sub-unit rounding leaves behind
            // accrues to existing holders, never the other way around.
            ((amount as u128 * total as u128) / self.total_assets_under_management() as u128)
                as Amount
        };

        // Custody credit and share mint are this vault's own effects; both
        // complete before anything external could observe the deposit.
        self.idle = self.idle.saturating_add(amount);
        if let Err(e) = self.shares.mint(caller, minted) {
            self.idle -= amount;
            return Err(e.into());
        }

        self.events.record(AuditEventKind::Deposited {
            account: caller.to_string(),
            asset: asset.to_string(),
            amount,
            shares_minted: minted,
        });
        Ok(minted)
    }

    /// Burns `shares` from `caller` and pays out the proportional amount.
    ///
    /// Shares are debited first. If idle custody cannot cover the payout,
    /// the shortfall is pulled from active strategies in registration
    /// order; a failing adapter is skipped and the walk continues. Returns
    /// the amount actually paid, which under adapter under-recovery can be
    /// less than the proportional entitlement — partial progress committed
    /// by design, so no broken integration can freeze withdrawals.
    ///
    /// # Errors
    ///
    /// [`VaultError::InvalidAmount`] on zero, [`VaultError::Shares`] when
    /// `shares` exceeds the caller's balance, [`VaultError::Paused`] while
    /// paused.
    pub fn withdraw(&mut self, caller: &str, shares: Amount) -> Result<Amount, VaultError> {
        if shares == 0 {
            return Err(VaultError::InvalidAmount);
        }
        let held = self.shares.balance_of(caller);
        if shares > held {
            return Err(VaultError::Shares(ShareError::InsufficientShares {
                account: caller.to_string(),
                available: held,
                requested: shares,
            }));
        }
        if self.paused {
            return Err(VaultError::Paused);
        }
        self.enter()?;
        let result = self.withdraw_inner(caller, shares);
        self.exit();
        result
    }

    fn withdraw_inner(&mut self, caller: &str, shares: Amount) -> Result<Amount, VaultError> {
        let total = self.shares.total();
        let amount = ((shares as u128 * self.total_assets_under_management() as u128)
            / total as u128) as Amount;

        // Debit shares before any external call can observe the state.
        self.shares.burn(caller, shares)?;

        if self.idle < amount {
            let shortfall = amount - self.idle;
            self.cover_shortfall(shortfall);
        }

        let paid = amount.min(self.idle);
        self.idle -= paid;

        self.events.record(AuditEventKind::Withdrawn {
            account: caller.to_string(),
            shares_burned: shares,
            amount: paid,
        });
        Ok(paid)
    }

    /// Walks active strategies in registration order pulling funds until
    /// `shortfall` is covered or the list is exhausted. Debits the
    /// *requested* amount from the allocation record before each call;
    /// credits idle custody with what the adapter *returned*.
    fn cover_shortfall(&mut self, mut shortfall: Amount) {
        let ids: Vec<StrategyId> = self.active_strategies.clone();
        for id in ids {
            if shortfall == 0 {
                break;
            }
            let alloc = self.allocations.get(&id).copied().unwrap_or(0);
            if alloc == 0 {
                continue;
            }
            let want = shortfall.min(alloc);

            // Allocation debit commits before the adapter gets control.
            self.allocations.insert(id.clone(), alloc - want);

            let port = match self.ports.get_mut(&id) {
                Some(p) => p,
                None => continue,
            };
            match port.withdraw_amount(want) {
                Ok(returned) => {
                    self.idle = self.idle.saturating_add(returned);
                    shortfall = shortfall.saturating_sub(returned);
                }
                Err(e) => {
                    tracing::warn!(strategy = %id, error = %e, "shortfall withdrawal failed; skipping strategy");
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Allocation
    // -----------------------------------------------------------------------

    /// Deploys `amount` of idle custody into `strategy` via its adapter.
    /// Administrator-only. Adapter failure propagates — the whole
    /// allocation fails and no state changes.
    ///
    /// The strategy enters the active set on its first successful
    /// allocation and is never automatically removed, even when its
    /// allocation later falls to zero.
    pub fn allocate(&mut self, caller: &str, strategy: &str, amount: Amount) -> Result<(), VaultError> {
        if amount == 0 || !is_valid_id(strategy) {
            return Err(VaultError::InvalidAmount);
        }
        self.require_admin(caller)?;
        if self.paused {
            return Err(VaultError::Paused);
        }
        self.enter()?;
        let result = self.allocate_inner(strategy, amount);
        self.exit();
        result
    }

    fn allocate_inner(&mut self, strategy: &str, amount: Amount) -> Result<(), VaultError> {
        if !self.ports.contains_key(strategy) {
            return Err(VaultError::UnknownStrategy {
                strategy: strategy.to_string(),
            });
        }
        let is_new = !self.active_strategies.iter().any(|s| s == strategy);
        if is_new && self.active_strategies.len() >= MAX_ACTIVE_STRATEGIES {
            return Err(VaultError::CapacityExceeded {
                cap: MAX_ACTIVE_STRATEGIES,
            });
        }
        if self.idle < amount {
            return Err(VaultError::InsufficientIdle {
                available: self.idle,
                requested: amount,
            });
        }

        match self.ports.get_mut(strategy) {
            Some(port) => port.deposit(amount)?,
            None => {
                return Err(VaultError::UnknownStrategy {
                    strategy: strategy.to_string(),
                })
            }
        };

        self.idle -= amount;
        if is_new {
            self.active_strategies.push(strategy.to_string());
        }
        *self.allocations.entry(strategy.to_string()).or_insert(0) += amount;

        self.events.record(AuditEventKind::Allocated {
            strategy: strategy.to_string(),
            amount,
        });
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Emergency Paths
    // -----------------------------------------------------------------------

    /// Drains every active strategy back into idle custody. Administrator-
    /// only, and deliberately exempt from the pause gate — this is what you
    /// run *while* paused.
    ///
    /// Each strategy's recorded allocation is zeroed *before* its adapter
    /// is invoked, so a failing adapter cannot leave stale accounting. A
    /// per-adapter failure is tolerated; the sweep continues. Best-effort,
    /// not atomic across strategies.
    pub fn emergency_exit(&mut self, caller: &str) -> Result<Amount, VaultError> {
        self.require_admin(caller)?;
        self.enter()?;
        let result = self.emergency_exit_inner();
        self.exit();
        Ok(result)
    }

    fn emergency_exit_inner(&mut self) -> Amount {
        let mut recovered: Amount = 0;
        let mut swept = 0usize;

        let ids: Vec<StrategyId> = self.active_strategies.clone();
        for id in ids {
            let alloc = self.allocations.get(&id).copied().unwrap_or(0);
            if alloc == 0 {
                continue;
            }
            // Zero the record first: stale accounting is worse than a
            // temporarily missing balance.
            self.allocations.insert(id.clone(), 0);

            let port = match self.ports.get_mut(&id) {
                Some(p) => p,
                None => continue,
            };
            match port.emergency_withdraw() {
                Ok(amount) => {
                    self.idle = self.idle.saturating_add(amount);
                    recovered = recovered.saturating_add(amount);
                    swept += 1;
                }
                Err(e) => {
                    tracing::warn!(strategy = %id, error = %e, "emergency withdrawal failed; continuing sweep");
                }
            }
        }

        self.events.record(AuditEventKind::EmergencyExit {
            strategies_swept: swept,
            recovered,
        });
        recovered
    }

    /// Credits tokens that arrived outside `deposit`. A supported asset is
    /// folded into pooled custody (it raises the share price — a donation);
    /// anything else is held for [`Self::sweep_token`].
    pub fn receive_external(&mut self, asset: &str, amount: Amount) {
        if amount == 0 {
            return;
        }
        if self.supported_assets.contains(asset) {
            self.idle = self.idle.saturating_add(amount);
        } else {
            *self.stray.entry(asset.to_string()).or_insert(0) += amount;
        }
    }

    /// Sweeps the stray balance of `asset` to the administrator.
    /// Administrator-only. Pooled assets are refused — sweeping them would
    /// corrupt share accounting.
    pub fn sweep_token(&mut self, caller: &str, asset: &str) -> Result<Amount, VaultError> {
        self.require_admin(caller)?;
        if self.supported_assets.contains(asset) {
            return Err(VaultError::CannotSweepPooledAsset {
                asset: asset.to_string(),
            });
        }
        let amount = match self.stray.remove(asset) {
            Some(a) if a > 0 => a,
            _ => {
                return Err(VaultError::NothingToSweep {
                    asset: asset.to_string(),
                })
            }
        };
        self.events.record(AuditEventKind::TokenSwept {
            asset: asset.to_string(),
            amount,
            to: self.admin.clone(),
        });
        Ok(amount)
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    /// Captures the durable accounting state. Adapter ports and the audit
    /// trail are excluded: ports are live wiring re-registered at boot, and
    /// audit records are drained to the log as they happen.
    pub fn snapshot(&self) -> VaultSnapshot {
        VaultSnapshot {
            address: self.address.clone(),
            admin: self.admin.clone(),
            supported_assets: self.supported_assets.clone(),
            shares: self.shares.clone(),
            idle: self.idle,
            active_strategies: self.active_strategies.clone(),
            allocations: self.allocations.clone(),
            stray: self.stray.clone(),
            paused: self.paused,
        }
    }

    /// Rebuilds a vault from a snapshot. The port table starts empty;
    /// callers re-run [`Self::register_strategy`] for every adapter before
    /// serving traffic.
    pub fn from_snapshot(snapshot: VaultSnapshot) -> Self {
        Self {
            address: snapshot.address,
            admin: snapshot.admin,
            supported_assets: snapshot.supported_assets,
            shares: snapshot.shares,
            idle: snapshot.idle,
            active_strategies: snapshot.active_strategies,
            allocations: snapshot.allocations,
            ports: HashMap::new(),
            stray: snapshot.stray,
            paused: snapshot.paused,
            entered: false,
            events: EventLog::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Internal Helpers
    // -----------------------------------------------------------------------

    fn require_admin(&self, caller: &str) -> Result<(), VaultError> {
        if caller != self.admin {
            return Err(VaultError::Unauthorized {
                caller: caller.to_string(),
            });
        }
        Ok(())
    }

    fn enter(&mut self) -> Result<(), VaultError> {
        if self.entered {
            return Err(VaultError::Reentrancy);
        }
        self.entered = true;
        Ok(())
    }

    fn exit(&mut self) {
        self.entered = false;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
