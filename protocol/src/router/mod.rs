//! # Router Module — Cross-Domain Fund Routing
//!
//! The router decides *how* funds move between execution domains and makes
//! sure inbound instructions are consumed at most once. It owns routing
//! metadata only — the bridge registry, the chain-pair quote catalog, the
//! processed-message set — and never custodies pooled funds beyond the fee
//! that transiently passes through a dispatch.
//!
//! ```text
//! catalog.rs   — Bridge registry, chain-pair quotes, weighted selection.
//! messages.rs  — Payload codec, MessageId derivation, dedup set.
//! mod.rs       — The Router entity: dispatch, receive, rebalance, admin.
//! ```
//!
//! The router holds a fixed reference to its ledger but never reaches into
//! its accounting. Local allocation — the same-domain branch of `route` and
//! every consumed inbound message — goes through the [`AllocationHook`]
//! trait, an authorization-gated indirection the embedding wires up.

pub mod catalog;
pub mod messages;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::events::{AuditEvent, AuditEventKind, EventLog};
use crate::types::{is_valid_id, Address, Amount, ChainId, StrategyId};

pub use catalog::{BridgeCatalog, BridgeQuote, CatalogError, SelectedBridge};
pub use messages::{message_id, CodecError, MessageId, ProcessedMessages, RoutePayload};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failure in the external bridge transport.
#[derive(Debug, Error)]
#[error("bridge transport failure: {0}")]
pub struct TransportError(pub String);

/// Failure in the ledger-side allocation hook.
#[derive(Debug, Error)]
#[error("allocation hook failure: {0}")]
pub struct HookError(pub String);

/// Errors that can occur during router operations.
#[derive(Debug, Error)]
pub enum RouterError {
    /// Domain identifiers must be nonzero.
    #[error("invalid domain: {domain}")]
    InvalidDomain {
        /// The offending identifier.
        domain: ChainId,
    },

    /// The target strategy identifier is empty.
    #[error("invalid strategy identifier")]
    InvalidStrategy,

    /// Zero-amount routing is a caller bug.
    #[error("invalid amount")]
    InvalidAmount,

    /// The caller is not the router administrator.
    #[error("unauthorized: caller {caller} is not the administrator")]
    Unauthorized {
        /// Who attempted the call.
        caller: Address,
    },

    /// The selected bridge is not currently registered. Happens when a
    /// stale quote outlives its bridge's removal.
    #[error("unsupported bridge: {bridge}")]
    UnsupportedBridge {
        /// The quoted-but-unregistered bridge.
        bridge: Address,
    },

    /// The supplied fee does not cover the quoted cost.
    #[error("insufficient fee: required {required}, provided {provided}")]
    InsufficientFee {
        /// The winning quote's cost.
        required: Amount,
        /// What the caller supplied.
        provided: Amount,
    },

    /// The message identifier has already been consumed.
    #[error("duplicate message: {message_id}")]
    DuplicateMessage {
        /// Hex form of the rejected identifier.
        message_id: String,
    },

    /// Rebalance input sequences must have equal length.
    #[error("length mismatch: exits {exits}, enters {enters}, amounts {amounts}")]
    LengthMismatch {
        /// Length of the exit list.
        exits: usize,
        /// Length of the enter list.
        enters: usize,
        /// Length of the amounts list.
        amounts: usize,
    },

    /// A mutator re-entered while another mutation was in progress.
    #[error("reentrant call rejected")]
    Reentrancy,

    /// Registry/catalog failure (capacity, unknown bridge, no bridge).
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Payload codec failure.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Transport failure on the cross-domain branch.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Hook failure on the local-dispatch branch.
    #[error(transparent)]
    Hook(#[from] HookError),
}

// ---------------------------------------------------------------------------
// Collaborator seams
// ---------------------------------------------------------------------------

/// The external bridge transport. Accepts a payload for eventual delivery
/// to `receive_message` on the destination domain; delivery reliability
/// and ordering are its problem, not ours.
pub trait BridgeTransport: Send {
    /// Hands `payload` (and opaque `params`) to `bridge` for delivery to
    /// `dst`, paying `fee`.
    fn send(
        &mut self,
        bridge: &str,
        dst: ChainId,
        payload: &[u8],
        params: &[u8],
        fee: Amount,
    ) -> Result<(), TransportError>;
}

/// The ledger-side seam for local allocation. The router never mutates
/// vault accounting directly; the embedding provides an implementation
/// that carries the proper authority.
pub trait AllocationHook: Send {
    /// Deploy `amount` into `strategy` on this domain.
    fn allocate(&mut self, strategy: &str, amount: Amount) -> Result<(), HookError>;

    /// Pull `amount` out of `strategy` on this domain.
    fn release(&mut self, strategy: &str, amount: Amount) -> Result<(), HookError>;
}

/// Hook that accepts everything and does nothing. Useful when dispatch is
/// reconciled off the audit trail rather than wired in-process.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHook;

impl AllocationHook for NoopHook {
    fn allocate(&mut self, _strategy: &str, _amount: Amount) -> Result<(), HookError> {
        Ok(())
    }

    fn release(&mut self, _strategy: &str, _amount: Amount) -> Result<(), HookError> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// The serializable state of a router: catalog configuration plus the
/// processed-message set, which must survive restarts or replay protection
/// is worthless. Transport and hook are live wiring, re-supplied at boot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterSnapshot {
    /// The administrator identity.
    pub admin: Address,
    /// The ledger this router serves.
    pub ledger: Address,
    /// Bridge registry and quote catalog.
    pub catalog: BridgeCatalog,
    /// Consumed message identifiers.
    pub processed: ProcessedMessages,
}

/// The cross-domain fund router.
pub struct Router {
    /// The single designated administrator.
    admin: Address,
    /// Fixed reference to the ledger this router serves. Identity only —
    /// all interaction goes through the hook.
    ledger: Address,
    catalog: BridgeCatalog,
    processed: ProcessedMessages,
    transport: Box<dyn BridgeTransport>,
    hook: Box<dyn AllocationHook>,
    entered: bool,
    events: EventLog,
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("admin", &self.admin)
            .field("ledger", &self.ledger)
            .field("bridges", &self.catalog.bridge_count())
            .field("processed", &self.processed.len())
            .finish_non_exhaustive()
    }
}

impl Router {
    /// Creates a router bound to one administrator and one ledger, with an
    /// empty catalog and an empty processed set.
    pub fn new(
        admin: impl Into<Address>,
        ledger: impl Into<Address>,
        transport: Box<dyn BridgeTransport>,
        hook: Box<dyn AllocationHook>,
    ) -> Self {
        Self {
            admin: admin.into(),
            ledger: ledger.into(),
            catalog: BridgeCatalog::new(),
            processed: ProcessedMessages::new(),
            transport,
            hook,
            entered: false,
            events: EventLog::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// The administrator identity.
    pub fn admin(&self) -> &Address {
        &self.admin
    }

    /// The ledger this router serves.
    pub fn ledger(&self) -> &Address {
        &self.ledger
    }

    /// The bridge registry and quote catalog (read-only).
    pub fn catalog(&self) -> &BridgeCatalog {
        &self.catalog
    }

    /// The processed-message set (read-only).
    pub fn processed(&self) -> &ProcessedMessages {
        &self.processed
    }

    /// Resolves the best bridge for a pair without dispatching anything.
    /// Pure with respect to the catalog; emits nothing.
    pub fn get_optimal_bridge(
        &self,
        src: ChainId,
        dst: ChainId,
    ) -> Result<SelectedBridge, RouterError> {
        Ok(self.catalog.best_quote(src, dst)?)
    }

    /// Removes and returns all audit records, oldest first.
    pub fn drain_events(&mut self) -> Vec<AuditEvent> {
        self.events.drain()
    }

    /// Audit records appended so far.
    pub fn events(&self) -> &[AuditEvent] {
        self.events.records()
    }

    // -----------------------------------------------------------------------
    // Administration
    // -----------------------------------------------------------------------

    /// Registers a bridge. Administrator-only.
    pub fn add_bridge(&mut self, caller: &str, bridge: &str) -> Result<(), RouterError> {
        self.require_admin(caller)?;
        if !is_valid_id(bridge) {
            return Err(RouterError::InvalidStrategy);
        }
        self.catalog.add_bridge(bridge)?;
        self.events.record(AuditEventKind::BridgeAdded {
            bridge: bridge.to_string(),
        });
        Ok(())
    }

    /// Removes a bridge. Administrator-only. Stale quotes referencing the
    /// bridge persist until their pair is cleared.
    pub fn remove_bridge(&mut self, caller: &str, bridge: &str) -> Result<(), RouterError> {
        self.require_admin(caller)?;
        self.catalog.remove_bridge(bridge)?;
        self.events.record(AuditEventKind::BridgeRemoved {
            bridge: bridge.to_string(),
        });
        Ok(())
    }

    /// Appends a quote for a chain pair. Administrator-only.
    pub fn configure_quote(
        &mut self,
        caller: &str,
        src: ChainId,
        dst: ChainId,
        quote: BridgeQuote,
    ) -> Result<(), RouterError> {
        self.require_admin(caller)?;
        if src == 0 {
            return Err(RouterError::InvalidDomain { domain: src });
        }
        if dst == 0 {
            return Err(RouterError::InvalidDomain { domain: dst });
        }
        let bridge = quote.bridge.clone();
        self.catalog.add_quote(src, dst, quote)?;
        self.events
            .record(AuditEventKind::QuoteConfigured { src, dst, bridge });
        Ok(())
    }

    /// Drops all quotes for a pair. Administrator-only.
    pub fn clear_pair(&mut self, caller: &str, src: ChainId, dst: ChainId) -> Result<usize, RouterError> {
        self.require_admin(caller)?;
        let dropped = self.catalog.clear_pair(src, dst);
        self.events.record(AuditEventKind::PairCleared {
            src,
            dst,
            quotes_dropped: dropped,
        });
        Ok(dropped)
    }

    // -----------------------------------------------------------------------
    // Dispatch
    // -----------------------------------------------------------------------

    /// Routes `amount` toward `strategy` on `dst`, paying `fee`.
    ///
    /// Same-domain requests dispatch through the allocation hook with no
    /// fee consumed; cross-domain requests encode a payload and hand it to
    /// the selected bridge's transport. Either branch leaves a
    /// [`AuditEventKind::RouteDispatched`] record. Returns the intent id.
    ///
    /// # Errors
    ///
    /// Validation: [`RouterError::InvalidDomain`] (zero domain),
    /// [`RouterError::InvalidStrategy`], [`RouterError::InvalidAmount`].
    /// Selection: [`CatalogError::NoBridgeAvailable`] (wrapped),
    /// [`RouterError::UnsupportedBridge`], [`RouterError::InsufficientFee`].
    pub fn route(
        &mut self,
        src: ChainId,
        dst: ChainId,
        strategy: &str,
        amount: Amount,
        fee: Amount,
        params: &[u8],
    ) -> Result<String, RouterError> {
        if src == 0 {
            return Err(RouterError::InvalidDomain { domain: src });
        }
        if dst == 0 {
            return Err(RouterError::InvalidDomain { domain: dst });
        }
        if !is_valid_id(strategy) {
            return Err(RouterError::InvalidStrategy);
        }
        if amount == 0 {
            return Err(RouterError::InvalidAmount);
        }

        let selected = self.catalog.best_quote(src, dst)?;
        if !self.catalog.is_supported(&selected.bridge) {
            return Err(RouterError::UnsupportedBridge {
                bridge: selected.bridge,
            });
        }
        if fee < selected.cost {
            return Err(RouterError::InsufficientFee {
                required: selected.cost,
                provided: fee,
            });
        }

        self.enter()?;
        let result = self.route_inner(src, dst, strategy, amount, fee, params, selected);
        self.exit();
        result
    }

    #[allow(clippy::too_many_arguments)]
    fn route_inner(
        &mut self,
        src: ChainId,
        dst: ChainId,
        strategy: &str,
        amount: Amount,
        fee: Amount,
        params: &[u8],
        selected: SelectedBridge,
    ) -> Result<String, RouterError> {
        let intent_id = Uuid::new_v4().to_string();

        self.events.record(AuditEventKind::BridgeSelected {
            src,
            dst,
            bridge: selected.bridge.clone(),
            cost: selected.cost,
        });

        let fee_paid = if src == dst {
            // Local allocation; the bridge fee is not consumed.
            self.hook.allocate(strategy, amount)?;
            0
        } else {
            let payload = RoutePayload {
                target_strategy: strategy.to_string(),
                amount,
            }
            .encode()?;
            self.transport
                .send(&selected.bridge, dst, &payload, params, fee)?;
            fee
        };

        self.events.record(AuditEventKind::RouteDispatched {
            intent_id: intent_id.clone(),
            src,
            dst,
            strategy: strategy.to_string(),
            amount,
            bridge: selected.bridge,
            fee_paid,
        });
        Ok(intent_id)
    }

    /// Consumes an inbound cross-domain message at the current clock.
    /// See [`Self::receive_message_at`] for the semantics.
    pub fn receive_message(
        &mut self,
        src: ChainId,
        payload: &[u8],
    ) -> Result<(StrategyId, Amount), RouterError> {
        self.receive_message_at(src, payload, Utc::now().timestamp())
    }

    /// Consumes an inbound message received at `timestamp_secs`.
    ///
    /// The identifier is marked processed *before* anything acts on the
    /// payload, so a re-entrant replay hits the duplicate check. The
    /// decoded `(strategy, amount)` dispatches through the same local
    /// allocation hook as same-domain `route`.
    ///
    /// # Errors
    ///
    /// [`RouterError::DuplicateMessage`] on an already-consumed identifier,
    /// [`RouterError::Codec`] on undecodable bytes, [`RouterError::Hook`]
    /// if local dispatch fails. On either failure the identifier is
    /// released again: only a fully dispatched message counts as consumed,
    /// so a transiently failing adapter cannot permanently eat a message.
    pub fn receive_message_at(
        &mut self,
        src: ChainId,
        payload: &[u8],
        timestamp_secs: i64,
    ) -> Result<(StrategyId, Amount), RouterError> {
        if src == 0 {
            return Err(RouterError::InvalidDomain { domain: src });
        }

        let id = message_id(src, payload, timestamp_secs);
        self.enter()?;
        let result = self.receive_inner(src, payload, id);
        self.exit();
        result
    }

    fn receive_inner(
        &mut self,
        src: ChainId,
        payload: &[u8],
        id: MessageId,
    ) -> Result<(StrategyId, Amount), RouterError> {
        // Mark before acting: replay protection must hold even if the
        // dispatch below calls back into untrusted code. A delivery that
        // fails past this point hands its identifier back — the message
        // was not consumed.
        if !self.processed.mark(id) {
            return Err(RouterError::DuplicateMessage {
                message_id: hex::encode(id),
            });
        }

        let decoded = match RoutePayload::decode(payload) {
            Ok(p) => p,
            Err(e) => {
                self.processed.unmark(&id);
                return Err(e.into());
            }
        };
        if let Err(e) = self.hook.allocate(&decoded.target_strategy, decoded.amount) {
            self.processed.unmark(&id);
            return Err(e.into());
        }

        self.events.record(AuditEventKind::MessageReceived {
            src,
            message_id: hex::encode(id),
            strategy: decoded.target_strategy.clone(),
            amount: decoded.amount,
        });
        Ok((decoded.target_strategy, decoded.amount))
    }

    // -----------------------------------------------------------------------
    // Rebalance
    // -----------------------------------------------------------------------

    /// Issues exit-then-enter instructions across strategies.
    /// Administrator-only.
    ///
    /// The three sequences pair by position; the router does not verify
    /// that exited value matches entered value — that's the caller's
    /// arithmetic. All exits are issued before any enter so a later entry
    /// cannot starve an earlier exit's liquidity. Instructions are
    /// fire-and-forget: a failing hook call is recorded in the audit trail
    /// and the pass continues.
    ///
    /// # Errors
    ///
    /// [`RouterError::LengthMismatch`] unless all three sequences have
    /// equal length — checked before any instruction is issued.
    pub fn rebalance(
        &mut self,
        caller: &str,
        exits: &[StrategyId],
        enters: &[StrategyId],
        amounts: &[Amount],
    ) -> Result<(), RouterError> {
        self.require_admin(caller)?;
        if exits.len() != enters.len() || enters.len() != amounts.len() {
            return Err(RouterError::LengthMismatch {
                exits: exits.len(),
                enters: enters.len(),
                amounts: amounts.len(),
            });
        }
        self.enter()?;

        for (strategy, &amount) in exits.iter().zip(amounts) {
            if amount == 0 {
                continue;
            }
            let succeeded = match self.hook.release(strategy, amount) {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!(strategy = %strategy, error = %e, "rebalance exit failed");
                    false
                }
            };
            self.events.record(AuditEventKind::RebalanceExit {
                strategy: strategy.clone(),
                amount,
                succeeded,
            });
        }

        for (strategy, &amount) in enters.iter().zip(amounts) {
            if amount == 0 {
                continue;
            }
            let succeeded = match self.hook.allocate(strategy, amount) {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!(strategy = %strategy, error = %e, "rebalance enter failed");
                    false
                }
            };
            self.events.record(AuditEventKind::RebalanceEnter {
                strategy: strategy.clone(),
                amount,
                succeeded,
            });
        }

        self.exit();
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    /// Captures the durable routing state.
    pub fn snapshot(&self) -> RouterSnapshot {
        RouterSnapshot {
            admin: self.admin.clone(),
            ledger: self.ledger.clone(),
            catalog: self.catalog.clone(),
            processed: self.processed.clone(),
        }
    }

    /// Rebuilds a router from a snapshot, re-supplying the live transport
    /// and hook wiring.
    pub fn from_snapshot(
        snapshot: RouterSnapshot,
        transport: Box<dyn BridgeTransport>,
        hook: Box<dyn AllocationHook>,
    ) -> Self {
        Self {
            admin: snapshot.admin,
            ledger: snapshot.ledger,
            catalog: snapshot.catalog,
            processed: snapshot.processed,
            transport,
            hook,
            entered: false,
            events: EventLog::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Internal Helpers
    // -----------------------------------------------------------------------

    fn require_admin(&self, caller: &str) -> Result<(), RouterError> {
        if caller != self.admin {
            return Err(RouterError::Unauthorized {
                caller: caller.to_string(),
            });
        }
        Ok(())
    }

    fn enter(&mut self) -> Result<(), RouterError> {
        if self.entered {
            return Err(RouterError::Reentrancy);
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

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    const ADMIN: &str = "router-admin";
    const LEDGER: &str = "vault-1";

    /// Transport that records every send. Shared handles let the tests
    /// inspect what crossed the seam.
    #[derive(Default)]
    struct RecordingTransport {
        sent: Arc<Mutex<Vec<(String, ChainId, Vec<u8>, Amount)>>>,
    }

    impl BridgeTransport for RecordingTransport {
        fn send(
            &mut self,
            bridge: &str,
            dst: ChainId,
            payload: &[u8],
            _params: &[u8],
            fee: Amount,
        ) -> Result<(), TransportError> {
            self.sent
                .lock()
                .unwrap()
                .push((bridge.to_string(), dst, payload.to_vec(), fee));
            Ok(())
        }
    }

    /// Hook that records instructions; fails on whatever strategy the
    /// shared `fail_on` slot currently names, so a test can break and
    /// repair an adapter mid-flight.
    #[derive(Default)]
    struct RecordingHook {
        calls: Arc<Mutex<Vec<(String, String, Amount)>>>,
        fail_on: Arc<Mutex<Option<String>>>,
    }

    impl AllocationHook for RecordingHook {
        fn allocate(&mut self, strategy: &str, amount: Amount) -> Result<(), HookError> {
            if self.fail_on.lock().unwrap().as_deref() == Some(strategy) {
                return Err(HookError("adapter offline".into()));
            }
            self.calls
                .lock()
                .unwrap()
                .push(("allocate".into(), strategy.to_string(), amount));
            Ok(())
        }

        fn release(&mut self, strategy: &str, amount: Amount) -> Result<(), HookError> {
            if self.fail_on.lock().unwrap().as_deref() == Some(strategy) {
                return Err(HookError("adapter offline".into()));
            }
            self.calls
                .lock()
                .unwrap()
                .push(("release".into(), strategy.to_string(), amount));
            Ok(())
        }
    }

    struct Harness {
        router: Router,
        sent: Arc<Mutex<Vec<(String, ChainId, Vec<u8>, Amount)>>>,
        calls: Arc<Mutex<Vec<(String, String, Amount)>>>,
        fail_on: Arc<Mutex<Option<String>>>,
    }

    fn harness() -> Harness {
        harness_failing_on(None)
    }

    fn harness_failing_on(fail_on: Option<&str>) -> Harness {
        let transport = RecordingTransport::default();
        let sent = Arc::clone(&transport.sent);
        let hook = RecordingHook {
            calls: Arc::default(),
            fail_on: Arc::new(Mutex::new(fail_on.map(str::to_string))),
        };
        let calls = Arc::clone(&hook.calls);
        let fail_on = Arc::clone(&hook.fail_on);
        Harness {
            router: Router::new(ADMIN, LEDGER, Box::new(transport), Box::new(hook)),
            sent,
            calls,
            fail_on,
        }
    }

    fn quote(bridge: &str, cost: Amount, time: u64, sec: u8) -> BridgeQuote {
        BridgeQuote {
            bridge: bridge.to_string(),
            estimated_cost: cost,
            estimated_time_secs: time,
            security_score: sec,
        }
    }

    // -- admin ------------------------------------------------------------

    #[test]
    fn bridge_admin_requires_admin() {
        let mut h = harness();
        assert!(matches!(
            h.router.add_bridge("mallory", "hop"),
            Err(RouterError::Unauthorized { .. })
        ));
        h.router.add_bridge(ADMIN, "hop").unwrap();
        assert!(h.router.catalog().is_supported("hop"));
    }

    #[test]
    fn configure_quote_rejects_zero_domains() {
        let mut h = harness();
        h.router.add_bridge(ADMIN, "hop").unwrap();
        assert!(matches!(
            h.router.configure_quote(ADMIN, 0, 2, quote("hop", 1, 1, 1)),
            Err(RouterError::InvalidDomain { domain: 0 })
        ));
        assert!(matches!(
            h.router.configure_quote(ADMIN, 1, 0, quote("hop", 1, 1, 1)),
            Err(RouterError::InvalidDomain { domain: 0 })
        ));
    }

    // -- route validation -------------------------------------------------

    #[test]
    fn route_validates_inputs_in_order() {
        let mut h = harness();
        assert!(matches!(
            h.router.route(0, 2, "s", 100, 10, &[]),
            Err(RouterError::InvalidDomain { domain: 0 })
        ));
        assert!(matches!(
            h.router.route(1, 0, "s", 100, 10, &[]),
            Err(RouterError::InvalidDomain { domain: 0 })
        ));
        assert!(matches!(
            h.router.route(1, 2, "", 100, 10, &[]),
            Err(RouterError::InvalidStrategy)
        ));
        assert!(matches!(
            h.router.route(1, 2, "s", 0, 10, &[]),
            Err(RouterError::InvalidAmount)
        ));
        // Nothing dispatched by any rejected call.
        assert!(h.sent.lock().unwrap().is_empty());
        assert!(h.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn route_with_empty_catalog_fails() {
        let mut h = harness();
        assert!(matches!(
            h.router.route(1, 2, "s", 100, 10, &[]),
            Err(RouterError::Catalog(CatalogError::NoBridgeAvailable))
        ));
    }

    #[test]
    fn route_rejects_stale_quote_for_removed_bridge() {
        let mut h = harness();
        h.router.add_bridge(ADMIN, "hop").unwrap();
        h.router.add_bridge(ADMIN, "other").unwrap();
        h.router
            .configure_quote(ADMIN, 1, 2, quote("hop", 5, 60, 90))
            .unwrap();
        h.router.remove_bridge(ADMIN, "hop").unwrap();

        // The stale quote still wins selection but is no longer routable.
        assert!(matches!(
            h.router.route(1, 2, "s", 100, 10, &[]),
            Err(RouterError::UnsupportedBridge { .. })
        ));
    }

    #[test]
    fn route_rejects_insufficient_fee() {
        let mut h = harness();
        h.router.add_bridge(ADMIN, "hop").unwrap();
        h.router
            .configure_quote(ADMIN, 1, 2, quote("hop", 50, 60, 90))
            .unwrap();

        assert!(matches!(
            h.router.route(1, 2, "s", 100, 49, &[]),
            Err(RouterError::InsufficientFee {
                required: 50,
                provided: 49
            })
        ));
    }

    // -- route dispatch ---------------------------------------------------

    #[test]
    fn same_domain_route_dispatches_locally_without_fee() {
        let mut h = harness();
        h.router.add_bridge(ADMIN, "hop").unwrap();

        h.router.route(1, 1, "strategy-a", 5_000, 0, &[]).unwrap();

        let calls = h.calls.lock().unwrap();
        assert_eq!(calls.as_slice(), &[("allocate".into(), "strategy-a".into(), 5_000)]);
        assert!(h.sent.lock().unwrap().is_empty());

        let events = h.router.events();
        assert!(events.iter().any(|e| matches!(
            &e.kind,
            AuditEventKind::RouteDispatched { fee_paid: 0, dst: 1, .. }
        )));
    }

    #[test]
    fn cross_domain_route_sends_payload_through_bridge() {
        let mut h = harness();
        h.router.add_bridge(ADMIN, "hop").unwrap();
        h.router
            .configure_quote(ADMIN, 1, 137, quote("hop", 25, 60, 90))
            .unwrap();

        let intent = h.router.route(1, 137, "strategy-b", 7_500, 30, &[]).unwrap();
        assert!(!intent.is_empty());

        let sent = h.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        let (bridge, dst, payload, fee) = &sent[0];
        assert_eq!(bridge, "hop");
        assert_eq!(*dst, 137);
        assert_eq!(*fee, 30);

        let decoded = RoutePayload::decode(payload).unwrap();
        assert_eq!(decoded.target_strategy, "strategy-b");
        assert_eq!(decoded.amount, 7_500);

        // No local dispatch on the cross-domain branch.
        assert!(h.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn optimal_bridge_query_is_pure() {
        let mut h = harness();
        h.router.add_bridge(ADMIN, "hop").unwrap();
        h.router
            .configure_quote(ADMIN, 1, 2, quote("hop", 5_000_000, 900, 70))
            .unwrap();
        let events_before = h.router.events().len();

        let a = h.router.get_optimal_bridge(1, 2).unwrap();
        let b = h.router.get_optimal_bridge(1, 2).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.cost, 5_000_000);
        assert_eq!(h.router.events().len(), events_before);
    }

    // -- receive ----------------------------------------------------------

    fn payload(strategy: &str, amount: Amount) -> Vec<u8> {
        RoutePayload {
            target_strategy: strategy.into(),
            amount,
        }
        .encode()
        .unwrap()
    }

    #[test]
    fn receive_dispatches_and_dedups() {
        let mut h = harness();
        let bytes = payload("strategy-a", 1_000);

        let (strategy, amount) = h.router.receive_message_at(7, &bytes, 1_700_000_000).unwrap();
        assert_eq!(strategy, "strategy-a");
        assert_eq!(amount, 1_000);
        assert_eq!(h.calls.lock().unwrap().len(), 1);

        // Identical (src, payload, timestamp) triple: duplicate.
        let replay = h.router.receive_message_at(7, &bytes, 1_700_000_000);
        assert!(matches!(replay, Err(RouterError::DuplicateMessage { .. })));
        assert_eq!(h.calls.lock().unwrap().len(), 1);
    }

    #[test]
    fn receive_accepts_different_payload_in_same_quantum() {
        let mut h = harness();
        h.router
            .receive_message_at(7, &payload("s", 100), 42)
            .unwrap();
        // Same source and timestamp, different amount: a distinct message.
        h.router
            .receive_message_at(7, &payload("s", 200), 42)
            .unwrap();
        assert_eq!(h.router.processed().len(), 2);
    }

    #[test]
    fn receive_rejects_zero_domain_and_garbage() {
        let mut h = harness();
        assert!(matches!(
            h.router.receive_message_at(0, b"x", 1),
            Err(RouterError::InvalidDomain { domain: 0 })
        ));
        assert!(matches!(
            h.router.receive_message_at(1, &[0xFF; 3], 1),
            Err(RouterError::Codec(_))
        ));
        // The undecodable delivery did not consume its identifier.
        assert!(h.router.processed().is_empty());
    }

    #[test]
    fn failed_dispatch_releases_the_message_id_for_redelivery() {
        let mut h = harness_failing_on(Some("s"));
        let bytes = payload("s", 100);

        // First delivery fails in the hook; the identifier must come back.
        assert!(matches!(
            h.router.receive_message_at(7, &bytes, 42),
            Err(RouterError::Hook(_))
        ));
        assert!(h.router.processed().is_empty());

        // The adapter recovers; redelivery of the same triple succeeds.
        *h.fail_on.lock().unwrap() = None;
        h.router.receive_message_at(7, &bytes, 42).unwrap();
        assert_eq!(h.calls.lock().unwrap().len(), 1);

        // A genuine replay is still a duplicate.
        assert!(matches!(
            h.router.receive_message_at(7, &bytes, 42),
            Err(RouterError::DuplicateMessage { .. })
        ));
    }

    // -- re-entrancy ------------------------------------------------------

    #[test]
    fn mutators_reject_reentry_mid_mutation() {
        let mut h = harness();
        h.router.add_bridge(ADMIN, "hop").unwrap();
        let bytes = payload("s", 100);

        // Simulate a callback arriving while a mutation holds the guard.
        h.router.enter().unwrap();

        assert!(matches!(
            h.router.route(1, 1, "s", 100, 10, &[]),
            Err(RouterError::Reentrancy)
        ));
        assert!(matches!(
            h.router.receive_message_at(7, &bytes, 42),
            Err(RouterError::Reentrancy)
        ));
        assert!(matches!(
            h.router.rebalance(ADMIN, &["a".into()], &["b".into()], &[10]),
            Err(RouterError::Reentrancy)
        ));
        // Nothing dispatched and no identifier consumed.
        assert!(h.calls.lock().unwrap().is_empty());
        assert!(h.router.processed().is_empty());

        h.router.exit();
        h.router.receive_message_at(7, &bytes, 42).unwrap();
    }

    // -- persistence ------------------------------------------------------

    #[test]
    fn snapshot_preserves_dedup_across_restart() {
        let mut h = harness();
        h.router.add_bridge(ADMIN, "hop").unwrap();
        h.router
            .receive_message_at(7, &payload("s", 100), 42)
            .unwrap();

        let snap = h.router.snapshot();
        let mut restored = Router::from_snapshot(
            snap,
            Box::new(RecordingTransport::default()),
            Box::new(RecordingHook::default()),
        );

        assert!(restored.catalog().is_supported("hop"));
        // The consumed identifier must still be consumed.
        assert!(matches!(
            restored.receive_message_at(7, &payload("s", 100), 42),
            Err(RouterError::DuplicateMessage { .. })
        ));
    }

    // -- rebalance --------------------------------------------------------

    #[test]
    fn rebalance_arity_checked_before_any_side_effect() {
        let mut h = harness();
        let result = h.router.rebalance(
            ADMIN,
            &["a".into(), "b".into()],
            &["c".into()],
            &[100, 200],
        );
        assert!(matches!(
            result,
            Err(RouterError::LengthMismatch {
                exits: 2,
                enters: 1,
                amounts: 2
            })
        ));
        assert!(h.calls.lock().unwrap().is_empty());
        assert!(h.router.events().is_empty());
    }

    #[test]
    fn rebalance_requires_admin() {
        let mut h = harness();
        assert!(matches!(
            h.router.rebalance("mallory", &[], &[], &[]),
            Err(RouterError::Unauthorized { .. })
        ));
    }

    #[test]
    fn rebalance_issues_all_exits_before_any_enter() {
        let mut h = harness();
        h.router
            .rebalance(
                ADMIN,
                &["old-1".into(), "old-2".into()],
                &["new-1".into(), "new-2".into()],
                &[100, 200],
            )
            .unwrap();

        let calls = h.calls.lock().unwrap();
        assert_eq!(
            calls.as_slice(),
            &[
                ("release".into(), "old-1".into(), 100),
                ("release".into(), "old-2".into(), 200),
                ("allocate".into(), "new-1".into(), 100),
                ("allocate".into(), "new-2".into(), 200),
            ]
        );
    }

    #[test]
    fn rebalance_skips_zero_amounts() {
        let mut h = harness();
        h.router
            .rebalance(
                ADMIN,
                &["a".into(), "b".into()],
                &["c".into(), "d".into()],
                &[0, 500],
            )
            .unwrap();

        let calls = h.calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert!(calls.iter().all(|(_, _, amount)| *amount == 500));
    }

    #[test]
    fn rebalance_tolerates_failing_instruction_and_records_it() {
        let mut h = harness_failing_on(Some("dead"));
        h.router
            .rebalance(
                ADMIN,
                &["dead".into(), "ok".into()],
                &["ok".into(), "dead".into()],
                &[100, 200],
            )
            .unwrap();

        // The two instructions touching "dead" failed; the others landed.
        assert_eq!(h.calls.lock().unwrap().len(), 2);

        let events = h.router.events();
        let failed: Vec<_> = events
            .iter()
            .filter(|e| {
                matches!(
                    &e.kind,
                    AuditEventKind::RebalanceExit { succeeded: false, .. }
                        | AuditEventKind::RebalanceEnter { succeeded: false, .. }
                )
            })
            .collect();
        assert_eq!(failed.len(), 2);
    }
}
