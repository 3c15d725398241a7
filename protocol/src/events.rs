//! # Audit Events
//!
//! Every externally observable state change in the vault or router leaves a
//! record here. Off-chain monitors reconcile against these events, so each
//! variant carries the full parameter set of the operation that produced it
//! — no "see logs for details".
//!
//! Entities own an [`EventLog`] and append to it *after* their own state
//! writes succeed. The log is drainable so an embedding process can ship
//! events to wherever they need to go; every record is also mirrored to
//! `tracing` at info level the moment it is appended.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Address, Amount, AssetId, ChainId, StrategyId};

/// One audit record. Timestamps are assigned at append time (UTC).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// When the event was recorded.
    pub at: DateTime<Utc>,
    /// What happened.
    pub kind: AuditEventKind,
}

/// The full taxonomy of observable state changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditEventKind {
    // -- Vault ------------------------------------------------------------
    Deposited {
        account: Address,
        asset: AssetId,
        amount: Amount,
        shares_minted: Amount,
    },
    Withdrawn {
        account: Address,
        shares_burned: Amount,
        amount: Amount,
    },
    Allocated {
        strategy: StrategyId,
        amount: Amount,
    },
    Paused,
    Unpaused,
    EmergencyExit {
        strategies_swept: usize,
        recovered: Amount,
    },
    AssetSupported {
        asset: AssetId,
    },
    AssetRemoved {
        asset: AssetId,
    },
    TokenSwept {
        asset: AssetId,
        amount: Amount,
        to: Address,
    },

    // -- Router -----------------------------------------------------------
    BridgeAdded {
        bridge: Address,
    },
    BridgeRemoved {
        bridge: Address,
    },
    QuoteConfigured {
        src: ChainId,
        dst: ChainId,
        bridge: Address,
    },
    PairCleared {
        src: ChainId,
        dst: ChainId,
        quotes_dropped: usize,
    },
    BridgeSelected {
        src: ChainId,
        dst: ChainId,
        bridge: Address,
        cost: Amount,
    },
    RouteDispatched {
        intent_id: String,
        src: ChainId,
        dst: ChainId,
        strategy: StrategyId,
        amount: Amount,
        bridge: Address,
        fee_paid: Amount,
    },
    MessageReceived {
        src: ChainId,
        message_id: String,
        strategy: StrategyId,
        amount: Amount,
    },
    RebalanceExit {
        strategy: StrategyId,
        amount: Amount,
        succeeded: bool,
    },
    RebalanceEnter {
        strategy: StrategyId,
        amount: Amount,
        succeeded: bool,
    },
}

/// An append-only, drainable event journal owned by one entity.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct EventLog {
    records: Vec<AuditEvent>,
}

impl EventLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record, stamping it with the current time, and mirrors it
    /// to `tracing`.
    pub fn record(&mut self, kind: AuditEventKind) {
        tracing::info!(event = ?kind, "audit");
        self.records.push(AuditEvent {
            at: Utc::now(),
            kind,
        });
    }

    /// Returns the records appended so far, oldest first.
    pub fn records(&self) -> &[AuditEvent] {
        &self.records
    }

    /// Removes and returns all records, oldest first.
    pub fn drain(&mut self) -> Vec<AuditEvent> {
        std::mem::take(&mut self.records)
    }

    /// Number of records currently held.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// `true` if no records are held.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
