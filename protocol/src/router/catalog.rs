//! # Bridge Registry & Chain-Pair Catalog
//!
//! The catalog answers one question: "I need to move funds from domain A to
//! domain B — which bridge, and what will it cost?" It holds the global
//! bridge registry (ordered, capped) and, per chain pair, the list of
//! quotes operators have configured. Quotes append and persist until a pair
//! is explicitly cleared; nothing deduplicates or refreshes them.
//!
//! ## Scoring
//!
//! Selection is a greedy single-pass argmax over a small bounded list —
//! cheaper than sorting and trivially deterministic. Each quote gets a
//! composite score out of three weighted terms:
//!
//! ```text
//! cost:     COST_WEIGHT / cost          (max score at zero cost)
//! speed:    3600 * SPEED_WEIGHT / time  (one-hour reference)
//! security: score * SECURITY_WEIGHT / 100
//! ```
//!
//! Per-term values carry a fixed-point scale so slow-but-cheap bridges
//! don't truncate to zero before they can compete; the sum is truncated to
//! an integer exactly once, at the end.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

use crate::config::{
    COST_WEIGHT, MAX_SUPPORTED_BRIDGES, SCORE_SCALE, SECURITY_WEIGHT, SPEED_REFERENCE_SECS,
    SPEED_WEIGHT,
};
use crate::types::{Address, Amount, ChainId};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur while managing or querying the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The bridge registry is full.
    #[error("bridge capacity exceeded: cap is {cap}")]
    CapacityExceeded {
        /// The configured maximum.
        cap: usize,
    },

    /// The bridge is already registered.
    #[error("bridge already registered: {bridge}")]
    AlreadyRegistered {
        /// The offending address.
        bridge: Address,
    },

    /// The bridge is not in the registry.
    #[error("unknown bridge: {bridge}")]
    UnknownBridge {
        /// The address the caller supplied.
        bridge: Address,
    },

    /// Security scores live in 0..=100.
    #[error("invalid security score: {got} (must be 0..=100)")]
    InvalidSecurityScore {
        /// The out-of-range value.
        got: u8,
    },

    /// No quotes for the pair and the global registry is empty.
    #[error("no bridge available")]
    NoBridgeAvailable,
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One operator-configured quote for a chain pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeQuote {
    /// The bridge this quote belongs to.
    pub bridge: Address,
    /// Estimated transfer cost in smallest units.
    pub estimated_cost: Amount,
    /// Estimated transfer latency in seconds.
    pub estimated_time_secs: u64,
    /// Operator-assigned security score, 0..=100.
    pub security_score: u8,
}

/// The winning bridge for a pair: its address and the quoted cost — not
/// the composite score, which is an internal ranking detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedBridge {
    /// The chosen bridge.
    pub bridge: Address,
    /// The cost the caller's fee is checked against.
    pub cost: Amount,
}

/// Global bridge registry plus per-pair quote lists.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct BridgeCatalog {
    /// Registration order; the zero-quote fallback picks index 0.
    bridges: Vec<Address>,
    /// O(1) membership alongside the ordered list.
    membership: HashSet<Address>,
    pairs: HashMap<(ChainId, ChainId), Vec<BridgeQuote>>,
}

impl BridgeCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------------
    // Registry
    // -----------------------------------------------------------------------

    /// Registers a bridge.
    ///
    /// # Errors
    ///
    /// [`CatalogError::CapacityExceeded`] at the cap,
    /// [`CatalogError::AlreadyRegistered`] on duplicates. Neither mutates
    /// the registry.
    pub fn add_bridge(&mut self, bridge: &str) -> Result<(), CatalogError> {
        if self.membership.contains(bridge) {
            return Err(CatalogError::AlreadyRegistered {
                bridge: bridge.to_string(),
            });
        }
        if self.bridges.len() >= MAX_SUPPORTED_BRIDGES {
            return Err(CatalogError::CapacityExceeded {
                cap: MAX_SUPPORTED_BRIDGES,
            });
        }
        self.bridges.push(bridge.to_string());
        self.membership.insert(bridge.to_string());
        Ok(())
    }

    /// Removes a bridge, compacting the ordered list. Quotes referencing
    /// the bridge persist — they simply become unroutable until cleared.
    pub fn remove_bridge(&mut self, bridge: &str) -> Result<(), CatalogError> {
        if !self.membership.remove(bridge) {
            return Err(CatalogError::UnknownBridge {
                bridge: bridge.to_string(),
            });
        }
        self.bridges.retain(|b| b != bridge);
        Ok(())
    }

    /// `true` if the bridge is currently registered.
    pub fn is_supported(&self, bridge: &str) -> bool {
        self.membership.contains(bridge)
    }

    /// Number of registered bridges.
    pub fn bridge_count(&self) -> usize {
        self.bridges.len()
    }

    /// Registered bridges in registration order.
    pub fn bridges(&self) -> &[Address] {
        &self.bridges
    }

    // -----------------------------------------------------------------------
    // Quotes
    // -----------------------------------------------------------------------

    /// Appends a quote for `(src, dst)`. Quotes are never deduplicated or
    /// replaced; stale ones persist until [`Self::clear_pair`].
    ///
    /// # Errors
    ///
    /// [`CatalogError::InvalidSecurityScore`] above 100,
    /// [`CatalogError::UnknownBridge`] if the quoted bridge isn't
    /// registered.
    pub fn add_quote(
        &mut self,
        src: ChainId,
        dst: ChainId,
        quote: BridgeQuote,
    ) -> Result<(), CatalogError> {
        if quote.security_score > 100 {
            return Err(CatalogError::InvalidSecurityScore {
                got: quote.security_score,
            });
        }
        if !self.membership.contains(&quote.bridge) {
            return Err(CatalogError::UnknownBridge {
                bridge: quote.bridge.clone(),
            });
        }
        self.pairs.entry((src, dst)).or_default().push(quote);
        Ok(())
    }

    /// Drops every quote for `(src, dst)`. Returns how many were dropped.
    pub fn clear_pair(&mut self, src: ChainId, dst: ChainId) -> usize {
        self.pairs.remove(&(src, dst)).map(|q| q.len()).unwrap_or(0)
    }

    /// Quotes configured for a pair, in configuration order.
    pub fn quotes(&self, src: ChainId, dst: ChainId) -> &[BridgeQuote] {
        self.pairs
            .get(&(src, dst))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    // -----------------------------------------------------------------------
    // Selection
    // -----------------------------------------------------------------------

    /// Picks the best bridge for `(src, dst)`.
    ///
    /// With no quotes for the pair, falls back to the first registered
    /// bridge at cost 0. A pure function of the catalog: repeated calls
    /// with no intervening configuration change return the same answer.
    ///
    /// # Errors
    ///
    /// [`CatalogError::NoBridgeAvailable`] when the pair has no quotes and
    /// the registry is empty.
    pub fn best_quote(&self, src: ChainId, dst: ChainId) -> Result<SelectedBridge, CatalogError> {
        let quotes = self.quotes(src, dst);
        if quotes.is_empty() {
            let bridge = self
                .bridges
                .first()
                .cloned()
                .ok_or(CatalogError::NoBridgeAvailable)?;
            return Ok(SelectedBridge { bridge, cost: 0 });
        }

        let mut best_index = 0usize;
        let mut best_score = composite_score(&quotes[0]);
        for (i, quote) in quotes.iter().enumerate().skip(1) {
            let score = composite_score(quote);
            // Strictly greater: ties resolve to the first-encountered quote.
            if score > best_score {
                best_score = score;
                best_index = i;
            }
        }

        let winner = &quotes[best_index];
        Ok(SelectedBridge {
            bridge: winner.bridge.clone(),
            cost: winner.estimated_cost,
        })
    }
}

/// Composite score of one quote, truncated to an integer after the
/// weighted sum. The per-term values carry [`SCORE_SCALE`] so cheap-slow
/// and expensive-fast quotes both survive integer division.
pub fn composite_score(quote: &BridgeQuote) -> u128 {
    let cost_score = if quote.estimated_cost > 0 {
        COST_WEIGHT * SCORE_SCALE / quote.estimated_cost as u128
    } else {
        COST_WEIGHT * SCORE_SCALE
    };
    let speed_score = if quote.estimated_time_secs > 0 {
        SPEED_REFERENCE_SECS * SPEED_WEIGHT * SCORE_SCALE / quote.estimated_time_secs as u128
    } else {
        SPEED_WEIGHT * SCORE_SCALE
    };
    let security_score = quote.security_score as u128 * SECURITY_WEIGHT * SCORE_SCALE / 100;

    (cost_score + speed_score + security_score) / SCORE_SCALE
}
