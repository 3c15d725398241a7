//! # Protocol Configuration & Constants
//!
//! Every magic number in Strata lives here. If you're hardcoding a constant
//! somewhere else, you're doing it wrong and you owe the team coffee.
//!
//! Most of these values gate capacity or shape the bridge-scoring formula.
//! Changing the scoring weights changes which bridge wins for every pair in
//! the catalog, so treat them as consensus-grade parameters.

/// Protocol semantic version, independent of crate versions. Snapshots and
/// wire payloads from one protocol version are not guaranteed readable by
/// another.
pub const PROTOCOL_VERSION: &str = "0.1.0";

// ---------------------------------------------------------------------------
// Share Accounting
// ---------------------------------------------------------------------------

/// Fixed-point scale for share-price reporting. 1e12 gives twelve decimal
/// places of price resolution on top of smallest-unit amounts, which is
/// enough that rounding in the price readout never exceeds the rounding
/// already inherent in integer share math.
pub const SHARE_PRICE_PRECISION: u128 = 1_000_000_000_000;

/// Maximum number of strategies a vault will ever register. Withdrawal
/// shortfalls and emergency exits walk this list linearly, so the cap
/// bounds the work done inside a single operation.
pub const MAX_ACTIVE_STRATEGIES: usize = 16;

// ---------------------------------------------------------------------------
// Bridge Selection
// ---------------------------------------------------------------------------

/// Maximum number of bridges in the global registry. Selection is a single
/// pass over a pair's quote list, and every quote references a registered
/// bridge, so this also bounds scoring work.
pub const MAX_SUPPORTED_BRIDGES: usize = 32;

/// Weight of the cost term in the composite bridge score.
pub const COST_WEIGHT: u128 = 40;

/// Weight of the speed term in the composite bridge score.
pub const SPEED_WEIGHT: u128 = 30;

/// Weight of the security term in the composite bridge score.
pub const SECURITY_WEIGHT: u128 = 30;

/// Speed scores are normalized against a one-hour reference: a bridge that
/// settles in an hour scores exactly `SPEED_WEIGHT`; faster scores higher.
pub const SPEED_REFERENCE_SECS: u128 = 3600;

/// Fixed-point scale applied to every per-term score before summation.
/// Truncation to an integer happens once, after the weighted sum — never
/// per term, or cheap-but-slow bridges would all collapse to zero.
pub const SCORE_SCALE: u128 = 10_000;

// ---------------------------------------------------------------------------
// Cross-Domain Messaging
// ---------------------------------------------------------------------------

/// Domain-separation context for message-identifier derivation. Bump the
/// version suffix if the preimage layout ever changes.
pub const MESSAGE_ID_CONTEXT: &str = "strata-message-id-v1";
