//! # Vault Module — Share-Based Custody
//!
//! The vault is where pooled money lives in Strata. Depositors hand it an
//! asset and receive shares — proportional claims on everything the vault
//! manages, idle or deployed. The vault keeps the books straight across
//! deposits, withdrawals, strategy allocations, and the day everything has
//! to come back home in a hurry.
//!
//! ```text
//! shares.rs  — The share table: per-account balances, mint/burn, the
//!              conservation invariant.
//! ledger.rs  — The Vault entity: custody, pricing, allocation
//!              bookkeeping, pause, emergency unwind.
//! ```
//!
//! ## Design Principles
//!
//! 1. **Share price only moves through recorded gain or loss.** Deposits
//!    and withdrawals are ratio-preserving by construction; nothing may
//!    dilute existing holders.
//! 2. **Effects before external calls.** The vault finishes its own
//!    bookkeeping before any adapter gets control.
//! 3. **Best-effort where it protects users.** One broken adapter must
//!    never freeze withdrawals or the emergency sweep.

pub mod ledger;
pub mod shares;

pub use ledger::{PortError, StrategyPort, Vault, VaultError, VaultSnapshot};
pub use shares::{ShareError, ShareLedger};
