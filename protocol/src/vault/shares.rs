//! # The Share Table
//!
//! A [`ShareLedger`] maps accounts to share balances and maintains the sum
//! invariant the rest of the vault leans on: the running `total` always
//! equals the sum of every balance. Mint and burn are the only mutations,
//! both with checked arithmetic — wrapping arithmetic and money do not mix.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{Address, Amount};

/// Errors that can occur during share-table operations.
#[derive(Debug, Error)]
pub enum ShareError {
    /// Attempted to burn more shares than the account holds.
    #[error("insufficient shares: account {account} holds {available}, requested {requested}")]
    InsufficientShares {
        /// The account being debited.
        account: Address,
        /// Shares currently held.
        available: Amount,
        /// Shares requested for burning.
        requested: Amount,
    },

    /// A mint would overflow the total supply. If you're hitting this,
    /// someone is minting more than 18.4 quintillion shares. That's either
    /// a bug or an attack.
    #[error("share supply overflow: total {total}, mint {mint}")]
    Overflow {
        /// Total supply before the failed mint.
        total: Amount,
        /// The amount that caused the overflow.
        mint: Amount,
    },
}

/// Per-account share balances plus the running total supply.
///
/// Invariant: `total() == Σ balance_of(a)` for all accounts, after every
/// operation. Both mutators uphold it or fail without touching state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShareLedger {
    balances: HashMap<Address, Amount>,
    total: Amount,
}

impl ShareLedger {
    /// Creates an empty share table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mints `shares` to `account`, creating the entry if needed.
    ///
    /// # Errors
    ///
    /// Returns [`ShareError::Overflow`] if the mint would overflow the
    /// total supply. Individual balances cannot overflow before the total
    /// does, so the total is the only check needed.
    pub fn mint(&mut self, account: &str, shares: Amount) -> Result<Amount, ShareError> {
        let new_total = self.total.checked_add(shares).ok_or(ShareError::Overflow {
            total: self.total,
            mint: shares,
        })?;

        let balance = self.balances.entry(account.to_string()).or_insert(0);
        *balance += shares;
        self.total = new_total;
        Ok(*balance)
    }

    /// Burns `shares` from `account`.
    ///
    /// # Errors
    ///
    /// Returns [`ShareError::InsufficientShares`] if the account holds
    /// fewer shares than requested (including the no-entry case).
    pub fn burn(&mut self, account: &str, shares: Amount) -> Result<Amount, ShareError> {
        let available = self.balances.get(account).copied().unwrap_or(0);
        if shares > available {
            return Err(ShareError::InsufficientShares {
                account: account.to_string(),
                available,
                requested: shares,
            });
        }

        let remaining = available - shares;
        if remaining == 0 {
            self.balances.remove(account);
        } else {
            self.balances.insert(account.to_string(), remaining);
        }
        self.total -= shares;
        Ok(remaining)
    }

    /// Shares held by `account` (zero if no entry).
    pub fn balance_of(&self, account: &str) -> Amount {
        self.balances.get(account).copied().unwrap_or(0)
    }

    /// Total share supply.
    pub fn total(&self) -> Amount {
        self.total
    }

    /// Number of accounts with a nonzero balance.
    pub fn holder_count(&self) -> usize {
        self.balances.len()
    }

    /// All holders as `(account, shares)` pairs, in arbitrary order.
    pub fn holders(&self) -> Vec<(Address, Amount)> {
        self.balances
            .iter()
            .map(|(a, s)| (a.clone(), *s))
            .collect()
    }

    /// Recomputes the sum invariant from scratch. Intended for tests and
    /// snapshot-restore validation, not the hot path.
    pub fn is_conserved(&self) -> bool {
        let sum: u128 = self.balances.values().map(|s| *s as u128).sum();
        sum == self.total as u128
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mint_creates_entry_and_raises_total() {
        let mut s = ShareLedger::new();
        let balance = s.mint("alice", 1_000).unwrap();
        assert_eq!(balance, 1_000);
        assert_eq!(s.balance_of("alice"), 1_000);
        assert_eq!(s.total(), 1_000);
        assert!(s.is_conserved());
    }

    #[test]
    fn mint_accumulates() {
        let mut s = ShareLedger::new();
        s.mint("alice", 500).unwrap();
        s.mint("alice", 300).unwrap();
        assert_eq!(s.balance_of("alice"), 800);
        assert_eq!(s.total(), 800);
    }

    #[test]
    fn mint_overflow_rejected_without_mutation() {
        let mut s = ShareLedger::new();
        s.mint("alice", u64::MAX).unwrap();
        let result = s.mint("bob", 1);
        assert!(matches!(result, Err(ShareError::Overflow { .. })));
        assert_eq!(s.balance_of("bob"), 0);
        assert_eq!(s.total(), u64::MAX);
        assert!(s.is_conserved());
    }

    #[test]
    fn burn_reduces_balance_and_total() {
        let mut s = ShareLedger::new();
        s.mint("alice", 1_000).unwrap();
        let remaining = s.burn("alice", 400).unwrap();
        assert_eq!(remaining, 600);
        assert_eq!(s.total(), 600);
        assert!(s.is_conserved());
    }

    #[test]
    fn burn_to_zero_removes_entry() {
        let mut s = ShareLedger::new();
        s.mint("alice", 500).unwrap();
        s.burn("alice", 500).unwrap();
        assert_eq!(s.balance_of("alice"), 0);
        assert_eq!(s.holder_count(), 0);
        assert_eq!(s.total(), 0);
    }

    #[test]
    fn burn_more_than_held_rejected() {
        let mut s = ShareLedger::new();
        s.mint("alice", 100).unwrap();
        let result = s.burn("alice", 200);
        assert!(matches!(
            result,
            Err(ShareError::InsufficientShares {
                available: 100,
                requested: 200,
                ..
            })
        ));
        assert_eq!(s.balance_of("alice"), 100);
    }

    #[test]
    fn burn_from_unknown_account_rejected() {
        let mut s = ShareLedger::new();
        assert!(s.burn("ghost", 1).is_err());
    }

    #[test]
    fn conservation_across_operation_sequence() {
        let mut s = ShareLedger::new();
        s.mint("alice", 1_000).unwrap();
        assert!(s.is_conserved());
        s.mint("bob", 2_500).unwrap();
        assert!(s.is_conserved());
        s.burn("alice", 999).unwrap();
        assert!(s.is_conserved());
        s.mint("carol", 7).unwrap();
        assert!(s.is_conserved());
        s.burn("bob", 2_500).unwrap();
        assert!(s.is_conserved());
        assert_eq!(s.total(), 8);
    }

    #[test]
    fn serialization_roundtrip() {
        let mut s = ShareLedger::new();
        s.mint("alice", 42).unwrap();
        let json = serde_json::to_string(&s).expect("serialize");
        let back: ShareLedger = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back.balance_of("alice"), 42);
        assert_eq!(back.total(), 42);
        assert!(back.is_conserved());
    }
}
