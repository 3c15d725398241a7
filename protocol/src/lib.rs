// Copyright (c) 2026 Strata Contributors. MIT License.
// See LICENSE for details.

//! # Strata Protocol — Core Library
//!
//! Strata is a custodial yield vault paired with a cross-domain fund router.
//! Depositors pool an asset and receive proportional shares; an operator
//! deploys the pool into pluggable yield strategies; and when capital has to
//! live on another execution domain, the router picks the cheapest-fastest-
//! safest bridge it knows about and moves it there.
//!
//! This crate is the accounting and decision engine only. Bridge transports,
//! the yield protocols behind each adapter, and anything with a UI are
//! external collaborators — they appear here as traits at the seams, nothing
//! more.
//!
//! ## Architecture
//!
//! The library is split into modules that mirror the actual concerns of the
//! system:
//!
//! - **config** — Protocol constants. Weights, caps, precision. One place.
//! - **crypto** — BLAKE3 hashing for message identifiers. That's it.
//! - **types** — Shared identifiers and the risk-metrics report shape.
//! - **events** — The audit trail. Every state change leaves a record.
//! - **adapter** — The uniform wrapper around one external yield protocol.
//! - **vault** — Share-based custody: mint, burn, allocate, unwind.
//! - **router** — Bridge catalog, weighted selection, message dedup,
//!   rebalance orchestration.
//! - **storage** — Snapshot persistence over sled.
//!
//! ## Design Philosophy
//!
//! 1. All amounts are `u64` in smallest-unit denomination. No floats touch
//!    money, ever. Intermediate products go through `u128`.
//! 2. Effects commit before external calls. Every mutator finishes its own
//!    bookkeeping before an adapter, transport, or hook gets control.
//! 3. Every failure is scoped to the operation that triggered it. Nothing
//!    in this crate is allowed to take the whole system down.
//! 4. If it touches money, it has tests. Plural.

pub mod adapter;
pub mod config;
pub mod crypto;
pub mod events;
pub mod router;
pub mod storage;
pub mod types;
pub mod vault;
