// Copyright (c) 2026 Strata Contributors. MIT License.
// See LICENSE for details.

//! # Strata Operator Node
//!
//! Entry point for the `strata-node` binary. Parses CLI arguments,
//! initializes logging, and drives the protocol library.
//!
//! The binary supports three subcommands:
//!
//! - `demo`    — run the scripted capital lifecycle and persist snapshots
//! - `inspect` — print stored snapshots from a data directory as JSON
//! - `version` — print build version information
//!
//! The demo wires real protocol entities together: a vault with two
//! strategy adapters, a router whose allocation hook feeds the vault, and
//! a logging bridge transport standing in for real bridge integrations.
//! On a data directory that already holds snapshots, it restores them
//! first, so running the demo twice exercises the restart path.

mod cli;
mod logging;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use std::sync::{Arc, Mutex};

use strata_protocol::adapter::{DriverError, ProtocolDriver, StrategyAdapter};
use strata_protocol::router::{
    AllocationHook, BridgeQuote, BridgeTransport, HookError, Router, TransportError,
};
use strata_protocol::storage::SnapshotStore;
use strata_protocol::types::{Amount, BasisPoints, ChainId, RiskMetrics};
use strata_protocol::vault::Vault;

use cli::{Commands, StrataNodeCli};
use logging::LogFormat;

const ADMIN: &str = "ops-admin";
const VAULT: &str = "vault-main";
const ASSET: &str = "usdc";

fn main() -> Result<()> {
    let cli = StrataNodeCli::parse();

    match cli.command {
        Commands::Demo(args) => run_demo(args),
        Commands::Inspect(args) => inspect(args),
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// Demo wiring
// ---------------------------------------------------------------------------

/// Driver simulating a protocol that pays shares 1:1 and redeems at par.
struct SimDriver {
    held: Amount,
    apy_bps: BasisPoints,
}

impl ProtocolDriver for SimDriver {
    fn deposit_to_protocol(&mut self, amount: Amount) -> Result<Amount, DriverError> {
        self.held += amount;
        Ok(amount)
    }

    fn withdraw_from_protocol(&mut self, shares: Amount) -> Result<Amount, DriverError> {
        let take = shares.min(self.held);
        self.held -= take;
        Ok(take)
    }

    fn protocol_apy(&self) -> BasisPoints {
        self.apy_bps
    }

    fn protocol_risk_metrics(&self) -> RiskMetrics {
        RiskMetrics::zero()
    }

    fn emergency_withdraw_from_protocol(&mut self) -> Result<Amount, DriverError> {
        let out = self.held;
        self.held = 0;
        Ok(out)
    }
}

fn sim_adapter(apy_bps: BasisPoints) -> Box<StrategyAdapter> {
    Box::new(StrategyAdapter::new(
        VAULT,
        ADMIN,
        ASSET,
        Box::new(SimDriver { held: 0, apy_bps }),
    ))
}

/// Transport that logs every dispatch. Stands in for real bridge
/// integrations; the payload goes nowhere.
struct LoggingTransport;

impl BridgeTransport for LoggingTransport {
    fn send(
        &mut self,
        bridge: &str,
        dst: ChainId,
        payload: &[u8],
        _params: &[u8],
        fee: Amount,
    ) -> Result<(), TransportError> {
        tracing::info!(
            bridge = %bridge,
            dst,
            payload = %hex::encode(payload),
            fee,
            "bridge dispatch"
        );
        Ok(())
    }
}

/// Hook that feeds the shared vault: inbound funds are credited as
/// external custody and deployed into the named strategy.
struct VaultHook {
    vault: Arc<Mutex<Vault>>,
}

impl AllocationHook for VaultHook {
    fn allocate(&mut self, strategy: &str, amount: Amount) -> Result<(), HookError> {
        let mut v = self
            .vault
            .lock()
            .map_err(|_| HookError("vault lock poisoned".into()))?;
        v.receive_external(ASSET, amount);
        v.allocate(ADMIN, strategy, amount)
            .map_err(|e| HookError(e.to_string()))
    }

    fn release(&mut self, strategy: &str, _amount: Amount) -> Result<(), HookError> {
        Err(HookError(format!(
            "release for {strategy} is operated manually on this domain"
        )))
    }
}

/// Runs the scripted capital lifecycle and persists the result.
fn run_demo(args: cli::DemoArgs) -> Result<()> {
    logging::init_logging(
        "strata_node=info,strata_protocol=info",
        LogFormat::from_str_lossy(&args.log_format),
    );

    tracing::info!(data_dir = %args.data_dir.display(), "starting strata-node demo");

    let store = open_store(&args.data_dir)?;

    // Restore prior state if this data directory has seen a demo before;
    // otherwise start from an empty vault.
    let vault = match store.get_vault(VAULT)? {
        Some(snapshot) => {
            tracing::info!("restoring vault from snapshot");
            Vault::from_snapshot(snapshot)
        }
        None => {
            let mut v = Vault::new(VAULT, ADMIN);
            v.add_supported_asset(ADMIN, ASSET)
                .map_err(|e| anyhow::anyhow!(e.to_string()))?;
            v
        }
    };
    let vault = Arc::new(Mutex::new(vault));

    // Adapters are live wiring and never persist; register fresh ones.
    {
        let mut v = vault.lock().expect("vault lock");
        for (strategy, apy) in [("aave-v3", 350), ("gmx-v2", 1_200)] {
            if let Err(e) = v.register_strategy(ADMIN, strategy, sim_adapter(apy)) {
                tracing::warn!(strategy, error = %e, "strategy registration skipped");
            }
        }
    }

    let mut router = match store.get_router(VAULT)? {
        Some(snapshot) => {
            tracing::info!("restoring router from snapshot");
            Router::from_snapshot(
                snapshot,
                Box::new(LoggingTransport),
                Box::new(VaultHook {
                    vault: Arc::clone(&vault),
                }),
            )
        }
        None => Router::new(
            ADMIN,
            VAULT,
            Box::new(LoggingTransport),
            Box::new(VaultHook {
                vault: Arc::clone(&vault),
            }),
        ),
    };

    // -- the scripted lifecycle ---------------------------------------------

    {
        let mut v = vault.lock().expect("vault lock");
        let minted = v
            .deposit("alice", ASSET, 100_000)
            .map_err(|e| anyhow::anyhow!(e.to_string()))?;
        tracing::info!(account = "alice", minted, "deposit accepted");

        v.allocate(ADMIN, "aave-v3", 60_000)
            .map_err(|e| anyhow::anyhow!(e.to_string()))?;
        tracing::info!(
            idle = v.idle_balance(),
            aum = v.total_assets_under_management(),
            "capital deployed"
        );
    }

    if !router.catalog().is_supported("axelar") {
        router
            .add_bridge(ADMIN, "axelar")
            .map_err(|e| anyhow::anyhow!(e.to_string()))?;
        router
            .configure_quote(
                ADMIN,
                1,
                42161,
                BridgeQuote {
                    bridge: "axelar".to_string(),
                    estimated_cost: 25,
                    estimated_time_secs: 600,
                    security_score: 88,
                },
            )
            .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    }

    let intent = router
        .route(1, 42161, "gmx-v2", 25_000, 25, &[])
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    tracing::info!(intent_id = %intent, "cross-domain route dispatched");

    // -- persist --------------------------------------------------------------

    {
        let v = vault.lock().expect("vault lock");
        store.put_vault(&v.snapshot())?;
    }
    store.put_router(&router.snapshot())?;
    tracing::info!("snapshots persisted");

    // Ship the audit trail to the log before exit.
    {
        let mut v = vault.lock().expect("vault lock");
        for event in v.drain_events() {
            tracing::info!(at = %event.at, event = ?event.kind, "vault audit");
        }
    }
    for event in router.drain_events() {
        tracing::info!(at = %event.at, event = ?event.kind, "router audit");
    }

    tracing::info!("strata-node demo complete");
    Ok(())
}

/// Prints the stored snapshots for a data directory as JSON on stdout.
fn inspect(args: cli::InspectArgs) -> Result<()> {
    logging::init_logging("strata_node=warn", LogFormat::Pretty);

    let store = open_store(&args.data_dir)?;

    match store.get_vault(&args.vault)? {
        Some(snapshot) => {
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        None => println!("no vault snapshot stored under {:?}", args.vault),
    }
    match store.get_router(&args.vault)? {
        Some(snapshot) => {
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        None => println!("no router snapshot stored under {:?}", args.vault),
    }

    Ok(())
}

fn open_store(data_dir: &Path) -> Result<SnapshotStore> {
    let db_path = data_dir.join("db");
    std::fs::create_dir_all(&db_path)
        .with_context(|| format!("failed to create database directory: {}", db_path.display()))?;
    SnapshotStore::open(&db_path)
        .with_context(|| format!("failed to open snapshot store at {}", db_path.display()))
}

/// Prints version information to stdout.
fn print_version() {
    println!("strata-node {}", env!("CARGO_PKG_VERSION"));
    println!("protocol    {}", strata_protocol::config::PROTOCOL_VERSION);
}
