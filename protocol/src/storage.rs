//! # Snapshot Store — Persistent State
//!
//! Durable storage for vault and router snapshots, built on sled's
//! embedded key-value store. Everything that must survive a restart
//! flows through this module; live wiring (adapter ports, bridge
//! transports) is re-supplied at boot and never touches disk.
//!
//! ## Tree Layout
//!
//! | Tree       | Key                | Value                      |
//! |------------|--------------------|----------------------------|
//! | `vaults`   | address (UTF-8)    | `bincode(VaultSnapshot)`   |
//! | `routers`  | address (UTF-8)    | `bincode(RouterSnapshot)`  |
//! | `metadata` | key (UTF-8)        | value (bytes)              |
//!
//! The processed-message set rides inside the router snapshot. Losing it
//! would reopen every consumed message to replay, which is why `put_*`
//! flushes before returning: a snapshot that might not be on disk is
//! worse than no snapshot.

use sled::{Db, Tree};
use std::path::Path;

use crate::router::RouterSnapshot;
use crate::vault::VaultSnapshot;

// ---------------------------------------------------------------------------
// Error Type
// ---------------------------------------------------------------------------

/// Errors that can occur during snapshot-store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    #[error("serialization error: {0}")]
    Serialization(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

// ---------------------------------------------------------------------------
// Metadata Keys
// ---------------------------------------------------------------------------

/// Well-known key in the `metadata` tree: unix seconds of the most recent
/// successful `put_*`.
const META_LAST_PERSISTED: &[u8] = b"last_persisted_at";

// ---------------------------------------------------------------------------
// SnapshotStore
// ---------------------------------------------------------------------------

/// Persistent store for vault and router snapshots.
///
/// Wraps a sled `Db` and exposes typed accessors keyed by entity address.
/// All serialization uses bincode. sled supports lock-free concurrent
/// reads, so the store can be shared via `Arc<SnapshotStore>` without
/// external synchronization.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    /// The underlying sled database handle.
    db: Db,
    /// Vault snapshots keyed by vault address.
    vaults: Tree,
    /// Router snapshots keyed by router/ledger address.
    routers: Tree,
    /// Arbitrary key-value metadata.
    metadata: Tree,
}

impl SnapshotStore {
    /// Opens or creates a store at the given filesystem path.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let db = sled::open(path)?;
        Self::from_db(db)
    }

    /// Creates an in-memory store that is discarded on drop. For tests.
    pub fn open_temporary() -> StoreResult<Self> {
        let config = sled::Config::new().temporary(true);
        let db = config.open()?;
        Self::from_db(db)
    }

    fn from_db(db: Db) -> StoreResult<Self> {
        let vaults = db.open_tree("vaults")?;
        let routers = db.open_tree("routers")?;
        let metadata = db.open_tree("metadata")?;
        Ok(Self {
            db,
            vaults,
            routers,
            metadata,
        })
    }

    // -- Vault snapshots ----------------------------------------------------

    /// Persists a vault snapshot under its address, flushing to disk.
    pub fn put_vault(&self, snapshot: &VaultSnapshot) -> StoreResult<()> {
        let bytes =
            bincode::serialize(snapshot).map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.vaults.insert(snapshot.address.as_bytes(), bytes)?;
        self.touch()?;
        self.db.flush()?;
        Ok(())
    }

    /// Retrieves the vault snapshot stored under `address`, if any.
    pub fn get_vault(&self, address: &str) -> StoreResult<Option<VaultSnapshot>> {
        match self.vaults.get(address.as_bytes())? {
            Some(bytes) => {
                let snapshot = bincode::deserialize(&bytes)
                    .map_err(|e| StoreError::Serialization(e.to_string()))?;
                Ok(Some(snapshot))
            }
            None => Ok(None),
        }
    }

    // -- Router snapshots ---------------------------------------------------

    /// Persists a router snapshot under its ledger address, flushing to
    /// disk.
    pub fn put_router(&self, snapshot: &RouterSnapshot) -> StoreResult<()> {
        let bytes =
            bincode::serialize(snapshot).map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.routers.insert(snapshot.ledger.as_bytes(), bytes)?;
        self.touch()?;
        self.db.flush()?;
        Ok(())
    }

    /// Retrieves the router snapshot stored under `ledger`, if any.
    pub fn get_router(&self, ledger: &str) -> StoreResult<Option<RouterSnapshot>> {
        match self.routers.get(ledger.as_bytes())? {
            Some(bytes) => {
                let snapshot = bincode::deserialize(&bytes)
                    .map_err(|e| StoreError::Serialization(e.to_string()))?;
                Ok(Some(snapshot))
            }
            None => Ok(None),
        }
    }

    // -- Metadata operations ------------------------------------------------

    /// Unix seconds of the most recent persist, if anything was ever
    /// written.
    pub fn last_persisted_at(&self) -> StoreResult<Option<i64>> {
        match self.metadata.get(META_LAST_PERSISTED)? {
            Some(bytes) => {
                let secs = i64::from_be_bytes(bytes.as_ref().try_into().map_err(|_| {
                    StoreError::Serialization("invalid timestamp bytes".to_string())
                })?);
                Ok(Some(secs))
            }
            None => Ok(None),
        }
    }

    fn touch(&self) -> StoreResult<()> {
        let now = chrono::Utc::now().timestamp();
        self.metadata
            .insert(META_LAST_PERSISTED, &now.to_be_bytes())?;
        Ok(())
    }

    // -- Utility operations -------------------------------------------------

    /// Number of vault snapshots stored.
    pub fn vault_count(&self) -> usize {
        self.vaults.len()
    }

    /// Number of router snapshots stored.
    pub fn router_count(&self) -> usize {
        self.routers.len()
    }

    /// Blocks until all pending writes are durable.
    pub fn flush(&self) -> StoreResult<()> {
        self.db.flush()?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
