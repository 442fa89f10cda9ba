// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! WAL-backed lock store

use crate::{LockStore, MaterializedState, Operation, StoreError, Wal};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tfgate_core::{Lock, LockKey};
use tracing::{debug, info, warn};

/// Entries a log may grow to before it is rewritten from the lock table
pub const DEFAULT_COMPACT_THRESHOLD: u64 = 1000;

struct Inner {
    wal: Wal,
    state: MaterializedState,
    compact_threshold: u64,
}

impl Inner {
    /// Append, then apply. Once the append is synced the mutation is
    /// committed, so a failed compaction only leaves the log longer.
    fn record(&mut self, op: Operation) -> Result<(), StoreError> {
        self.wal.append(&op)?;
        self.state.apply(&op);
        if self.wal.len() > self.compact_threshold {
            compact(&mut self.wal, &self.state);
        }
        Ok(())
    }
}

fn compact(wal: &mut Wal, state: &MaterializedState) {
    let snapshot = state.snapshot();
    debug!(
        entries = wal.len(),
        locks = snapshot.len(),
        "compacting lock WAL"
    );
    if let Err(e) = wal.compact(&snapshot) {
        warn!(error = %e, entries = wal.len(), "lock WAL compaction failed");
    }
}

/// Lock store that survives restarts.
///
/// Every mutation is appended and synced before the in-memory table is
/// updated, so a lock reported as acquired is on disk.
#[derive(Clone)]
pub struct WalLockStore {
    inner: Arc<Mutex<Inner>>,
}

impl WalLockStore {
    /// Open the store at `path`, replaying any existing log
    pub fn open(path: &Path, compact_threshold: u64) -> Result<Self, StoreError> {
        let mut wal = Wal::open(path)?;
        let ops = Wal::replay(path)?;
        let state = MaterializedState::from_operations(&ops);
        let compact_threshold = compact_threshold.max(1);
        info!(
            path = %path.display(),
            entries = ops.len(),
            locks = state.locks.len(),
            "opened lock store"
        );
        if wal.len() > compact_threshold {
            compact(&mut wal, &state);
        }
        Ok(Self {
            inner: Arc::new(Mutex::new(Inner {
                wal,
                state,
                compact_threshold,
            })),
        })
    }

    /// Number of entries in the underlying log
    pub fn log_len(&self) -> u64 {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.wal.len()
    }
}

impl LockStore for WalLockStore {
    fn get(&self, key: &LockKey) -> Result<Option<Lock>, StoreError> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        Ok(inner.state.locks.get(key).cloned())
    }

    fn put_if_absent(&self, lock: Lock) -> Result<Option<Lock>, StoreError> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(existing) = inner.state.locks.get(&lock.key()) {
            return Ok(Some(existing.clone()));
        }
        inner.record(Operation::LockPut { lock })?;
        Ok(None)
    }

    fn delete(&self, key: &LockKey) -> Result<Option<Lock>, StoreError> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let Some(existing) = inner.state.locks.get(key).cloned() else {
            return Ok(None);
        };
        inner.record(Operation::LockDelete { key: key.clone() })?;
        Ok(Some(existing))
    }

    fn list(&self) -> Result<Vec<Lock>, StoreError> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let mut locks: Vec<Lock> = inner.state.locks.values().cloned().collect();
        locks.sort_by_key(|lock| lock.key());
        Ok(locks)
    }
}

#[cfg(test)]
#[path = "wal_store_tests.rs"]
mod tests;
