// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lock store trait

use crate::WalError;
use thiserror::Error;
use tfgate_core::{Lock, LockKey};

/// Errors from lock store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("WAL error: {0}")]
    Wal(#[from] WalError),
    #[error("lock store unavailable: {0}")]
    Unavailable(String),
}

/// Durable mapping from lock key to held lock.
///
/// `put_if_absent` is the only way to take a key: it must check and insert
/// atomically so two callers can never both believe they hold the same lock.
pub trait LockStore: Clone + Send + Sync + 'static {
    /// Look up the lock stored under a key
    fn get(&self, key: &LockKey) -> Result<Option<Lock>, StoreError>;

    /// Insert the lock unless its key is taken.
    ///
    /// Returns `None` when the lock was stored, or the existing lock.
    fn put_if_absent(&self, lock: Lock) -> Result<Option<Lock>, StoreError>;

    /// Remove the lock under a key, returning it if one was held
    fn delete(&self, key: &LockKey) -> Result<Option<Lock>, StoreError>;

    /// All held locks
    fn list(&self) -> Result<Vec<Lock>, StoreError>;
}
