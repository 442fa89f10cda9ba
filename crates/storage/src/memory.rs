// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory lock store

use crate::{LockStore, StoreError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tfgate_core::{Lock, LockKey};

#[derive(Default)]
struct MemoryState {
    locks: HashMap<LockKey, Lock>,
    unavailable: Option<String>,
}

/// Lock store that lives only as long as the process
#[derive(Clone, Default)]
pub struct MemoryLockStore {
    inner: Arc<Mutex<MemoryState>>,
}

impl MemoryLockStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn check(state: &MemoryState) -> Result<(), StoreError> {
        match &state.unavailable {
            Some(reason) => Err(StoreError::Unavailable(reason.clone())),
            None => Ok(()),
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
impl MemoryLockStore {
    /// Make every subsequent call fail with `StoreError::Unavailable`
    pub fn set_unavailable(&self, reason: impl Into<String>) {
        let mut state = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        state.unavailable = Some(reason.into());
    }

    /// Restore normal operation after `set_unavailable`
    pub fn set_available(&self) {
        let mut state = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        state.unavailable = None;
    }
}

impl LockStore for MemoryLockStore {
    fn get(&self, key: &LockKey) -> Result<Option<Lock>, StoreError> {
        let state = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        Self::check(&state)?;
        Ok(state.locks.get(key).cloned())
    }

    fn put_if_absent(&self, lock: Lock) -> Result<Option<Lock>, StoreError> {
        let mut state = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        Self::check(&state)?;
        let key = lock.key();
        if let Some(existing) = state.locks.get(&key) {
            return Ok(Some(existing.clone()));
        }
        state.locks.insert(key, lock);
        Ok(None)
    }

    fn delete(&self, key: &LockKey) -> Result<Option<Lock>, StoreError> {
        let mut state = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        Self::check(&state)?;
        Ok(state.locks.remove(key))
    }

    fn list(&self) -> Result<Vec<Lock>, StoreError> {
        let state = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        Self::check(&state)?;
        let mut locks: Vec<Lock> = state.locks.values().cloned().collect();
        locks.sort_by_key(|lock| lock.key());
        Ok(locks)
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
