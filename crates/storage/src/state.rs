// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized state from WAL replay

use crate::Operation;
use std::collections::HashMap;
use tfgate_core::{Lock, LockKey};

/// Materialized lock table built from WAL operations
#[derive(Debug, Default, Clone)]
pub struct MaterializedState {
    pub locks: HashMap<LockKey, Lock>,
}

impl MaterializedState {
    /// Rebuild state by applying operations in log order
    pub fn from_operations<'a>(ops: impl IntoIterator<Item = &'a Operation>) -> Self {
        let mut state = Self::default();
        for op in ops {
            state.apply(op);
        }
        state
    }

    /// Apply an operation to update the state
    pub fn apply(&mut self, op: &Operation) {
        match op {
            Operation::LockPut { lock } => {
                self.locks.insert(lock.key(), lock.clone());
            }

            Operation::LockDelete { key } => {
                self.locks.remove(key);
            }
        }
    }

    /// Operations that recreate this state from scratch, ordered by key
    pub fn snapshot(&self) -> Vec<Operation> {
        let mut locks: Vec<&Lock> = self.locks.values().collect();
        locks.sort_by_key(|lock| lock.key());
        locks
            .into_iter()
            .map(|lock| Operation::LockPut { lock: lock.clone() })
            .collect()
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
