// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Project/workspace locks held across commands

use std::collections::HashMap;
use tfgate_core::{Clock, Lock, LockKey, Project, PullRequest, User};
use tfgate_storage::{LockStore, StoreError};

/// Outcome of a lock attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TryLockResponse {
    /// Whether the caller's pull request now holds the lock
    pub acquired: bool,
    /// The lock under the key after the attempt: the caller's own or the
    /// conflicting one
    pub current_lock: Lock,
    pub key: LockKey,
}

/// Mutual exclusion per (repo, project path, workspace).
///
/// A pull request that already holds a key may lock it again; any other
/// pull request is refused until the key is unlocked.
#[derive(Clone)]
pub struct LockManager<L, C> {
    store: L,
    clock: C,
}

impl<L: LockStore, C: Clock> LockManager<L, C> {
    pub fn new(store: L, clock: C) -> Self {
        Self { store, clock }
    }

    pub fn try_lock(
        &self,
        project: Project,
        workspace: &str,
        pull: PullRequest,
        user: User,
    ) -> Result<TryLockResponse, StoreError> {
        let lock = Lock::new(project, workspace, pull, user, self.clock.now());
        let key = lock.key();

        match self.store.put_if_absent(lock.clone())? {
            None => {
                tracing::info!(%key, pull = lock.pull.num, "lock acquired");
                Ok(TryLockResponse {
                    acquired: true,
                    current_lock: lock,
                    key,
                })
            }
            Some(existing) if existing.is_held_by_pull(lock.pull.num) => Ok(TryLockResponse {
                acquired: true,
                current_lock: existing,
                key,
            }),
            Some(existing) => {
                tracing::info!(
                    %key,
                    pull = lock.pull.num,
                    held_by = existing.pull.num,
                    "lock held by another pull request"
                );
                Ok(TryLockResponse {
                    acquired: false,
                    current_lock: existing,
                    key,
                })
            }
        }
    }

    /// Release a lock; unlocking a free key is not an error
    pub fn unlock(&self, key: &LockKey) -> Result<Option<Lock>, StoreError> {
        let removed = self.store.delete(key)?;
        if removed.is_some() {
            tracing::info!(%key, "lock released");
        }
        Ok(removed)
    }

    pub fn list(&self) -> Result<HashMap<LockKey, Lock>, StoreError> {
        Ok(self
            .store
            .list()?
            .into_iter()
            .map(|lock| (lock.key(), lock))
            .collect())
    }

    pub fn get_lock(&self, key: &LockKey) -> Result<Option<Lock>, StoreError> {
        self.store.get(key)
    }

    /// Release every lock a pull request holds in a repository
    pub fn unlock_by_pull(
        &self,
        repo_full_name: &str,
        pull_num: u64,
    ) -> Result<Vec<Lock>, StoreError> {
        let mut released = Vec::new();
        for lock in self.store.list()? {
            if lock.project.repo_full_name == repo_full_name && lock.is_held_by_pull(pull_num) {
                if let Some(lock) = self.store.delete(&lock.key())? {
                    released.push(lock);
                }
            }
        }
        tracing::info!(
            repo = repo_full_name,
            pull = pull_num,
            count = released.len(),
            "released pull request locks"
        );
        Ok(released)
    }
}

#[cfg(test)]
#[path = "locking_tests.rs"]
mod tests;
