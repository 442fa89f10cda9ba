// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-flight guard for a pull request's working directory

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Another command for the same pull request and workspace is running
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("The {workspace} workspace is currently locked by another command that is running for this pull request–wait until the previous command is complete and try again.")]
pub struct WorkingDirBusy {
    pub workspace: String,
}

type Key = (String, u64, String);

/// Serializes commands that share a pull request checkout.
///
/// Held only for the duration of a command and never persisted.
#[derive(Debug, Clone, Default)]
pub struct WorkingDirLocker {
    held: Arc<Mutex<HashSet<Key>>>,
}

impl WorkingDirLocker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_lock(
        &self,
        repo_full_name: &str,
        pull_num: u64,
        workspace: &str,
    ) -> Result<WorkingDirGuard, WorkingDirBusy> {
        let key = (
            repo_full_name.to_string(),
            pull_num,
            workspace.to_string(),
        );
        let mut held = self.held.lock().unwrap_or_else(|e| e.into_inner());
        if !held.insert(key.clone()) {
            return Err(WorkingDirBusy {
                workspace: workspace.to_string(),
            });
        }
        Ok(WorkingDirGuard {
            held: Arc::clone(&self.held),
            key,
        })
    }

    /// Number of commands currently holding a working directory
    pub fn in_flight(&self) -> usize {
        self.held.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

/// Releases the working directory when dropped
#[derive(Debug)]
pub struct WorkingDirGuard {
    held: Arc<Mutex<HashSet<Key>>>,
    key: Key,
}

impl Drop for WorkingDirGuard {
    fn drop(&mut self) {
        let mut held = self.held.lock().unwrap_or_else(|e| e.into_inner());
        held.remove(&self.key);
    }
}

#[cfg(test)]
#[path = "working_dir_tests.rs"]
mod tests;
