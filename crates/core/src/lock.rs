// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lock records for project/workspace mutual exclusion

use crate::project::{Project, PullRequest, User};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Key a lock is stored under, derived from a project and workspace
///
/// Two pull requests targeting the same project and workspace share a key;
/// different workspaces of the same project do not.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LockKey(pub String);

impl LockKey {
    pub fn new(project: &Project, workspace: &str) -> Self {
        Self(format!(
            "{}/{}/{}",
            project.repo_full_name, project.path, workspace
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LockKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for LockKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A held lock on a project/workspace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lock {
    pub project: Project,
    pub workspace: String,
    pub pull: PullRequest,
    pub user: User,
    pub acquired_at: DateTime<Utc>,
}

impl Lock {
    pub fn new(
        project: Project,
        workspace: impl Into<String>,
        pull: PullRequest,
        user: User,
        acquired_at: DateTime<Utc>,
    ) -> Self {
        Self {
            project,
            workspace: workspace.into(),
            pull,
            user,
            acquired_at,
        }
    }

    /// The key this lock is stored under
    pub fn key(&self) -> LockKey {
        LockKey::new(&self.project, &self.workspace)
    }

    /// Whether this lock belongs to the given pull request number
    pub fn is_held_by_pull(&self, pull_num: u64) -> bool {
        self.pull.num == pull_num
    }
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;
