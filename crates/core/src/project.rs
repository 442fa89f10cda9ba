// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Project, pull request and user identities
//!
//! These are supplied by the calling layer (webhook/comment parsing) and are
//! read-only to the rest of tfgate.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Workspace used when a command does not name one
pub const DEFAULT_WORKSPACE: &str = "default";

/// A workspace name that cannot be a lock key segment or a plan file name
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid workspace {0:?}: must be non-empty and contain no '/', '\\' or '..'")]
pub struct InvalidWorkspace(pub String);

/// Check a workspace name before it reaches a lock key or `<workspace>.tfplan`
pub fn check_workspace(name: &str) -> Result<(), InvalidWorkspace> {
    let invalid = name.trim().is_empty()
        || name == "."
        || name.contains("..")
        || name.contains(['/', '\\']);
    if invalid {
        return Err(InvalidWorkspace(name.to_string()));
    }
    Ok(())
}

/// A Terraform root module: a repository plus a directory inside it
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Project {
    /// Repository owner and name, e.g. `runatlantis/atlantis`
    pub repo_full_name: String,
    /// Directory relative to the repository root, normalized (`.` for the root)
    pub path: String,
}

impl Project {
    pub fn new(repo_full_name: impl Into<String>, path: impl AsRef<str>) -> Self {
        Self {
            repo_full_name: repo_full_name.into(),
            path: clean_path(path.as_ref()),
        }
    }
}

impl fmt::Display for Project {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.repo_full_name, self.path)
    }
}

/// Normalize a repo-relative directory.
///
/// Collapses `.` segments, duplicate and trailing separators, and resolves
/// `..` against earlier segments. An empty result becomes `.`.
pub fn clean_path(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if matches!(parts.last(), Some(last) if *last != "..") {
                    parts.pop();
                } else {
                    parts.push("..");
                }
            }
            s => parts.push(s),
        }
    }
    if parts.is_empty() {
        ".".to_string()
    } else {
        parts.join("/")
    }
}

/// A pull (or merge) request on the VCS host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    /// Pull request number
    pub num: u64,
    /// VCS username of the author
    pub author: String,
    /// Link to the pull request
    pub url: String,
    /// Head branch name
    #[serde(default)]
    pub branch: String,
    /// Full name of the base repository
    #[serde(default)]
    pub base_repo: String,
}

impl PullRequest {
    pub fn new(num: u64, author: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            num,
            author: author.into(),
            url: url.into(),
            branch: String::new(),
            base_repo: String::new(),
        }
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }

    pub fn with_base_repo(mut self, repo: impl Into<String>) -> Self {
        self.base_repo = repo.into();
        self
    }
}

/// The VCS user that triggered a command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
}

impl User {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
        }
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.username)
    }
}

#[cfg(test)]
#[path = "project_tests.rs"]
mod tests;
