// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Errors shown to the person at the terminal.
//!
//! Each carries the failure, an optional note on the likely cause and the
//! commands that usually get them unstuck.

use std::fmt;
use std::path::Path;

use crate::client::ClientError;

#[derive(Debug)]
pub struct CliError {
    pub message: String,
    pub cause: Option<String>,
    pub suggestions: Vec<String>,
    source: Option<ClientError>,
}

impl CliError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            cause: None,
            suggestions: Vec::new(),
            source: None,
        }
    }

    pub fn because(mut self, cause: impl Into<String>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    pub fn suggest(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Lock administration needs a running daemon
    pub fn daemon_not_running() -> Self {
        Self::new("tfgated is not running")
            .because("Locks are held by the daemon and only it can change them")
            .suggest("tfgate daemon start")
    }

    pub fn lock_not_found(key: &str) -> Self {
        Self::new(format!("No lock held for '{}'", key))
            .because("The plan may already have been applied or discarded")
            .suggest("tfgate lock list")
    }

    /// Auto-planning needs project definitions
    pub fn no_repo_config(repo_dir: &Path) -> Self {
        Self::new(format!("No tfgate.toml found in {}", repo_dir.display()))
            .because("Modified files are matched against the projects tfgate.toml declares")
            .suggest("tfgate plan --path <dir> ...")
    }

    pub fn daemon_start_failed(reason: &str) -> Self {
        Self::new("Failed to start tfgated")
            .because(reason)
            .suggest("TFGATE_TF_VERSION=<version> tfgate daemon start")
            .suggest("tfgate daemon logs")
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "error: {}", self.message)?;
        if let Some(cause) = &self.cause {
            writeln!(f, "  -> {}", cause)?;
        }
        for suggestion in &self.suggestions {
            writeln!(f, "  try: {}", suggestion)?;
        }
        Ok(())
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

impl From<ClientError> for CliError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::DaemonNotRunning => Self::daemon_not_running(),
            ClientError::DaemonStartFailed(reason) => Self::daemon_start_failed(&reason),
            ClientError::DaemonStartTimeout => Self::new("Timed out waiting for tfgated to start")
                .because("tfgated did not create its socket in time")
                .suggest("tfgate daemon logs"),
            other => {
                let message = other.to_string();
                Self {
                    source: Some(other),
                    ..Self::new(message)
                }
            }
        }
    }
}
