// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command names and the result returned to the calling layer

use serde::{Deserialize, Serialize};
use std::fmt;

/// The Terraform action a pull request asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandName {
    Plan,
    Apply,
}

impl CommandName {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandName::Plan => "plan",
            CommandName::Apply => "apply",
        }
    }
}

impl fmt::Display for CommandName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pull request status supplied by the VCS collaborator, used for apply requirements
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullStatus {
    pub approved: bool,
    pub mergeable: bool,
}

/// Outcome of running one command against one project
///
/// Exactly one of `output`, `failure` or `error` is meaningful: `failure` is
/// a message meant for the pull request author (lock conflict, unmet apply
/// requirement), `error` is anything that stopped the command from running
/// to completion (store unreachable, bad config, failed step).
/// `output` may also carry partial output alongside an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectResult {
    pub output: String,
    pub failure: Option<String>,
    pub error: Option<String>,
}

impl ProjectResult {
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            ..Self::default()
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }

    /// Attach output gathered before an error occurred
    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = output.into();
        self
    }

    pub fn is_success(&self) -> bool {
        self.failure.is_none() && self.error.is_none()
    }
}
