// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Terraform execution adapters

mod client;

pub use client::{detect_version, parse_version_output, TerraformClient};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeTerraformExecutor, TerraformCall};

use async_trait::async_trait;
use std::path::Path;
use tfgate_core::TerraformVersion;
use thiserror::Error;

/// Errors from running external commands
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecError {
    #[error("failed to start {program}: {reason}")]
    Spawn { program: String, reason: String },
    #[error("running {command:?} in {path:?}: exit status {code}\n{output}")]
    NonZeroExit {
        command: String,
        path: String,
        code: i32,
        output: String,
    },
    #[error("unable to determine terraform version: {0}")]
    VersionUnknown(String),
}

impl ExecError {
    /// Output captured before the failure, if any
    pub fn output(&self) -> &str {
        match self {
            ExecError::NonZeroExit { output, .. } => output,
            _ => "",
        }
    }
}

/// Runs Terraform subcommands for a project directory
#[async_trait]
pub trait TerraformExecutor: Clone + Send + Sync + 'static {
    /// Run `terraform <args>` in `path` with the binary for `version`.
    ///
    /// Returns the combined output of the command.
    async fn run_command(
        &self,
        path: &Path,
        args: &[String],
        version: &TerraformVersion,
        workspace: &str,
    ) -> Result<String, ExecError>;
}

/// Environment every Terraform and custom step command runs with
pub fn step_env(path: &Path, workspace: &str, version: &TerraformVersion) -> Vec<(String, String)> {
    vec![
        ("TF_IN_AUTOMATION".to_string(), "true".to_string()),
        ("WORKSPACE".to_string(), workspace.to_string()),
        ("ATLANTIS_TERRAFORM_VERSION".to_string(), version.to_string()),
        ("DIR".to_string(), path.display().to_string()),
    ]
}
