// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake Terraform executor for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{ExecError, TerraformExecutor};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tfgate_core::TerraformVersion;

/// Recorded Terraform invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerraformCall {
    pub path: PathBuf,
    pub args: Vec<String>,
    pub version: TerraformVersion,
    pub workspace: String,
}

#[derive(Debug, Clone)]
enum Response {
    Output(String),
    Fail { code: i32, output: String },
}

#[derive(Debug, Default)]
struct FakeState {
    calls: Vec<TerraformCall>,
    responses: HashMap<Vec<String>, Response>,
    default_output: String,
}

/// Fake executor that records calls and replays scripted responses.
///
/// Responses are matched on the exact argument list; unmatched calls
/// succeed with the default output.
#[derive(Clone, Debug, Default)]
pub struct FakeTerraformExecutor {
    inner: Arc<Mutex<FakeState>>,
}

impl FakeTerraformExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Succeed with `output` when called with exactly `args`
    pub fn respond(&self, args: &[&str], output: impl Into<String>) {
        let mut state = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        state
            .responses
            .insert(to_args(args), Response::Output(output.into()));
    }

    /// Exit non-zero with `output` when called with exactly `args`
    pub fn fail(&self, args: &[&str], output: impl Into<String>) {
        let mut state = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        state.responses.insert(
            to_args(args),
            Response::Fail {
                code: 1,
                output: output.into(),
            },
        );
    }

    /// Output returned by calls without a scripted response
    pub fn set_default_output(&self, output: impl Into<String>) {
        let mut state = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        state.default_output = output.into();
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<TerraformCall> {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .calls
            .clone()
    }

    /// Argument lists of all recorded calls, joined with spaces
    pub fn commands(&self) -> Vec<String> {
        self.calls().iter().map(|c| c.args.join(" ")).collect()
    }
}

fn to_args(args: &[&str]) -> Vec<String> {
    args.iter().map(|a| a.to_string()).collect()
}

#[async_trait]
impl TerraformExecutor for FakeTerraformExecutor {
    async fn run_command(
        &self,
        path: &Path,
        args: &[String],
        version: &TerraformVersion,
        workspace: &str,
    ) -> Result<String, ExecError> {
        let mut state = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        state.calls.push(TerraformCall {
            path: path.to_path_buf(),
            args: args.to_vec(),
            version: version.clone(),
            workspace: workspace.to_string(),
        });

        match state.responses.get(args) {
            Some(Response::Output(output)) => Ok(output.clone()),
            Some(Response::Fail { code, output }) => Err(ExecError::NonZeroExit {
                command: format!("terraform {}", args.join(" ")),
                path: path.display().to_string(),
                code: *code,
                output: output.clone(),
            }),
            None => Ok(state.default_output.clone()),
        }
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
