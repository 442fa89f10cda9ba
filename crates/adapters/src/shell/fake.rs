// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake shell runner for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::ShellRunner;
use crate::ExecError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tfgate_core::TerraformVersion;

/// Recorded shell invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellCall {
    pub command: String,
    pub path: PathBuf,
    pub workspace: String,
    pub version: TerraformVersion,
}

#[derive(Debug, Default)]
struct FakeState {
    calls: Vec<ShellCall>,
    responses: HashMap<String, Result<String, String>>,
}

/// Fake shell runner; unscripted commands echo nothing and succeed
#[derive(Clone, Debug, Default)]
pub struct FakeShellRunner {
    inner: Arc<Mutex<FakeState>>,
}

impl FakeShellRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Succeed with `output` when `command` runs
    pub fn respond(&self, command: &str, output: impl Into<String>) {
        let mut state = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        state
            .responses
            .insert(command.to_string(), Ok(output.into()));
    }

    /// Exit non-zero with `output` when `command` runs
    pub fn fail(&self, command: &str, output: impl Into<String>) {
        let mut state = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        state
            .responses
            .insert(command.to_string(), Err(output.into()));
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<ShellCall> {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .calls
            .clone()
    }
}

#[async_trait]
impl ShellRunner for FakeShellRunner {
    async fn run(
        &self,
        command: &str,
        path: &Path,
        workspace: &str,
        version: &TerraformVersion,
    ) -> Result<String, ExecError> {
        let mut state = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        state.calls.push(ShellCall {
            command: command.to_string(),
            path: path.to_path_buf(),
            workspace: workspace.to_string(),
            version: version.clone(),
        });

        match state.responses.get(command) {
            Some(Ok(output)) => Ok(output.clone()),
            Some(Err(output)) => Err(ExecError::NonZeroExit {
                command: command.to_string(),
                path: path.display().to_string(),
                code: 1,
                output: output.clone(),
            }),
            None => Ok(String::new()),
        }
    }
}
