// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `sh -c` shell runner

use super::ShellRunner;
use crate::terraform::step_env;
use crate::ExecError;
use async_trait::async_trait;
use std::path::Path;
use tfgate_core::TerraformVersion;
use tokio::process::Command;

/// Shell runner backed by `sh -c`
#[derive(Clone, Debug, Default)]
pub struct ProcessShellRunner;

impl ProcessShellRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ShellRunner for ProcessShellRunner {
    async fn run(
        &self,
        command: &str,
        path: &Path,
        workspace: &str,
        version: &TerraformVersion,
    ) -> Result<String, ExecError> {
        let output = Command::new("sh")
            .arg("-c")
            .arg(command)
            .current_dir(path)
            .envs(step_env(path, workspace, version))
            .output()
            .await
            .map_err(|e| ExecError::Spawn {
                program: "sh".to_string(),
                reason: e.to_string(),
            })?;

        let mut combined = String::from_utf8_lossy(&output.stdout).to_string();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        if !output.status.success() {
            return Err(ExecError::NonZeroExit {
                command: command.to_string(),
                path: path.display().to_string(),
                code: output.status.code().unwrap_or(-1),
                output: combined,
            });
        }

        Ok(combined)
    }
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
