// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrappers for consistent observability

use crate::shell::ShellRunner;
use crate::terraform::{ExecError, TerraformExecutor};
use async_trait::async_trait;
use std::path::Path;
use tfgate_core::TerraformVersion;
use tracing::Instrument;

fn check_dir(path: &Path, program: &str) -> Result<(), ExecError> {
    if path.is_dir() {
        return Ok(());
    }
    tracing::error!("working directory does not exist");
    Err(ExecError::Spawn {
        program: program.to_string(),
        reason: format!("working directory does not exist: {}", path.display()),
    })
}

/// Wrapper that adds tracing to any TerraformExecutor
#[derive(Clone, Debug)]
pub struct TracedTerraformExecutor<T> {
    inner: T,
}

impl<T> TracedTerraformExecutor<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<T: TerraformExecutor> TerraformExecutor for TracedTerraformExecutor<T> {
    async fn run_command(
        &self,
        path: &Path,
        args: &[String],
        version: &TerraformVersion,
        workspace: &str,
    ) -> Result<String, ExecError> {
        let span = tracing::info_span!(
            "terraform.run",
            path = %path.display(),
            workspace,
            version = %version
        );

        async move {
            tracing::info!(command = %args.join(" "), "starting");

            check_dir(path, "terraform")?;

            let start = std::time::Instant::now();
            let result = self
                .inner
                .run_command(path, args, version, workspace)
                .await;
            let elapsed = start.elapsed();

            match &result {
                Ok(output) => tracing::info!(
                    elapsed_ms = elapsed.as_millis() as u64,
                    output_len = output.len(),
                    "terraform finished"
                ),
                Err(e) => tracing::error!(
                    elapsed_ms = elapsed.as_millis() as u64,
                    error = %e,
                    "terraform failed"
                ),
            }

            result
        }
        .instrument(span)
        .await
    }
}

/// Wrapper that adds tracing to any ShellRunner
#[derive(Clone, Debug)]
pub struct TracedShellRunner<R> {
    inner: R,
}

impl<R> TracedShellRunner<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<R: ShellRunner> ShellRunner for TracedShellRunner<R> {
    async fn run(
        &self,
        command: &str,
        path: &Path,
        workspace: &str,
        version: &TerraformVersion,
    ) -> Result<String, ExecError> {
        let span = tracing::info_span!("shell.run", path = %path.display(), workspace);

        async move {
            tracing::info!(command, "starting");

            check_dir(path, "sh")?;

            let start = std::time::Instant::now();
            let result = self.inner.run(command, path, workspace, version).await;
            let elapsed = start.elapsed();

            match &result {
                Ok(output) => tracing::info!(
                    elapsed_ms = elapsed.as_millis() as u64,
                    output_len = output.len(),
                    "command finished"
                ),
                Err(e) => tracing::error!(
                    elapsed_ms = elapsed.as_millis() as u64,
                    error = %e,
                    "command failed"
                ),
            }

            result
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
