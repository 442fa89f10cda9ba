// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shell command adapters for custom pipeline steps

mod process;

pub use process::ProcessShellRunner;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeShellRunner, ShellCall};

use crate::ExecError;
use async_trait::async_trait;
use std::path::Path;
use tfgate_core::TerraformVersion;

/// Runs arbitrary shell commands in a project directory
#[async_trait]
pub trait ShellRunner: Clone + Send + Sync + 'static {
    /// Run `command` through the shell in `path`, returning its combined output
    async fn run(
        &self,
        command: &str,
        path: &Path,
        workspace: &str,
        version: &TerraformVersion,
    ) -> Result<String, ExecError>;
}
