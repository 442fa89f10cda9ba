// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Adapters for external processes: the Terraform binary and shell commands

pub mod shell;
pub mod terraform;
pub mod traced;

pub use shell::{ProcessShellRunner, ShellRunner};
pub use terraform::{ExecError, TerraformClient, TerraformExecutor};
pub use traced::{TracedShellRunner, TracedTerraformExecutor};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use shell::{FakeShellRunner, ShellCall};
#[cfg(any(test, feature = "test-support"))]
pub use terraform::{FakeTerraformExecutor, TerraformCall};
