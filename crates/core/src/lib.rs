// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! tfgate-core: shared domain types for the tfgate Terraform run coordinator
//!
//! This crate provides:
//! - Project, pull request and user identities
//! - Lock records and the key they are stored under
//! - Structured Terraform versions with ordering
//! - Command names and the upward result contract

pub mod clock;
pub mod command;
pub mod lock;
pub mod project;
pub mod version;

pub use clock::{Clock, FakeClock, SystemClock};
pub use command::{CommandName, ProjectResult, PullStatus};
pub use lock::{Lock, LockKey};
pub use project::{
    check_workspace, InvalidWorkspace, Project, PullRequest, User, DEFAULT_WORKSPACE,
};
pub use version::{TerraformVersion, VersionError};
