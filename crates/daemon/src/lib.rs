// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! tfgate-daemon: the long-running process that owns the lock store
//!
//! The CLI talks to it over a Unix socket using the length-prefixed JSON
//! protocol in [`protocol`].

pub mod lifecycle;
pub mod protocol;
pub mod server;

pub use lifecycle::{Config, DaemonRunner, DaemonState, LifecycleError};
pub use protocol::{CommandRequest, ProtocolError, Request, Response};
pub use server::{Server, ServerError};

/// Startup marker prefix written to the log before anything else.
/// Full format: "--- tfgated: starting (pid: 12345) ---"
pub const STARTUP_MARKER_PREFIX: &str = "--- tfgated: starting (pid: ";
