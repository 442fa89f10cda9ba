// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test utilities for CLI integration tests.

#![allow(dead_code)]

use std::path::Path;

use assert_cmd::Command;
use tempfile::TempDir;

/// Isolated daemon state and socket directories for one test
pub struct TestEnv {
    pub state: TempDir,
    pub socket: TempDir,
    pub repo: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            state: TempDir::new().expect("Failed to create state directory"),
            socket: TempDir::new().expect("Failed to create socket directory"),
            repo: TempDir::new().expect("Failed to create repo directory"),
        }
    }

    /// A `tfgate` command pointed at this environment's directories
    pub fn tfgate(&self) -> Command {
        let mut cmd = Command::cargo_bin("tfgate").expect("tfgate binary not built");
        cmd.env("TFGATE_STATE_DIR", self.state.path())
            .env("TFGATE_SOCKET_DIR", self.socket.path())
            .env("TFGATE_TIMEOUT_CONNECT_MS", "200")
            .env_remove("RUST_LOG")
            .current_dir(self.repo.path());
        cmd
    }

    pub fn write_repo_file(&self, rel: &str, content: &str) {
        let path = self.repo.path().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        std::fs::write(path, content).expect("Failed to write repo file");
    }

    pub fn state_path(&self, name: &str) -> std::path::PathBuf {
        self.state.path().join(name)
    }

    pub fn repo_path(&self) -> &Path {
        self.repo.path()
    }
}

/// Arguments every plan/apply needs besides the project selection
pub const PULL_ARGS: &[&str] = &["--repo", "acme/infra", "--pull", "7", "--author", "alice"];
