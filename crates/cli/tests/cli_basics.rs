// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI integration tests that need no running daemon

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(deprecated)]

mod common;

use common::{TestEnv, PULL_ARGS};
use predicates::prelude::*;

#[test]
fn help_lists_commands() {
    let env = TestEnv::new();
    env.tfgate()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("plan"))
        .stdout(predicate::str::contains("apply"))
        .stdout(predicate::str::contains("lock"))
        .stdout(predicate::str::contains("daemon"));
}

#[test]
fn version_flag() {
    let env = TestEnv::new();
    env.tfgate()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn completions_name_the_binary() {
    let env = TestEnv::new();
    env.tfgate()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("tfgate"));
}

#[test]
fn plan_requires_pull_number() {
    let env = TestEnv::new();
    env.tfgate()
        .args(["plan", "--repo", "acme/infra", "--author", "alice", "--path", "."])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--pull"));
}

#[test]
fn plan_without_project_selection_fails() {
    let env = TestEnv::new();
    env.tfgate()
        .arg("plan")
        .args(PULL_ARGS)
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "pass --path or at least one --modified file",
        ));
}

#[test]
fn autoplan_without_config_explains_how_to_fix() {
    let env = TestEnv::new();
    env.tfgate()
        .arg("plan")
        .args(PULL_ARGS)
        .args(["--modified", "main.tf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No tfgate.toml found"))
        .stderr(predicate::str::contains("--path"));
}

#[test]
fn autoplan_with_no_matching_projects_does_nothing() {
    let env = TestEnv::new();
    env.write_repo_file(
        "tfgate.toml",
        "version = 2\n\n[[projects]]\ndir = \"staging\"\n",
    );

    env.tfgate()
        .arg("plan")
        .args(PULL_ARGS)
        .args(["--modified", "docs/README.md"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No projects matched the modified files"));

    assert!(!env.state_path("daemon.pid").exists());
}

#[test]
fn invalid_config_is_reported() {
    let env = TestEnv::new();
    env.write_repo_file("tfgate.toml", "version = 1\n");

    env.tfgate()
        .arg("apply")
        .args(PULL_ARGS)
        .args(["--modified", "main.tf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("parsing config"));
}
