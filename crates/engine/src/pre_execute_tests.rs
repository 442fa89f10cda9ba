// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::path::Path;
use tfgate_adapters::{FakeShellRunner, FakeTerraformExecutor};
use tfgate_config::CONFIG_FILE;
use tfgate_core::{CommandName, FakeClock, LockKey, PullRequest, PullStatus, TerraformVersion, User};
use tfgate_storage::MemoryLockStore;

type FakePreExecutor =
    PreExecutor<MemoryLockStore, FakeClock, FakeTerraformExecutor, FakeShellRunner>;

fn setup() -> (FakePreExecutor, LockManager<MemoryLockStore, FakeClock>, MemoryLockStore) {
    let store = MemoryLockStore::new();
    let locks = LockManager::new(store.clone(), FakeClock::new());
    let builder = PipelineBuilder::new(
        FakeTerraformExecutor::new(),
        FakeShellRunner::new(),
        TerraformVersion::new(0, 11, 4),
    );
    (PreExecutor::new(locks.clone(), builder), locks, store)
}

fn ctx(repo_dir: &Path, pull: u64) -> CommandContext {
    CommandContext {
        command: CommandName::Plan,
        repo_dir: repo_dir.to_path_buf(),
        workspace: "default".to_string(),
        pull: PullRequest::new(pull, "author", "url"),
        user: User::new("alice"),
        comment_args: vec![],
        pull_status: PullStatus::default(),
    }
}

fn project() -> Project {
    Project::new("owner/repo", "staging")
}

fn key() -> LockKey {
    LockKey::from("owner/repo/staging/default")
}

#[test]
fn ready_holds_lock() {
    let repo = tempfile::tempdir().unwrap();
    let (pre, locks, _) = setup();

    match pre.execute(&ctx(repo.path(), 1), &project()) {
        PreExecuteResult::Ready { stage, lock } => {
            assert_eq!(stage.name, CommandName::Plan);
            assert!(lock.acquired);
            assert_eq!(lock.key, key());
        }
        other => panic!("expected Ready, got {:?}", other),
    }
    assert!(locks.get_lock(&key()).unwrap().is_some());
}

#[test]
fn other_pull_gets_conflict_message() {
    let repo = tempfile::tempdir().unwrap();
    let (pre, _, _) = setup();
    assert!(matches!(
        pre.execute(&ctx(repo.path(), 1), &project()),
        PreExecuteResult::Ready { .. }
    ));

    match pre.execute(&ctx(repo.path(), 2), &project()) {
        PreExecuteResult::Conflict(result) => assert_eq!(
            result.failure.as_deref(),
            Some("This project is currently locked by #1. The locking plan must be applied or discarded before future plans can execute.")
        ),
        other => panic!("expected Conflict, got {:?}", other),
    }
}

#[test]
fn same_pull_can_prepare_again() {
    let repo = tempfile::tempdir().unwrap();
    let (pre, _, store) = setup();

    for _ in 0..2 {
        assert!(matches!(
            pre.execute(&ctx(repo.path(), 1), &project()),
            PreExecuteResult::Ready { .. }
        ));
    }
    assert_eq!(store.list().unwrap().len(), 1);
}

#[test]
fn store_failure_is_wrapped() {
    let repo = tempfile::tempdir().unwrap();
    let (pre, _, store) = setup();
    store.set_unavailable("disk full");

    match pre.execute(&ctx(repo.path(), 1), &project()) {
        PreExecuteResult::Error(result) => assert_eq!(
            result.error.as_deref(),
            Some("acquiring lock: lock store unavailable: disk full")
        ),
        other => panic!("expected Error, got {:?}", other),
    }
}

#[test]
fn build_failure_releases_lock() {
    let repo = tempfile::tempdir().unwrap();
    std::fs::write(repo.path().join(CONFIG_FILE), "version = 2\nnot toml").unwrap();
    let (pre, locks, _) = setup();

    match pre.execute(&ctx(repo.path(), 1), &project()) {
        PreExecuteResult::Error(result) => {
            let error = result.error.unwrap();
            assert!(
                error.starts_with("building plan stage: parsing config: "),
                "{}",
                error
            );
        }
        other => panic!("expected Error, got {:?}", other),
    }
    assert!(locks.list().unwrap().is_empty());
}
