// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::Utc;
use tfgate_core::{Project, PullRequest, User};

fn make_lock(path: &str, pull: u64) -> Lock {
    Lock::new(
        Project::new("owner/repo", path),
        "default",
        PullRequest::new(pull, "alice", "url"),
        User::new("alice"),
        Utc::now(),
    )
}

#[test]
fn apply_lock_put() {
    let mut state = MaterializedState::default();
    let lock = make_lock("staging", 1);
    state.apply(&Operation::LockPut { lock: lock.clone() });

    assert_eq!(state.locks.get(&lock.key()), Some(&lock));
}

#[test]
fn apply_lock_delete() {
    let mut state = MaterializedState::default();
    let lock = make_lock("staging", 1);
    state.apply(&Operation::LockPut { lock: lock.clone() });
    state.apply(&Operation::LockDelete { key: lock.key() });

    assert!(state.locks.is_empty());
}

#[test]
fn later_put_replaces_earlier() {
    let first = make_lock("staging", 1);
    let second = make_lock("staging", 2);
    let state = MaterializedState::from_operations(&[
        Operation::LockPut { lock: first },
        Operation::LockPut {
            lock: second.clone(),
        },
    ]);

    assert_eq!(state.locks.len(), 1);
    assert_eq!(state.locks[&second.key()].pull.num, 2);
}

#[test]
fn snapshot_recreates_state() {
    let state = MaterializedState::from_operations(&[
        Operation::LockPut {
            lock: make_lock("b", 1),
        },
        Operation::LockPut {
            lock: make_lock("a", 2),
        },
        Operation::LockDelete {
            key: make_lock("b", 1).key(),
        },
    ]);

    let snapshot = state.snapshot();
    assert_eq!(snapshot.len(), 1);
    let rebuilt = MaterializedState::from_operations(&snapshot);
    assert_eq!(rebuilt.locks, state.locks);
}
