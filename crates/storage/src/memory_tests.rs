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
fn put_if_absent_returns_existing_holder() {
    let store = MemoryLockStore::new();
    assert!(store.put_if_absent(make_lock("a", 1)).unwrap().is_none());

    let existing = store.put_if_absent(make_lock("a", 2)).unwrap().unwrap();
    assert_eq!(existing.pull.num, 1);
    assert_eq!(store.list().unwrap().len(), 1);
}

#[test]
fn delete_returns_removed_lock() {
    let store = MemoryLockStore::new();
    let lock = make_lock("a", 1);
    store.put_if_absent(lock.clone()).unwrap();

    assert_eq!(store.delete(&lock.key()).unwrap(), Some(lock.clone()));
    assert_eq!(store.delete(&lock.key()).unwrap(), None);
    assert_eq!(store.get(&lock.key()).unwrap(), None);
}

#[test]
fn list_is_sorted_by_key() {
    let store = MemoryLockStore::new();
    store.put_if_absent(make_lock("b", 1)).unwrap();
    store.put_if_absent(make_lock("a", 2)).unwrap();

    let paths: Vec<String> = store
        .list()
        .unwrap()
        .into_iter()
        .map(|l| l.project.path)
        .collect();
    assert_eq!(paths, vec!["a", "b"]);
}

#[test]
fn unavailable_store_fails_every_call() {
    let store = MemoryLockStore::new();
    store.set_unavailable("disk gone");

    let err = store.put_if_absent(make_lock("a", 1)).unwrap_err();
    assert!(matches!(err, StoreError::Unavailable(ref r) if r == "disk gone"));
    assert!(store.list().is_err());

    store.set_available();
    assert!(store.list().unwrap().is_empty());
}
