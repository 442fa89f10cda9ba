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
fn locks_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("locks.wal");

    {
        let store = WalLockStore::open(&path, DEFAULT_COMPACT_THRESHOLD).unwrap();
        store.put_if_absent(make_lock("staging", 1)).unwrap();
        store.put_if_absent(make_lock("prod", 2)).unwrap();
        store.delete(&make_lock("prod", 2).key()).unwrap();
    }

    let store = WalLockStore::open(&path, DEFAULT_COMPACT_THRESHOLD).unwrap();
    let locks = store.list().unwrap();
    assert_eq!(locks.len(), 1);
    assert_eq!(locks[0].project.path, "staging");
    assert_eq!(locks[0].pull.num, 1);
}

#[test]
fn conflicting_put_does_not_touch_log() {
    let dir = tempfile::tempdir().unwrap();
    let store = WalLockStore::open(&dir.path().join("locks.wal"), 100).unwrap();

    store.put_if_absent(make_lock("staging", 1)).unwrap();
    let existing = store.put_if_absent(make_lock("staging", 2)).unwrap();

    assert_eq!(existing.map(|l| l.pull.num), Some(1));
    assert_eq!(store.log_len(), 1);
}

#[test]
fn deleting_missing_key_does_not_touch_log() {
    let dir = tempfile::tempdir().unwrap();
    let store = WalLockStore::open(&dir.path().join("locks.wal"), 100).unwrap();

    assert!(store.delete(&LockKey::from("nope")).unwrap().is_none());
    assert_eq!(store.log_len(), 0);
}

#[test]
fn log_is_compacted_past_threshold() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("locks.wal");
    let store = WalLockStore::open(&path, 4).unwrap();

    for pull in 0..3 {
        let lock = make_lock("staging", pull);
        store.put_if_absent(lock.clone()).unwrap();
        store.delete(&lock.key()).unwrap();
    }
    store.put_if_absent(make_lock("prod", 9)).unwrap();

    assert!(store.log_len() <= 4);
    drop(store);

    let reopened = WalLockStore::open(&path, 4).unwrap();
    let locks = reopened.list().unwrap();
    assert_eq!(locks.len(), 1);
    assert_eq!(locks[0].pull.num, 9);
}

#[test]
fn oversized_log_is_compacted_on_open() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("locks.wal");

    {
        let store = WalLockStore::open(&path, 100).unwrap();
        for pull in 0..5 {
            let lock = make_lock("staging", pull);
            store.put_if_absent(lock.clone()).unwrap();
            store.delete(&lock.key()).unwrap();
        }
        assert_eq!(store.log_len(), 10);
    }

    let store = WalLockStore::open(&path, 3).unwrap();
    assert_eq!(store.log_len(), 0);
    assert!(store.list().unwrap().is_empty());
}

#[test]
fn failed_compaction_keeps_committed_lock() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("locks.wal");
    let store = WalLockStore::open(&path, 1).unwrap();
    store.put_if_absent(make_lock("staging", 1)).unwrap();

    // A directory where the temp log goes makes the rewrite fail
    std::fs::create_dir(dir.path().join("locks.wal.tmp")).unwrap();
    let result = store.put_if_absent(make_lock("prod", 2));

    assert!(matches!(result, Ok(None)), "{:?}", result.map(|_| ()));
    assert_eq!(store.log_len(), 2);
    assert_eq!(store.list().unwrap().len(), 2);
    drop(store);

    let reopened = WalLockStore::open(&path, 1).unwrap();
    assert_eq!(reopened.list().unwrap().len(), 2);
}

#[test]
fn concurrent_puts_on_one_key_admit_one_holder() {
    let dir = tempfile::tempdir().unwrap();
    let store = WalLockStore::open(&dir.path().join("locks.wal"), 100).unwrap();

    let handles: Vec<_> = (1..=8)
        .map(|pull| {
            let store = store.clone();
            std::thread::spawn(move || store.put_if_absent(make_lock("staging", pull)).unwrap())
        })
        .collect();
    let winners = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(Option::is_none)
        .count();

    assert_eq!(winners, 1);
    assert_eq!(store.list().unwrap().len(), 1);
    assert_eq!(store.log_len(), 1);
}
