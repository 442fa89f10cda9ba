// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Durable lock storage for tfgate
//!
//! Locks are persisted through an append-only write-ahead log and
//! materialized into memory on open, so a restart never forgets a held lock.

mod memory;
mod operation;
mod state;
mod store;
mod wal;
mod wal_store;

pub use memory::MemoryLockStore;
pub use operation::Operation;
pub use state::MaterializedState;
pub use store::{LockStore, StoreError};
pub use wal::{Wal, WalError};
pub use wal_store::{WalLockStore, DEFAULT_COMPACT_THRESHOLD};
