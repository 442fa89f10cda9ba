// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Operations for the write-ahead log

use serde::{Deserialize, Serialize};
use tfgate_core::{Lock, LockKey};

/// Operations that can be persisted to the WAL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    /// Record a held lock
    LockPut { lock: Lock },

    /// Remove the lock stored under a key
    LockDelete { key: LockKey },
}
