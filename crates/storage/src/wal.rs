// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Write-ahead log for durable storage
//!
//! Each line is a JSON entry carrying a sequence number, the operation and a
//! CRC32 checksum of the serialized operation. A damaged final line is the
//! signature of a crash mid-append and is truncated on open; damage followed
//! by valid entries is reported as corruption.

use crate::Operation;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// Errors that can occur in WAL operations
#[derive(Debug, Error)]
pub enum WalError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("corrupted entry at line {line}: {reason}")]
    Corrupted { line: usize, reason: String },
}

/// Write-ahead log for durable operation storage
pub struct Wal {
    path: PathBuf,
    file: File,
    sequence: u64,
    entries: u64,
}

impl Wal {
    /// Open or create a WAL at the given path, truncating a torn final entry
    pub fn open(path: &Path) -> Result<Self, WalError> {
        let scan = scan(path)?;
        if let Some(valid_len) = scan.torn_tail {
            warn!(
                path = %path.display(),
                valid_len,
                "truncating torn entry at end of WAL"
            );
            let file = OpenOptions::new().write(true).open(path)?;
            file.set_len(valid_len)?;
            file.sync_all()?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .read(true)
            .open(path)?;
        if scan.unterminated {
            // The next append must start on its own line
            file.write_all(b"\n")?;
            file.sync_all()?;
        }

        Ok(Self {
            path: path.to_path_buf(),
            file,
            sequence: scan.last_sequence,
            entries: scan.ops.len() as u64,
        })
    }

    /// Append an operation to the log and sync it to disk
    pub fn append(&mut self, op: &Operation) -> Result<u64, WalError> {
        let entry = WalEntry::new(self.sequence + 1, op.clone())?;
        let line = serde_json::to_string(&entry)?;
        writeln!(self.file, "{}", line)?;
        self.file.sync_all()?;
        self.sequence = entry.seq;
        self.entries += 1;
        Ok(self.sequence)
    }

    /// Get the current sequence number
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Number of entries currently in the log
    pub fn len(&self) -> u64 {
        self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }

    /// Replace the log contents with the given operations.
    ///
    /// The new log is written to a sibling temp file, synced, then renamed
    /// over the original so a crash leaves either the old or the new log.
    pub fn compact(&mut self, ops: &[Operation]) -> Result<(), WalError> {
        let tmp_path = self.path.with_extension("wal.tmp");
        // The handle follows the inode through the rename, so once the rename
        // lands nothing else can fail
        let mut tmp = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .read(true)
            .open(&tmp_path)?;
        for (i, op) in ops.iter().enumerate() {
            let entry = WalEntry::new(i as u64 + 1, op.clone())?;
            writeln!(tmp, "{}", serde_json::to_string(&entry)?)?;
        }
        tmp.sync_all()?;
        fs::rename(&tmp_path, &self.path)?;
        if let Some(parent) = self.path.parent() {
            // Directory fsync is unsupported on some platforms
            if let Ok(dir) = File::open(parent) {
                let _ = dir.sync_all();
            }
        }

        self.file = tmp;
        self.sequence = ops.len() as u64;
        self.entries = ops.len() as u64;
        Ok(())
    }

    /// Replay all operations from the log
    pub fn replay(path: &Path) -> Result<Vec<Operation>, WalError> {
        Ok(scan(path)?.ops)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct WalEntry {
    seq: u64,
    op: Operation,
    checksum: u32,
}

impl WalEntry {
    fn new(seq: u64, op: Operation) -> Result<Self, WalError> {
        let checksum = checksum(&op)?;
        Ok(Self { seq, op, checksum })
    }

    fn verify(&self) -> bool {
        checksum(&self.op).is_ok_and(|c| c == self.checksum)
    }
}

fn checksum(op: &Operation) -> Result<u32, WalError> {
    let json = serde_json::to_string(op)?;
    Ok(crc32fast::hash(json.as_bytes()))
}

/// Result of reading a WAL file from start to end
struct Scan {
    ops: Vec<Operation>,
    last_sequence: u64,
    /// Byte length of the valid prefix when the final entry is damaged
    torn_tail: Option<u64>,
    /// The final entry is intact but lacks its newline
    unterminated: bool,
}

fn scan(path: &Path) -> Result<Scan, WalError> {
    let content = match fs::read(path) {
        Ok(c) => c,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Ok(Scan {
                ops: Vec::new(),
                last_sequence: 0,
                torn_tail: None,
                unterminated: false,
            })
        }
        Err(e) => return Err(e.into()),
    };

    let mut ops = Vec::new();
    let mut last_sequence = 0;
    let mut offset = 0usize;
    let mut damaged: Option<(usize, usize, String)> = None;

    for (idx, raw) in content.split_inclusive(|b| *b == b'\n').enumerate() {
        let line_start = offset;
        offset += raw.len();

        let text = String::from_utf8_lossy(raw);
        let trimmed = text.trim();
        if trimmed.is_empty() {
            continue;
        }

        let parsed = serde_json::from_str::<WalEntry>(trimmed)
            .map_err(|e| e.to_string())
            .and_then(|entry| {
                if entry.verify() {
                    Ok(entry)
                } else {
                    Err("checksum mismatch".to_string())
                }
            });

        match (parsed, &damaged) {
            (Ok(_), Some((line, _, reason))) => {
                return Err(WalError::Corrupted {
                    line: *line,
                    reason: reason.clone(),
                });
            }
            (Ok(entry), None) => {
                last_sequence = entry.seq;
                ops.push(entry.op);
            }
            (Err(reason), None) => damaged = Some((idx + 1, line_start, reason)),
            (Err(_), Some(_)) => {}
        }
    }

    let unterminated = damaged.is_none() && content.last().is_some_and(|b| *b != b'\n');
    Ok(Scan {
        ops,
        last_sequence,
        torn_tail: damaged.map(|(_, start, _)| start as u64),
        unterminated,
    })
}

#[cfg(test)]
#[path = "wal_tests.rs"]
mod tests;
