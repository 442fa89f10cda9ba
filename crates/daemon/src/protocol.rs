// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! IPC protocol between the CLI and the daemon.
//!
//! Every message is a 4-byte big-endian length followed by a JSON body.
//! A connection carries one request and one response.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tfgate_core::{
    CommandName, Lock, LockKey, Project, ProjectResult, PullRequest, PullStatus, User,
};
use tfgate_engine::CommandContext;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Protocol version reported in the Hello handshake
pub const PROTOCOL_VERSION: &str = "1";

/// Timeout for reading a request or writing a response
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Largest message body either side will accept
pub const MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// Protocol errors
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("timed out")]
    Timeout,

    #[error("connection closed")]
    ConnectionClosed,

    #[error("message of {size} bytes exceeds limit of {max} bytes")]
    MessageTooLarge { size: usize, max: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A plan or apply submitted for one project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandRequest {
    pub command: CommandName,
    /// Root of the pull request checkout
    pub repo_dir: PathBuf,
    pub project: Project,
    pub workspace: String,
    pub pull: PullRequest,
    pub user: User,
    #[serde(default)]
    pub comment_args: Vec<String>,
    #[serde(default)]
    pub pull_status: PullStatus,
}

impl CommandRequest {
    /// Split into the engine's command context and the target project
    pub fn into_context(self) -> (CommandContext, Project) {
        let ctx = CommandContext {
            command: self.command,
            repo_dir: self.repo_dir,
            workspace: self.workspace,
            pull: self.pull,
            user: self.user,
            comment_args: self.comment_args,
            pull_status: self.pull_status,
        };
        (ctx, self.project)
    }
}

/// Request from CLI to daemon
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Request {
    /// Health check
    Ping,

    /// Version handshake
    Hello { version: String },

    /// Daemon status
    Status,

    /// Stop accepting connections and exit once in-flight work drains
    Shutdown,

    /// Run a plan or apply
    Command { request: CommandRequest },

    /// All held locks
    ListLocks,

    /// The lock stored under a key, if any
    GetLock { key: LockKey },

    /// Discard the lock stored under a key
    Unlock { key: LockKey },

    /// Release every lock a pull request holds
    UnlockPull { repo: String, num: u64 },
}

/// Response from daemon to CLI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Response {
    /// Generic success
    Ok,

    /// Ping response
    Pong,

    /// Version handshake response
    Hello { version: String },

    /// Daemon status
    Status {
        uptime_secs: u64,
        locks_held: usize,
        commands_in_flight: usize,
    },

    /// Shutdown acknowledged
    ShuttingDown,

    /// Outcome of a plan or apply
    CommandResult { result: ProjectResult },

    /// Held locks ordered by key
    Locks { locks: Vec<Lock> },

    /// A single lock lookup
    Lock { lock: Option<Lock> },

    /// The lock that was discarded, if one was held
    Unlocked { lock: Option<Lock> },

    /// Locks released for a pull request
    Released { locks: Vec<Lock> },

    /// Request failed
    Error { message: String },
}

/// Serialize a message body to JSON (without the length prefix)
pub fn encode<T: Serialize>(msg: &T) -> Result<Vec<u8>, ProtocolError> {
    Ok(serde_json::to_vec(msg)?)
}

/// Deserialize a message body from JSON
pub fn decode<T: for<'de> Deserialize<'de>>(bytes: &[u8]) -> Result<T, ProtocolError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Read one length-prefixed message
pub async fn read_message<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Vec<u8>, ProtocolError> {
    let mut len_buf = [0u8; 4];
    if let Err(e) = reader.read_exact(&mut len_buf).await {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            return Err(ProtocolError::ConnectionClosed);
        }
        return Err(e.into());
    }

    let size = u32::from_be_bytes(len_buf) as usize;
    if size > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge {
            size,
            max: MAX_MESSAGE_SIZE,
        });
    }

    let mut body = vec![0u8; size];
    reader.read_exact(&mut body).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            ProtocolError::ConnectionClosed
        } else {
            e.into()
        }
    })?;
    Ok(body)
}

/// Write one length-prefixed message
pub async fn write_message<W: AsyncWrite + Unpin>(
    writer: &mut W,
    data: &[u8],
) -> Result<(), ProtocolError> {
    if data.len() > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge {
            size: data.len(),
            max: MAX_MESSAGE_SIZE,
        });
    }
    writer.write_all(&(data.len() as u32).to_be_bytes()).await?;
    writer.write_all(data).await?;
    writer.flush().await?;
    Ok(())
}

/// Read and decode a request, bounded by `timeout`
pub async fn read_request<R: AsyncRead + Unpin>(
    reader: &mut R,
    timeout: Duration,
) -> Result<Request, ProtocolError> {
    let bytes = tokio::time::timeout(timeout, read_message(reader))
        .await
        .map_err(|_| ProtocolError::Timeout)??;
    decode(&bytes)
}

/// Encode and write a response, bounded by `timeout`
pub async fn write_response<W: AsyncWrite + Unpin>(
    writer: &mut W,
    response: &Response,
    timeout: Duration,
) -> Result<(), ProtocolError> {
    let data = encode(response)?;
    tokio::time::timeout(timeout, write_message(writer, &data))
        .await
        .map_err(|_| ProtocolError::Timeout)?
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
