// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon client for CLI commands

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use tfgate_core::{Lock, LockKey, ProjectResult};
use tfgate_daemon::protocol::{self, ProtocolError};
use tfgate_daemon::{CommandRequest, Config, Request, Response, STARTUP_MARKER_PREFIX};
use thiserror::Error;
use tokio::net::UnixStream;

/// Client-side waits, each overridable in milliseconds from the environment
#[derive(Debug, Clone, Copy)]
pub struct Timeouts {
    /// Short requests: hello, status, lock administration, shutdown
    pub ipc: Duration,
    /// A plan or apply reporting back
    pub command: Duration,
    /// A freshly spawned daemon creating its socket
    pub connect: Duration,
    /// A stopped daemon process going away
    pub exit: Duration,
    pub poll: Duration,
}

impl Timeouts {
    pub fn from_env() -> Self {
        let ms = |var: &str, default: Duration| {
            std::env::var(var)
                .ok()
                .and_then(|s| s.parse::<u64>().ok())
                .map(Duration::from_millis)
                .unwrap_or(default)
        };
        Self {
            ipc: ms("TFGATE_TIMEOUT_IPC_MS", Duration::from_secs(5)),
            command: ms("TFGATE_TIMEOUT_COMMAND_MS", Duration::from_secs(60 * 60)),
            connect: ms("TFGATE_TIMEOUT_CONNECT_MS", Duration::from_secs(5)),
            exit: ms("TFGATE_TIMEOUT_EXIT_MS", Duration::from_secs(2)),
            poll: ms("TFGATE_POLL_INTERVAL_MS", Duration::from_millis(50)),
        }
    }
}

/// Client errors
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Daemon not running")]
    DaemonNotRunning,

    #[error("Failed to start daemon: {0}")]
    DaemonStartFailed(String),

    #[error("Timed out waiting for the daemon socket")]
    DaemonStartTimeout,

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Unexpected response from daemon")]
    UnexpectedResponse,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Map a response the caller did not ask for onto an error
fn unexpected(response: Response) -> ClientError {
    match response {
        Response::Error { message } => ClientError::Rejected(message),
        _ => ClientError::UnexpectedResponse,
    }
}

/// Handle to the daemon socket; each request opens its own connection
pub struct DaemonClient {
    socket_path: PathBuf,
    timeouts: Timeouts,
}

impl DaemonClient {
    /// Connect, spawning `tfgated` when no socket exists yet
    pub fn connect_or_start(config: &Config) -> Result<Self, ClientError> {
        match Self::connect(config) {
            Err(ClientError::DaemonNotRunning) => {
                let child = spawn_daemon()?;
                Self::await_socket(config, child)
            }
            other => other,
        }
    }

    /// Connect to a running daemon only
    pub fn connect(config: &Config) -> Result<Self, ClientError> {
        if !config.socket_path.exists() {
            return Err(ClientError::DaemonNotRunning);
        }
        Ok(Self {
            socket_path: config.socket_path.clone(),
            timeouts: Timeouts::from_env(),
        })
    }

    fn await_socket(config: &Config, mut child: Child) -> Result<Self, ClientError> {
        let timeouts = Timeouts::from_env();
        let deadline = Instant::now() + timeouts.connect;

        while Instant::now() < deadline {
            if let Ok(Some(status)) = child.try_wait() {
                // Startup failed; give the log writer a moment to flush the reason
                let flush_deadline = Instant::now() + timeouts.exit;
                while Instant::now() < flush_deadline {
                    if let Some(reason) = read_startup_error(config) {
                        return Err(ClientError::DaemonStartFailed(reason));
                    }
                    std::thread::sleep(timeouts.poll);
                }
                return Err(ClientError::DaemonStartFailed(format!(
                    "tfgated exited with {}",
                    status
                )));
            }

            if config.socket_path.exists() {
                return Self::connect(config);
            }
            std::thread::sleep(timeouts.poll);
        }

        Err(match read_startup_error(config) {
            Some(reason) => ClientError::DaemonStartFailed(reason),
            None => ClientError::DaemonStartTimeout,
        })
    }

    async fn round_trip(
        &self,
        request: Request,
        response_timeout: Duration,
    ) -> Result<Response, ClientError> {
        let stream = UnixStream::connect(&self.socket_path).await?;
        let (mut reader, mut writer) = stream.into_split();

        let body = protocol::encode(&request)?;
        tokio::time::timeout(self.timeouts.ipc, protocol::write_message(&mut writer, &body))
            .await
            .map_err(|_| ProtocolError::Timeout)??;

        let reply = tokio::time::timeout(response_timeout, protocol::read_message(&mut reader))
            .await
            .map_err(|_| ProtocolError::Timeout)??;
        Ok(protocol::decode(&reply)?)
    }

    async fn send(&self, request: Request) -> Result<Response, ClientError> {
        self.round_trip(request, self.timeouts.ipc).await
    }

    /// Submit a plan or apply and wait for its outcome
    pub async fn run_command(&self, request: CommandRequest) -> Result<ProjectResult, ClientError> {
        match self
            .round_trip(Request::Command { request }, self.timeouts.command)
            .await?
        {
            Response::CommandResult { result } => Ok(result),
            other => Err(unexpected(other)),
        }
    }

    pub async fn list_locks(&self) -> Result<Vec<Lock>, ClientError> {
        match self.send(Request::ListLocks).await? {
            Response::Locks { locks } => Ok(locks),
            other => Err(unexpected(other)),
        }
    }

    pub async fn get_lock(&self, key: LockKey) -> Result<Option<Lock>, ClientError> {
        match self.send(Request::GetLock { key }).await? {
            Response::Lock { lock } => Ok(lock),
            other => Err(unexpected(other)),
        }
    }

    /// Discard the lock under `key`; `None` when nothing was held
    pub async fn unlock(&self, key: LockKey) -> Result<Option<Lock>, ClientError> {
        match self.send(Request::Unlock { key }).await? {
            Response::Unlocked { lock } => Ok(lock),
            other => Err(unexpected(other)),
        }
    }

    /// Release every lock held by a pull request
    pub async fn unlock_pull(&self, repo: &str, num: u64) -> Result<Vec<Lock>, ClientError> {
        let request = Request::UnlockPull {
            repo: repo.to_string(),
            num,
        };
        match self.send(request).await? {
            Response::Released { locks } => Ok(locks),
            other => Err(unexpected(other)),
        }
    }

    /// Uptime in seconds, locks held and commands in flight
    pub async fn status(&self) -> Result<(u64, usize, usize), ClientError> {
        match self.send(Request::Status).await? {
            Response::Status {
                uptime_secs,
                locks_held,
                commands_in_flight,
            } => Ok((uptime_secs, locks_held, commands_in_flight)),
            other => Err(unexpected(other)),
        }
    }

    pub async fn shutdown(&self) -> Result<(), ClientError> {
        match self.send(Request::Shutdown).await? {
            Response::Ok | Response::ShuttingDown => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    /// Protocol version the daemon speaks
    pub async fn hello(&self) -> Result<String, ClientError> {
        let request = Request::Hello {
            version: protocol::PROTOCOL_VERSION.to_string(),
        };
        match self.send(request).await? {
            Response::Hello { version } => Ok(version),
            other => Err(unexpected(other)),
        }
    }
}

fn spawn_daemon() -> Result<Child, ClientError> {
    Command::new(find_daemon_binary())
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| ClientError::DaemonStartFailed(e.to_string()))
}

/// Ask the daemon to stop, killing it if it outlives its drain period.
///
/// Returns false when no daemon was running.
pub async fn daemon_stop(config: &Config) -> Result<bool, ClientError> {
    let client = match DaemonClient::connect(config) {
        Ok(client) => client,
        Err(ClientError::DaemonNotRunning) => {
            remove_stale_pid_file(config);
            return Ok(false);
        }
        Err(e) => return Err(e),
    };
    let timeouts = client.timeouts;
    let acknowledged = client.shutdown().await.is_ok();

    if let Some(pid) = read_daemon_pid(config) {
        if acknowledged {
            wait_for_exit(pid, config.shutdown_grace + timeouts.exit, timeouts.poll).await;
        }
        if signal(pid, "-0") {
            signal(pid, "-9");
            wait_for_exit(pid, timeouts.exit, timeouts.poll).await;
        }
    }

    remove_stale_pid_file(config);
    Ok(true)
}

async fn wait_for_exit(pid: u32, timeout: Duration, poll: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if !signal(pid, "-0") {
            return true;
        }
        tokio::time::sleep(poll).await;
    }
    false
}

/// `TFGATE_DAEMON_BINARY`, then a `tfgated` next to this executable, then `PATH`
pub fn find_daemon_binary() -> PathBuf {
    if let Ok(path) = std::env::var("TFGATE_DAEMON_BINARY") {
        return PathBuf::from(path);
    }

    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join("tfgated")))
        .filter(|sibling| sibling.exists())
        .unwrap_or_else(|| PathBuf::from("tfgated"))
}

fn remove_stale_pid_file(config: &Config) {
    let alive = read_daemon_pid(config).is_some_and(|pid| signal(pid, "-0"));
    if !alive {
        let _ = std::fs::remove_file(&config.lock_path);
    }
}

pub fn read_daemon_pid(config: &Config) -> Option<u32> {
    std::fs::read_to_string(&config.lock_path)
        .ok()?
        .trim()
        .parse()
        .ok()
}

/// Run `kill <flag> <pid>`; `-0` probes for the process without signalling it
fn signal(pid: u32, flag: &str) -> bool {
    Command::new("kill")
        .args([flag, &pid.to_string()])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok_and(|s| s.success())
}

/// Errors logged since the daemon's most recent startup marker
pub fn read_startup_error(config: &Config) -> Option<String> {
    let content = std::fs::read_to_string(&config.log_path).ok()?;
    startup_error_from_log(&content)
}

const STARTUP_FAILURE: &str = "Failed to start daemon: ";

fn startup_error_from_log(content: &str) -> Option<String> {
    let latest = &content[content.rfind(STARTUP_MARKER_PREFIX)?..];

    // The daemon writes the reason synchronously before tracing flushes
    latest
        .lines()
        .find(|line| line.contains("ERROR"))
        .map(|line| {
            line.split_once(STARTUP_FAILURE)
                .map_or(line, |(_, reason)| reason)
        })
        .map(str::to_string)
}

/// Resolve a repository directory to the absolute path the daemon runs in
pub fn absolute_repo_dir(dir: &Path) -> Result<PathBuf, ClientError> {
    Ok(dir.canonicalize()?)
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
