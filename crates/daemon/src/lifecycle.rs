// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: configuration, startup, shutdown.

use std::fs::{File, OpenOptions};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use fs2::FileExt;
use tfgate_adapters::{
    ExecError, ProcessShellRunner, TerraformClient, TracedShellRunner, TracedTerraformExecutor,
};
use tfgate_core::{SystemClock, TerraformVersion, VersionError};
use tfgate_engine::{CommandRunner, LockManager, PipelineBuilder, WorkingDirLocker};
use tfgate_storage::{LockStore, StoreError, WalLockStore, DEFAULT_COMPACT_THRESHOLD};
use thiserror::Error;
use tokio::net::UnixListener;
use tracing::{info, warn};

/// Command runner with the daemon's concrete store and executors
pub type DaemonRunner = CommandRunner<
    WalLockStore,
    SystemClock,
    TracedTerraformExecutor<TerraformClient>,
    TracedShellRunner<ProcessShellRunner>,
>;

/// Default time in-flight commands get to finish after shutdown starts
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the WAL, PID file and log
    pub state_dir: PathBuf,
    /// Path to Unix socket
    pub socket_path: PathBuf,
    /// Path to lock/PID file
    pub lock_path: PathBuf,
    /// Path to version file
    pub version_path: PathBuf,
    /// Path to daemon log file
    pub log_path: PathBuf,
    /// Path to the lock store's write-ahead log
    pub wal_path: PathBuf,
    /// Server default Terraform version; detected from `terraform version` when unset
    pub terraform_version: Option<TerraformVersion>,
    /// Directory holding `terraform<version>` binaries
    pub terraform_bin_dir: Option<PathBuf>,
    pub shutdown_grace: Duration,
    pub compact_threshold: u64,
}

impl Config {
    /// Load configuration from the process environment
    pub fn load() -> Result<Self, LifecycleError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable lookup
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, LifecycleError> {
        let state_dir = match get("TFGATE_STATE_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => default_state_dir(&get)?,
        };
        let socket_dir = get("TFGATE_SOCKET_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("/tmp/tfgate"));

        let terraform_version = get("TFGATE_TF_VERSION")
            .map(|v| TerraformVersion::parse(&v))
            .transpose()?;

        let shutdown_grace = match get("TFGATE_SHUTDOWN_GRACE_MS") {
            Some(ms) => Duration::from_millis(parse_number("TFGATE_SHUTDOWN_GRACE_MS", &ms)?),
            None => DEFAULT_SHUTDOWN_GRACE,
        };
        let compact_threshold = match get("TFGATE_WAL_COMPACT_THRESHOLD") {
            Some(n) => parse_number("TFGATE_WAL_COMPACT_THRESHOLD", &n)?,
            None => DEFAULT_COMPACT_THRESHOLD,
        };

        Ok(Self {
            socket_path: socket_dir.join("tfgated.sock"),
            lock_path: state_dir.join("daemon.pid"),
            version_path: state_dir.join("daemon.version"),
            log_path: state_dir.join("daemon.log"),
            wal_path: state_dir.join("locks.wal"),
            state_dir,
            terraform_version,
            terraform_bin_dir: get("TFGATE_TF_BIN_DIR").map(PathBuf::from),
            shutdown_grace,
            compact_threshold,
        })
    }
}

fn default_state_dir(get: &impl Fn(&str) -> Option<String>) -> Result<PathBuf, LifecycleError> {
    if let Some(xdg) = get("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("tfgate"));
    }
    let home = get("HOME").ok_or(LifecycleError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/tfgate"))
}

fn parse_number(name: &'static str, value: &str) -> Result<u64, LifecycleError> {
    value
        .trim()
        .parse()
        .map_err(|_| LifecycleError::InvalidSetting {
            name,
            value: value.to_string(),
        })
}

/// Daemon state during operation
pub struct DaemonState {
    pub config: Config,
    // NOTE(lifetime): Held to maintain exclusive file lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
    /// Unix socket listener
    pub listener: UnixListener,
    pub runner: DaemonRunner,
    /// When daemon started
    pub start_time: Instant,
}

impl DaemonState {
    /// Remove the files that advertise a running daemon
    pub fn shutdown(&self) {
        info!("shutting down daemon");

        for path in [
            &self.config.socket_path,
            &self.config.lock_path,
            &self.config.version_path,
        ] {
            if path.exists() {
                if let Err(e) = std::fs::remove_file(path) {
                    warn!(path = %path.display(), error = %e, "failed to remove file");
                }
            }
        }

        // Lock file is released when self.lock_file is dropped
        info!("daemon shutdown complete");
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("could not determine state directory")]
    NoStateDir,

    #[error("invalid value {value:?} for {name}")]
    InvalidSetting { name: &'static str, value: String },

    #[error("invalid TFGATE_TF_VERSION: {0}")]
    Version(#[from] VersionError),

    #[error("failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("failed to bind socket at {0}: {1}")]
    BindFailed(PathBuf, std::io::Error),

    #[error("lock store error: {0}")]
    Store(#[from] StoreError),

    #[error("detecting terraform version: {0}")]
    Terraform(#[from] ExecError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Start the daemon
pub async fn startup(config: &Config) -> Result<DaemonState, LifecycleError> {
    match startup_inner(config).await {
        Ok(state) => Ok(state),
        // Another daemon owns these files
        Err(e @ LifecycleError::LockFailed(_)) => Err(e),
        Err(e) => {
            cleanup_on_failure(config);
            Err(e)
        }
    }
}

async fn startup_inner(config: &Config) -> Result<DaemonState, LifecycleError> {
    std::fs::create_dir_all(&config.state_dir)?;

    // Acquire the PID lock before touching anything shared
    let lock_file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&config.lock_path)?;
    lock_file
        .try_lock_exclusive()
        .map_err(LifecycleError::LockFailed)?;

    use std::io::Write;
    let mut lock_file = lock_file;
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;
    let lock_file = lock_file;

    if let Some(parent) = config.socket_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&config.version_path, env!("CARGO_PKG_VERSION"))?;

    // Open the store and resolve terraform before binding so a bad
    // setup never accepts connections
    let store = WalLockStore::open(&config.wal_path, config.compact_threshold)?;
    let held = store.list()?.len();

    let terraform = match &config.terraform_version {
        Some(version) => TerraformClient::new(version.clone(), config.terraform_bin_dir.clone()),
        None => TerraformClient::detect(config.terraform_bin_dir.clone()).await?,
    };
    let default_version = terraform.default_version().clone();

    if held > 0 {
        info!(locks = held, "recovered held locks from previous run");
    }

    if config.socket_path.exists() {
        std::fs::remove_file(&config.socket_path)?;
    }
    let listener = UnixListener::bind(&config.socket_path)
        .map_err(|e| LifecycleError::BindFailed(config.socket_path.clone(), e))?;

    let runner = CommandRunner::new(
        LockManager::new(store, SystemClock),
        PipelineBuilder::new(
            TracedTerraformExecutor::new(terraform),
            TracedShellRunner::new(ProcessShellRunner::new()),
            default_version.clone(),
        ),
        WorkingDirLocker::new(),
    );

    info!(
        state_dir = %config.state_dir.display(),
        terraform_version = %default_version,
        "daemon started"
    );

    Ok(DaemonState {
        config: config.clone(),
        lock_file,
        listener,
        runner,
        start_time: Instant::now(),
    })
}

/// Clean up resources on startup failure
fn cleanup_on_failure(config: &Config) {
    for path in [
        &config.socket_path,
        &config.version_path,
        &config.lock_path,
    ] {
        if path.exists() {
            let _ = std::fs::remove_file(path);
        }
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
