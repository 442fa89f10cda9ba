// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! tfgate daemon (tfgated)
//!
//! Holds project locks and runs Terraform plans and applies submitted by
//! the `tfgate` CLI.

use std::fs::OpenOptions;
use std::io::Write;

use tfgate_daemon::lifecycle::{self, Config, LifecycleError};
use tfgate_daemon::{Server, STARTUP_MARKER_PREFIX};
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    // The CLI reads the log from the last marker when a spawn fails
    append_to_log(&config, &format!("{}{}) ---", STARTUP_MARKER_PREFIX, std::process::id()))?;
    let _log_guard = init_tracing(&config)?;

    info!(pid = std::process::id(), state_dir = %config.state_dir.display(), "starting tfgated");

    let daemon = match lifecycle::startup(&config).await {
        Ok(daemon) => daemon,
        Err(e) => {
            // The non-blocking writer may not flush before the process exits
            let _ = append_to_log(&config, &format!("ERROR Failed to start daemon: {}", e));
            error!(error = %e, "startup failed");
            return Err(e.into());
        }
    };

    let server = Server::new(daemon.runner.clone(), daemon.start_time);
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    info!(socket = %config.socket_path.display(), "daemon ready");
    println!("READY");

    tokio::select! {
        _ = server.serve(&daemon.listener) => info!("shutdown requested over the socket"),
        _ = sigterm.recv() => {
            info!("SIGTERM received");
            server.request_shutdown();
        }
        _ = sigint.recv() => {
            info!("SIGINT received");
            server.request_shutdown();
        }
    }

    let in_flight = server.active_connections();
    if in_flight > 0 {
        info!(in_flight, grace = ?config.shutdown_grace, "waiting for running commands");
    }
    if !server.drain(config.shutdown_grace).await {
        warn!(
            in_flight = server.active_connections(),
            "grace period elapsed; locks of unfinished commands stay held"
        );
    }

    daemon.shutdown();
    info!("daemon stopped");
    Ok(())
}

/// Write a line to the daemon log outside of tracing
fn append_to_log(config: &Config, line: &str) -> Result<(), LifecycleError> {
    if let Some(parent) = config.log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_path)?;
    writeln!(file, "{}", line)?;
    Ok(())
}

fn init_tracing(config: &Config) -> Result<WorkerGuard, LifecycleError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let (Some(dir), Some(file)) = (config.log_path.parent(), config.log_path.file_name())
    else {
        return Err(LifecycleError::NoStateDir);
    };
    let appender = tracing_appender::rolling::never(dir, file);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .init();

    Ok(guard)
}
