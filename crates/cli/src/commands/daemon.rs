// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon management commands

use anyhow::Result;
use clap::{Args, Subcommand};
use tfgate_daemon::Config;

use crate::client::{daemon_stop, find_daemon_binary, ClientError, DaemonClient};
use crate::error::CliError;

#[derive(Args, Debug)]
pub struct DaemonArgs {
    #[command(subcommand)]
    pub command: DaemonCommand,
}

#[derive(Subcommand, Debug)]
pub enum DaemonCommand {
    /// Start the daemon
    Start {
        /// Run in the foreground instead of detaching
        #[arg(long)]
        foreground: bool,
    },
    /// Stop the daemon, letting running commands finish
    Stop,
    /// Show daemon status
    Status,
    /// Show the end of the daemon log
    Logs {
        /// Number of lines to show
        #[arg(short = 'n', long, default_value = "50")]
        lines: usize,
    },
}

pub async fn daemon(args: DaemonArgs) -> Result<()> {
    let config = Config::load()?;

    match args.command {
        DaemonCommand::Start { foreground } => start(&config, foreground),
        DaemonCommand::Stop => {
            if daemon_stop(&config).await.map_err(CliError::from)? {
                println!("Daemon stopped");
            } else {
                println!("Daemon not running");
            }
            Ok(())
        }
        DaemonCommand::Status => status(&config).await,
        DaemonCommand::Logs { lines } => logs(&config, lines),
    }
}

fn start(config: &Config, foreground: bool) -> Result<()> {
    if foreground {
        let status = std::process::Command::new(find_daemon_binary()).status()?;
        if !status.success() {
            anyhow::bail!("tfgated exited with {}", status);
        }
        return Ok(());
    }

    if DaemonClient::connect(config).is_ok() {
        println!("Daemon already running");
        return Ok(());
    }
    DaemonClient::connect_or_start(config).map_err(CliError::from)?;
    println!("Daemon started");
    Ok(())
}

async fn status(config: &Config) -> Result<()> {
    let client = match DaemonClient::connect(config) {
        Ok(client) => client,
        Err(ClientError::DaemonNotRunning) => {
            println!("Daemon not running");
            return Ok(());
        }
        Err(e) => return Err(CliError::from(e).into()),
    };

    let version = client.hello().await.map_err(CliError::from)?;
    let (uptime_secs, locks_held, commands_in_flight) =
        client.status().await.map_err(CliError::from)?;

    println!("Status: running");
    println!("Protocol: {}", version);
    println!("Uptime: {}", format_uptime(uptime_secs));
    println!("Locks held: {}", locks_held);
    println!("Commands in flight: {}", commands_in_flight);
    println!("Socket: {}", config.socket_path.display());
    Ok(())
}

fn logs(config: &Config, lines: usize) -> Result<()> {
    let content = match std::fs::read_to_string(&config.log_path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            println!("No daemon log at {}", config.log_path.display());
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    for line in tail(&content, lines) {
        println!("{}", line);
    }
    Ok(())
}

fn tail(content: &str, lines: usize) -> Vec<&str> {
    let all: Vec<&str> = content.lines().collect();
    all[all.len().saturating_sub(lines)..].to_vec()
}

fn format_uptime(secs: u64) -> String {
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{}h {}m {}s", h, m, s)
    } else if m > 0 {
        format!("{}m {}s", m, s)
    } else {
        format!("{}s", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tail_keeps_last_lines() {
        assert_eq!(tail("a\nb\nc\n", 2), vec!["b", "c"]);
        assert_eq!(tail("a\nb\n", 10), vec!["a", "b"]);
        assert!(tail("", 5).is_empty());
    }

    #[test]
    fn uptime_is_human_readable() {
        assert_eq!(format_uptime(42), "42s");
        assert_eq!(format_uptime(125), "2m 5s");
        assert_eq!(format_uptime(3_723), "1h 2m 3s");
    }
}
