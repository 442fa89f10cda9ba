// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lock administration

use std::fmt;

use anyhow::Result;
use clap::{Args, Subcommand};
use serde::Serialize;
use tfgate_core::{Lock, LockKey};
use tfgate_daemon::Config;

use crate::client::DaemonClient;
use crate::error::CliError;
use crate::output::{self, OutputFormat};

#[derive(Args, Debug)]
pub struct LockArgs {
    #[command(subcommand)]
    pub command: LockCommand,
}

#[derive(Subcommand, Debug)]
pub enum LockCommand {
    /// List held locks
    List,
    /// Show the lock held under a key (repo/path/workspace)
    Show { key: String },
    /// Discard the lock held under a key, as if its plan were thrown away
    Unlock { key: String },
    /// Release every lock a closed pull request holds
    ReleasePull {
        /// Repository owner and name
        #[arg(long)]
        repo: String,
        /// Pull request number
        #[arg(long)]
        pull: u64,
    },
}

/// A lock as printed
#[derive(Debug, Serialize)]
pub struct LockView {
    key: String,
    #[serde(flatten)]
    lock: Lock,
}

impl From<Lock> for LockView {
    fn from(lock: Lock) -> Self {
        Self {
            key: lock.key().to_string(),
            lock,
        }
    }
}

impl fmt::Display for LockView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<40} #{:<6} {:<16} {}",
            self.key,
            self.lock.pull.num,
            self.lock.user.username,
            self.lock.acquired_at.format("%Y-%m-%d %H:%M:%S UTC")
        )
    }
}

pub async fn handle(args: LockArgs, format: OutputFormat) -> Result<()> {
    let config = Config::load()?;
    let client = DaemonClient::connect(&config).map_err(CliError::from)?;

    match args.command {
        LockCommand::List => {
            let locks: Vec<LockView> = client
                .list_locks()
                .await
                .map_err(CliError::from)?
                .into_iter()
                .map(LockView::from)
                .collect();
            output::print_list(&locks, format, "No locks held");
        }

        LockCommand::Show { key } => {
            let lock = client
                .get_lock(LockKey::from(key.as_str()))
                .await
                .map_err(CliError::from)?
                .ok_or_else(|| CliError::lock_not_found(&key))?;
            output::print(&LockView::from(lock), format);
        }

        LockCommand::Unlock { key } => {
            let lock = client
                .unlock(LockKey::from(key.as_str()))
                .await
                .map_err(CliError::from)?;
            match lock {
                Some(lock) => println!("Discarded lock {} held by #{}", key, lock.pull.num),
                None => println!("No lock held for {}", key),
            }
        }

        LockCommand::ReleasePull { repo, pull } => {
            let locks = client
                .unlock_pull(&repo, pull)
                .await
                .map_err(CliError::from)?;
            println!("Released {} lock(s) for {}#{}", locks.len(), repo, pull);
            for lock in locks {
                println!("  {}", lock.key());
            }
        }
    }

    Ok(())
}
