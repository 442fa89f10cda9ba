// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! tfgate - serialized Terraform plans and applies for pull requests

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod client;
mod commands;
mod completions;
mod error;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{daemon, lock, run};
use tfgate_core::CommandName;

use crate::completions::CompletionsArgs;
use crate::error::CliError;
use crate::output::OutputFormat;

#[derive(Parser)]
#[command(
    name = "tfgate",
    version,
    about = "tfgate - One Terraform plan or apply at a time per project"
)]
struct Cli {
    /// Output format
    #[arg(long, global = true, value_enum, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lock projects and run terraform plan
    Plan(run::RunArgs),
    /// Run terraform apply on planned projects
    Apply(run::RunArgs),
    /// Lock administration
    Lock(lock::LockArgs),
    /// Daemon management
    Daemon(daemon::DaemonArgs),
    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[tokio::main]
async fn main() {
    setup_logging();

    let cli = Cli::parse();
    if let Err(e) = dispatch(cli).await {
        match e.downcast_ref::<CliError>() {
            Some(cli_error) => eprint!("{}", cli_error),
            None => eprintln!("error: {:#}", e),
        }
        std::process::exit(1);
    }
}

async fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Plan(args) => run::handle(CommandName::Plan, args, cli.format).await,
        Commands::Apply(args) => run::handle(CommandName::Apply, args, cli.format).await,
        Commands::Lock(args) => lock::handle(args, cli.format).await,
        Commands::Daemon(args) => daemon::daemon(args).await,
        Commands::Completions(args) => {
            completions::generate_completions::<Cli>(args.shell);
            Ok(())
        }
    }
}

/// Log to stderr, quiet unless RUST_LOG asks for more
fn setup_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
