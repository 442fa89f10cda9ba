// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Plan and apply submission

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::Serialize;
use tfgate_core::{
    check_workspace, CommandName, InvalidWorkspace, Project, ProjectResult, PullRequest,
    PullStatus, User, DEFAULT_WORKSPACE,
};
use tfgate_daemon::{CommandRequest, Config};

use crate::client::{absolute_repo_dir, DaemonClient};
use crate::error::CliError;
use crate::output::{self, OutputFormat};

#[derive(clap::Args, Debug)]
pub struct RunArgs {
    /// Checkout of the pull request's head
    #[arg(long, default_value = ".")]
    pub repo_dir: PathBuf,

    /// Repository owner and name, e.g. acme/infra
    #[arg(long)]
    pub repo: String,

    /// Project directory relative to the repository root
    #[arg(long)]
    pub path: Option<String>,

    /// Terraform workspace
    #[arg(long, default_value = DEFAULT_WORKSPACE, value_parser = parse_workspace)]
    pub workspace: String,

    /// File changed by the pull request; selects projects from tfgate.toml when --path is omitted
    #[arg(long = "modified", value_name = "FILE")]
    pub modified: Vec<String>,

    /// Pull request number
    #[arg(long)]
    pub pull: u64,

    /// Pull request author
    #[arg(long)]
    pub author: String,

    /// Link to the pull request
    #[arg(long, default_value = "")]
    pub url: String,

    /// Head branch of the pull request
    #[arg(long)]
    pub branch: Option<String>,

    /// User who asked for the command (defaults to the author)
    #[arg(long)]
    pub user: Option<String>,

    /// The pull request has been approved
    #[arg(long)]
    pub approved: bool,

    /// The pull request can be merged
    #[arg(long)]
    pub mergeable: bool,

    /// Extra arguments appended to the terraform command
    #[arg(last = true)]
    pub extra_args: Vec<String>,
}

fn parse_workspace(name: &str) -> Result<String, InvalidWorkspace> {
    check_workspace(name)?;
    Ok(name.to_string())
}

/// A project and workspace a command targets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub project: Project,
    pub workspace: String,
}

/// One project's result, as printed
#[derive(Debug, Serialize)]
struct ProjectOutput {
    project: String,
    workspace: String,
    #[serde(flatten)]
    result: ProjectResult,
}

impl fmt::Display for ProjectOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "==> {} ({})", self.project, self.workspace)?;
        if !self.result.output.is_empty() {
            writeln!(f, "{}", self.result.output.trim_end())?;
        }
        if let Some(failure) = &self.result.failure {
            writeln!(f, "failure: {}", failure)?;
        }
        if let Some(error) = &self.result.error {
            writeln!(f, "error: {}", error)?;
        }
        Ok(())
    }
}

/// Work out which projects a command applies to
pub fn resolve_targets(args: &RunArgs, repo_dir: &Path) -> Result<Vec<Target>> {
    if let Some(path) = &args.path {
        return Ok(vec![Target {
            project: Project::new(&args.repo, path),
            workspace: args.workspace.clone(),
        }]);
    }

    if args.modified.is_empty() {
        anyhow::bail!("pass --path or at least one --modified file");
    }

    let config =
        tfgate_config::load(repo_dir)?.ok_or_else(|| CliError::no_repo_config(repo_dir))?;
    Ok(config
        .projects_to_autoplan(&args.modified)
        .into_iter()
        .map(|p| Target {
            project: Project::new(&args.repo, &p.dir),
            workspace: p.workspace.clone(),
        })
        .collect())
}

pub async fn handle(command: CommandName, args: RunArgs, format: OutputFormat) -> Result<()> {
    let repo_dir = absolute_repo_dir(&args.repo_dir).map_err(CliError::from)?;
    let targets = resolve_targets(&args, &repo_dir)?;
    if targets.is_empty() {
        println!("No projects matched the modified files");
        return Ok(());
    }

    let config = Config::load()?;
    let client = DaemonClient::connect_or_start(&config).map_err(CliError::from)?;

    let mut pull = PullRequest::new(args.pull, &args.author, &args.url).with_base_repo(&args.repo);
    if let Some(branch) = &args.branch {
        pull = pull.with_branch(branch);
    }
    let user = User::new(args.user.as_deref().unwrap_or(&args.author));
    let pull_status = PullStatus {
        approved: args.approved,
        mergeable: args.mergeable,
    };

    let mut outputs = Vec::with_capacity(targets.len());
    for target in targets {
        tracing::debug!(
            project = %target.project,
            workspace = %target.workspace,
            %command,
            "submitting"
        );
        let result = client
            .run_command(CommandRequest {
                command,
                repo_dir: repo_dir.clone(),
                project: target.project.clone(),
                workspace: target.workspace.clone(),
                pull: pull.clone(),
                user: user.clone(),
                comment_args: args.extra_args.clone(),
                pull_status,
            })
            .await
            .map_err(CliError::from)?;
        outputs.push(ProjectOutput {
            project: target.project.to_string(),
            workspace: target.workspace,
            result,
        });
    }

    match format {
        OutputFormat::Text => {
            for out in &outputs {
                output::print(out, format);
            }
        }
        OutputFormat::Json => output::print_list(&outputs, format, ""),
    }

    let unsuccessful = outputs.iter().filter(|o| !o.result.is_success()).count();
    if unsuccessful > 0 {
        anyhow::bail!(
            "{} {} of {} project(s) did not succeed",
            command,
            unsuccessful,
            outputs.len()
        );
    }
    Ok(())
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
