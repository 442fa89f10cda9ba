// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pipeline steps

use std::path::PathBuf;
use std::sync::Arc;
use tfgate_adapters::{ExecError, ShellRunner, TerraformExecutor};
use tfgate_core::{TerraformVersion, DEFAULT_WORKSPACE};
use thiserror::Error;

/// Errors from running a single step
#[derive(Debug, Error)]
pub enum StepError {
    #[error("terraform version {0} does not support workspaces")]
    WorkspacesUnsupported(TerraformVersion),
    #[error("no plan found at path \"{dir}\" and workspace \"{workspace}\"–did you run plan?")]
    NoPlan { dir: String, workspace: String },
    #[error(transparent)]
    Exec(#[from] ExecError),
}

impl StepError {
    /// Output the failing command produced, if any
    pub fn output(&self) -> &str {
        match self {
            StepError::Exec(e) => e.output(),
            _ => "",
        }
    }
}

/// Execution context shared by every step of a stage
#[derive(Debug)]
pub struct StepMeta<T, R> {
    pub workspace: String,
    pub absolute_path: PathBuf,
    pub dir_relative_to_repo_root: String,
    pub terraform_version: TerraformVersion,
    /// Arguments appended from the triggering comment
    pub extra_comment_args: Vec<String>,
    pub username: String,
    pub terraform: T,
    pub runner: R,
}

impl<T: TerraformExecutor, R> StepMeta<T, R> {
    async fn terraform(&self, args: Vec<String>) -> Result<String, ExecError> {
        self.terraform
            .run_command(
                &self.absolute_path,
                &args,
                &self.terraform_version,
                &self.workspace,
            )
            .await
    }

    fn plan_path(&self) -> PathBuf {
        self.absolute_path
            .join(format!("{}.tfplan", self.workspace))
    }
}

/// `terraform init`, or `terraform get` before workspaces existed
#[derive(Debug)]
pub struct InitStep<T, R> {
    pub extra_args: Vec<String>,
    pub meta: Arc<StepMeta<T, R>>,
}

/// Select the workspace and write a plan file
#[derive(Debug)]
pub struct PlanStep<T, R> {
    pub extra_args: Vec<String>,
    pub meta: Arc<StepMeta<T, R>>,
}

/// Apply the plan file written by the plan step
#[derive(Debug)]
pub struct ApplyStep<T, R> {
    pub extra_args: Vec<String>,
    pub meta: Arc<StepMeta<T, R>>,
}

/// A custom shell command
#[derive(Debug)]
pub struct RunStep<T, R> {
    pub command: String,
    pub meta: Arc<StepMeta<T, R>>,
}

/// One unit of stage work
#[derive(Debug)]
pub enum Step<T, R> {
    Init(InitStep<T, R>),
    Plan(PlanStep<T, R>),
    Apply(ApplyStep<T, R>),
    Run(RunStep<T, R>),
}

impl<T: TerraformExecutor, R: ShellRunner> Step<T, R> {
    pub fn name(&self) -> &'static str {
        match self {
            Step::Init(_) => "init",
            Step::Plan(_) => "plan",
            Step::Apply(_) => "apply",
            Step::Run(_) => "run",
        }
    }

    pub async fn run(&self) -> Result<String, StepError> {
        match self {
            Step::Init(step) => step.run().await,
            Step::Plan(step) => step.run().await,
            Step::Apply(step) => step.run().await,
            Step::Run(step) => step.run().await,
        }
    }
}

impl<T: TerraformExecutor, R> InitStep<T, R> {
    pub async fn run(&self) -> Result<String, StepError> {
        let subcommand = if self.meta.terraform_version.supports_workspaces() {
            "init"
        } else {
            "get"
        };
        let mut args = vec![subcommand.to_string(), "-no-color".to_string()];
        args.extend(self.extra_args.iter().cloned());
        Ok(self.meta.terraform(args).await?)
    }
}

impl<T: TerraformExecutor, R> PlanStep<T, R> {
    pub async fn run(&self) -> Result<String, StepError> {
        let meta = &self.meta;
        self.switch_workspace().await?;

        let mut args = vec![
            "plan".to_string(),
            "-refresh".to_string(),
            "-no-color".to_string(),
            "-out".to_string(),
            meta.plan_path().display().to_string(),
            "-var".to_string(),
            format!("atlantis_user={}", meta.username),
        ];
        args.extend(self.extra_args.iter().cloned());
        args.extend(meta.extra_comment_args.iter().cloned());

        let var_file = meta
            .absolute_path
            .join("env")
            .join(format!("{}.tfvars", meta.workspace));
        if var_file.is_file() {
            args.push("-var-file".to_string());
            args.push(var_file.display().to_string());
        }

        Ok(meta.terraform(args).await?)
    }

    async fn switch_workspace(&self) -> Result<(), StepError> {
        let meta = &self.meta;
        let version = &meta.terraform_version;
        let workspace = meta.workspace.as_str();

        let Some(subcommand) = version.workspace_subcommand() else {
            if workspace != DEFAULT_WORKSPACE {
                return Err(StepError::WorkspacesUnsupported(version.clone()));
            }
            return Ok(());
        };

        let current = meta
            .terraform(vec![subcommand.to_string(), "show".to_string()])
            .await?;
        if current.trim() == workspace {
            tracing::debug!(workspace, "already in workspace");
            return Ok(());
        }

        let select = meta
            .terraform(vec![
                subcommand.to_string(),
                "select".to_string(),
                "-no-color".to_string(),
                workspace.to_string(),
            ])
            .await;
        if let Err(e) = select {
            tracing::info!(workspace, error = %e, "workspace select failed, creating it");
            meta.terraform(vec![
                subcommand.to_string(),
                "new".to_string(),
                "-no-color".to_string(),
                workspace.to_string(),
            ])
            .await?;
        }
        Ok(())
    }
}

impl<T: TerraformExecutor, R> ApplyStep<T, R> {
    pub async fn run(&self) -> Result<String, StepError> {
        let meta = &self.meta;
        let plan_path = meta.plan_path();
        if !plan_path.is_file() {
            return Err(StepError::NoPlan {
                dir: meta.dir_relative_to_repo_root.clone(),
                workspace: meta.workspace.clone(),
            });
        }

        let mut args = vec!["apply".to_string(), "-no-color".to_string()];
        args.extend(self.extra_args.iter().cloned());
        args.extend(meta.extra_comment_args.iter().cloned());
        args.push(plan_path.display().to_string());

        Ok(meta.terraform(args).await?)
    }
}

impl<T, R: ShellRunner> RunStep<T, R> {
    pub async fn run(&self) -> Result<String, StepError> {
        let meta = &self.meta;
        Ok(meta
            .runner
            .run(
                &self.command,
                &meta.absolute_path,
                &meta.workspace,
                &meta.terraform_version,
            )
            .await?)
    }
}

#[cfg(test)]
#[path = "step_tests.rs"]
mod tests;
