// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Builds plan and apply stages from repository config

use crate::{ApplyStep, BuildError, InitStep, PlanStep, RunStep, Stage, Step, StepMeta};
use std::path::Path;
use std::sync::Arc;
use tfgate_config::{ApplyRequirement, RepoConfig, StageConfig, StepConfig};
use tfgate_core::project::clean_path;
use tfgate_core::{CommandName, TerraformVersion};

/// Constructs stages for a project checkout.
///
/// `tfgate.toml` is read on every build so config changes in a pull
/// request take effect on its next command.
#[derive(Debug, Clone)]
pub struct PipelineBuilder<T, R> {
    terraform: T,
    runner: R,
    default_version: TerraformVersion,
}

impl<T: Clone, R: Clone> PipelineBuilder<T, R> {
    pub fn new(terraform: T, runner: R, default_version: TerraformVersion) -> Self {
        Self {
            terraform,
            runner,
            default_version,
        }
    }

    pub fn build_plan_stage(
        &self,
        repo_dir: &Path,
        workspace: &str,
        rel_project_path: &str,
        comment_args: &[String],
        username: &str,
    ) -> Result<Stage<T, R>, BuildError> {
        self.build(
            CommandName::Plan,
            repo_dir,
            workspace,
            rel_project_path,
            comment_args,
            username,
        )
    }

    pub fn build_apply_stage(
        &self,
        repo_dir: &Path,
        workspace: &str,
        rel_project_path: &str,
        comment_args: &[String],
        username: &str,
    ) -> Result<Stage<T, R>, BuildError> {
        self.build(
            CommandName::Apply,
            repo_dir,
            workspace,
            rel_project_path,
            comment_args,
            username,
        )
    }

    /// Build the stage for `command`
    pub fn build(
        &self,
        command: CommandName,
        repo_dir: &Path,
        workspace: &str,
        rel_project_path: &str,
        comment_args: &[String],
        username: &str,
    ) -> Result<Stage<T, R>, BuildError> {
        let dir = clean_path(rel_project_path);
        let config = tfgate_config::load(repo_dir)?;

        let (version, steps, apply_requirements) = match &config {
            None => (self.default_version.clone(), default_steps(command), vec![]),
            Some(config) => self.configured(config, command, &dir, workspace)?,
        };

        let absolute_path = if dir == "." {
            repo_dir.to_path_buf()
        } else {
            repo_dir.join(&dir)
        };
        let meta = Arc::new(StepMeta {
            workspace: workspace.to_string(),
            absolute_path,
            dir_relative_to_repo_root: dir,
            terraform_version: version,
            extra_comment_args: comment_args.to_vec(),
            username: username.to_string(),
            terraform: self.terraform.clone(),
            runner: self.runner.clone(),
        });

        let steps = steps
            .into_iter()
            .map(|step| to_step(step, &meta))
            .collect();

        Ok(Stage {
            name: command,
            steps,
            apply_requirements: match command {
                CommandName::Apply => apply_requirements,
                CommandName::Plan => vec![],
            },
        })
    }

    fn configured(
        &self,
        config: &RepoConfig,
        command: CommandName,
        dir: &str,
        workspace: &str,
    ) -> Result<(TerraformVersion, Vec<StepConfig>, Vec<ApplyRequirement>), BuildError> {
        let project = config.find_project(dir, workspace).ok_or_else(|| {
            BuildError::ProjectNotConfigured {
                dir: dir.to_string(),
                workspace: workspace.to_string(),
            }
        })?;

        let version = project
            .terraform_version
            .clone()
            .unwrap_or_else(|| self.default_version.clone());

        let stage: Option<&StageConfig> =
            config
                .pipeline_for(project)
                .and_then(|pipeline| match command {
                    CommandName::Plan => pipeline.plan.as_ref(),
                    CommandName::Apply => pipeline.apply.as_ref(),
                });
        let steps = match stage {
            Some(stage) => stage.steps.clone(),
            None => default_steps(command),
        };

        Ok((version, steps, project.apply_requirements.clone()))
    }
}

fn default_steps(command: CommandName) -> Vec<StepConfig> {
    match command {
        CommandName::Plan => vec![
            StepConfig::Init { extra_args: vec![] },
            StepConfig::Plan { extra_args: vec![] },
        ],
        CommandName::Apply => vec![StepConfig::Apply { extra_args: vec![] }],
    }
}

fn to_step<T, R>(step: StepConfig, meta: &Arc<StepMeta<T, R>>) -> Step<T, R> {
    let meta = Arc::clone(meta);
    match step {
        StepConfig::Init { extra_args } => Step::Init(InitStep { extra_args, meta }),
        StepConfig::Plan { extra_args } => Step::Plan(PlanStep { extra_args, meta }),
        StepConfig::Apply { extra_args } => Step::Apply(ApplyStep { extra_args, meta }),
        StepConfig::Run { command } => Step::Run(RunStep { command, meta }),
    }
}

#[cfg(test)]
#[path = "builder_tests.rs"]
mod tests;
