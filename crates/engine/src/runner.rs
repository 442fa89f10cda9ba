// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runs one plan or apply command for one project

use crate::{
    EngineError, LockManager, PipelineBuilder, PreExecuteResult, PreExecutor, WorkingDirLocker,
};
use std::path::PathBuf;
use tfgate_adapters::{ShellRunner, TerraformExecutor};
use tfgate_core::{Clock, CommandName, Project, ProjectResult, PullRequest, PullStatus, User};
use tfgate_storage::LockStore;
use tracing::Instrument;

/// Everything a command needs to know about its trigger
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub command: CommandName,
    /// Root of the pull request checkout
    pub repo_dir: PathBuf,
    pub workspace: String,
    pub pull: PullRequest,
    pub user: User,
    /// Extra Terraform arguments from the triggering comment
    pub comment_args: Vec<String>,
    pub pull_status: PullStatus,
}

/// Guard, lock, build, check and run a command.
///
/// The lock outlives a plan so the plan can be applied; it is released
/// only once an apply succeeds or the lock is discarded.
#[derive(Clone)]
pub struct CommandRunner<L, C, T, R> {
    locks: LockManager<L, C>,
    pre_executor: PreExecutor<L, C, T, R>,
    working_dirs: WorkingDirLocker,
}

impl<L, C, T, R> CommandRunner<L, C, T, R>
where
    L: LockStore,
    C: Clock,
    T: TerraformExecutor,
    R: ShellRunner,
{
    pub fn new(
        locks: LockManager<L, C>,
        builder: PipelineBuilder<T, R>,
        working_dirs: WorkingDirLocker,
    ) -> Self {
        Self {
            pre_executor: PreExecutor::new(locks.clone(), builder),
            locks,
            working_dirs,
        }
    }

    pub fn locks(&self) -> &LockManager<L, C> {
        &self.locks
    }

    pub fn working_dirs(&self) -> &WorkingDirLocker {
        &self.working_dirs
    }

    pub async fn run(&self, ctx: &CommandContext, project: &Project) -> ProjectResult {
        let span = tracing::info_span!(
            "command",
            command = %ctx.command,
            project = %project,
            workspace = %ctx.workspace,
            pull = ctx.pull.num
        );
        self.run_inner(ctx, project).instrument(span).await
    }

    async fn run_inner(&self, ctx: &CommandContext, project: &Project) -> ProjectResult {
        let _guard = match self.working_dirs.try_lock(
            &project.repo_full_name,
            ctx.pull.num,
            &ctx.workspace,
        ) {
            Ok(guard) => guard,
            Err(busy) => return ProjectResult::failure(busy.to_string()),
        };

        let (stage, lock) = match self.pre_executor.execute(ctx, project) {
            PreExecuteResult::Ready { stage, lock } => (stage, lock),
            PreExecuteResult::Conflict(result) | PreExecuteResult::Error(result) => {
                return result
            }
        };

        if ctx.command == CommandName::Apply {
            if let Some(reason) = stage.unmet_requirement(&ctx.pull_status) {
                tracing::info!(reason, "apply requirements not met");
                return ProjectResult::failure(reason);
            }
        }

        let start = std::time::Instant::now();
        let output = match stage.run().await {
            Ok(output) => output,
            Err(source) => {
                let output = source.output.clone();
                let err = EngineError::Run {
                    stage: ctx.command,
                    source,
                };
                tracing::warn!(
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    error = %err,
                    "command failed"
                );
                return ProjectResult::error(err.to_string()).with_output(output);
            }
        };
        tracing::info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            "command succeeded"
        );

        if ctx.command == CommandName::Apply {
            if let Err(e) = self.locks.unlock(&lock.key) {
                let err = EngineError::Unlock(e);
                tracing::error!(key = %lock.key, error = %err, "apply succeeded but lock remains");
                return ProjectResult::error(err.to_string()).with_output(output);
            }
        }

        ProjectResult::success(output)
    }
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
