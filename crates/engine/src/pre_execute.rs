// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lock and build before a command runs

use crate::{CommandContext, EngineError, LockManager, PipelineBuilder, Stage, TryLockResponse};
use tfgate_core::{Clock, Project, ProjectResult};
use tfgate_storage::LockStore;

/// Outcome of preparing a command
#[derive(Debug)]
pub enum PreExecuteResult<T, R> {
    /// The project is locked by another pull request
    Conflict(ProjectResult),
    /// Locking or building failed; no lock is left held by this attempt
    Error(ProjectResult),
    /// The lock is held and the stage is ready to run
    Ready {
        stage: Stage<T, R>,
        lock: TryLockResponse,
    },
}

/// Takes the project lock and builds the stage for a command.
///
/// A lock taken here is released again if the stage cannot be built.
#[derive(Clone)]
pub struct PreExecutor<L, C, T, R> {
    locks: LockManager<L, C>,
    builder: PipelineBuilder<T, R>,
}

impl<L, C, T, R> PreExecutor<L, C, T, R>
where
    L: LockStore,
    C: Clock,
    T: Clone,
    R: Clone,
{
    pub fn new(locks: LockManager<L, C>, builder: PipelineBuilder<T, R>) -> Self {
        Self { locks, builder }
    }

    pub fn execute(&self, ctx: &CommandContext, project: &Project) -> PreExecuteResult<T, R> {
        let lock = match self.locks.try_lock(
            project.clone(),
            &ctx.workspace,
            ctx.pull.clone(),
            ctx.user.clone(),
        ) {
            Ok(lock) => lock,
            Err(e) => {
                let err = EngineError::Lock(e);
                tracing::error!(error = %err, "lock attempt failed");
                return PreExecuteResult::Error(ProjectResult::error(err.to_string()));
            }
        };

        if !lock.acquired && lock.current_lock.pull.num != ctx.pull.num {
            return PreExecuteResult::Conflict(ProjectResult::failure(format!(
                "This project is currently locked by #{}. The locking plan must be applied or discarded before future plans can execute.",
                lock.current_lock.pull.num
            )));
        }
        tracing::info!(key = %lock.key, "acquired lock");

        match self.builder.build(
            ctx.command,
            &ctx.repo_dir,
            &ctx.workspace,
            &project.path,
            &ctx.comment_args,
            &ctx.user.username,
        ) {
            Ok(stage) => PreExecuteResult::Ready { stage, lock },
            Err(source) => {
                let err = EngineError::Build {
                    stage: ctx.command,
                    source,
                };
                tracing::warn!(key = %lock.key, error = %err, "build failed, releasing lock");
                if let Err(e) = self.locks.unlock(&lock.key) {
                    tracing::error!(key = %lock.key, error = %e, "failed to release lock");
                }
                PreExecuteResult::Error(ProjectResult::error(err.to_string()))
            }
        }
    }
}

#[cfg(test)]
#[path = "pre_execute_tests.rs"]
mod tests;
