// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! tfgate execution engine
//!
//! Locks a project/workspace for a pull request, builds the plan or apply
//! stage for it and runs the stage's steps against Terraform.

mod builder;
mod error;
mod locking;
mod pre_execute;
mod runner;
mod stage;
mod step;
mod working_dir;

pub use builder::PipelineBuilder;
pub use error::{BuildError, EngineError};
pub use locking::{LockManager, TryLockResponse};
pub use pre_execute::{PreExecuteResult, PreExecutor};
pub use runner::{CommandContext, CommandRunner};
pub use stage::{Stage, StageError};
pub use step::{ApplyStep, InitStep, PlanStep, RunStep, Step, StepError, StepMeta};
pub use working_dir::{WorkingDirBusy, WorkingDirGuard, WorkingDirLocker};
