// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the engine

use crate::StageError;
use tfgate_config::ConfigError;
use tfgate_core::CommandName;
use tfgate_storage::StoreError;
use thiserror::Error;

/// Errors from building a stage
#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("no project configured in tfgate.toml for dir {dir:?} and workspace {workspace:?}")]
    ProjectNotConfigured { dir: String, workspace: String },
}

/// Errors surfaced to the caller of a command, each with one layer of context
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("acquiring lock: {0}")]
    Lock(#[source] StoreError),
    #[error("building {stage} stage: {source}")]
    Build {
        stage: CommandName,
        #[source]
        source: BuildError,
    },
    #[error("running {stage} steps: {source}")]
    Run {
        stage: CommandName,
        #[source]
        source: StageError,
    },
    #[error("releasing lock: {0}")]
    Unlock(#[source] StoreError),
}
