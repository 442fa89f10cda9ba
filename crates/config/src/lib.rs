// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Repository configuration (`tfgate.toml`) parsing and validation

mod parser;
mod path_glob;
mod project;
mod step;

pub use parser::{load, parse_repo_config, ConfigError, RepoConfig, ValidationError};
pub use path_glob::Glob;
pub use project::{ApplyRequirement, AutoPlan, ProjectConfig};
pub use step::{PipelineConfig, StageConfig, StepConfig};

/// Name of the configuration file at the repository root
pub const CONFIG_FILE: &str = "tfgate.toml";

/// Config schema version this release understands
pub const SUPPORTED_VERSION: u32 = 2;
