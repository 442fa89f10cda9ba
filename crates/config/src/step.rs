// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pipeline, stage and step definitions

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;

/// A named pipeline: the steps run for plan and for apply.
///
/// A stage left out falls back to the built-in default for that stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    #[serde(default)]
    pub plan: Option<StageConfig>,
    #[serde(default)]
    pub apply: Option<StageConfig>,
}

/// Ordered steps for one stage
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StageConfig {
    #[serde(default)]
    pub steps: Vec<StepConfig>,
}

/// A single configured step.
///
/// Accepted forms:
/// - keyword: `"init"`, `"plan"`, `"apply"`
/// - built-in with arguments: `{ plan = { extra_args = ["-lock=false"] } }`
/// - custom command: `{ run = "make lint" }`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawStep")]
pub enum StepConfig {
    Init { extra_args: Vec<String> },
    Plan { extra_args: Vec<String> },
    Apply { extra_args: Vec<String> },
    Run { command: String },
}

impl StepConfig {
    pub fn name(&self) -> &'static str {
        match self {
            StepConfig::Init { .. } => "init",
            StepConfig::Plan { .. } => "plan",
            StepConfig::Apply { .. } => "apply",
            StepConfig::Run { .. } => "run",
        }
    }

    fn builtin(name: &str, extra_args: Vec<String>) -> Result<Self, String> {
        match name {
            "init" => Ok(StepConfig::Init { extra_args }),
            "plan" => Ok(StepConfig::Plan { extra_args }),
            "apply" => Ok(StepConfig::Apply { extra_args }),
            "run" => Err("run step requires a command: { run = \"...\" }".to_string()),
            other => Err(format!(
                "unknown step {:?}; expected init, plan, apply or run",
                other
            )),
        }
    }
}

impl fmt::Display for StepConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawStep {
    Keyword(String),
    Run(RawRun),
    Builtin(BTreeMap<String, RawArgs>),
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRun {
    run: String,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawArgs {
    #[serde(default)]
    extra_args: Vec<String>,
}

impl TryFrom<RawStep> for StepConfig {
    type Error = String;

    fn try_from(raw: RawStep) -> Result<Self, Self::Error> {
        match raw {
            RawStep::Keyword(name) => StepConfig::builtin(&name, Vec::new()),
            RawStep::Run(RawRun { run }) => {
                if run.trim().is_empty() {
                    return Err("run step command must not be empty".to_string());
                }
                Ok(StepConfig::Run { command: run })
            }
            RawStep::Builtin(map) => {
                let mut entries = map.into_iter();
                match (entries.next(), entries.next()) {
                    (Some((name, args)), None) => StepConfig::builtin(&name, args.extra_args),
                    _ => Err("step table must name exactly one step".to_string()),
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "step_tests.rs"]
mod tests;
