// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stages: ordered steps for one command

use crate::{Step, StepError};
use tfgate_adapters::{ShellRunner, TerraformExecutor};
use tfgate_config::ApplyRequirement;
use tfgate_core::{CommandName, PullStatus};
use thiserror::Error;
use tracing::Instrument;

/// A step failed; `output` holds what earlier steps produced
#[derive(Debug, Error)]
#[error("{step}: {source}")]
pub struct StageError {
    pub output: String,
    pub step: &'static str,
    #[source]
    pub source: StepError,
}

/// The steps run for a plan or apply, in order
#[derive(Debug)]
pub struct Stage<T, R> {
    pub name: CommandName,
    pub steps: Vec<Step<T, R>>,
    /// Conditions checked before an apply stage runs
    pub apply_requirements: Vec<ApplyRequirement>,
}

impl<T: TerraformExecutor, R: ShellRunner> Stage<T, R> {
    /// Run every step, stopping at the first failure.
    ///
    /// Each non-empty step output is appended after a newline.
    pub async fn run(&self) -> Result<String, StageError> {
        let span = tracing::info_span!("stage.run", stage = %self.name, steps = self.steps.len());
        async move {
            let mut output = String::new();
            for step in &self.steps {
                let start = std::time::Instant::now();
                match step.run().await {
                    Ok(out) => {
                        tracing::info!(
                            step = step.name(),
                            elapsed_ms = start.elapsed().as_millis() as u64,
                            "step finished"
                        );
                        if !out.is_empty() {
                            output.push('\n');
                            output.push_str(&out);
                        }
                    }
                    Err(source) => {
                        tracing::warn!(
                            step = step.name(),
                            elapsed_ms = start.elapsed().as_millis() as u64,
                            error = %source,
                            "step failed"
                        );
                        return Err(StageError {
                            output,
                            step: step.name(),
                            source,
                        });
                    }
                }
            }
            Ok(output)
        }
        .instrument(span)
        .await
    }
}

impl<T, R> Stage<T, R> {
    /// The user-facing reason apply may not run yet, if any
    pub fn unmet_requirement(&self, status: &PullStatus) -> Option<String> {
        self.apply_requirements.iter().find_map(|req| match req {
            ApplyRequirement::Approved if !status.approved => {
                Some("Pull request must be approved before running apply.".to_string())
            }
            ApplyRequirement::Mergeable if !status.mergeable => {
                Some("Pull request must be mergeable before running apply.".to_string())
            }
            _ => None,
        })
    }
}

#[cfg(test)]
#[path = "stage_tests.rs"]
mod tests;
