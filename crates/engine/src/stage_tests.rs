// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::{RunStep, StepMeta};
use std::path::PathBuf;
use std::sync::Arc;
use tfgate_adapters::{FakeShellRunner, FakeTerraformExecutor};
use tfgate_core::TerraformVersion;

type FakeStage = Stage<FakeTerraformExecutor, FakeShellRunner>;

fn stage_of(commands: &[&str], runner: &FakeShellRunner) -> FakeStage {
    let meta = Arc::new(StepMeta {
        workspace: "default".to_string(),
        absolute_path: PathBuf::from("/repo"),
        dir_relative_to_repo_root: ".".to_string(),
        terraform_version: TerraformVersion::new(0, 11, 4),
        extra_comment_args: vec![],
        username: "alice".to_string(),
        terraform: FakeTerraformExecutor::new(),
        runner: runner.clone(),
    });
    Stage {
        name: CommandName::Plan,
        steps: commands
            .iter()
            .map(|c| {
                Step::Run(RunStep {
                    command: c.to_string(),
                    meta: Arc::clone(&meta),
                })
            })
            .collect(),
        apply_requirements: vec![],
    }
}

#[tokio::test]
async fn empty_stage_outputs_nothing() {
    let stage = stage_of(&[], &FakeShellRunner::new());
    assert_eq!(stage.run().await.unwrap(), "");
}

#[tokio::test]
async fn outputs_are_joined_with_newlines() {
    let runner = FakeShellRunner::new();
    runner.respond("one", "first");
    runner.respond("three", "third");
    let stage = stage_of(&["one", "two", "three"], &runner);

    // "two" produces no output and adds no separator
    assert_eq!(stage.run().await.unwrap(), "\nfirst\nthird");
}

#[tokio::test]
async fn first_failure_stops_stage() {
    let runner = FakeShellRunner::new();
    runner.respond("one", "first");
    runner.fail("two", "boom");
    let stage = stage_of(&["one", "two", "three"], &runner);

    let err = stage.run().await.unwrap_err();

    assert_eq!(err.output, "\nfirst");
    assert_eq!(err.step, "run");
    assert_eq!(err.source.output(), "boom");
    assert!(err.to_string().starts_with("run: "), "{}", err);
    let commands: Vec<String> = runner.calls().into_iter().map(|c| c.command).collect();
    assert_eq!(commands, vec!["one", "two"]);
}

#[test]
fn requirements_checked_against_pull_status() {
    let mut stage = stage_of(&[], &FakeShellRunner::new());
    stage.apply_requirements = vec![ApplyRequirement::Approved, ApplyRequirement::Mergeable];

    let none = PullStatus::default();
    assert_eq!(
        stage.unmet_requirement(&none).as_deref(),
        Some("Pull request must be approved before running apply.")
    );

    let approved = PullStatus {
        approved: true,
        mergeable: false,
    };
    assert_eq!(
        stage.unmet_requirement(&approved).as_deref(),
        Some("Pull request must be mergeable before running apply.")
    );

    let both = PullStatus {
        approved: true,
        mergeable: true,
    };
    assert_eq!(stage.unmet_requirement(&both), None);
}

#[test]
fn no_requirements_always_met() {
    let stage = stage_of(&[], &FakeShellRunner::new());
    assert_eq!(stage.unmet_requirement(&PullStatus::default()), None);
}
