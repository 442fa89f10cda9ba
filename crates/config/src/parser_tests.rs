// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::{ApplyRequirement, StageConfig};
use tfgate_core::TerraformVersion;

const SAMPLE: &str = r#"
version = 2

[[projects]]
dir = "./staging/"
pipeline = "custom"
terraform_version = "0.10.8"
apply_requirements = ["approved", "mergeable"]

[[projects]]
dir = "prod"
workspace = "blue"
[projects.auto_plan]
enabled = false

[pipelines.custom]
plan = { steps = [{ run = "make lint" }, "init", { plan = { extra_args = ["-lock=false"] } }] }
"#;

fn v2(body: &str) -> String {
    format!("version = 2\n{}", body)
}

#[test]
fn parses_sample() {
    let config = parse_repo_config(SAMPLE).unwrap();
    assert_eq!(config.projects.len(), 2);

    let staging = &config.projects[0];
    assert_eq!(staging.dir, "staging");
    assert_eq!(staging.workspace, "default");
    assert_eq!(
        staging.terraform_version,
        Some(TerraformVersion::new(0, 10, 8))
    );
    assert_eq!(
        staging.apply_requirements,
        vec![ApplyRequirement::Approved, ApplyRequirement::Mergeable]
    );
    assert!(staging.auto_plan.enabled);
    assert_eq!(staging.auto_plan.when_modified, vec!["**/*.tf"]);

    let pipeline = config.pipeline_for(staging).unwrap();
    let plan = pipeline.plan.as_ref().unwrap();
    assert_eq!(plan.steps.len(), 3);
    assert_eq!(plan.steps[0].name(), "run");
    assert!(pipeline.apply.is_none());

    let prod = &config.projects[1];
    assert_eq!(prod.workspace, "blue");
    assert!(!prod.auto_plan.enabled);
    assert!(config.pipeline_for(prod).is_none());
}

#[test]
fn find_project_matches_dir_and_workspace() {
    let config = parse_repo_config(SAMPLE).unwrap();

    assert!(config.find_project("staging", "default").is_some());
    assert!(config.find_project("./staging", "default").is_some());
    assert!(config.find_project("staging", "blue").is_none());
    assert_eq!(
        config.find_project("prod", "blue").map(|p| p.dir.as_str()),
        Some("prod")
    );
}

#[test]
fn version_is_required() {
    let err = parse_repo_config("[[projects]]\ndir = \".\"\n").unwrap_err();
    assert!(matches!(err, ConfigError::Toml(_)));
    assert!(err.to_string().starts_with("parsing config: "));
}

#[test]
fn unsupported_version_is_rejected() {
    let err = parse_repo_config("version = 1\n").unwrap_err();
    assert!(matches!(
        err,
        ConfigError::Invalid(ValidationError::UnsupportedVersion { found: 1, .. })
    ));
}

#[test]
fn unknown_keys_are_rejected() {
    assert!(parse_repo_config(&v2("[[projects]]\ndir = \".\"\nworkspaces = \"x\"\n")).is_err());
    assert!(parse_repo_config(&v2("flavour = \"x\"\n")).is_err());
}

#[test]
fn absolute_dir_is_rejected() {
    let err = parse_repo_config(&v2("[[projects]]\ndir = \"/etc\"\n")).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::Invalid(ValidationError::InvalidDir(_))
    ));
}

#[test]
fn escaping_dir_is_rejected() {
    let err = parse_repo_config(&v2("[[projects]]\ndir = \"a/../../b\"\n")).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::Invalid(ValidationError::InvalidDir(_))
    ));
}

#[yare::parameterized(
    empty = { "" },
    nested = { "a/b" },
    parent = { ".." },
    escape = { "../../tmp/x" },
)]
fn unusable_workspace_is_rejected(workspace: &str) {
    let body = format!("[[projects]]\ndir = \"staging\"\nworkspace = {:?}\n", workspace);
    let (dir, source) = match parse_repo_config(&v2(&body)).unwrap_err() {
        ConfigError::Invalid(ValidationError::InvalidWorkspace { dir, source }) => (dir, source),
        other => panic!("expected InvalidWorkspace, got {:?}", other),
    };
    assert_eq!(dir, "staging");
    assert_eq!(source.0, workspace);
}

#[test]
fn duplicate_project_is_rejected() {
    let body = "[[projects]]\ndir = \"a\"\n[[projects]]\ndir = \"./a\"\n";
    let err = parse_repo_config(&v2(body)).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::Invalid(ValidationError::DuplicateProject { .. })
    ));
}

#[test]
fn same_dir_different_workspace_is_allowed() {
    let body = "[[projects]]\ndir = \"a\"\n[[projects]]\ndir = \"a\"\nworkspace = \"b\"\n";
    assert_eq!(parse_repo_config(&v2(body)).unwrap().projects.len(), 2);
}

#[test]
fn undefined_pipeline_is_rejected() {
    let err = parse_repo_config(&v2("[[projects]]\ndir = \".\"\npipeline = \"nope\"\n"))
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "parsing config: project dir \".\" references undefined pipeline \"nope\""
    );
}

#[test]
fn apply_step_in_plan_stage_is_rejected() {
    let err = parse_repo_config(&v2("[pipelines.p]\nplan = { steps = [\"apply\"] }\n"))
        .unwrap_err();
    assert!(matches!(
        err,
        ConfigError::Invalid(ValidationError::MisplacedStep {
            stage: "plan",
            step: "apply",
            ..
        })
    ));
}

#[test]
fn plan_step_in_apply_stage_is_rejected() {
    let err = parse_repo_config(&v2("[pipelines.p]\napply = { steps = [\"plan\"] }\n"))
        .unwrap_err();
    assert!(matches!(
        err,
        ConfigError::Invalid(ValidationError::MisplacedStep { stage: "apply", .. })
    ));
}

#[test]
fn unknown_apply_requirement_is_rejected() {
    let err = parse_repo_config(&v2(
        "[[projects]]\ndir = \".\"\napply_requirements = [\"signed\"]\n",
    ))
    .unwrap_err();
    assert!(err.to_string().contains("unknown apply requirement"), "{}", err);
}

#[test]
fn empty_stage_is_allowed() {
    let config = parse_repo_config(&v2("[pipelines.p]\napply = { steps = [] }\n")).unwrap();
    assert_eq!(
        config.pipelines["p"].apply,
        Some(StageConfig { steps: vec![] })
    );
}

#[test]
fn autoplan_matches_modified_files() {
    let body = r#"
[[projects]]
dir = "staging"

[[projects]]
dir = "prod"
[projects.auto_plan]
when_modified = ["**/*.tf", "../modules/**/*.tf"]

[[projects]]
dir = "disabled"
[projects.auto_plan]
enabled = false
"#;
    let config = parse_repo_config(&v2(body)).unwrap();

    let dirs = |files: &[&str]| -> Vec<String> {
        let files: Vec<String> = files.iter().map(|f| f.to_string()).collect();
        config
            .projects_to_autoplan(&files)
            .into_iter()
            .map(|p| p.dir.clone())
            .collect()
    };

    assert_eq!(dirs(&["staging/main.tf"]), vec!["staging"]);
    assert_eq!(dirs(&["modules/vpc/main.tf"]), vec!["prod"]);
    assert_eq!(dirs(&["staging/README.md"]), Vec::<String>::new());
    assert_eq!(dirs(&["disabled/main.tf"]), Vec::<String>::new());
    assert_eq!(
        dirs(&["prod/nested/x.tf", "staging/y.tf"]),
        vec!["staging", "prod"]
    );
}

#[test]
fn load_missing_file_is_none() {
    let dir = tempfile::tempdir().unwrap();
    assert!(load(dir.path()).unwrap().is_none());
}

#[test]
fn load_reads_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(CONFIG_FILE), SAMPLE).unwrap();
    let config = load(dir.path()).unwrap().unwrap();
    assert_eq!(config.projects.len(), 2);
}

#[test]
fn load_unreadable_file_is_read_error() {
    let dir = tempfile::tempdir().unwrap();
    // A directory where the file should be cannot be read as a string
    std::fs::create_dir(dir.path().join(CONFIG_FILE)).unwrap();

    let err = load(dir.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Read(_)));
    assert!(err.to_string().starts_with("unable to read tfgate.toml"));
}
