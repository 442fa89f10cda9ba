// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `tfgate.toml` parsing and validation

use crate::{Glob, PipelineConfig, ProjectConfig, StepConfig, CONFIG_FILE, SUPPORTED_VERSION};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::Path;
use tfgate_core::project::{check_workspace, clean_path, InvalidWorkspace};
use thiserror::Error;

/// Errors from loading repository config
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to read tfgate.toml: {0}")]
    Read(#[source] io::Error),
    #[error("parsing config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("parsing config: {0}")]
    Invalid(#[from] ValidationError),
}

/// Well-formed TOML that breaks a config rule
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("unsupported version {found}; this release understands version {expected}")]
    UnsupportedVersion { found: u32, expected: u32 },
    #[error("project dir {0:?} must be a relative path inside the repository")]
    InvalidDir(String),
    #[error("project dir {dir:?}: {source}")]
    InvalidWorkspace {
        dir: String,
        source: InvalidWorkspace,
    },
    #[error("project dir {dir:?} and workspace {workspace:?} are configured more than once")]
    DuplicateProject { dir: String, workspace: String },
    #[error("project dir {dir:?} references undefined pipeline {pipeline:?}")]
    UnknownPipeline { dir: String, pipeline: String },
    #[error("pipeline {pipeline:?}: {step} step is not allowed in the {stage} stage")]
    MisplacedStep {
        pipeline: String,
        stage: &'static str,
        step: &'static str,
    },
    #[error("project dir {dir:?}: invalid when_modified pattern {pattern:?}")]
    InvalidPattern { dir: String, pattern: String },
}

/// Parsed and validated `tfgate.toml`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RepoConfig {
    pub version: u32,
    #[serde(default)]
    pub projects: Vec<ProjectConfig>,
    #[serde(default)]
    pub pipelines: HashMap<String, PipelineConfig>,
}

impl RepoConfig {
    /// The project bound to `dir` and `workspace`
    pub fn find_project(&self, dir: &str, workspace: &str) -> Option<&ProjectConfig> {
        let dir = clean_path(dir);
        self.projects
            .iter()
            .find(|p| p.dir == dir && p.workspace == workspace)
    }

    /// The named pipeline a project uses, if it names one
    pub fn pipeline_for(&self, project: &ProjectConfig) -> Option<&PipelineConfig> {
        project
            .pipeline
            .as_ref()
            .and_then(|name| self.pipelines.get(name))
    }

    /// Projects that should be planned automatically for the modified files.
    ///
    /// File paths are relative to the repository root.
    pub fn projects_to_autoplan(&self, modified_files: &[String]) -> Vec<&ProjectConfig> {
        let files: Vec<String> = modified_files.iter().map(|f| clean_path(f)).collect();
        self.projects
            .iter()
            .filter(|p| p.auto_plan.enabled)
            .filter(|p| {
                p.auto_plan
                    .when_modified
                    .iter()
                    .filter_map(|pattern| project_glob(&p.dir, pattern).ok())
                    .any(|glob| files.iter().any(|f| glob.is_match(f)))
            })
            .collect()
    }

    fn validate(&mut self) -> Result<(), ValidationError> {
        if self.version != SUPPORTED_VERSION {
            return Err(ValidationError::UnsupportedVersion {
                found: self.version,
                expected: SUPPORTED_VERSION,
            });
        }

        for (name, pipeline) in &self.pipelines {
            check_stage(name, "plan", pipeline.plan.as_ref().map(|s| &s.steps[..]))?;
            check_stage(name, "apply", pipeline.apply.as_ref().map(|s| &s.steps[..]))?;
        }

        let mut seen = HashSet::new();
        for project in &mut self.projects {
            if Path::new(&project.dir).is_absolute() {
                return Err(ValidationError::InvalidDir(project.dir.clone()));
            }
            let dir = clean_path(&project.dir);
            if dir == ".." || dir.starts_with("../") {
                return Err(ValidationError::InvalidDir(project.dir.clone()));
            }
            project.dir = dir;

            if let Err(source) = check_workspace(&project.workspace) {
                return Err(ValidationError::InvalidWorkspace {
                    dir: project.dir.clone(),
                    source,
                });
            }

            if !seen.insert((project.dir.clone(), project.workspace.clone())) {
                return Err(ValidationError::DuplicateProject {
                    dir: project.dir.clone(),
                    workspace: project.workspace.clone(),
                });
            }

            if let Some(pipeline) = &project.pipeline {
                if !self.pipelines.contains_key(pipeline) {
                    return Err(ValidationError::UnknownPipeline {
                        dir: project.dir.clone(),
                        pipeline: pipeline.clone(),
                    });
                }
            }

            for pattern in &project.auto_plan.when_modified {
                project_glob(&project.dir, pattern).map_err(|_| {
                    ValidationError::InvalidPattern {
                        dir: project.dir.clone(),
                        pattern: pattern.clone(),
                    }
                })?;
            }
        }

        Ok(())
    }
}

fn check_stage(
    pipeline: &str,
    stage: &'static str,
    steps: Option<&[StepConfig]>,
) -> Result<(), ValidationError> {
    for step in steps.unwrap_or_default() {
        let misplaced = matches!(
            (stage, step),
            ("plan", StepConfig::Apply { .. }) | ("apply", StepConfig::Plan { .. })
        );
        if misplaced {
            return Err(ValidationError::MisplacedStep {
                pipeline: pipeline.to_string(),
                stage,
                step: step.name(),
            });
        }
    }
    Ok(())
}

/// Resolve a project-relative pattern to a repo-relative glob
fn project_glob(dir: &str, pattern: &str) -> Result<Glob, glob::PatternError> {
    Glob::new(&clean_path(&format!("{}/{}", dir, pattern)))
}

/// Parse and validate config file content
pub fn parse_repo_config(content: &str) -> Result<RepoConfig, ConfigError> {
    let mut config: RepoConfig = toml::from_str(content)?;
    config.validate()?;
    Ok(config)
}

/// Load `tfgate.toml` from a repository checkout.
///
/// A missing file is not an error; callers fall back to defaults.
pub fn load(repo_dir: &Path) -> Result<Option<RepoConfig>, ConfigError> {
    let path = repo_dir.join(CONFIG_FILE);
    let content = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::info!(
                repo_dir = %repo_dir.display(),
                "no {} file found, continuing with defaults",
                CONFIG_FILE
            );
            return Ok(None);
        }
        Err(e) => return Err(ConfigError::Read(e)),
    };
    parse_repo_config(&content).map(Some)
}

#[cfg(test)]
#[path = "parser_tests.rs"]
mod tests;
