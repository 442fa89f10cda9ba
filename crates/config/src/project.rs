// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Project bindings

use serde::Deserialize;
use std::fmt;
use tfgate_core::{TerraformVersion, DEFAULT_WORKSPACE};

/// A project directory and workspace managed by tfgate
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Directory relative to the repository root
    pub dir: String,
    #[serde(default = "default_workspace")]
    pub workspace: String,
    /// Named pipeline; the built-in pipeline when absent
    #[serde(default)]
    pub pipeline: Option<String>,
    /// Overrides the server's default Terraform version
    #[serde(default)]
    pub terraform_version: Option<TerraformVersion>,
    #[serde(default)]
    pub auto_plan: AutoPlan,
    #[serde(default)]
    pub apply_requirements: Vec<ApplyRequirement>,
}

fn default_workspace() -> String {
    DEFAULT_WORKSPACE.to_string()
}

/// When a project is planned without an explicit command
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AutoPlan {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Globs relative to the project dir; `..` may reach sibling modules
    #[serde(default = "default_when_modified")]
    pub when_modified: Vec<String>,
}

impl Default for AutoPlan {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            when_modified: default_when_modified(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_when_modified() -> Vec<String> {
    vec!["**/*.tf".to_string()]
}

/// A condition the pull request must meet before apply runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum ApplyRequirement {
    Approved,
    Mergeable,
}

impl ApplyRequirement {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplyRequirement::Approved => "approved",
            ApplyRequirement::Mergeable => "mergeable",
        }
    }
}

impl TryFrom<String> for ApplyRequirement {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.as_str() {
            "approved" => Ok(ApplyRequirement::Approved),
            "mergeable" => Ok(ApplyRequirement::Mergeable),
            other => Err(format!(
                "unknown apply requirement {:?}; expected approved or mergeable",
                other
            )),
        }
    }
}

impl fmt::Display for ApplyRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
