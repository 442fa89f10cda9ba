// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Terraform binary adapter

use super::{step_env, ExecError, TerraformExecutor};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tfgate_core::TerraformVersion;
use tokio::process::Command;

/// Runs the real `terraform` binary.
///
/// The default version is whatever `terraform` resolves to on `PATH`; other
/// versions are expected as `terraform<version>` in the binary directory.
#[derive(Clone, Debug)]
pub struct TerraformClient {
    default_version: TerraformVersion,
    bin_dir: Option<PathBuf>,
}

impl TerraformClient {
    pub fn new(default_version: TerraformVersion, bin_dir: Option<PathBuf>) -> Self {
        Self {
            default_version,
            bin_dir,
        }
    }

    /// Build a client whose default version is reported by `terraform version`
    pub async fn detect(bin_dir: Option<PathBuf>) -> Result<Self, ExecError> {
        let version = detect_version(Path::new("terraform")).await?;
        Ok(Self::new(version, bin_dir))
    }

    pub fn default_version(&self) -> &TerraformVersion {
        &self.default_version
    }

    /// Path of the binary that runs `version`
    pub fn binary_for(&self, version: &TerraformVersion) -> PathBuf {
        if *version == self.default_version {
            return PathBuf::from("terraform");
        }
        let name = format!("terraform{}", version);
        match &self.bin_dir {
            Some(dir) => dir.join(name),
            None => PathBuf::from(name),
        }
    }
}

#[async_trait]
impl TerraformExecutor for TerraformClient {
    async fn run_command(
        &self,
        path: &Path,
        args: &[String],
        version: &TerraformVersion,
        workspace: &str,
    ) -> Result<String, ExecError> {
        let binary = self.binary_for(version);
        let output = Command::new(&binary)
            .args(args)
            .current_dir(path)
            .envs(step_env(path, workspace, version))
            .output()
            .await
            .map_err(|e| ExecError::Spawn {
                program: binary.display().to_string(),
                reason: e.to_string(),
            })?;

        let mut combined = String::from_utf8_lossy(&output.stdout).to_string();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        if !output.status.success() {
            return Err(ExecError::NonZeroExit {
                command: format!("terraform {}", args.join(" ")),
                path: path.display().to_string(),
                code: output.status.code().unwrap_or(-1),
                output: combined,
            });
        }

        Ok(combined)
    }
}

/// Run `<binary> version` and parse the reported version
pub async fn detect_version(binary: &Path) -> Result<TerraformVersion, ExecError> {
    let output = Command::new(binary)
        .arg("version")
        .output()
        .await
        .map_err(|e| ExecError::Spawn {
            program: binary.display().to_string(),
            reason: e.to_string(),
        })?;

    if !output.status.success() {
        return Err(ExecError::VersionUnknown(
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ));
    }

    parse_version_output(&String::from_utf8_lossy(&output.stdout))
}

/// Extract the version from `terraform version` output such as
/// `Terraform v0.11.4`
pub fn parse_version_output(output: &str) -> Result<TerraformVersion, ExecError> {
    output
        .lines()
        .find_map(|line| line.trim().strip_prefix("Terraform v"))
        .and_then(|rest| rest.split_whitespace().next())
        .ok_or_else(|| ExecError::VersionUnknown(format!("unexpected output: {}", output.trim())))
        .and_then(|raw| {
            TerraformVersion::parse(raw).map_err(|e| ExecError::VersionUnknown(e.to_string()))
        })
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
