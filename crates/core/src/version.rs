// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Structured Terraform versions
//!
//! Versions are compared numerically by (major, minor, patch). A pre-release
//! suffix sorts before the release it precedes, so `0.10.0-beta1 < 0.10.0`.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors from parsing a version string
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionError {
    #[error("empty version string")]
    Empty,
    #[error("malformed version {0:?}")]
    Malformed(String),
}

/// A parsed Terraform version
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TerraformVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub pre: Option<String>,
}

impl TerraformVersion {
    /// First release with workspaces (then called environments)
    pub const WORKSPACES: TerraformVersion = TerraformVersion::new(0, 9, 0);

    /// First release where the `workspace` subcommand replaced `env`
    pub const WORKSPACE_SUBCOMMAND: TerraformVersion = TerraformVersion::new(0, 10, 0);

    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            pre: None,
        }
    }

    pub fn parse(s: &str) -> Result<Self, VersionError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(VersionError::Empty);
        }
        let malformed = || VersionError::Malformed(s.to_string());

        let body = trimmed.strip_prefix('v').unwrap_or(trimmed);
        // Build metadata never affects ordering
        let body = body.split('+').next().unwrap_or(body);
        let (numbers, pre) = match body.split_once('-') {
            Some((n, p)) if !p.is_empty() => (n, Some(p.to_string())),
            Some(_) => return Err(malformed()),
            None => (body, None),
        };

        let mut segments = [0u64; 3];
        let mut count = 0;
        for part in numbers.split('.') {
            if count == segments.len() || part.is_empty() {
                return Err(malformed());
            }
            segments[count] = part.parse().map_err(|_| malformed())?;
            count += 1;
        }

        Ok(Self {
            major: segments[0],
            minor: segments[1],
            patch: segments[2],
            pre,
        })
    }

    /// Whether this version understands named workspaces
    pub fn supports_workspaces(&self) -> bool {
        *self >= Self::WORKSPACES
    }

    /// The subcommand family used to manage workspaces, if any.
    ///
    /// `env` for 0.9.x, `workspace` for 0.10.0 and later.
    pub fn workspace_subcommand(&self) -> Option<&'static str> {
        if *self >= Self::WORKSPACE_SUBCOMMAND {
            Some("workspace")
        } else if self.supports_workspaces() {
            Some("env")
        } else {
            None
        }
    }
}

impl Ord for TerraformVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch)
            .cmp(&(other.major, other.minor, other.patch))
            .then_with(|| match (&self.pre, &other.pre) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(a), Some(b)) => a.cmp(b),
            })
    }
}

impl PartialOrd for TerraformVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for TerraformVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(pre) = &self.pre {
            write!(f, "-{}", pre)?;
        }
        Ok(())
    }
}

impl FromStr for TerraformVersion {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for TerraformVersion {
    type Error = VersionError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<TerraformVersion> for String {
    fn from(v: TerraformVersion) -> Self {
        v.to_string()
    }
}

#[cfg(test)]
#[path = "version_tests.rs"]
mod tests;
