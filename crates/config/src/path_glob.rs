// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Path globs for autoplan matching
//!
//! `**` spans any number of directories, `*` and `?` stay within one
//! path segment.

use glob::{MatchOptions, Pattern, PatternError};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// A compiled path glob
#[derive(Debug, Clone)]
pub struct Glob {
    pattern: Pattern,
}

impl Glob {
    pub fn new(pattern: &str) -> Result<Self, PatternError> {
        Ok(Self {
            pattern: Pattern::new(pattern)?,
        })
    }

    pub fn is_match(&self, path: &str) -> bool {
        self.pattern.matches_with(path, MATCH_OPTIONS)
    }
}

#[cfg(test)]
#[path = "path_glob_tests.rs"]
mod tests;
