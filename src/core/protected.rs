//! Protected branch patterns.
//!
//! A pattern is either an exact branch name or a glob where `*` matches any run
//! of characters, including `/` (`release/*` matches `release/1.0/hotfix`).

use crate::core::error::{FleetError, Result};
use crate::core::records::Branch;
use regex::Regex;

#[derive(Debug, Clone)]
pub struct ProtectedBranches {
    patterns: Vec<String>,
    exact: Vec<String>,
    globs: Vec<Regex>,
}

impl ProtectedBranches {
    pub fn new<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut protected = ProtectedBranches {
            patterns: Vec::new(),
            exact: Vec::new(),
            globs: Vec::new(),
        };
        for pattern in patterns {
            let pattern = pattern.as_ref().trim();
            if pattern.is_empty() {
                continue;
            }
            if pattern.contains('*') {
                protected.globs.push(glob_to_regex(pattern)?);
            } else {
                protected.exact.push(pattern.to_string());
            }
            protected.patterns.push(pattern.to_string());
        }
        Ok(protected)
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn is_protected(&self, name: &str) -> bool {
        self.exact.iter().any(|exact| exact == name) || self.globs.iter().any(|re| re.is_match(name))
    }

    /// Set `is_protected` on each branch, matching on the name without any
    /// remote prefix.
    pub fn mark(&self, branches: &mut [Branch]) {
        for branch in branches {
            branch.is_protected = self.is_protected(branch.short_name());
        }
    }
}

fn glob_to_regex(pattern: &str) -> Result<Regex> {
    let body = pattern
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");
    Regex::new(&format!("^{body}$")).map_err(|source| FleetError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}
