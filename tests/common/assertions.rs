//! Common assertion helpers for test output validation
//!
//! Provides predicates for validating git-fleet command output and error
//! messages.

#![allow(dead_code)]

use predicates::prelude::*;

/// Creates a predicate that checks for a repository line starting with `[name]`
pub fn has_repository(name: &str) -> impl Predicate<str> {
    predicates::str::contains(format!("[{}]", name))
}

/// Creates a predicate that checks for a status label such as "clean" or "dirty"
pub fn has_status_label(label: &str) -> impl Predicate<str> {
    predicates::str::contains(label.to_string())
}

/// Creates a predicate that checks for the unprotected-branch refusal
pub fn branch_not_protected() -> impl Predicate<str> {
    predicates::str::contains("is not protected")
}

/// Creates a predicate that checks for the summary line
pub fn has_summary(total: usize) -> impl Predicate<str> {
    predicates::str::contains(format!("{} repositories", total))
}

pub fn not_tracked() -> impl Predicate<str> {
    predicates::str::contains("Repository is not tracked")
}
