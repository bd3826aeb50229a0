//! Package filtering for group processing
//!
//! Applies, in order: cross-group dedup against the already-processed set,
//! the include list, the exclude list, and finally the group pattern itself.
//! Matching is shell-glob style (`*`, `?`) against the raw dependency name
//! and is case-sensitive.

use crate::config::Project;
use crate::domain::DependencyDetails;
use glob::Pattern;
use std::collections::HashSet;

/// Selects the dependencies a group is allowed to act on
///
/// A dependency already claimed by an earlier group of the same directory is
/// never offered again; first matching group wins. An empty result is a
/// normal outcome and ends processing for the group.
pub fn filter_packages(
    all_packages: &HashSet<DependencyDetails>,
    already_processed: &HashSet<String>,
    group: &str,
    project: &Project,
) -> Vec<DependencyDetails> {
    if all_packages.is_empty() {
        return Vec::new();
    }

    all_packages
        .iter()
        .filter(|package| !already_processed.contains(&package.name))
        .filter(|package| {
            project.include.is_empty()
                || project
                    .include
                    .iter()
                    .any(|pattern| matches_pattern(pattern, &package.name))
        })
        .filter(|package| {
            !project
                .exclude
                .iter()
                .any(|pattern| matches_pattern(pattern, &package.name))
        })
        .filter(|package| matches_pattern(group, &package.name))
        .cloned()
        .collect()
}

/// Shell-glob match against a dependency name; invalid patterns match nothing
///
/// Patterns are validated at configuration time, so a parse failure here only
/// occurs for patterns that never entered the configuration.
pub(crate) fn matches_pattern(pattern: &str, name: &str) -> bool {
    Pattern::new(pattern)
        .map(|pattern| pattern.matches(name))
        .unwrap_or(false)
}
