//! Version selection policy
//!
//! Picks the target version for a dependency out of the candidates a registry
//! returned, bounded by the project's update policy. Pure function, no I/O.

use crate::config::UpdatePolicy;
use crate::domain::PackageVersion;

/// Selects the best candidate allowed by `policy`, or `None`
///
/// - `Major` takes the overall maximum; the result may equal `current` when
///   nothing newer exists, which callers neutralize downstream.
/// - `Minor` takes the maximum candidate with the same major component and a
///   greater minor component.
/// - `Patch` takes the maximum candidate with the same major and minor
///   components and a greater build component.
///
/// An empty candidate list always yields `None`.
pub fn select_target(
    candidates: &[PackageVersion],
    current: PackageVersion,
    policy: UpdatePolicy,
) -> Option<PackageVersion> {
    if candidates.is_empty() {
        return None;
    }

    match policy {
        UpdatePolicy::Major => candidates.iter().max().copied(),
        UpdatePolicy::Minor => candidates
            .iter()
            .filter(|v| v.major == current.major && v.minor > current.minor)
            .max()
            .copied(),
        UpdatePolicy::Patch => candidates
            .iter()
            .filter(|v| {
                v.major == current.major && v.minor == current.minor && v.build > current.build
            })
            .max()
            .copied(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidates() -> Vec<PackageVersion> {
        vec![
            PackageVersion::new(2, 0, 0),
            PackageVersion::new(1, 1, 0),
            PackageVersion::new(1, 0, 2),
        ]
    }

    #[test]
    fn test_major_takes_overall_maximum() {
        let target = select_target(&candidates(), PackageVersion::new(1, 0, 0), UpdatePolicy::Major);
        assert_eq!(target, Some(PackageVersion::new(2, 0, 0)));
    }

    #[test]
    fn test_minor_stays_within_major() {
        let target = select_target(&candidates(), PackageVersion::new(1, 0, 0), UpdatePolicy::Minor);
        assert_eq!(target, Some(PackageVersion::new(1, 1, 0)));
    }

    #[test]
    fn test_patch_stays_within_minor() {
        let target = select_target(&candidates(), PackageVersion::new(1, 0, 0), UpdatePolicy::Patch);
        assert_eq!(target, Some(PackageVersion::new(1, 0, 2)));
    }

    #[test]
    fn test_exhausted_candidates() {
        // only the current version is available
        let only_current = vec![PackageVersion::new(1, 0, 0)];
        let current = PackageVersion::new(1, 0, 0);

        assert_eq!(
            select_target(&only_current, current, UpdatePolicy::Minor),
            None
        );
        assert_eq!(
            select_target(&only_current, current, UpdatePolicy::Patch),
            None
        );
        // Major tolerates selecting the current version; the commit no-op
        // downstream keeps it from producing an empty pull request
        assert_eq!(
            select_target(&only_current, current, UpdatePolicy::Major),
            Some(current)
        );
    }

    #[test]
    fn test_empty_candidates_yield_none() {
        let current = PackageVersion::new(1, 0, 0);
        assert_eq!(select_target(&[], current, UpdatePolicy::Major), None);
        assert_eq!(select_target(&[], current, UpdatePolicy::Minor), None);
        assert_eq!(select_target(&[], current, UpdatePolicy::Patch), None);
    }

    #[test]
    fn test_minor_ignores_other_majors() {
        let versions = vec![PackageVersion::new(2, 5, 0), PackageVersion::new(3, 0, 0)];
        assert_eq!(
            select_target(&versions, PackageVersion::new(1, 2, 0), UpdatePolicy::Minor),
            None
        );
    }

    #[test]
    fn test_patch_ignores_other_minors() {
        let versions = vec![PackageVersion::new(1, 1, 5), PackageVersion::new(2, 0, 1)];
        assert_eq!(
            select_target(&versions, PackageVersion::new(1, 0, 0), UpdatePolicy::Patch),
            None
        );
    }

    #[test]
    fn test_minor_picks_maximum_eligible() {
        let versions = vec![
            PackageVersion::new(1, 1, 0),
            PackageVersion::new(1, 4, 2),
            PackageVersion::new(1, 3, 9),
            PackageVersion::new(2, 0, 0),
        ];
        assert_eq!(
            select_target(&versions, PackageVersion::new(1, 0, 0), UpdatePolicy::Minor),
            Some(PackageVersion::new(1, 4, 2))
        );
    }

    #[test]
    fn test_multi_digit_components_compare_numerically() {
        let versions = vec![PackageVersion::new(1, 9, 0), PackageVersion::new(1, 10, 0)];
        assert_eq!(
            select_target(&versions, PackageVersion::new(1, 8, 0), UpdatePolicy::Minor),
            Some(PackageVersion::new(1, 10, 0))
        );
    }
}
