//! Version keys extracted from release tags.
//!
//! A tag can embed several independent version axes, e.g. a platform build
//! and an upstream application version. The caller's pattern names each
//! axis with a capture group; the key holds one parsed version per group,
//! ordered by group name.

use std::cmp::Ordering;

use regex::Regex;
use semver::Version;

use crate::version::normalize_version;

/// Parsed version components of one tag. Empty means "no usable version".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionKey(Vec<Version>);

impl VersionKey {
    pub fn new(components: Vec<Version>) -> Self {
        VersionKey(components)
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn components(&self) -> &[Version] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True when both keys are non-empty, equally long, and at least one
    /// component of `self` has higher precedence than the matching
    /// component of `baseline`.
    ///
    /// This is deliberately existential rather than lexicographic: `[1, 5]`
    /// is newer than `[2, 4]` and `[2, 4]` is newer than `[1, 5]`. Build
    /// metadata is ignored.
    pub fn is_newer_than(&self, baseline: &VersionKey) -> bool {
        if self.is_empty() || baseline.is_empty() || self.len() != baseline.len() {
            return false;
        }
        self.0
            .iter()
            .zip(&baseline.0)
            .any(|(candidate, base)| candidate.cmp_precedence(base) == Ordering::Greater)
    }
}

impl std::fmt::Display for VersionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self.0.iter().map(Version::to_string).collect();
        write!(f, "[{}]", parts.join(", "))
    }
}

/// Extract the version key of `tag` using the named groups of `pattern`.
///
/// All-or-nothing: if the pattern is absent or does not match, or any named
/// group is missing or does not parse as a strict semantic version after
/// normalization, the key is empty.
///
/// An epoch becomes an extra leading release component (`1!2.3.4` turns into
/// `1.2.3.4`), so an epoch tag only parses when its release has two parts.
pub fn extract_version_key(tag: &str, pattern: Option<&Regex>) -> VersionKey {
    let Some(pattern) = pattern else {
        return VersionKey::empty();
    };
    let Some(caps) = pattern.captures(tag) else {
        return VersionKey::empty();
    };

    let mut names: Vec<&str> = pattern.capture_names().flatten().collect();
    names.sort_unstable();

    let mut components = Vec::with_capacity(names.len());
    for name in names {
        let Some(text) = caps.name(name) else {
            return VersionKey::empty();
        };
        match Version::parse(&normalize_version(text.as_str())) {
            Ok(version) => components.push(version),
            Err(_) => return VersionKey::empty(),
        }
    }
    VersionKey(components)
}
