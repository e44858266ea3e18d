//! Stable / prerelease selection over a newest-first release catalog.
//!
//! One pass over the catalog feeds every release that survives the ignore
//! filter into a [`SelectionState`]. The state holds two one-shot slots:
//!
//! - **stable**: the first non-prerelease seen. Its version key becomes the
//!   baseline for later prereleases.
//! - **prerelease**: the first prerelease seen while no stable is recorded,
//!   or the first later prerelease whose key is newer than the baseline
//!   (see [`VersionKey::is_newer_than`]).
//!
//! A filled slot is never overwritten.

use forge_api::{Release, ReleaseCatalog};
use regex::Regex;
use tracing::debug;

use crate::domain::Result;
use crate::obs::{emit_prerelease_selected, emit_release_skipped, emit_stable_selected};
use crate::tag_version::{extract_version_key, VersionKey};

/// Compiled patterns steering a selection pass.
#[derive(Debug, Clone, Default)]
pub struct SelectionPatterns {
    /// Releases whose name or description match are skipped
    pub ignore: Option<Regex>,
    /// Named groups extract the version key from the tag
    pub version: Option<Regex>,
}

impl SelectionPatterns {
    /// Compile optional patterns; empty strings count as absent.
    pub fn new(ignore: Option<&str>, version: Option<&str>) -> Result<Self> {
        Ok(SelectionPatterns {
            ignore: compile_optional(ignore)?,
            version: compile_optional(version)?,
        })
    }

    /// Whether the release's (non-empty) name or description matches the
    /// ignore pattern.
    pub fn is_ignored(&self, release: &Release) -> bool {
        self.ignore.as_ref().is_some_and(|re| {
            matches_non_empty(re, &release.name) || matches_non_empty(re, &release.description)
        })
    }
}

pub(crate) fn compile_optional(pattern: Option<&str>) -> Result<Option<Regex>> {
    match pattern.filter(|p| !p.is_empty()) {
        Some(p) => Ok(Some(Regex::new(p)?)),
        None => Ok(None),
    }
}

pub(crate) fn matches_non_empty(re: &Regex, text: &str) -> bool {
    !text.is_empty() && re.is_match(text)
}

/// What [`SelectionState::offer`] did with a release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotFill {
    Stable,
    Prerelease,
    /// Both relevant slots were filled, or the prerelease was not newer
    Rejected,
}

/// Accumulator with one-shot stable and prerelease slots.
#[derive(Debug, Clone, Default)]
pub struct SelectionState {
    stable: Option<(Release, VersionKey)>,
    prerelease: Option<Release>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer the next (older) release with its version key.
    pub fn offer(&mut self, release: &Release, key: VersionKey) -> SlotFill {
        if self.stable.is_none() && !release.is_prerelease {
            self.stable = Some((release.clone(), key));
            return SlotFill::Stable;
        }

        if self.prerelease.is_none() && release.is_prerelease {
            let accepted = match &self.stable {
                None => true,
                Some((_, baseline)) => key.is_newer_than(baseline),
            };
            if accepted {
                self.prerelease = Some(release.clone());
                return SlotFill::Prerelease;
            }
        }

        SlotFill::Rejected
    }

    pub fn stable(&self) -> Option<&Release> {
        self.stable.as_ref().map(|(release, _)| release)
    }

    /// Version key of the recorded stable release.
    pub fn baseline(&self) -> Option<&VersionKey> {
        self.stable.as_ref().map(|(_, key)| key)
    }

    pub fn prerelease(&self) -> Option<&Release> {
        self.prerelease.as_ref()
    }

    /// Both slots are filled; further offers are always rejected.
    pub fn is_complete(&self) -> bool {
        self.stable.is_some() && self.prerelease.is_some()
    }

    pub fn finish(self) -> Selection {
        Selection {
            stable: self.stable.map(|(release, _)| release),
            prerelease: self.prerelease,
        }
    }
}

/// Outcome of a selection pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub stable: Option<Release>,
    pub prerelease: Option<Release>,
}

/// Pick the current stable and prerelease from `catalog`.
pub fn select_releases(catalog: &ReleaseCatalog, patterns: &SelectionPatterns) -> Selection {
    let mut state = SelectionState::new();

    for release in catalog {
        if patterns.is_ignored(release) {
            emit_release_skipped(&release.tag_name, "ignore pattern");
            continue;
        }

        let key = extract_version_key(&release.tag_name, patterns.version.as_ref());
        let key_text = key.to_string();
        match state.offer(release, key) {
            SlotFill::Stable => emit_stable_selected(&release.tag_name, &key_text),
            SlotFill::Prerelease => emit_prerelease_selected(&release.tag_name, &key_text),
            SlotFill::Rejected => {
                debug!(tag = %release.tag_name, key = %key_text, "release not selected")
            }
        }
    }

    state.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog(releases: Vec<Release>) -> ReleaseCatalog {
        ReleaseCatalog::newest_first(releases).unwrap()
    }

    #[test]
    fn test_example_without_version_pattern() {
        let releases = catalog(vec![
            Release::new("v2.0-rc1", true),
            Release::new("v1.9", false),
            Release::new("v1.8", false),
        ]);

        let selection = select_releases(&releases, &SelectionPatterns::default());
        assert_eq!(selection.stable.unwrap().tag_name, "v1.9");
        assert_eq!(selection.prerelease.unwrap().tag_name, "v2.0-rc1");
    }

    #[test]
    fn test_prerelease_after_stable_needs_version_key() {
        let releases = catalog(vec![
            Release::new("v1.9.0", false),
            Release::new("v2.0.0-rc.1", true),
        ]);

        let selection = select_releases(&releases, &SelectionPatterns::default());
        assert_eq!(selection.stable.unwrap().tag_name, "v1.9.0");
        assert!(selection.prerelease.is_none());
    }

    #[test]
    fn test_prerelease_after_stable_accepted_when_newer() {
        let releases = catalog(vec![
            Release::new("v1.9.0", false),
            Release::new("v1.8.0-rc.1", true),
            Release::new("v2.0.0-rc.1", true),
        ]);
        let patterns = SelectionPatterns::new(None, Some(r"^v(?P<version>.+)$")).unwrap();

        let selection = select_releases(&releases, &patterns);
        assert_eq!(selection.stable.unwrap().tag_name, "v1.9.0");
        assert_eq!(selection.prerelease.unwrap().tag_name, "v2.0.0-rc.1");
    }

    #[test]
    fn test_ignore_pattern_checks_name_and_description() {
        let releases = catalog(vec![
            Release::new("v3", false).with_name("v3 nightly build"),
            Release::new("v2", false).with_description("nightly snapshot"),
            Release::new("v1", false),
        ]);
        let patterns = SelectionPatterns::new(Some("nightly"), None).unwrap();

        let selection = select_releases(&releases, &patterns);
        assert_eq!(selection.stable.unwrap().tag_name, "v1");
    }

    #[test]
    fn test_empty_patterns_are_absent() {
        let patterns = SelectionPatterns::new(Some(""), Some("")).unwrap();
        assert!(patterns.ignore.is_none());
        assert!(patterns.version.is_none());
    }

    #[test]
    fn test_invalid_pattern_is_an_error() {
        assert!(SelectionPatterns::new(Some("(nightly"), None).is_err());
    }

    #[test]
    fn test_state_slots_are_one_shot() {
        let mut state = SelectionState::new();
        assert_eq!(
            state.offer(&Release::new("pre-1", true), VersionKey::empty()),
            SlotFill::Prerelease
        );
        assert_eq!(
            state.offer(&Release::new("pre-2", true), VersionKey::empty()),
            SlotFill::Rejected
        );
        assert_eq!(
            state.offer(&Release::new("stable-1", false), VersionKey::empty()),
            SlotFill::Stable
        );
        assert_eq!(
            state.offer(&Release::new("stable-2", false), VersionKey::empty()),
            SlotFill::Rejected
        );
        assert!(state.is_complete());
        assert_eq!(state.stable().unwrap().tag_name, "stable-1");
        assert_eq!(state.prerelease().unwrap().tag_name, "pre-1");
        assert_eq!(state.baseline(), Some(&VersionKey::empty()));
    }
}
