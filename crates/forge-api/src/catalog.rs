//! Release catalog types and the collaborator traits that produce them.
//!
//! - `ReleaseSource`: lists a repository's releases, newest first
//! - `AssetStore`: downloads a descriptor asset as JSON, or any file as bytes
//!
//! `ReleaseCatalog` carries the newest-first ordering as a checked
//! precondition instead of an assumption about the source.

use std::cmp::Ordering;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::FeedError;
use crate::Result;

/// `owner/name` reference to a hosted repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    pub fn new(owner: &str, name: &str) -> Self {
        RepoRef {
            owner: owner.to_string(),
            name: name.to_string(),
        }
    }
}

impl FromStr for RepoRef {
    type Err = FeedError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().split_once('/') {
            Some((owner, name))
                if !owner.is_empty() && !name.is_empty() && !name.contains('/') =>
            {
                Ok(RepoRef::new(owner, name))
            }
            _ => Err(FeedError::InvalidRepository(s.to_string())),
        }
    }
}

impl std::fmt::Display for RepoRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// A published release as seen by the bots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    /// Display name (may be empty)
    pub name: String,
    /// Release notes (may be empty)
    pub description: String,
    /// Git tag the release points at
    pub tag_name: String,
    /// Flagged as pre-production
    pub is_prerelease: bool,
    /// Download URL of the descriptor asset, if one is attached
    pub asset_url: Option<String>,
    /// Creation time, when the source reports it
    pub created_at: Option<DateTime<Utc>>,
}

impl Release {
    /// Create an undated release without an asset.
    pub fn new(tag_name: &str, is_prerelease: bool) -> Self {
        Release {
            name: tag_name.to_string(),
            description: String::new(),
            tag_name: tag_name.to_string(),
            is_prerelease,
            asset_url: None,
            created_at: None,
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn with_asset(mut self, url: &str) -> Self {
        self.asset_url = Some(url.to_string());
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Whether a descriptor asset is attached.
    pub fn has_asset(&self) -> bool {
        self.asset_url.is_some()
    }
}

/// Releases ordered newest-created first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReleaseCatalog {
    releases: Vec<Release>,
}

impl ReleaseCatalog {
    /// Accept releases the source claims are newest first.
    ///
    /// Dated entries must not increase in `created_at` along the list;
    /// undated entries are not checked.
    pub fn newest_first(releases: Vec<Release>) -> Result<Self> {
        let mut previous: Option<&Release> = None;
        for release in &releases {
            let Some(created) = release.created_at else {
                continue;
            };
            if let Some(prev) = previous {
                if prev.created_at.is_some_and(|p| created > p) {
                    return Err(FeedError::OutOfOrder {
                        newer: release.tag_name.clone(),
                        older: prev.tag_name.clone(),
                    });
                }
            }
            previous = Some(release);
        }
        Ok(ReleaseCatalog { releases })
    }

    /// Re-sort arbitrary releases by `created_at`, newest first.
    ///
    /// The sort is stable; undated releases keep their relative order after
    /// all dated ones.
    pub fn sorted(mut releases: Vec<Release>) -> Self {
        releases.sort_by(|a, b| match (a.created_at, b.created_at) {
            (Some(x), Some(y)) => y.cmp(&x),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
        ReleaseCatalog { releases }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Release> {
        self.releases.iter()
    }

    pub fn len(&self) -> usize {
        self.releases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.releases.is_empty()
    }

    pub fn into_vec(self) -> Vec<Release> {
        self.releases
    }
}

impl<'a> IntoIterator for &'a ReleaseCatalog {
    type Item = &'a Release;
    type IntoIter = std::slice::Iter<'a, Release>;

    fn into_iter(self) -> Self::IntoIter {
        self.releases.iter()
    }
}

/// Source of a repository's release history.
#[async_trait]
pub trait ReleaseSource: Send + Sync {
    /// List the repository's releases, newest created first.
    async fn list_releases(&self, repo: &RepoRef) -> Result<ReleaseCatalog>;
}

/// Downloads release assets and other published files.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Fetch the asset at `url` and parse it as JSON.
    async fn fetch_json(&self, url: &str) -> Result<serde_json::Value>;

    /// Fetch the raw bytes at `url`.
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_repo_ref_parse() {
        let repo: RepoRef = "raspberrypi/rpi-imager".parse().unwrap();
        assert_eq!(repo.owner, "raspberrypi");
        assert_eq!(repo.name, "rpi-imager");
        assert_eq!(repo.to_string(), "raspberrypi/rpi-imager");
    }

    #[test]
    fn test_repo_ref_parse_rejects_garbage() {
        assert!("no-slash".parse::<RepoRef>().is_err());
        assert!("/repo".parse::<RepoRef>().is_err());
        assert!("owner/".parse::<RepoRef>().is_err());
        assert!("a/b/c".parse::<RepoRef>().is_err());
    }

    #[test]
    fn test_newest_first_accepts_descending() {
        let catalog = ReleaseCatalog::newest_first(vec![
            Release::new("v3", false).with_created_at(at(3)),
            Release::new("v2", false),
            Release::new("v1", false).with_created_at(at(1)),
        ])
        .unwrap();
        assert_eq!(catalog.len(), 3);
    }

    #[test]
    fn test_newest_first_rejects_ascending() {
        let err = ReleaseCatalog::newest_first(vec![
            Release::new("v1", false).with_created_at(at(1)),
            Release::new("v2", false).with_created_at(at(2)),
        ])
        .unwrap_err();
        assert!(matches!(err, FeedError::OutOfOrder { ref newer, .. } if newer == "v2"));
    }

    #[test]
    fn test_sorted_puts_newest_first_and_undated_last() {
        let catalog = ReleaseCatalog::sorted(vec![
            Release::new("undated-a", false),
            Release::new("v1", false).with_created_at(at(1)),
            Release::new("undated-b", false),
            Release::new("v2", false).with_created_at(at(2)),
        ]);
        let tags: Vec<&str> = catalog.iter().map(|r| r.tag_name.as_str()).collect();
        assert_eq!(tags, vec!["v2", "v1", "undated-a", "undated-b"]);
    }
}
